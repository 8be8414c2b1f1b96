//! Maps environment entries onto the fields of a configuration struct.
//!
//! The field list comes from a [`Schema`], normally generated by `#[derive(EnvConfig)]`.
//! Each supported kind has one decoder; the decoded [`Value`] is then handed to the
//! field's setter, which narrows it to the exact Rust type.

use crate::environment::EnvMap;
use crate::error::LoadError;
use crate::field::{FieldKind, Schema, Value};
use chrono::DateTime;

/// Parse a boolean in the forms `1 t T TRUE true True` and `0 f F FALSE false False`
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("invalid syntax".to_string()),
    }
}

/// Decode a raw string as `kind`
///
/// `field` and `key` only feed the error. Unsupported kinds always fail.
pub fn decode(
    kind: FieldKind,
    field: &'static str,
    key: &str,
    raw: &str,
) -> Result<Value, LoadError> {
    let conversion = |reason: String| LoadError::Conversion {
        key: key.to_string(),
        kind,
        value: raw.to_string(),
        reason,
    };

    match kind {
        FieldKind::Text => Ok(Value::Text(raw.to_string())),
        FieldKind::Integer => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| conversion(e.to_string())),
        FieldKind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| conversion(e.to_string())),
        FieldKind::Bool => parse_bool(raw).map(Value::Bool).map_err(conversion),
        FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
            .map(Value::Timestamp)
            .map_err(|e| conversion(e.to_string())),
        FieldKind::Unsupported { .. } => Err(LoadError::UnsupportedType { field }),
    }
}

/// Assign every tagged field of `target` whose key is present in `env`
///
/// Fields are visited in declaration order. Untagged fields and fields whose key is
/// absent are left untouched. The first failure stops the walk; fields assigned before
/// it keep their new values. Returns the number of fields assigned.
pub fn map_fields<T>(env: &EnvMap, target: &mut T, schema: &Schema<T>) -> Result<usize, LoadError> {
    let mut assigned = 0;

    for spec in schema.fields() {
        let Some(key) = spec.key else {
            continue;
        };
        let Some(raw) = env.get(key) else {
            tracing::trace!(field = spec.name, key, "key not set, keeping default");
            continue;
        };

        // Unsupported fields carry no setter; they fail on their type instead
        let setter = match spec.setter {
            Some(setter) if !spec.readonly => setter,
            _ if spec.readonly || spec.kind.is_supported() => {
                return Err(LoadError::NotAssignable { field: spec.name });
            }
            _ => return Err(LoadError::UnsupportedType { field: spec.name }),
        };

        let value = decode(spec.kind, spec.name, key, raw)?;
        setter(target, value).map_err(|e| LoadError::Conversion {
            key: key.to_string(),
            kind: spec.kind,
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

        tracing::trace!(field = spec.name, key, "assigned field");
        assigned += 1;
    }

    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use chrono::{TimeZone, Utc};

    #[derive(Debug, Default)]
    struct Settings {
        name: String,
        retries: i8,
        ratio: f32,
        verbose: bool,
        started: DateTime<Utc>,
        hosts: Vec<String>,
    }

    fn schema() -> Schema<Settings> {
        Schema::new()
            .field(
                FieldSpec::<Settings>::new("name", FieldKind::Text)
                    .key("NAME")
                    .setter(|t, v| {
                        t.name = v.try_into()?;
                        Ok(())
                    }),
            )
            .field(
                FieldSpec::<Settings>::new("retries", FieldKind::Integer)
                    .key("RETRIES")
                    .setter(|t, v| {
                        t.retries = v.try_into()?;
                        Ok(())
                    }),
            )
            .field(
                FieldSpec::<Settings>::new("ratio", FieldKind::Float)
                    .key("RATIO")
                    .setter(|t, v| {
                        t.ratio = v.try_into()?;
                        Ok(())
                    }),
            )
            .field(
                FieldSpec::<Settings>::new("verbose", FieldKind::Bool)
                    .key("VERBOSE")
                    .setter(|t, v| {
                        t.verbose = v.try_into()?;
                        Ok(())
                    }),
            )
            .field(
                FieldSpec::<Settings>::new("started", FieldKind::Timestamp)
                    .key("STARTED")
                    .setter(|t, v| {
                        t.started = v.try_into()?;
                        Ok(())
                    }),
            )
            .field(FieldSpec::<Settings>::new(
                "hosts",
                FieldKind::Unsupported {
                    type_name: "Vec<String>",
                },
            )
            .key("HOSTS"))
    }

    fn env(entries: &[(&str, &str)]) -> EnvMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_assigns_every_supported_kind() {
        let mut settings = Settings::default();
        let env = env(&[
            ("NAME", "api"),
            ("RETRIES", "-3"),
            ("RATIO", "0.25"),
            ("VERBOSE", "T"),
            ("STARTED", "2024-01-02T03:04:05Z"),
        ]);

        let assigned = map_fields(&env, &mut settings, &schema()).unwrap();

        assert_eq!(assigned, 5);
        assert_eq!(settings.name, "api");
        assert_eq!(settings.retries, -3);
        assert_eq!(settings.ratio, 0.25);
        assert!(settings.verbose);
        assert_eq!(
            settings.started,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_absent_keys_keep_defaults() {
        let mut settings = Settings {
            name: "preset".to_string(),
            ..Settings::default()
        };

        let assigned = map_fields(&env(&[("UNRELATED", "x")]), &mut settings, &schema()).unwrap();

        assert_eq!(assigned, 0);
        assert_eq!(settings.name, "preset");
        assert_eq!(settings.retries, 0);
    }

    #[test]
    fn test_stops_at_first_failure() {
        let mut settings = Settings::default();
        let env = env(&[("NAME", "api"), ("RETRIES", "many"), ("VERBOSE", "true")]);

        let err = map_fields(&env, &mut settings, &schema()).unwrap_err();

        match err {
            LoadError::Conversion { key, kind, value, .. } => {
                assert_eq!(key, "RETRIES");
                assert_eq!(kind, FieldKind::Integer);
                assert_eq!(value, "many");
            }
            other => panic!("Expected Conversion error, got {:?}", other),
        }
        assert_eq!(settings.name, "api");
        assert!(!settings.verbose);
    }

    #[test]
    fn test_integer_overflow_is_conversion_error() {
        let mut settings = Settings::default();

        let err = map_fields(&env(&[("RETRIES", "300")]), &mut settings, &schema()).unwrap_err();

        match err {
            LoadError::Conversion { key, reason, .. } => {
                assert_eq!(key, "RETRIES");
                assert!(reason.contains("out of range for i8"));
            }
            other => panic!("Expected Conversion error, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_type_only_fails_when_key_present() {
        let mut settings = Settings::default();
        assert!(map_fields(&env(&[]), &mut settings, &schema()).is_ok());

        let err = map_fields(&env(&[("HOSTS", "a,b")]), &mut settings, &schema()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedType { field: "hosts" }));
        assert!(settings.hosts.is_empty());
    }

    #[test]
    fn test_readonly_field_is_not_assignable() {
        let schema = Schema::new().field(
            FieldSpec::<Settings>::new("name", FieldKind::Text)
                .key("NAME")
                .readonly(),
        );
        let mut settings = Settings::default();

        let err = map_fields(&env(&[("NAME", "api")]), &mut settings, &schema).unwrap_err();
        assert!(matches!(err, LoadError::NotAssignable { field: "name" }));
    }

    #[test]
    fn test_field_without_setter_is_not_assignable() {
        let schema =
            Schema::new().field(FieldSpec::<Settings>::new("name", FieldKind::Text).key("NAME"));
        let mut settings = Settings::default();

        let err = map_fields(&env(&[("NAME", "api")]), &mut settings, &schema).unwrap_err();
        assert!(matches!(err, LoadError::NotAssignable { field: "name" }));
    }

    #[test]
    fn test_missing_setter_reported_before_conversion() {
        let schema = Schema::new()
            .field(FieldSpec::<Settings>::new("retries", FieldKind::Integer).key("RETRIES"));
        let mut settings = Settings::default();

        let err = map_fields(&env(&[("RETRIES", "abc")]), &mut settings, &schema).unwrap_err();
        assert!(matches!(err, LoadError::NotAssignable { field: "retries" }));
    }

    #[test]
    fn test_parse_bool_forms() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(raw), Ok(true), "{}", raw);
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(raw), Ok(false), "{}", raw);
        }
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("tRuE").is_err());
    }

    #[test]
    fn test_decode_errors_name_the_key() {
        colored::control::set_override(false);

        let err = decode(FieldKind::Timestamp, "started", "STARTED", "yesterday").unwrap_err();
        assert!(err.to_string().contains("failed to parse STARTED as timestamp"));

        let err = decode(FieldKind::Float, "ratio", "RATIO", "1.2.3").unwrap_err();
        assert!(err.to_string().contains("failed to parse RATIO as float"));
    }
}
