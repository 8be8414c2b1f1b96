use crate::field::FieldKind;
use crate::validate::ValidationError;
use colored::Colorize;
use std::{fmt, io, path::PathBuf};

/// Errors that can occur while loading configuration
#[derive(Debug)]
pub enum LoadError {
    /// More than two path segments were passed to the loader
    InvalidArguments { count: usize },
    /// The config file could not be inspected for a reason other than absence
    Io { path: PathBuf, source: io::Error },
    /// The config file exists but could not be read or parsed
    File {
        path: PathBuf,
        source: dotenvy::Error,
    },
    /// An environment entry had no `=` separator
    MalformedEntry { entry: String },
    /// A field whose key is present cannot be assigned
    NotAssignable { field: &'static str },
    /// A value could not be converted into the field's declared type
    Conversion {
        key: String,
        kind: FieldKind,
        value: String,
        reason: String,
    },
    /// A field's declared type is outside the supported set
    UnsupportedType { field: &'static str },
    /// The populated struct failed its declared constraints
    Validation(ValidationError),
}

impl LoadError {
    /// Short name of the loading stage that failed, used as a log field
    pub fn stage(&self) -> &'static str {
        match self {
            LoadError::InvalidArguments { .. } => "arguments",
            LoadError::Io { .. } => "io",
            LoadError::File { .. } => "file",
            LoadError::MalformedEntry { .. } => "environment",
            LoadError::NotAssignable { .. }
            | LoadError::Conversion { .. }
            | LoadError::UnsupportedType { .. } => "mapping",
            LoadError::Validation(_) => "validation",
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::InvalidArguments { count } => write!(
                f,
                "invalid set of parameters are provided: expected at most 2 path segments, got {}",
                count.to_string().yellow().bold()
            ),
            LoadError::Io { path, source } => write!(
                f,
                "{}: cannot access config file: {}",
                path.display().to_string().magenta().bold(),
                source
            ),
            LoadError::File { path, source } => write!(
                f,
                "{}: failed to read config file: {}",
                path.display().to_string().magenta().bold(),
                source
            ),
            LoadError::MalformedEntry { entry } => write!(
                f,
                "malformed environment entry {}: expected KEY=VALUE",
                format!("'{}'", entry).red()
            ),
            LoadError::NotAssignable { field } => {
                write!(f, "field {} is not settable", field.magenta().bold())
            }
            LoadError::Conversion {
                key,
                kind,
                value,
                reason,
            } => write!(
                f,
                "failed to parse {} as {}: {} ({})",
                key.magenta().bold(),
                kind,
                format!("'{}'", value).red(),
                reason
            ),
            LoadError::UnsupportedType { field } => {
                write!(f, "unsupported type for field {}", field.magenta().bold())
            }
            LoadError::Validation(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::File { source, .. } => Some(source),
            LoadError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for LoadError {
    fn from(err: ValidationError) -> Self {
        LoadError::Validation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_arguments() {
        colored::control::set_override(false);

        let error = LoadError::InvalidArguments { count: 3 };

        let output = error.to_string();
        assert!(output.contains("invalid set of parameters"));
        assert!(output.contains("got 3"));
        assert_eq!(error.stage(), "arguments");
    }

    #[test]
    fn test_conversion_names_key_and_value() {
        colored::control::set_override(false);

        let error = LoadError::Conversion {
            key: "PORT".to_string(),
            kind: FieldKind::Integer,
            value: "not-a-number".to_string(),
            reason: "invalid digit found in string".to_string(),
        };

        let output = error.to_string();
        assert!(output.contains("failed to parse PORT as int"));
        assert!(output.contains("'not-a-number'"));
        assert!(output.contains("invalid digit"));
        assert_eq!(error.stage(), "mapping");
    }

    #[test]
    fn test_unsupported_type() {
        colored::control::set_override(false);

        let error = LoadError::UnsupportedType { field: "hosts" };
        assert_eq!(error.to_string(), "unsupported type for field hosts");
    }

    #[test]
    fn test_not_assignable() {
        colored::control::set_override(false);

        let error = LoadError::NotAssignable { field: "build_id" };
        assert_eq!(error.to_string(), "field build_id is not settable");
    }

    #[test]
    fn test_io_error_has_source() {
        colored::control::set_override(false);

        let error = LoadError::Io {
            path: PathBuf::from("/etc/app/.env"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };

        let output = error.to_string();
        assert!(output.contains("/etc/app/.env"));
        assert!(output.contains("permission denied"));
        assert!(error.source().is_some());
        assert_eq!(error.stage(), "io");
    }

    #[test]
    fn test_malformed_entry() {
        colored::control::set_override(false);

        let error = LoadError::MalformedEntry {
            entry: "JUST_A_KEY".to_string(),
        };

        assert!(error.to_string().contains("'JUST_A_KEY'"));
        assert_eq!(error.stage(), "environment");
    }

    #[test]
    fn test_debug_format() {
        let error = LoadError::UnsupportedType { field: "hosts" };

        let debug_output = format!("{:?}", error);
        assert!(debug_output.contains("UnsupportedType"));
        assert!(debug_output.contains("hosts"));
    }
}
