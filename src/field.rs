use crate::validate::Rule;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use std::fmt;

/// Declared semantic type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Bool,
    Timestamp,
    /// Any type outside the supported set, carrying its source spelling
    Unsupported { type_name: &'static str },
}

impl FieldKind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, FieldKind::Unsupported { .. })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "string"),
            FieldKind::Integer => write!(f, "int"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Timestamp => write!(f, "timestamp"),
            FieldKind::Unsupported { type_name } => write!(f, "{}", type_name),
        }
    }
}

/// A decoded value, tagged with the kind it was decoded as
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::Text(_) => FieldKind::Text,
            Value::Int(_) => FieldKind::Integer,
            Value::Float(_) => FieldKind::Float,
            Value::Bool(_) => FieldKind::Bool,
            Value::Timestamp(_) => FieldKind::Timestamp,
        }
    }

    /// Whether this is the zero value of its kind. The zero timestamp is the Unix epoch,
    /// which is what `DateTime::default()` yields.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Text(s) => s.is_empty(),
            Value::Int(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Bool(v) => !*v,
            Value::Timestamp(t) => t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Failure to move a decoded value into a concrete field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    Mismatch {
        expected: FieldKind,
        found: FieldKind,
    },
    OutOfRange { target: &'static str },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::Mismatch { expected, found } => {
                write!(f, "expected {} value, found {}", expected, found)
            }
            ValueError::OutOfRange { target } => write!(f, "value out of range for {}", target),
        }
    }
}

impl std::error::Error for ValueError {}

fn mismatch(expected: FieldKind, found: &Value) -> ValueError {
    ValueError::Mismatch {
        expected,
        found: found.kind(),
    }
}

impl TryFrom<Value> for String {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(FieldKind::Text, &other)),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

macro_rules! integer_value {
    ($($t:ty),*) => {
        $(
            impl TryFrom<Value> for $t {
                type Error = ValueError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value {
                        Value::Int(v) => <$t>::try_from(v).map_err(|_| ValueError::OutOfRange {
                            target: stringify!($t),
                        }),
                        other => Err(mismatch(FieldKind::Integer, &other)),
                    }
                }
            }

            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Int(value as i64)
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, i64, isize);

impl TryFrom<Value> for f64 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(FieldKind::Float, &other)),
        }
    }
}

impl TryFrom<Value> for f32 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Float(v) => {
                let narrowed = v as f32;
                if narrowed.is_infinite() && v.is_finite() {
                    return Err(ValueError::OutOfRange { target: "f32" });
                }
                Ok(narrowed)
            }
            other => Err(mismatch(FieldKind::Float, &other)),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl TryFrom<Value> for bool {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch(FieldKind::Bool, &other)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl TryFrom<Value> for DateTime<FixedOffset> {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Timestamp(t) => Ok(t),
            other => Err(mismatch(FieldKind::Timestamp, &other)),
        }
    }
}

impl TryFrom<Value> for DateTime<Utc> {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        DateTime::<FixedOffset>::try_from(value).map(|t| t.with_timezone(&Utc))
    }
}

impl TryFrom<Value> for DateTime<Local> {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        DateTime::<FixedOffset>::try_from(value).map(|t| t.with_timezone(&Local))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::Timestamp(value.fixed_offset())
    }
}

/// Assigns a decoded value to one field of `T`
pub type Setter<T> = fn(&mut T, Value) -> Result<(), ValueError>;

/// Reads one field of `T` back as a [`Value`]
pub type Getter<T> = fn(&T) -> Value;

/// Description of a single field of a configuration struct
pub struct FieldSpec<T> {
    /// Field name as declared in the struct
    pub name: &'static str,
    /// Environment variable key, if the field is tagged
    pub key: Option<&'static str>,
    pub kind: FieldKind,
    /// Present in the environment is an error rather than an assignment
    pub readonly: bool,
    pub setter: Option<Setter<T>>,
    pub getter: Option<Getter<T>>,
    pub rules: Vec<Rule>,
}

impl<T> FieldSpec<T> {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            key: None,
            kind,
            readonly: false,
            setter: None,
            getter: None,
            rules: Vec::new(),
        }
    }

    pub fn key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn setter(mut self, setter: Setter<T>) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn getter(mut self, getter: Getter<T>) -> Self {
        self.getter = Some(getter);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("readonly", &self.readonly)
            .field("rules", &self.rules)
            .finish()
    }
}

/// Ordered field descriptors of a configuration struct
#[derive(Debug)]
pub struct Schema<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, spec: FieldSpec<T>) -> Self {
        self.fields.push(spec);
        self
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}
