use ahash::RandomState;
use indexmap::IndexMap;

use alloc::string::{String, ToString};

use core::fmt;

/// The payload of a raw sample: a number, a string, or a record of named sub-values.
///
/// `Value` is the already-parsed form callers hand to the [`Factory`](crate::Factory);
/// the factory picks the concrete series variant from the kind of the first value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric observation
    Number(f64),
    /// Textual observation
    Text(String),
    /// Named sub-values sharing the sample's timestamp
    Record(Record),
}

/// Discriminant of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Number`]
    Number,
    /// [`Value::Text`]
    Text,
    /// [`Value::Record`]
    Record,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::Text => "text",
            Self::Record => "record",
        })
    }
}

impl Value {
    /// Returns the kind of this value
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Record(_) => ValueKind::Record,
        }
    }

    /// Returns the number, if this is a [`Value::Number`]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a [`Value::Text`]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the record, if this is a [`Value::Record`]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Record(r) => {
                f.write_str("{")?;
                for (i, (key, value)) in r.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Record(value)
    }
}

impl From<&f64> for Value {
    fn from(value: &f64) -> Self {
        Self::Number(*value)
    }
}

impl From<&Record> for Value {
    fn from(value: &Record) -> Self {
        Self::Record(value.clone())
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

/// An ordered mapping of attribute names to values.
///
/// Keys keep the order in which they were first inserted; a multi series derives
/// its attribute discovery order from the first record it sees. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(IndexMap<String, Value, RandomState>);

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self(IndexMap::with_hasher(RandomState::default()))
    }

    /// Builder-style insert
    ///
    /// # Arguments
    ///
    /// * `key` - Attribute name
    /// * `value` - Attribute value
    ///
    /// # Returns
    ///
    /// * `Self` - The record with the attribute set
    ///
    /// # Examples
    ///
    /// ```
    /// # use ts_series::{Record, Value};
    /// let record = Record::new().with("drinks", 2.0).with("name", "dan");
    /// assert_eq!(record.get("drinks"), Some(&Value::Number(2.0)));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets an attribute, replacing an existing value in place
    ///
    /// # Returns
    ///
    /// * `Option<Value>` - The previous value of the attribute, if any
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value of an attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the attribute is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Attribute names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
