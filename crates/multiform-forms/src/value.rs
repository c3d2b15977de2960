//! Typed values produced by cleaning form input.
//!
//! Fields coerce raw strings (and uploaded files) into [`Value`]s. Initial
//! values are supplied as `Value`s as well, so change detection compares
//! like with like.

use std::fmt;

use crate::form_data::UploadedFile;

/// A cleaned or initial form value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string.
    String(String),
    /// A calendar date.
    Date(chrono::NaiveDate),
    /// A UUID.
    Uuid(uuid::Uuid),
    /// An uploaded file.
    File(UploadedFile),
    /// Several values, e.g. from a multi-select.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` for `Null`, the empty string, and the empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Formats the value the way a widget shows it in a `value` attribute.
    pub fn to_form_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::File(file) => file.name.clone(),
            other => other.to_string(),
        }
    }

    /// Converts the value to JSON. Files serialize as their metadata.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Uuid(u) => serde_json::Value::String(u.to_string()),
            Self::File(file) => serde_json::json!({
                "name": file.name,
                "content_type": file.content_type,
                "size": file.size,
            }),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(true) => write!(f, "true"),
            Self::Bool(false) => write!(f, "false"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::File(file) => write!(f, "{}", file.name),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(d: chrono::NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(u: uuid::Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::Bool(false).is_empty());
    }

    #[test]
    fn test_to_form_string() {
        assert_eq!(Value::Null.to_form_string(), "");
        assert_eq!(Value::Int(7).to_form_string(), "7");
        assert_eq!(Value::Bool(true).to_form_string(), "true");
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::Date(date).to_form_string(), "2024-02-29");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Int(1).to_json(), serde_json::json!(1));
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Null]).to_json(),
            serde_json::json!(["a", null])
        );
        let file = UploadedFile::new("a.txt", "text/plain", b"abc".to_vec());
        assert_eq!(
            Value::File(file).to_json(),
            serde_json::json!({"name": "a.txt", "content_type": "text/plain", "size": 3})
        );
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }
}
