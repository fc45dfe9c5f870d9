//! Loosely-typed command argument values.
//!
//! The wire command encoding carries arguments as an ordered list of these
//! values. The set is closed and matched exhaustively; objects keep their
//! insertion order, matching the encoding's key-ordered maps.

/// A single loosely-typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null / absent command object placeholder.
    Null,
    /// Boolean.
    Boolean(bool),
    /// All wire numbers are 64-bit floats.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Key-ordered mapping; insertion order is preserved.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Short type name, used in mapping error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
        }
    }

    /// String content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Ordered key/value pairs, if this is an object.
    pub fn as_object(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// True for the null placeholder.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up a key in an object value. First match wins.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Lossy conversion for diagnostics and structured logging. Object key
/// order follows `serde_json`'s map representation.
impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Object(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("live").as_str(), Some("live"));
        assert_eq!(Value::from(3.0).as_number(), Some(3.0));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(3.0).as_str(), None);
    }

    #[test]
    fn test_object_lookup_preserves_insertion_order() {
        let obj = Value::Object(vec![
            ("level".to_string(), Value::from("status")),
            ("code".to_string(), Value::from("NetStream.Publish.Start")),
        ]);
        assert_eq!(obj.get("code").and_then(Value::as_str), Some("NetStream.Publish.Start"));
        assert_eq!(obj.get("missing"), None);
        let pairs = obj.as_object().unwrap();
        assert_eq!(pairs[0].0, "level");
        assert_eq!(pairs[1].0, "code");
    }

    #[test]
    fn test_json_conversion() {
        let obj = Value::Object(vec![
            ("name".to_string(), Value::from("camera1")),
            ("start".to_string(), Value::from(-2.0)),
        ]);
        let json = serde_json::Value::from(&obj);
        assert_eq!(json["name"], "camera1");
        assert_eq!(json["start"], -2.0);
    }
}
