use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Typed value of a single annotation line.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Null,
    /// Also used for presence-only annotations (`@Name` with no value).
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<AnnotationValue>),
    /// Object literal; keys keep their source order.
    Map(Vec<(String, AnnotationValue)>),
}

impl AnnotationValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AnnotationValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnnotationValue::Float(f) => Some(*f),
            AnnotationValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AnnotationValue]> {
        match self {
            AnnotationValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(String, AnnotationValue)]> {
        match self {
            AnnotationValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key of a `Map` value.
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

impl From<serde_json::Value> for AnnotationValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => AnnotationValue::Null,
            Value::Bool(b) => AnnotationValue::Bool(b),
            // integers beyond i64 degrade to floats, like JSON decoders without bigint support
            Value::Number(n) => match n.as_i64() {
                Some(i) => AnnotationValue::Int(i),
                None => AnnotationValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => AnnotationValue::String(s),
            Value::Array(items) => {
                AnnotationValue::List(items.into_iter().map(AnnotationValue::from).collect())
            }
            Value::Object(map) => AnnotationValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, AnnotationValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for AnnotationValue {
    fn from(b: bool) -> Self {
        AnnotationValue::Bool(b)
    }
}

impl From<i64> for AnnotationValue {
    fn from(i: i64) -> Self {
        AnnotationValue::Int(i)
    }
}

impl From<f64> for AnnotationValue {
    fn from(f: f64) -> Self {
        AnnotationValue::Float(f)
    }
}

impl From<&str> for AnnotationValue {
    fn from(s: &str) -> Self {
        AnnotationValue::String(s.to_string())
    }
}

impl Serialize for AnnotationValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnnotationValue::Null => serializer.serialize_unit(),
            AnnotationValue::Bool(b) => serializer.serialize_bool(*b),
            AnnotationValue::Int(i) => serializer.serialize_i64(*i),
            AnnotationValue::Float(f) => serializer.serialize_f64(*f),
            AnnotationValue::String(s) => serializer.serialize_str(s),
            AnnotationValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AnnotationValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}
