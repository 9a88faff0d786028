use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

/// A deserialized request body: either a key/value mapping or an application-defined object.
#[derive(Clone)]
pub enum ParsedBody {
    Map(Map<String, Value>),
    Object(Arc<dyn Any + Send + Sync>),
}

impl ParsedBody {
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        ParsedBody::Object(Arc::new(value))
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            ParsedBody::Map(map) => Some(map),
            ParsedBody::Object(_) => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ParsedBody::Map(_) => None,
            ParsedBody::Object(object) => object.downcast_ref::<T>(),
        }
    }

    /// Decodes raw body bytes as a JSON object. Anything else, including malformed or
    /// non-UTF-8 input, becomes an empty mapping.
    pub fn from_json(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => ParsedBody::Map(map),
            Ok(other) => {
                trace!(kind = json_kind(&other), "json body is not an object, using empty mapping");
                ParsedBody::Map(Map::new())
            }
            Err(e) => {
                trace!(cause = %e, "json body decode failed, using empty mapping");
                ParsedBody::Map(Map::new())
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Map<String, Value>> for ParsedBody {
    fn from(map: Map<String, Value>) -> Self {
        ParsedBody::Map(map)
    }
}

impl From<HashMap<String, String>> for ParsedBody {
    fn from(params: HashMap<String, String>) -> Self {
        ParsedBody::Map(params.into_iter().map(|(key, value)| (key, Value::String(value))).collect())
    }
}

impl fmt::Debug for ParsedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedBody::Map(map) => f.debug_tuple("Map").field(map).finish(),
            ParsedBody::Object(_) => f.debug_tuple("Object").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    #[test]
    fn json_object_becomes_map() {
        let body = ParsedBody::from_json(
            indoc! {r#"
                {
                    "name": "micro",
                    "tags": ["a", "b"]
                }
            "#}
            .as_bytes(),
        );

        let map = body.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&json!("micro")));
        assert_eq!(map.get("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn non_object_json_becomes_empty_map() {
        for text in ["[1, 2]", "\"text\"", "42", "null", "{broken", ""] {
            let body = ParsedBody::from_json(text.as_bytes());
            assert!(body.as_map().unwrap().is_empty(), "{text:?} should decode to an empty mapping");
        }
    }

    #[test]
    fn invalid_utf8_becomes_empty_map() {
        let body = ParsedBody::from_json(&[0xff, 0xfe, 0x00]);
        assert!(body.as_map().unwrap().is_empty());
    }

    #[test]
    fn object_downcast() {
        #[derive(Debug, PartialEq)]
        struct Login {
            user: String,
        }

        let body = ParsedBody::object(Login { user: "alice".into() });
        assert_eq!(body.downcast_ref::<Login>(), Some(&Login { user: "alice".into() }));
        assert!(body.as_map().is_none());
        assert!(body.downcast_ref::<String>().is_none());
    }

    #[test]
    fn form_params_become_string_values() {
        let params = HashMap::from([("q".to_owned(), "rust".to_owned())]);
        let body = ParsedBody::from(params);
        assert_eq!(body.as_map().unwrap().get("q"), Some(&json!("rust")));
    }
}
