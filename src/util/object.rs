use crate::StateMap;
use serde_json::Value;

/// An empty key/value object, the placeholder initial state.
pub fn empty_object() -> StateMap {
    StateMap::new()
}

/// Combine two objects into a new one.
///
/// Keys of `first` are copied, then every key of `second` is written on top,
/// replacing existing entries and adding missing ones. Nested objects are
/// replaced wholesale, never merged.
///
/// ```
/// use datastore::util::merge;
/// use serde_json::json;
///
/// let a = json!({ "a": 1, "b": 2 });
/// let b = json!({ "b": 3, "c": 4 });
/// let merged = merge(a.as_object().unwrap(), b.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(merged), json!({ "a": 1, "b": 3, "c": 4 }));
/// ```
pub fn merge(first: &StateMap, second: &StateMap) -> StateMap {
    let mut target = first.clone();
    for (key, value) in second {
        target.insert(key.clone(), value.clone());
    }
    target
}

/// Whether `value` is a key/value object.
///
/// Arrays, `null` and scalars are not. This is the rule
/// [`DataStore`](crate::DataStore) applies to initial state and to every
/// update: exactly the values for which this returns `true` are accepted.
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

/// Name of a value's JSON type.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> StateMap {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn merge_overwrites_and_adds() {
        let merged = merge(
            &object(json!({ "a": 1, "b": 2 })),
            &object(json!({ "b": 3, "c": 4 })),
        );
        assert_eq!(Value::Object(merged), json!({ "a": 1, "b": 3, "c": 4 }));
    }

    #[test]
    fn merge_is_shallow() {
        let merged = merge(
            &object(json!({ "user": { "name": "ada", "age": 36 } })),
            &object(json!({ "user": { "name": "grace" } })),
        );
        assert_eq!(Value::Object(merged), json!({ "user": { "name": "grace" } }));
    }

    #[test]
    fn merge_leaves_inputs_untouched() {
        let first = object(json!({ "a": 1 }));
        let second = object(json!({ "a": 2 }));
        let _ = merge(&first, &second);
        assert_eq!(first["a"], json!(1));
        assert_eq!(second["a"], json!(2));
    }

    #[test]
    fn is_object_cases() {
        assert!(!is_object(&json!([1, 2, 3])));
        assert!(is_object(&json!({ "a": 1 })));
        assert!(is_object(&json!({})));
        assert!(!is_object(&Value::Null));
        assert!(!is_object(&json!("text")));
        assert!(!is_object(&json!(7)));
    }

    #[test]
    fn kinds() {
        assert_eq!(json_kind(&json!([])), "array");
        assert_eq!(json_kind(&Value::Null), "null");
        assert_eq!(json_kind(&json!(true)), "boolean");
        assert_eq!(json_kind(&json!({})), "object");
    }
}
