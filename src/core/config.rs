use crate::error::Error;
use crate::Result;
use serde_json::Value;

// ============================================================================
// JSON Pointer Operations
// ============================================================================

/// Set `new_value` at `pointer`, creating intermediate objects as needed.
pub fn set_json_pointer(root: &mut Value, pointer: &str, new_value: Value) -> Result<()> {
    let pointer = normalize_pointer(pointer)?;
    let Some((parent_ptr, token)) = split_parent_pointer(&pointer) else {
        *root = new_value;
        return Ok(());
    };

    let parent = ensure_pointer_container(root, &parent_ptr)?;
    set_child(parent, &token, new_value)
}

/// Remove the value at `pointer`. Returns the removed value.
pub fn remove_json_pointer(root: &mut Value, pointer: &str) -> Result<Value> {
    let pointer = normalize_pointer(pointer)?;
    let Some((parent_ptr, token)) = split_parent_pointer(&pointer) else {
        return Err(Error::validation_invalid_argument(
            "pointer",
            "Cannot remove the document root",
            None,
            None,
        ));
    };

    let not_found = || Error::config_missing_key(pointer.clone(), None);

    let parent = root.pointer_mut(&parent_ptr).ok_or_else(not_found)?;
    match parent {
        Value::Object(map) => map.remove(&token).ok_or_else(not_found),
        Value::Array(arr) => {
            let index = parse_array_index(&token)?;
            if index >= arr.len() {
                return Err(not_found());
            }
            Ok(arr.remove(index))
        }
        _ => Err(not_found()),
    }
}

fn normalize_pointer(pointer: &str) -> Result<String> {
    if pointer.is_empty() {
        return Ok(String::new());
    }

    if pointer == "/" {
        return Err(Error::validation_invalid_argument(
            "pointer",
            "Invalid JSON pointer '/'",
            None,
            None,
        ));
    }

    if !pointer.starts_with('/') {
        return Err(Error::validation_invalid_argument(
            "pointer",
            format!("JSON pointer must start with '/': {}", pointer),
            None,
            None,
        ));
    }

    Ok(pointer.to_string())
}

fn split_parent_pointer(pointer: &str) -> Option<(String, String)> {
    if pointer.is_empty() {
        return None;
    }

    let mut parts = pointer.rsplitn(2, '/');
    let token = parts.next()?.to_string();
    let parent = parts.next().unwrap_or("");

    Some((parent.to_string(), unescape_token(&token)))
}

fn ensure_pointer_container<'a>(root: &'a mut Value, pointer: &str) -> Result<&'a mut Value> {
    if pointer.is_empty() {
        return Ok(root);
    }

    let tokens: Vec<String> = pointer.split('/').skip(1).map(unescape_token).collect();

    let mut current = root;

    for token in tokens {
        if current.is_null() {
            *current = Value::Object(serde_json::Map::new());
        }

        let next = match current {
            Value::Object(map) => map
                .entry(token)
                .or_insert_with(|| Value::Object(serde_json::Map::new())),
            Value::Array(arr) => {
                let index = parse_array_index(&token)?;
                if index >= arr.len() {
                    return Err(Error::config_invalid_value(
                        pointer,
                        None,
                        "Array index out of bounds while creating path",
                    ));
                }
                &mut arr[index]
            }
            other => {
                return Err(Error::config_invalid_value(
                    pointer,
                    Some(value_type_name(other).to_string()),
                    "Expected object/array at pointer",
                ))
            }
        };

        current = next;
    }

    Ok(current)
}

fn set_child(parent: &mut Value, token: &str, value: Value) -> Result<()> {
    match parent {
        Value::Object(map) => {
            map.insert(token.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let index = parse_array_index(token)?;
            if index >= arr.len() {
                return Err(Error::config_invalid_value(
                    "arrayIndex",
                    Some(index.to_string()),
                    "Array index out of bounds",
                ));
            }
            arr[index] = value;
            Ok(())
        }
        _ => Err(Error::config_invalid_value(
            "jsonPointer",
            Some(value_type_name(parent).to_string()),
            "Cannot set child on non-container",
        )),
    }
}

fn parse_array_index(token: &str) -> Result<usize> {
    token.parse::<usize>().map_err(|_| {
        Error::validation_invalid_argument(
            "arrayIndex",
            "Invalid array index token",
            Some(token.to_string()),
            None,
        )
    })
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
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

    #[test]
    fn set_creates_intermediate_objects() {
        let mut root = json!({});
        set_json_pointer(&mut root, "/defaults/api/timeout_secs", json!(30)).unwrap();
        assert_eq!(root, json!({"defaults": {"api": {"timeout_secs": 30}}}));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut root = json!({"defaults": {"salts": {"mode": "strict"}}});
        set_json_pointer(&mut root, "/defaults/salts/mode", json!("faithful")).unwrap();
        assert_eq!(root["defaults"]["salts"]["mode"], "faithful");
    }

    #[test]
    fn set_rejects_relative_pointer() {
        let mut root = json!({});
        let err = set_json_pointer(&mut root, "defaults", json!(1)).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn set_through_scalar_fails() {
        let mut root = json!({"defaults": 5});
        assert!(set_json_pointer(&mut root, "/defaults/api", json!(1)).is_err());
    }

    #[test]
    fn remove_returns_old_value() {
        let mut root = json!({"defaults": {"api": {"default_port": 2087}}});
        let removed = remove_json_pointer(&mut root, "/defaults/api/default_port").unwrap();
        assert_eq!(removed, json!(2087));
        assert_eq!(root, json!({"defaults": {"api": {}}}));
    }

    #[test]
    fn remove_missing_key_errors() {
        let mut root = json!({"defaults": {}});
        let err = remove_json_pointer(&mut root, "/defaults/nope").unwrap_err();
        assert_eq!(err.code.as_str(), "config.missing_key");
    }

    #[test]
    fn escaped_tokens() {
        let mut root = json!({});
        set_json_pointer(&mut root, "/a~1b", json!(true)).unwrap();
        assert_eq!(root["a/b"], true);
    }
}
