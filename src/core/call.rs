//! Normalized outcome of one remote call.
//!
//! Every failure mode (transport, HTTP status, malformed payload, missing
//! local input, remote-reported failure) ends up as a `CallResult` so the
//! deployment pipeline only ever branches on `status`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

const SILENT_FAILURE: &str = "Remote call reported failure without error messages";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub status: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl CallResult {
    pub fn success(data: Option<Value>) -> Self {
        Self {
            status: true,
            errors: Vec::new(),
            data,
        }
    }

    /// Failed result. An empty message list still yields one entry.
    pub fn failure(errors: Vec<String>) -> Self {
        let errors = if errors.is_empty() {
            vec![SILENT_FAILURE.to_string()]
        } else {
            errors
        };

        Self {
            status: false,
            errors,
            data: None,
        }
    }

    /// Failed result carrying the error's description as its single entry.
    pub fn from_error(err: &Error) -> Self {
        Self::failure(vec![err.to_string()])
    }

    /// Parse a UAPI response body into a result.
    ///
    /// `status` may be a bool, a number or a string; anything truthy counts
    /// as success. `errors` may be absent, null, a string or an array.
    pub fn from_response(body: &Value) -> Self {
        let Some(obj) = body.as_object() else {
            return Self::from_error(&Error::remote_invalid_response(
                "response is not a JSON object",
                Some(truncate(&body.to_string())),
            ));
        };

        let Some(status_value) = obj.get("status") else {
            return Self::from_error(&Error::remote_invalid_response(
                "response has no status field",
                Some(truncate(&body.to_string())),
            ));
        };

        let status = is_truthy(status_value);
        let errors = collect_messages(obj.get("errors"));
        let data = obj.get("data").filter(|v| !v.is_null()).cloned();

        if status {
            Self {
                status,
                errors,
                data,
            }
        } else {
            let mut result = Self::failure(errors);
            result.data = data;
            result
        }
    }

    pub fn is_success(&self) -> bool {
        self.status
    }

    /// First error message, if any.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn collect_messages(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(other) => vec![other.to_string()],
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_status_one_is_success() {
        let result = CallResult::from_response(&json!({
            "status": 1,
            "errors": null,
            "data": {"name": "acme_wp"},
            "messages": null
        }));
        assert!(result.status);
        assert!(result.errors.is_empty());
        assert_eq!(result.data, Some(json!({"name": "acme_wp"})));
    }

    #[test]
    fn zero_status_keeps_remote_errors_in_order() {
        let result = CallResult::from_response(&json!({
            "status": 0,
            "errors": ["first", "second"],
            "data": null
        }));
        assert!(!result.status);
        assert_eq!(result.errors, vec!["first", "second"]);
        assert_eq!(result.data, None);
    }

    #[test]
    fn failure_without_errors_gets_synthetic_entry() {
        let result = CallResult::from_response(&json!({"status": false}));
        assert!(!result.status);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn missing_status_is_failure() {
        let result = CallResult::from_response(&json!({"data": 1}));
        assert!(!result.status);
        assert!(result.errors[0].contains("no status field"));
    }

    #[test]
    fn non_object_body_is_failure() {
        let result = CallResult::from_response(&json!([1, 2, 3]));
        assert!(!result.status);
        assert!(result.errors[0].contains("not a JSON object"));
    }

    #[test]
    fn string_statuses() {
        assert!(CallResult::from_response(&json!({"status": "1"})).status);
        assert!(!CallResult::from_response(&json!({"status": "0"})).status);
        assert!(!CallResult::from_response(&json!({"status": "false"})).status);
    }

    #[test]
    fn single_string_error_becomes_list() {
        let result = CallResult::from_response(&json!({"status": 0, "errors": "denied"}));
        assert_eq!(result.errors, vec!["denied"]);
    }

    #[test]
    fn from_error_embeds_description() {
        let err = Error::other("connection refused");
        let result = CallResult::from_error(&err);
        assert!(!result.status);
        assert_eq!(result.data, None);
        assert_eq!(result.errors, vec![err.to_string()]);
    }
}
