//! Error-message extraction from ConvertHub response bodies.
//!
//! The API reports failures in several shapes:
//!
//! ```text
//! { "success": false, "error": { "code": "…", "message": "…" } }
//! { "success": false, "error": "…" }
//! { "message": "…" }
//! { "errors": { "target_format": ["…"] } }
//! ```
//!
//! [`extract_error_message`] reduces all of them to one string. It is used
//! for the submission response, for every status response during polling,
//! and for error bodies attached to non-2xx HTTP responses.

use crate::error::ConvertHubError;
use serde_json::Value;

/// Fallback when a failed job carries no usable message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Fallback when a submission is rejected without a usable message.
pub const REQUEST_FAILED: &str = "Conversion request failed";

/// Best-effort human-readable message from an API error body.
///
/// Priority:
/// 1. `error.message` when `error` is an object
/// 2. `error` when it is a string
/// 3. top-level `message`
/// 4. `errors`, verbatim if a string, compact JSON otherwise
///
/// Returns `None` when the body carries none of these, or when it is not a
/// JSON object at all.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    match obj.get("error") {
        Some(Value::Object(err)) => {
            if let Some(msg) = err.get("message").and_then(non_empty_str) {
                return Some(msg.to_string());
            }
        }
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        _ => {}
    }

    if let Some(msg) = obj.get("message").and_then(non_empty_str) {
        return Some(msg.to_string());
    }

    match obj.get("errors") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// True when the body has any of the fields [`extract_error_message`] reads.
pub fn has_error_fields(body: &Value) -> bool {
    body.as_object().is_some_and(|obj| {
        ["error", "message", "errors"]
            .iter()
            .any(|k| obj.get(*k).is_some_and(|v| !v.is_null()))
    })
}

/// Build an API failure from a body with `success: false`.
///
/// Used at submission time and by [`crate::node`] for operation bodies; the
/// poller uses the same extraction through [`job_failure`].
pub fn api_failure(
    body: &Value,
    fallback: &str,
    status: Option<u16>,
    item_index: Option<usize>,
) -> ConvertHubError {
    ConvertHubError::Api {
        message: extract_error_message(body).unwrap_or_else(|| fallback.to_string()),
        status,
        item_index,
    }
}

/// Build the terminal failure for a job whose status says `success: false`.
///
/// Only the `error` field is consulted here: a top-level `message` on a
/// status payload is descriptive, not an error.
pub fn job_failure(job_id: &str, error: Option<&Value>, item_index: Option<usize>) -> ConvertHubError {
    let message = match error {
        Some(Value::Object(err)) => err.get("message").and_then(non_empty_str).map(str::to_string),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };
    ConvertHubError::JobFailed {
        job_id: job_id.to_string(),
        message: message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        item_index,
    }
}

fn non_empty_str(v: &Value) -> Option<&str> {
    v.as_str().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_message_first() {
        let body = json!({"error": {"code": "E42", "message": "corrupt file"}, "message": "other"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("corrupt file"));
    }

    #[test]
    fn string_error() {
        let body = json!({"error": "quota exceeded"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn object_without_message_falls_through_to_top_level() {
        let body = json!({"error": {"code": "E1"}, "message": "Unauthenticated."});
        assert_eq!(extract_error_message(&body).as_deref(), Some("Unauthenticated."));
    }

    #[test]
    fn errors_object_is_serialised() {
        let body = json!({"errors": {"target_format": ["The target format field is required."]}});
        assert_eq!(
            extract_error_message(&body).as_deref(),
            Some(r#"{"target_format":["The target format field is required."]}"#)
        );
    }

    #[test]
    fn errors_array_is_serialised() {
        let body = json!({"errors": ["a", "b"]});
        assert_eq!(extract_error_message(&body).as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn nothing_usable() {
        assert_eq!(extract_error_message(&json!({"success": false})), None);
        assert_eq!(extract_error_message(&json!("plain text")), None);
        assert_eq!(extract_error_message(&json!({"error": ""})), None);
        assert!(!has_error_fields(&json!({"success": true, "status": "processing"})));
        assert!(has_error_fields(&json!({"errors": []})));
        assert!(!has_error_fields(&json!({"error": null})));
    }

    #[test]
    fn api_failure_uses_fallback() {
        let err = api_failure(&json!({"success": false}), REQUEST_FAILED, Some(422), Some(1));
        assert_eq!(err.to_string(), "Conversion request failed");
        assert_eq!(err.item_index(), Some(1));
    }

    #[test]
    fn job_failure_shapes() {
        let e = job_failure("j", Some(&json!({"message": "corrupt file"})), None);
        assert_eq!(e.to_string(), "corrupt file");
        let e = job_failure("j", Some(&json!("bad codec")), None);
        assert_eq!(e.to_string(), "bad codec");
        let e = job_failure("j", Some(&json!(["nested"])), None);
        assert_eq!(e.to_string(), UNKNOWN_ERROR);
        let e = job_failure("j", None, Some(4));
        assert_eq!(e.to_string(), UNKNOWN_ERROR);
        assert_eq!(e.item_index(), Some(4));
    }
}
