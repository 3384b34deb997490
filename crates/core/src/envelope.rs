//! The `{ success, data, error }` wrapper every marketplace endpoint returns

use serde::{Deserialize, Serialize};

/// API response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_at: Option<String>,
}

/// Error produced when an envelope does not carry a usable payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", display_messages(.messages))]
pub struct EnvelopeError {
    pub messages: Vec<String>,
}

fn display_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "request was not successful".to_string()
    } else {
        messages.join(", ")
    }
}

impl<T> ApiResponse<T> {
    /// Build a successful envelope around `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_at: None,
        }
    }

    /// Unwrap the payload, treating `success: false` or a missing `data`
    /// field as an error.
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(EnvelopeError {
                messages: self.error.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_successful_envelope_yields_data() {
        let envelope: ApiResponse<u32> =
            serde_json::from_value(json!({"success": true, "data": 7, "error": null})).unwrap();
        assert_eq!(envelope.into_result().unwrap(), 7);
    }

    #[test]
    fn test_failed_envelope_joins_messages() {
        let envelope: ApiResponse<u32> = serde_json::from_value(json!({
            "success": false,
            "data": null,
            "error": ["user_id taken", "email invalid"]
        }))
        .unwrap();
        let err = envelope.into_result().unwrap_err();
        assert_eq!(err.to_string(), "user_id taken, email invalid");
    }

    #[test]
    fn test_success_without_data_is_an_error() {
        let envelope: ApiResponse<u32> =
            serde_json::from_value(json!({"success": true})).unwrap();
        let err = envelope.into_result().unwrap_err();
        assert!(err.messages.is_empty());
        assert_eq!(err.to_string(), "request was not successful");
    }
}
