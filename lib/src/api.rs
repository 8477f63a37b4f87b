//! Contains API-related struct definitions that are shared between server
//! and client.
use serde::{Deserialize, Serialize};

use crate::email::GeneratedEmail;

pub const SEND_SUCCESS_MESSAGE: &str = "Email sent successfully!";

/// Body of `POST /generate`. A missing prompt reads as empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

/// JSON API response from the draftmail server.
///
/// Indicates if the operation succeeded and includes information about
/// the operation. Fields that do not apply to an endpoint are omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<GeneratedEmail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments_count: Option<usize>,
    /// Short, user-facing error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Upstream error message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub message: String,
}

impl ServerResult {
    pub fn failure(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_result_uses_camel_case() {
        let result = ServerResult {
            success: true,
            message_id: Some("<abc@example.com>".to_string()),
            message: Some(SEND_SUCCESS_MESSAGE.to_string()),
            attachments_count: Some(2),
            ..Default::default()
        };

        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "messageId": "<abc@example.com>",
                "message": "Email sent successfully!",
                "attachmentsCount": 2,
            })
        );
    }

    #[test]
    fn missing_prompt_is_empty() {
        let req: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.prompt, "");
    }
}
