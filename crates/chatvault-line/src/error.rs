use serde::Deserialize;
use thiserror::Error;

/// Errors produced by the LINE platform layer.
#[derive(Debug, Error)]
pub enum LineError {
    /// Transport-level failure (connection, TLS, timeout, body read).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Messaging API answered with a non-success status.
    #[error("LINE API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

impl LineError {
    /// Parse the platform's structured error body, when there is one.
    ///
    /// API rejections carry a top-level `message` plus a `details` list of
    /// per-property messages worth logging individually.
    pub fn api_detail(&self) -> Option<ApiErrorBody> {
        match self {
            LineError::Api { body, .. } => serde_json::from_str(body).ok(),
            LineError::Http(_) => None,
        }
    }
}

/// Structured error payload returned by the Messaging API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
}

/// One entry of the API error `details` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub property: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_api_error_detail() {
        let err = LineError::Api {
            status: 400,
            body: r#"{"message":"The request body has 2 error(s)","details":[
                {"property":"messages[0].text","message":"May not be empty"},
                {"property":"messages[0].type","message":"invalid type"}
            ]}"#
            .to_string(),
        };

        let detail = err.api_detail().unwrap();
        assert_eq!(detail.message, "The request body has 2 error(s)");
        assert_eq!(detail.details.len(), 2);
        assert_eq!(detail.details[0].property.as_deref(), Some("messages[0].text"));
    }

    #[test]
    fn unparseable_body_yields_none() {
        let err = LineError::Api { status: 500, body: "gateway timeout".to_string() };
        assert!(err.api_detail().is_none());
    }
}
