//! Admin API error types

use thiserror::Error;

/// Errors returned by the Admin Ops client
#[derive(Debug, Error)]
pub enum AdminError {
    /// The endpoint could not be turned into a request URL
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Transport failure (connection, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status
    #[error("{}", status_message(*status, code.as_deref(), request_id.as_deref()))]
    Status {
        status: u16,
        /// RGW error code (e.g., "NoSuchUser")
        code: Option<String>,
        request_id: Option<String>,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be signed
    #[error("Failed to sign request: {0}")]
    Signing(String),
}

fn status_message(status: u16, code: Option<&str>, request_id: Option<&str>) -> String {
    let mut message = format!("RGW returned status {}", status);
    if let Some(code) = code {
        message.push_str(&format!(" ({})", code));
    }
    if let Some(request_id) = request_id {
        message.push_str(&format!(", request id {}", request_id));
    }
    message
}

impl AdminError {
    /// Create a signing error
    pub fn signing(reason: impl std::fmt::Display) -> Self {
        Self::Signing(reason.to_string())
    }

    /// RGW error code, if the gateway sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether the gateway reported that the user does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. }) || self.code() == Some("NoSuchUser")
    }
}

/// Result type for Admin API operations
pub type AdminResult<T> = Result<T, AdminError>;
