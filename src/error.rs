//! Error taxonomy for panel operations.
//!
//! Every store operation resolves to `PanelResult<T>`: either the payload or a
//! `PanelError` whose [`ErrorKind`] decides how the operation boundary reacts
//! (authorization failures clear the session, the rest become notices).

use thiserror::Error;

pub type PanelResult<T> = Result<T, PanelError>;

/// Coarse classification used by the operation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Authorization,
    Application,
    Unexpected,
}

#[derive(Debug, Error)]
pub enum PanelError {
    /// Caught before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("request timed out")]
    Timeout,

    #[error("no response from server: {0}")]
    Network(String),

    /// 401/403 from the backend.
    #[error("authorization rejected ({status})")]
    Unauthorized { status: u16, message: Option<String> },

    /// No token held for the role.
    #[error("not logged in")]
    NotAuthenticated,

    #[error("invalid session token: {0}")]
    InvalidToken(String),

    /// `success: false`, or an error status carrying a server message.
    #[error("{0}")]
    Application(String),

    #[error("image upload failed: {0}")]
    Upload(String),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Unexpected(String),
}

impl PanelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PanelError::Validation(_) => ErrorKind::Validation,
            PanelError::Timeout | PanelError::Network(_) => ErrorKind::Network,
            PanelError::Unauthorized { .. }
            | PanelError::NotAuthenticated
            | PanelError::InvalidToken(_) => ErrorKind::Authorization,
            PanelError::Application(_) | PanelError::Upload(_) => ErrorKind::Application,
            PanelError::Storage(_) | PanelError::Decode(_) | PanelError::Unexpected(_) => {
                ErrorKind::Unexpected
            }
        }
    }

    pub fn is_authorization(&self) -> bool {
        self.kind() == ErrorKind::Authorization
    }

    /// Message shown to the user. `fallback` covers errors without a
    /// server-provided message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PanelError::Validation(msg) | PanelError::Application(msg) => msg.clone(),
            PanelError::Timeout => "Request timed out. Please try again.".to_string(),
            PanelError::Network(_) => {
                "No response from server. Please check your connection and try again.".to_string()
            }
            PanelError::Unauthorized { .. } | PanelError::InvalidToken(_) => {
                "Session expired. Please login again.".to_string()
            }
            PanelError::NotAuthenticated => "Please log in to continue".to_string(),
            PanelError::Upload(_) => "Image upload failed".to_string(),
            PanelError::Storage(_) | PanelError::Decode(_) | PanelError::Unexpected(_) => {
                fallback.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for PanelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PanelError::Timeout
        } else if err.is_connect() || err.is_request() {
            PanelError::Network(err.to_string())
        } else {
            PanelError::Unexpected(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(PanelError::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(PanelError::Timeout.kind(), ErrorKind::Network);
        assert_eq!(
            PanelError::Unauthorized { status: 403, message: None }.kind(),
            ErrorKind::Authorization
        );
        assert_eq!(PanelError::NotAuthenticated.kind(), ErrorKind::Authorization);
        assert_eq!(PanelError::Application("nope".into()).kind(), ErrorKind::Application);
        assert_eq!(PanelError::Unexpected("boom".into()).kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = PanelError::Application("Slot already taken".into());
        assert_eq!(err.user_message("fallback"), "Slot already taken");

        let err = PanelError::Unexpected("eof while parsing".into());
        assert_eq!(err.user_message("Failed to fetch doctors"), "Failed to fetch doctors");

        assert_eq!(
            PanelError::Timeout.user_message("ignored"),
            "Request timed out. Please try again."
        );
    }
}
