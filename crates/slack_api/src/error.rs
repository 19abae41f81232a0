use thiserror::Error;

/// Error codes the platform uses when the addressed entity does not exist.
const NOT_FOUND_CODES: &[&str] = &[
    "channel_not_found",
    "user_not_found",
    "users_not_found",
    "no_such_subteam",
    "subteam_not_found",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{method} failed: {code}")]
    Platform { method: &'static str, code: String },

    #[error("Failed to decode {method} response: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },
}

impl ApiError {
    /// Builds the error for an `{"ok": false, "error": code}` envelope.
    pub fn platform(method: &'static str, code: impl Into<String>) -> Self {
        Self::Platform {
            method,
            code: code.into(),
        }
    }

    /// The platform error code, if the remote answered with one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Platform { code, .. } => Some(code),
            _ => None,
        }
    }

    /// A close on a conversation that is already closed.
    pub fn is_already_closed(&self) -> bool {
        self.code() == Some("already_closed")
    }

    pub fn is_not_found(&self) -> bool {
        self.code()
            .map(|code| NOT_FOUND_CODES.contains(&code))
            .unwrap_or(false)
    }
}
