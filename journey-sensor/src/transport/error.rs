//! Transport client error types.

/// Errors from fetching data from the transport API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// API returned a non-success status code
    #[error("API error {status}: {message}")]
    Http { status: u16, message: String },

    /// Response body was not the expected JSON shape
    #[error("malformed response: {message}")]
    Malformed {
        message: String,
        body: Option<String>,
    },
}

impl FetchError {
    /// Builds a `Malformed` error, keeping a prefix of the body for logs.
    pub(crate) fn malformed(message: impl Into<String>, body: Option<&str>) -> Self {
        FetchError::Malformed {
            message: message.into(),
            body: body.map(|b| b.chars().take(500).collect()),
        }
    }

    /// HTTP status code, if the API answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
            FetchError::Malformed { .. } => None,
        }
    }
}
