use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Required input missing; raised before any request leaves the client.
    #[error("{0}")]
    Validation(String),
    #[error("could not reach the server: {0}")]
    Transport(String),
    /// Display is the server-provided message, verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{message}")]
    DeleteConflict {
        message: String,
        detail: Option<String>,
    },
    #[error("record {0} is not in the current collection")]
    NotFound(String),
    #[error("unknown filter dimension: {0}")]
    UnknownFilter(String),
    #[error("{0}")]
    Refused(String),
}

impl CoreError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Transport(format!("invalid response body: {err}"))
        } else if err.is_timeout() {
            Self::Transport(format!("request timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}
