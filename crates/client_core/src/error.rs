use shared::{domain::IssueId, error::ValidationErrors};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to issue backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("issue {0} not found")]
    NotFound(IssueId),
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("invalid api url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("form is invalid: {0}")]
    Validation(#[from] ValidationErrors),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Transport and backend failures are worth retrying; validation and
    /// missing records are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::UnexpectedStatus { .. })
    }
}
