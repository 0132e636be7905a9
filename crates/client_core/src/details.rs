use shared::domain::{Issue, IssueId};
use tracing::warn;

use crate::IssueRepository;

pub const INVALID_ID_MESSAGE: &str = "Invalid issue ID";
pub const INVALID_ID_FORMAT_MESSAGE: &str = "Invalid issue ID format";
pub const NOT_FOUND_MESSAGE: &str = "Issue not found or failed to load";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsState {
    Loading,
    Loaded(Issue),
    /// Page-level error; the rest of the app keeps working.
    Failed(String),
}

/// Issue detail page.
#[derive(Debug, Clone)]
pub struct IssueDetails {
    state: DetailsState,
}

impl Default for IssueDetails {
    fn default() -> Self {
        Self {
            state: DetailsState::Loading,
        }
    }
}

pub fn parse_route_id(raw: Option<&str>) -> Result<IssueId, &'static str> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty());
    let Some(raw) = raw else {
        return Err(INVALID_ID_MESSAGE);
    };
    raw.parse::<i64>()
        .map(IssueId)
        .map_err(|_| INVALID_ID_FORMAT_MESSAGE)
}

impl IssueDetails {
    pub fn state(&self) -> &DetailsState {
        &self.state
    }

    pub fn issue(&self) -> Option<&Issue> {
        match &self.state {
            DetailsState::Loaded(issue) => Some(issue),
            _ => None,
        }
    }

    pub async fn load(&mut self, repository: &dyn IssueRepository, raw_id: Option<&str>) {
        let id = match parse_route_id(raw_id) {
            Ok(id) => id,
            Err(message) => {
                self.state = DetailsState::Failed(message.to_string());
                return;
            }
        };
        self.state = match repository.fetch_by_id(id).await {
            Ok(issue) => DetailsState::Loaded(issue),
            Err(err) => {
                warn!(issue_id = id.0, error = %err, "failed to load issue");
                DetailsState::Failed(NOT_FOUND_MESSAGE.to_string())
            }
        };
    }
}
