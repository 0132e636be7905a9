use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{Issue, IssueId, IssuePatch, NewIssue},
    protocol::PageRequest,
};
use tracing::debug;
use url::Url;

pub mod dashboard;
pub mod debounce;
pub mod details;
pub mod error;
pub mod form;
pub mod kanban;
pub mod query_sync;
pub mod session;

pub use dashboard::{
    Completion, DashboardController, DashboardState, FetchKind, FetchRequest, FetchTicket,
    ViewMode, DEFAULT_PAGE_SIZE,
};
pub use debounce::{SearchDebouncer, DEFAULT_SEARCH_DEBOUNCE};
pub use details::{DetailsState, IssueDetails};
pub use error::ClientError;
pub use form::{FormMode, IssueForm, Navigation};
pub use kanban::KanbanColumn;
pub use query_sync::{DashboardQuery, QuerySync, RawQueryParams, StatusParam, UrlQuerySync};
pub use session::{Dashboard, DashboardIntent};

/// Backend operations over the issue collection.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Issue>, ClientError>;
    /// Returns at most `request.limit` issues starting at `request.offset`.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Issue>, ClientError>;
    async fn fetch_by_id(&self, id: IssueId) -> Result<Issue, ClientError>;
    async fn create(&self, issue: &NewIssue) -> Result<Issue, ClientError>;
    async fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, ClientError>;
    async fn delete(&self, id: IssueId) -> Result<(), ClientError>;
}

/// json-server style REST backend rooted at `<api_url>/issues`.
pub struct HttpIssueRepository {
    http: Client,
    issues_url: String,
}

impl HttpIssueRepository {
    pub fn new(api_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), api_url)
    }

    pub fn with_client(http: Client, api_url: &str) -> Result<Self, ClientError> {
        let trimmed = api_url.trim().trim_end_matches('/');
        let base = Url::parse(trimmed).map_err(|source| ClientError::InvalidUrl {
            url: api_url.to_string(),
            source,
        })?;
        let issues_url = format!("{}/issues", base.as_str().trim_end_matches('/'));
        Ok(Self { http, issues_url })
    }

    pub fn issues_url(&self) -> &str {
        &self.issues_url
    }

    fn issue_url(&self, id: IssueId) -> String {
        format!("{}/{}", self.issues_url, id.0)
    }
}

fn check_status(response: Response, id: Option<IssueId>) -> Result<Response, ClientError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(ClientError::NotFound(id));
        }
    }
    if !status.is_success() {
        return Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

#[async_trait]
impl IssueRepository for HttpIssueRepository {
    async fn fetch_all(&self) -> Result<Vec<Issue>, ClientError> {
        let response = self.http.get(&self.issues_url).send().await?;
        let issues: Vec<Issue> = check_status(response, None)?.json().await?;
        debug!(count = issues.len(), "fetched all issues");
        Ok(issues)
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Issue>, ClientError> {
        let response = self
            .http
            .get(&self.issues_url)
            .query(&request.to_query_pairs())
            .send()
            .await?;
        let issues: Vec<Issue> = check_status(response, None)?.json().await?;
        debug!(
            offset = request.offset,
            limit = request.limit,
            count = issues.len(),
            "fetched issue page"
        );
        Ok(issues)
    }

    async fn fetch_by_id(&self, id: IssueId) -> Result<Issue, ClientError> {
        let response = self.http.get(self.issue_url(id)).send().await?;
        Ok(check_status(response, Some(id))?.json().await?)
    }

    async fn create(&self, issue: &NewIssue) -> Result<Issue, ClientError> {
        let response = self.http.post(&self.issues_url).json(issue).send().await?;
        Ok(check_status(response, None)?.json().await?)
    }

    async fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, ClientError> {
        let response = self
            .http
            .patch(self.issue_url(id))
            .json(patch)
            .send()
            .await?;
        Ok(check_status(response, Some(id))?.json().await?)
    }

    async fn delete(&self, id: IssueId) -> Result<(), ClientError> {
        let response = self.http.delete(self.issue_url(id)).send().await?;
        check_status(response, Some(id))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/fake_repository.rs"]
pub(crate) mod fake_repository;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
