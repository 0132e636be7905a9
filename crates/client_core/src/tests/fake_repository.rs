use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{
    domain::{Issue, IssueId, IssuePatch, IssuePriority, IssueStatus, NewIssue},
    protocol::PageRequest,
};

use crate::{error::ClientError, IssueRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchAll,
    FetchPage(PageRequest),
    FetchById(IssueId),
    Create,
    Update(IssueId),
    Delete(IssueId),
}

pub fn sample_issue(id: i64) -> Issue {
    issue_with(id, &format!("Issue {id}"), IssueStatus::ToDo)
}

pub fn issue_with(id: i64, title: &str, status: IssueStatus) -> Issue {
    let created = Utc
        .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .expect("timestamp");
    Issue {
        id: IssueId(id),
        title: title.to_string(),
        description: format!("Description for {title}"),
        status,
        priority: IssuePriority::Medium,
        assignee: "morgan".to_string(),
        creation_date: created,
        update_date: created,
    }
}

pub fn numbered_issues(count: i64) -> Vec<Issue> {
    (1..=count).map(sample_issue).collect()
}

/// In-memory backend with json-server paging and filter semantics.
#[derive(Default)]
pub struct FakeRepository {
    issues: Mutex<Vec<Issue>>,
    calls: Mutex<Vec<Call>>,
    fail: Mutex<bool>,
}

impl FakeRepository {
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        Self {
            issues: Mutex::new(issues),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().expect("lock") = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn page_calls(&self) -> Vec<PageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::FetchPage(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn stored(&self) -> Vec<Issue> {
        self.issues.lock().expect("lock").clone()
    }

    fn record(&self, call: Call) -> Result<(), ClientError> {
        self.calls.lock().expect("lock").push(call);
        if *self.fail.lock().expect("lock") {
            return Err(ClientError::UnexpectedStatus {
                status: 503,
                url: "http://fake/issues".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueRepository for FakeRepository {
    async fn fetch_all(&self) -> Result<Vec<Issue>, ClientError> {
        self.record(Call::FetchAll)?;
        Ok(self.stored())
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Issue>, ClientError> {
        self.record(Call::FetchPage(request.clone()))?;
        Ok(self
            .stored()
            .into_iter()
            .filter(|issue| request.query.matches(issue))
            .skip(request.offset)
            .take(request.limit)
            .collect())
    }

    async fn fetch_by_id(&self, id: IssueId) -> Result<Issue, ClientError> {
        self.record(Call::FetchById(id))?;
        self.stored()
            .into_iter()
            .find(|issue| issue.id == id)
            .ok_or(ClientError::NotFound(id))
    }

    async fn create(&self, issue: &NewIssue) -> Result<Issue, ClientError> {
        self.record(Call::Create)?;
        let mut issues = self.issues.lock().expect("lock");
        let next_id = issues.iter().map(|i| i.id.0).max().unwrap_or(0) + 1;
        let created = Issue {
            id: IssueId(next_id),
            title: issue.title.clone(),
            description: issue.description.clone(),
            status: issue.status,
            priority: issue.priority,
            assignee: issue.assignee.clone(),
            creation_date: issue.creation_date,
            update_date: issue.update_date,
        };
        issues.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: IssueId, patch: &IssuePatch) -> Result<Issue, ClientError> {
        self.record(Call::Update(id))?;
        let mut issues = self.issues.lock().expect("lock");
        let issue = issues
            .iter_mut()
            .find(|issue| issue.id == id)
            .ok_or(ClientError::NotFound(id))?;
        if let Some(title) = &patch.title {
            issue.title = title.clone();
        }
        if let Some(description) = &patch.description {
            issue.description = description.clone();
        }
        if let Some(status) = patch.status {
            issue.status = status;
        }
        if let Some(priority) = patch.priority {
            issue.priority = priority;
        }
        if let Some(assignee) = &patch.assignee {
            issue.assignee = assignee.clone();
        }
        if let Some(update_date) = patch.update_date {
            issue.update_date = update_date;
        }
        Ok(issue.clone())
    }

    async fn delete(&self, id: IssueId) -> Result<(), ClientError> {
        self.record(Call::Delete(id))?;
        let mut issues = self.issues.lock().expect("lock");
        let before = issues.len();
        issues.retain(|issue| issue.id != id);
        if issues.len() == before {
            return Err(ClientError::NotFound(id));
        }
        Ok(())
    }
}
