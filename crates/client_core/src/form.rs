//! Create/edit issue form.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use shared::{
    domain::{IssueId, IssuePatch, NewIssue},
    error::IssueField,
    validation::{validate, IssueDraft},
};
use tracing::{error, info};

use crate::{error::ClientError, IssueRepository};

pub const LOAD_FOR_EDIT_ERROR: &str = "Failed to load issue for editing";
pub const CREATE_ERROR: &str = "Failed to create issue. Please try again.";
pub const UPDATE_ERROR: &str = "Failed to update issue. Please try again.";
pub const DELETE_ERROR: &str = "Failed to delete issue. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(IssueId),
}

/// Where the form sends the user after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Dashboard,
    IssueDetail(IssueId),
}

impl Navigation {
    pub fn path(self) -> String {
        match self {
            Self::Dashboard => "/issues/dashboard".to_string(),
            Self::IssueDetail(id) => format!("/issues/{}", id.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssueForm {
    mode: FormMode,
    draft: IssueDraft,
    touched: BTreeSet<IssueField>,
    loading: bool,
    error: Option<String>,
    delete_pending: bool,
}

impl IssueForm {
    pub fn create() -> Self {
        Self::with_mode(FormMode::Create)
    }

    pub fn edit(id: IssueId) -> Self {
        Self::with_mode(FormMode::Edit(id))
    }

    /// `new`, a missing id, or a non-numeric id open an empty create form.
    pub fn for_route(raw_id: Option<&str>) -> Self {
        match raw_id
            .filter(|raw| *raw != "new")
            .and_then(|raw| raw.parse::<i64>().ok())
        {
            Some(id) => Self::edit(IssueId(id)),
            None => Self::create(),
        }
    }

    fn with_mode(mode: FormMode) -> Self {
        Self {
            mode,
            draft: IssueDraft::default(),
            touched: BTreeSet::new(),
            loading: false,
            error: None,
            delete_pending: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &IssueDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut IssueDraft {
        &mut self.draft
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn touch(&mut self, field: IssueField) {
        self.touched.insert(field);
    }

    fn mark_all_touched(&mut self) {
        self.touched.extend(IssueField::ALL);
    }

    /// Message for a touched, failing field.
    pub fn error_message(&self, field: IssueField) -> Option<String> {
        if !self.touched.contains(&field) {
            return None;
        }
        validate(&self.draft)
            .err()
            .and_then(|errors| errors.get(field).map(ToString::to_string))
    }

    pub fn is_field_invalid(&self, field: IssueField) -> bool {
        self.error_message(field).is_some()
    }

    pub async fn load_for_edit(&mut self, repository: &dyn IssueRepository) {
        let FormMode::Edit(id) = self.mode else {
            return;
        };
        self.loading = true;
        self.error = None;
        match repository.fetch_by_id(id).await {
            Ok(issue) => {
                self.draft = IssueDraft {
                    title: issue.title,
                    description: issue.description,
                    status: Some(issue.status),
                    priority: Some(issue.priority),
                    assignee: issue.assignee,
                };
            }
            Err(err) => {
                error!(issue_id = id.0, error = %err, "failed to load issue for edit");
                self.error = Some(LOAD_FOR_EDIT_ERROR.to_string());
            }
        }
        self.loading = false;
    }

    /// Validates and saves. An invalid draft marks every field touched and
    /// sends nothing.
    pub async fn submit(
        &mut self,
        repository: &dyn IssueRepository,
        now: DateTime<Utc>,
    ) -> Result<Navigation, ClientError> {
        let valid = match validate(&self.draft) {
            Ok(valid) => valid,
            Err(errors) => {
                self.mark_all_touched();
                return Err(ClientError::Validation(errors));
            }
        };

        self.loading = true;
        self.error = None;
        let result = match self.mode {
            FormMode::Edit(id) => {
                let patch = IssuePatch {
                    title: Some(valid.title),
                    description: Some(valid.description),
                    status: Some(valid.status),
                    priority: Some(valid.priority),
                    assignee: Some(valid.assignee),
                    update_date: Some(now),
                };
                repository.update(id, &patch).await.map_err(|err| {
                    error!(issue_id = id.0, error = %err, "failed to update issue");
                    self.error = Some(UPDATE_ERROR.to_string());
                    err
                })
            }
            FormMode::Create => {
                let issue = NewIssue {
                    title: valid.title,
                    description: valid.description,
                    status: valid.status,
                    priority: valid.priority,
                    assignee: valid.assignee,
                    creation_date: now,
                    update_date: now,
                };
                repository.create(&issue).await.map_err(|err| {
                    error!(error = %err, "failed to create issue");
                    self.error = Some(CREATE_ERROR.to_string());
                    err
                })
            }
        };
        self.loading = false;

        let saved = result?;
        info!(issue_id = saved.id.0, "issue saved");
        Ok(Navigation::IssueDetail(saved.id))
    }

    pub fn cancel(&self) -> Navigation {
        match self.mode {
            FormMode::Edit(id) => Navigation::IssueDetail(id),
            FormMode::Create => Navigation::Dashboard,
        }
    }

    /// Starts delete confirmation and returns the prompt to show. Only
    /// edit forms can delete.
    pub fn request_delete(&mut self) -> Option<String> {
        let FormMode::Edit(_) = self.mode else {
            return None;
        };
        self.delete_pending = true;
        let title = if self.draft.title.is_empty() {
            "this issue"
        } else {
            self.draft.title.as_str()
        };
        Some(format!("Are you sure you want to delete \"{title}\"?"))
    }

    pub fn cancel_delete(&mut self) {
        self.delete_pending = false;
    }

    /// Performs a previously requested delete. `Ok(None)` when nothing was
    /// pending.
    pub async fn confirm_delete(
        &mut self,
        repository: &dyn IssueRepository,
    ) -> Result<Option<Navigation>, ClientError> {
        let FormMode::Edit(id) = self.mode else {
            return Ok(None);
        };
        if !std::mem::take(&mut self.delete_pending) {
            return Ok(None);
        }
        self.loading = true;
        self.error = None;
        let result = repository.delete(id).await;
        self.loading = false;
        if let Err(err) = result {
            error!(issue_id = id.0, error = %err, "failed to delete issue");
            self.error = Some(DELETE_ERROR.to_string());
            return Err(err);
        }
        info!(issue_id = id.0, "issue deleted");
        Ok(Some(Navigation::Dashboard))
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
