//! Paging, filtering and view-mode state machine behind the issue dashboard.
//!
//! The controller never performs I/O. Every transition that needs data hands
//! back a [`FetchTicket`]; the caller runs the request and feeds the result to
//! [`DashboardController::complete`]. Replacing loads bump the generation so a
//! late response for a superseded search or filter is dropped.

use serde::{Deserialize, Serialize};
use shared::{
    domain::{Issue, IssueId, IssueStatus},
    protocol::{IssueQuery, PageRequest},
};
use tracing::{debug, warn};

use crate::{error::ClientError, kanban, query_sync::DashboardQuery};

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load issues. Please try again later.";
pub const DELETE_ERROR_MESSAGE: &str = "Failed to delete issue. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    List,
    Kanban,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Kanban => "kanban",
        }
    }

    /// Anything other than `kanban` falls back to the list view.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("kanban") => Self::Kanban,
            _ => Self::List,
        }
    }
}

/// Read-only view of the dashboard handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardState {
    pub issues: Vec<Issue>,
    pub search_term: String,
    pub status_filter: Vec<IssueStatus>,
    pub view_mode: ViewMode,
    pub current_offset: usize,
    pub page_size: usize,
    pub has_more_issues: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    pub pending_delete: Option<IssueId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Page 0 that replaces the list.
    Replace,
    /// Next page appended to the list.
    Append,
    /// Whole collection, filtered locally for the board.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Page(PageRequest),
    All { query: IssueQuery },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    kind: FetchKind,
    request: FetchRequest,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer load superseded the ticket; state was left untouched.
    Stale,
}

pub(crate) fn dedup_statuses(statuses: impl IntoIterator<Item = IssueStatus>) -> Vec<IssueStatus> {
    let mut out = Vec::new();
    for status in statuses {
        if !out.contains(&status) {
            out.push(status);
        }
    }
    out
}

pub struct DashboardController {
    state: DashboardState,
    generation: u64,
}

impl DashboardController {
    pub fn new(page_size: usize) -> Self {
        Self::from_query(&DashboardQuery::default(), page_size)
    }

    /// Seeds filter and view state restored from the location.
    pub fn from_query(query: &DashboardQuery, page_size: usize) -> Self {
        Self {
            state: DashboardState {
                issues: Vec::new(),
                search_term: query.search.clone(),
                status_filter: dedup_statuses(query.statuses.iter().copied()),
                view_mode: query.view,
                current_offset: 0,
                page_size: page_size.max(1),
                has_more_issues: true,
                loading: false,
                loading_more: false,
                error: None,
                pending_delete: None,
            },
            generation: 0,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.clone()
    }

    /// Filter and view state in the shape persisted to the location.
    pub fn query(&self) -> DashboardQuery {
        DashboardQuery {
            view: self.state.view_mode,
            search: self.state.search_term.clone(),
            statuses: self.state.status_filter.clone(),
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.state.loading || self.state.loading_more
    }

    fn issue_query(&self) -> IssueQuery {
        IssueQuery::new(&self.state.search_term, &self.state.status_filter)
    }

    fn issue_ticket(&mut self, kind: FetchKind, request: FetchRequest) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            generation: self.generation,
            kind,
            request,
        }
    }

    /// Loads the strategy of the active view.
    pub fn reload(&mut self) -> FetchTicket {
        match self.state.view_mode {
            ViewMode::List => self.load_issues(),
            ViewMode::Kanban => self.load_all_issues(),
        }
    }

    pub fn load_issues(&mut self) -> FetchTicket {
        self.state.current_offset = 0;
        self.state.has_more_issues = true;
        self.state.loading = true;
        self.state.loading_more = false;
        self.state.error = None;
        let request = PageRequest {
            offset: 0,
            limit: self.state.page_size,
            query: self.issue_query(),
        };
        self.issue_ticket(FetchKind::Replace, FetchRequest::Page(request))
    }

    /// `None` when a load is already running, nothing is left, or the board
    /// is showing (the board never pages).
    pub fn load_more_issues(&mut self) -> Option<FetchTicket> {
        if self.state.view_mode != ViewMode::List
            || self.is_fetching()
            || !self.state.has_more_issues
        {
            debug!(
                loading = self.state.loading,
                loading_more = self.state.loading_more,
                has_more = self.state.has_more_issues,
                "skipping load more"
            );
            return None;
        }
        self.state.loading_more = true;
        let request = PageRequest {
            offset: self.state.current_offset,
            limit: self.state.page_size,
            query: self.issue_query(),
        };
        Some(self.issue_ticket(FetchKind::Append, FetchRequest::Page(request)))
    }

    pub fn load_all_issues(&mut self) -> FetchTicket {
        self.state.current_offset = 0;
        self.state.loading = true;
        self.state.loading_more = false;
        self.state.error = None;
        let query = self.issue_query();
        self.issue_ticket(FetchKind::All, FetchRequest::All { query })
    }

    pub fn on_search_change(&mut self, term: &str) -> FetchTicket {
        self.state.search_term = term.to_string();
        self.reload()
    }

    pub fn on_status_filter_change(
        &mut self,
        statuses: impl IntoIterator<Item = IssueStatus>,
    ) -> FetchTicket {
        self.state.status_filter = dedup_statuses(statuses);
        self.reload()
    }

    pub fn clear_filters(&mut self) -> FetchTicket {
        self.state.search_term.clear();
        self.state.status_filter.clear();
        self.reload()
    }

    pub fn toggle_view_mode(&mut self, mode: ViewMode) -> FetchTicket {
        self.state.view_mode = mode;
        self.reload()
    }

    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Issue>, ClientError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale issue response"
            );
            return Completion::Stale;
        }

        let page_size = self.state.page_size;
        match (ticket.kind, result) {
            (FetchKind::Replace, Ok(issues)) => {
                self.state.has_more_issues = issues.len() == page_size;
                self.state.current_offset = issues.len();
                self.state.issues = issues;
                self.state.loading = false;
            }
            (FetchKind::Append, Ok(issues)) => {
                if issues.is_empty() {
                    self.state.has_more_issues = false;
                } else {
                    self.state.has_more_issues = issues.len() == page_size;
                    self.state.current_offset += issues.len();
                    self.state.issues.extend(issues);
                }
                self.state.loading_more = false;
            }
            (FetchKind::All, Ok(all)) => {
                let query = match &ticket.request {
                    FetchRequest::All { query } => query.clone(),
                    FetchRequest::Page(page) => page.query.clone(),
                };
                self.state.issues = all.into_iter().filter(|i| query.matches(i)).collect();
                self.state.has_more_issues = false;
                self.state.loading = false;
            }
            (FetchKind::Replace | FetchKind::All, Err(err)) => {
                warn!(error = %err, "failed to load issues");
                self.state.error = Some(LOAD_ERROR_MESSAGE.to_string());
                self.state.loading = false;
            }
            (FetchKind::Append, Err(err)) => {
                warn!(error = %err, offset = self.state.current_offset, "failed to load more issues");
                self.state.loading_more = false;
            }
        }
        Completion::Applied
    }

    /// Local removal after the backend confirmed the delete. Returns the
    /// backfill fetch when a list page dropped below a full page, or a
    /// replacement for an append that was already running.
    pub fn on_issue_deleted(&mut self, id: IssueId) -> Option<FetchTicket> {
        if self.state.pending_delete == Some(id) {
            self.state.pending_delete = None;
        }
        let before = self.state.issues.len();
        self.state.issues.retain(|issue| issue.id != id);
        if self.state.issues.len() == before {
            return None;
        }
        if self.state.view_mode != ViewMode::List {
            return None;
        }
        // The backend shifted every later row down by one.
        self.state.current_offset = self.state.current_offset.saturating_sub(1);
        if self.state.loading_more {
            // The running append was requested at the old offset and may now
            // skip a row. Re-issuing it retires the old ticket as stale.
            debug!(offset = self.state.current_offset, "re-issuing load more after delete");
            self.state.loading_more = false;
            return self.load_more_issues();
        }
        if self.state.issues.len() < self.state.page_size && self.state.has_more_issues {
            return self.load_more_issues();
        }
        None
    }

    /// Marks an issue as awaiting delete confirmation.
    pub fn request_delete(&mut self, id: IssueId) -> Option<&Issue> {
        let issue = self.state.issues.iter().find(|issue| issue.id == id)?;
        self.state.pending_delete = Some(id);
        Some(issue)
    }

    pub fn cancel_delete(&mut self) {
        self.state.pending_delete = None;
    }

    /// Takes the pending delete so the caller can send it to the backend.
    pub fn confirm_delete(&mut self) -> Option<IssueId> {
        self.state.pending_delete.take()
    }

    pub fn on_delete_failed(&mut self, id: IssueId) {
        warn!(issue_id = id.0, "delete failed; keeping issue");
        self.state.error = Some(DELETE_ERROR_MESSAGE.to_string());
    }

    pub fn issues_by_status(&self, status: IssueStatus) -> Vec<&Issue> {
        kanban::issues_by_status(&self.state.issues, status)
    }

    pub fn kanban_columns(&self) -> [kanban::KanbanColumn<'_>; 3] {
        kanban::columns(&self.state.issues)
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
