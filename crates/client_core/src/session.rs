//! Async dashboard session: runs the controller's fetches against a
//! repository, persists filters to the location and broadcasts snapshots.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use shared::domain::{Issue, IssueId, IssueStatus};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::{
    dashboard::{Completion, DashboardController, DashboardState, FetchRequest, FetchTicket, ViewMode},
    debounce::SearchDebouncer,
    error::ClientError,
    query_sync::QuerySync,
    IssueRepository,
};

/// Intents a renderer can raise against the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardIntent {
    Search(String),
    FilterByStatus(Vec<IssueStatus>),
    ClearFilters,
    SwitchView(ViewMode),
    ScrollNearBottom,
    DeleteIssue(IssueId),
    ConfirmDelete,
    CancelDelete,
}

pub struct Dashboard<Q: QuerySync> {
    repository: Arc<dyn IssueRepository>,
    query_sync: Q,
    controller: DashboardController,
    debouncer: SearchDebouncer,
    snapshots: broadcast::Sender<DashboardState>,
}

impl<Q: QuerySync> Dashboard<Q> {
    /// Restores filters and view from the location once. Nothing is fetched
    /// until [`Dashboard::activate`].
    pub fn new(
        repository: Arc<dyn IssueRepository>,
        query_sync: Q,
        page_size: usize,
        search_debounce: Duration,
    ) -> Self {
        let query = query_sync.read().normalize();
        let controller = DashboardController::from_query(&query, page_size);
        let mut debouncer = SearchDebouncer::new(search_debounce);
        debouncer.seed(query.search.clone());
        let (snapshots, _) = broadcast::channel(64);
        Self {
            repository,
            query_sync,
            controller,
            debouncer,
            snapshots,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardState> {
        self.snapshots.subscribe()
    }

    pub fn state(&self) -> &DashboardState {
        self.controller.state()
    }

    pub fn controller(&self) -> &DashboardController {
        &self.controller
    }

    pub fn query_sync(&self) -> &Q {
        &self.query_sync
    }

    pub async fn activate(&mut self) {
        info!(
            view = self.state().view_mode.as_str(),
            search = %self.state().search_term,
            statuses = self.state().status_filter.len(),
            "activating dashboard"
        );
        let ticket = self.controller.reload();
        self.run(ticket).await;
    }

    pub async fn load_issues(&mut self) {
        let ticket = self.controller.load_issues();
        self.run(ticket).await;
    }

    pub async fn load_more_issues(&mut self) {
        if let Some(ticket) = self.controller.load_more_issues() {
            self.run(ticket).await;
        }
    }

    pub async fn load_all_issues(&mut self) {
        let ticket = self.controller.load_all_issues();
        self.run(ticket).await;
    }

    /// Feeds a raw keystroke value to the search debouncer.
    pub fn type_search(&mut self, value: impl Into<String>, now: Instant) {
        self.debouncer.input(value, now);
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Fires the debounced search if its quiet period has passed. Returns
    /// whether a search was issued.
    pub async fn tick(&mut self, now: Instant) -> bool {
        let Some(term) = self.debouncer.poll(now) else {
            return false;
        };
        self.apply_filter_change(|controller| controller.on_search_change(&term))
            .await;
        true
    }

    pub async fn handle(&mut self, intent: DashboardIntent) -> Result<(), ClientError> {
        debug!(?intent, "dashboard intent");
        match intent {
            DashboardIntent::Search(term) => {
                self.debouncer.seed(term.clone());
                self.apply_filter_change(|controller| controller.on_search_change(&term))
                    .await;
            }
            DashboardIntent::FilterByStatus(statuses) => {
                self.apply_filter_change(|controller| controller.on_status_filter_change(statuses))
                    .await;
            }
            DashboardIntent::ClearFilters => {
                self.debouncer.seed(String::new());
                self.apply_filter_change(DashboardController::clear_filters)
                    .await;
            }
            DashboardIntent::SwitchView(mode) => {
                self.apply_filter_change(|controller| controller.toggle_view_mode(mode))
                    .await;
            }
            DashboardIntent::ScrollNearBottom => self.load_more_issues().await,
            DashboardIntent::DeleteIssue(id) => {
                self.request_delete(id);
            }
            DashboardIntent::ConfirmDelete => {
                self.confirm_delete().await?;
            }
            DashboardIntent::CancelDelete => {
                self.controller.cancel_delete();
                self.publish();
            }
        }
        Ok(())
    }

    pub fn request_delete(&mut self, id: IssueId) -> Option<&Issue> {
        if self.controller.request_delete(id).is_none() {
            debug!(issue_id = id.0, "delete requested for issue not on the dashboard");
            return None;
        }
        self.publish();
        self.controller.state().issues.iter().find(|issue| issue.id == id)
    }

    /// Sends the pending delete to the backend. The issue leaves the local
    /// list only once the backend confirmed it.
    pub async fn confirm_delete(&mut self) -> Result<Option<IssueId>, ClientError> {
        let Some(id) = self.controller.confirm_delete() else {
            return Ok(None);
        };
        if let Err(err) = self.repository.delete(id).await {
            error!(issue_id = id.0, error = %err, "failed to delete issue");
            self.controller.on_delete_failed(id);
            self.publish();
            return Err(err);
        }
        info!(issue_id = id.0, "issue deleted");
        match self.controller.on_issue_deleted(id) {
            Some(ticket) => self.run(ticket).await,
            None => self.publish(),
        }
        Ok(Some(id))
    }

    /// Delete gated by a caller-supplied confirmation.
    pub async fn delete_issue_with<F>(&mut self, id: IssueId, confirm: F) -> Result<bool, ClientError>
    where
        F: FnOnce(&Issue) -> bool,
    {
        let Some(issue) = self.request_delete(id) else {
            return Ok(false);
        };
        if !confirm(issue) {
            self.controller.cancel_delete();
            self.publish();
            return Ok(false);
        }
        Ok(self.confirm_delete().await?.is_some())
    }

    async fn apply_filter_change<F>(&mut self, change: F)
    where
        F: FnOnce(&mut DashboardController) -> FetchTicket,
    {
        let ticket = change(&mut self.controller);
        self.query_sync.write(&self.controller.query());
        self.run(ticket).await;
    }

    async fn run(&mut self, ticket: FetchTicket) {
        self.publish();
        let result = self.fetch(ticket.request()).await;
        if self.controller.complete(&ticket, result) == Completion::Applied {
            self.publish();
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Issue>, ClientError> {
        match request {
            FetchRequest::Page(page) => self.repository.fetch_page(page).await,
            FetchRequest::All { .. } => self.repository.fetch_all().await,
        }
    }

    fn publish(&self) {
        // No subscribers is fine; renderers may attach later.
        let _ = self.snapshots.send(self.controller.snapshot());
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
