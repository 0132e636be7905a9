use std::fmt::Write as _;

use client_core::{DashboardState, IssueForm, KanbanColumn, ViewMode};
use shared::{domain::Issue, error::IssueField};

const TITLE_WIDTH: usize = 40;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn issue_row(issue: &Issue) -> String {
    format!(
        "#{:<5} {:<width$} {:<12} {:<9} {}",
        issue.id,
        clip(&issue.title, TITLE_WIDTH),
        issue.status,
        issue.priority,
        issue.assignee,
        width = TITLE_WIDTH,
    )
}

pub fn list(state: &DashboardState) -> String {
    let mut out = String::new();
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    if state.issues.is_empty() && !state.loading {
        let _ = writeln!(out, "No issues match the current filters.");
        return out;
    }
    for issue in &state.issues {
        let _ = writeln!(out, "{}", issue_row(issue));
    }
    if state.loading_more {
        let _ = writeln!(out, "Loading more issues...");
    } else if state.view_mode == ViewMode::List && state.has_more_issues {
        let _ = writeln!(out, "-- {} shown, scroll for more --", state.issues.len());
    }
    out
}

pub fn kanban(columns: &[KanbanColumn<'_>]) -> String {
    let mut out = String::new();
    for column in columns {
        let _ = writeln!(out, "== {} ({}) ==", column.title, column.issues.len());
        if column.issues.is_empty() {
            let _ = writeln!(out, "   (empty)");
        }
        for issue in &column.issues {
            let _ = writeln!(
                out,
                "   #{} {} [{}] @{}",
                issue.id,
                clip(&issue.title, TITLE_WIDTH),
                issue.priority,
                issue.assignee
            );
        }
    }
    out
}

pub fn detail(issue: &Issue) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#{} {}", issue.id, issue.title);
    let _ = writeln!(out, "Status:   {}", issue.status);
    let _ = writeln!(out, "Priority: {}", issue.priority);
    let _ = writeln!(out, "Assignee: {}", issue.assignee);
    let _ = writeln!(out, "Created:  {}", issue.creation_date.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "Updated:  {}", issue.update_date.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", issue.description);
    out
}

/// Field errors for fields the user has touched.
pub fn form_errors(form: &IssueForm) -> String {
    let mut out = String::new();
    for field in IssueField::ALL {
        if let Some(message) = form.error_message(field) {
            let _ = writeln!(out, "  {field}: {message}");
        }
    }
    if let Some(error) = form.error() {
        let _ = writeln!(out, "! {error}");
    }
    out
}
