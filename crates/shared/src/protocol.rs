use serde::{Deserialize, Serialize};

use crate::domain::{Issue, IssueStatus};

/// Server-side filter applied to a page fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueQuery {
    /// Trimmed title substring; `None` when the search box is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<IssueStatus>,
}

impl IssueQuery {
    pub fn new(search_term: &str, statuses: &[IssueStatus]) -> Self {
        let trimmed = search_term.trim();
        Self {
            search: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            statuses: statuses.to_vec(),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.statuses.is_empty()
    }

    /// Case-insensitive title substring plus status membership, the same
    /// predicate the backend applies to page fetches.
    pub fn matches(&self, issue: &Issue) -> bool {
        let title_ok = self.search.as_deref().map_or(true, |term| {
            issue.title.to_lowercase().contains(&term.to_lowercase())
        });
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&issue.status);
        title_ok && status_ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    #[serde(flatten)]
    pub query: IssueQuery,
}

impl PageRequest {
    /// json-server pagination and filter parameters. Status repeats once per
    /// selected value. json-server compiles `title_like` into a regex, so the
    /// term is escaped to keep it a literal substring match.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("_start", self.offset.to_string()),
            ("_limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.query.search {
            pairs.push(("title_like", regex::escape(search)));
        }
        pairs.extend(
            self.query
                .statuses
                .iter()
                .map(|status| ("status", status.as_str().to_string())),
        );
        pairs
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{IssueId, IssuePriority};

    fn issue(title: &str, status: IssueStatus) -> Issue {
        Issue {
            id: IssueId(1),
            title: title.to_string(),
            description: String::new(),
            status,
            priority: IssuePriority::Low,
            assignee: "sam".to_string(),
            creation_date: Utc::now(),
            update_date: Utc::now(),
        }
    }

    #[test]
    fn blank_search_is_no_filter() {
        let query = IssueQuery::new("   ", &[]);
        assert!(query.is_unfiltered());
        assert!(query.matches(&issue("anything", IssueStatus::Done)));
    }

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let query = IssueQuery::new("  LOGIN ", &[]);
        assert_eq!(query.search.as_deref(), Some("LOGIN"));
        assert!(query.matches(&issue("Fix login redirect", IssueStatus::ToDo)));
        assert!(!query.matches(&issue("Logout", IssueStatus::ToDo)));
    }

    #[test]
    fn status_filter_is_membership() {
        let query = IssueQuery::new("", &[IssueStatus::Done, IssueStatus::ToDo]);
        assert!(query.matches(&issue("a", IssueStatus::Done)));
        assert!(!query.matches(&issue("a", IssueStatus::InProgress)));
    }

    #[test]
    fn title_search_is_sent_as_a_literal() {
        let request = PageRequest {
            offset: 0,
            limit: 12,
            query: IssueQuery::new("c++ (beta).", &[]),
        };
        assert_eq!(
            request.to_query_pairs()[2],
            ("title_like", r"c\+\+ \(beta\)\.".to_string())
        );
        assert!(request
            .query
            .matches(&issue("Crash in C++ (Beta).", IssueStatus::ToDo)));
        assert!(!IssueQuery::new(".", &[]).matches(&issue("no dot here", IssueStatus::ToDo)));
    }

    #[test]
    fn page_request_repeats_status_parameter() {
        let request = PageRequest {
            offset: 12,
            limit: 12,
            query: IssueQuery::new("crash", &[IssueStatus::ToDo, IssueStatus::InProgress]),
        };
        assert_eq!(
            request.to_query_pairs(),
            vec![
                ("_start", "12".to_string()),
                ("_limit", "12".to_string()),
                ("title_like", "crash".to_string()),
                ("status", "To Do".to_string()),
                ("status", "In Progress".to_string()),
            ]
        );
    }
}
