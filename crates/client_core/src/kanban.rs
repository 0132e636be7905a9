use serde::Serialize;
use shared::domain::{Issue, IssueStatus};

/// One board column. Columns always come in `IssueStatus::ALL` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KanbanColumn<'a> {
    pub key: &'static str,
    pub title: &'static str,
    pub status: IssueStatus,
    pub issues: Vec<&'a Issue>,
}

pub fn issues_by_status(issues: &[Issue], status: IssueStatus) -> Vec<&Issue> {
    issues.iter().filter(|issue| issue.status == status).collect()
}

pub fn columns(issues: &[Issue]) -> [KanbanColumn<'_>; 3] {
    IssueStatus::ALL.map(|status| KanbanColumn {
        key: status.as_str(),
        title: status.as_str(),
        status,
        issues: issues_by_status(issues, status),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use shared::domain::{IssueId, IssuePriority};

    use super::*;

    fn issue(id: i64, status: IssueStatus) -> Issue {
        Issue {
            id: IssueId(id),
            title: format!("issue {id}"),
            description: String::new(),
            status,
            priority: IssuePriority::Medium,
            assignee: "ra".into(),
            creation_date: Utc::now(),
            update_date: Utc::now(),
        }
    }

    #[test]
    fn columns_keep_fixed_order_regardless_of_input() {
        let issues = vec![
            issue(1, IssueStatus::Done),
            issue(2, IssueStatus::InProgress),
            issue(3, IssueStatus::ToDo),
            issue(4, IssueStatus::Done),
        ];
        let board = columns(&issues);
        let titles: Vec<_> = board.iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Done"]);
        let done: Vec<_> = board[2].issues.iter().map(|i| i.id.0).collect();
        assert_eq!(done, vec![1, 4]);
    }

    #[test]
    fn empty_column_when_no_issue_matches() {
        let issues = vec![issue(1, IssueStatus::Done)];
        assert!(issues_by_status(&issues, IssueStatus::ToDo).is_empty());
    }
}
