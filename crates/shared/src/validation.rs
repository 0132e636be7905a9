//! Field rules for the create/edit issue form.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{IssuePriority, IssueStatus},
    error::{FieldError, FieldRule, IssueField, ValidationErrors},
};

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const ASSIGNEE_MIN_LEN: usize = 2;

/// Raw form values as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee: String,
}

impl Default for IssueDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: Some(IssueStatus::ToDo),
            priority: Some(IssuePriority::Medium),
            assignee: String::new(),
        }
    }
}

fn check_text(
    errors: &mut ValidationErrors,
    field: IssueField,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    let len = value.chars().count();
    let rule = if value.is_empty() {
        Some(FieldRule::Required)
    } else if len < min {
        Some(FieldRule::MinLength { required: min })
    } else {
        max.filter(|allowed| len > *allowed)
            .map(|allowed| FieldRule::MaxLength { allowed })
    };
    if let Some(rule) = rule {
        errors.push(FieldError { field, rule });
    }
}

/// A draft that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIssue {
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assignee: String,
}

pub fn validate(draft: &IssueDraft) -> Result<ValidatedIssue, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_text(
        &mut errors,
        IssueField::Title,
        &draft.title,
        TITLE_MIN_LEN,
        Some(TITLE_MAX_LEN),
    );
    check_text(
        &mut errors,
        IssueField::Description,
        &draft.description,
        DESCRIPTION_MIN_LEN,
        None,
    );
    if draft.status.is_none() {
        errors.push(FieldError {
            field: IssueField::Status,
            rule: FieldRule::Required,
        });
    }
    if draft.priority.is_none() {
        errors.push(FieldError {
            field: IssueField::Priority,
            rule: FieldRule::Required,
        });
    }
    check_text(
        &mut errors,
        IssueField::Assignee,
        &draft.assignee,
        ASSIGNEE_MIN_LEN,
        None,
    );

    match (draft.status, draft.priority) {
        (Some(status), Some(priority)) if errors.is_empty() => Ok(ValidatedIssue {
            title: draft.title.clone(),
            description: draft.description.clone(),
            status,
            priority,
            assignee: draft.assignee.clone(),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> IssueDraft {
        IssueDraft {
            title: "Broken export".into(),
            description: "CSV export drops the last row".into(),
            assignee: "li".into(),
            ..IssueDraft::default()
        }
    }

    #[test]
    fn accepts_valid_draft() {
        let valid = validate(&valid_draft()).expect("valid");
        assert_eq!(valid.status, IssueStatus::ToDo);
        assert_eq!(valid.priority, IssuePriority::Medium);
    }

    #[test]
    fn empty_form_reports_required_text_fields() {
        let errors = validate(&IssueDraft::default()).expect_err("invalid");
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![IssueField::Title, IssueField::Description, IssueField::Assignee]
        );
        assert!(errors.iter().all(|e| e.rule == FieldRule::Required));
    }

    #[test]
    fn enforces_length_bounds() {
        let mut draft = valid_draft();
        draft.title = "ab".into();
        draft.description = "too short".into();
        draft.assignee = "x".into();
        let errors = validate(&draft).expect_err("invalid");
        assert_eq!(
            errors.get(IssueField::Title).map(|e| e.rule),
            Some(FieldRule::MinLength { required: 3 })
        );
        assert_eq!(
            errors.get(IssueField::Description).map(|e| e.rule),
            Some(FieldRule::MinLength { required: 10 })
        );

        draft = valid_draft();
        draft.title = "x".repeat(101);
        let errors = validate(&draft).expect_err("too long");
        assert_eq!(
            errors.get(IssueField::Title).map(ToString::to_string),
            Some("Title must be no more than 100 characters".to_string())
        );
    }

    #[test]
    fn missing_selects_are_required() {
        let mut draft = valid_draft();
        draft.status = None;
        draft.priority = None;
        let errors = validate(&draft).expect_err("invalid");
        assert!(errors.get(IssueField::Status).is_some());
        assert!(errors.get(IssueField::Priority).is_some());
    }
}
