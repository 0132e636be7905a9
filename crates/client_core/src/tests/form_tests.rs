use chrono::TimeZone;
use shared::domain::{IssuePriority, IssueStatus};

use super::*;
use crate::fake_repository::{sample_issue, Call, FakeRepository};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0)
        .single()
        .expect("timestamp")
}

fn fill(form: &mut IssueForm) {
    let draft = form.draft_mut();
    draft.title = "Search ignores accents".to_string();
    draft.description = "Searching for cafe does not find café".to_string();
    draft.priority = Some(IssuePriority::High);
    draft.assignee = "noor".to_string();
}

#[test]
fn route_decides_mode() {
    assert_eq!(IssueForm::for_route(Some("new")).mode(), FormMode::Create);
    assert_eq!(IssueForm::for_route(None).mode(), FormMode::Create);
    assert_eq!(IssueForm::for_route(Some("x1")).mode(), FormMode::Create);
    assert_eq!(
        IssueForm::for_route(Some("8")).mode(),
        FormMode::Edit(IssueId(8))
    );
}

#[test]
fn untouched_fields_show_no_errors() {
    let mut form = IssueForm::create();
    assert_eq!(form.error_message(IssueField::Title), None);
    form.touch(IssueField::Title);
    assert_eq!(
        form.error_message(IssueField::Title).as_deref(),
        Some("Title is required")
    );
    assert!(!form.is_field_invalid(IssueField::Description));
}

#[tokio::test]
async fn invalid_submit_marks_fields_and_sends_nothing() {
    let repository = FakeRepository::default();
    let mut form = IssueForm::create();
    form.draft_mut().title = "ab".to_string();

    let err = form.submit(&repository, now()).await.expect_err("invalid");
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(repository.calls().is_empty());
    assert_eq!(
        form.error_message(IssueField::Title).as_deref(),
        Some("Title must be at least 3 characters")
    );
    assert_eq!(
        form.error_message(IssueField::Assignee).as_deref(),
        Some("Assignee is required")
    );
    assert!(!form.is_field_invalid(IssueField::Status));
}

#[tokio::test]
async fn create_stamps_dates_and_navigates_to_new_issue() {
    let repository = FakeRepository::with_issues(vec![sample_issue(4)]);
    let mut form = IssueForm::create();
    fill(&mut form);

    let next = form.submit(&repository, now()).await.expect("created");
    assert_eq!(next, Navigation::IssueDetail(IssueId(5)));
    assert_eq!(next.path(), "/issues/5");

    let created = repository
        .stored()
        .into_iter()
        .find(|issue| issue.id == IssueId(5))
        .expect("stored");
    assert_eq!(created.status, IssueStatus::ToDo);
    assert_eq!(created.priority, IssuePriority::High);
    assert_eq!(created.creation_date, now());
    assert_eq!(created.update_date, now());
    assert!(!form.is_loading());
}

#[tokio::test]
async fn edit_loads_existing_values_and_patches() {
    let repository = FakeRepository::with_issues(vec![sample_issue(2)]);
    let mut form = IssueForm::for_route(Some("2"));
    form.load_for_edit(&repository).await;
    assert_eq!(form.draft().title, "Issue 2");
    assert_eq!(form.draft().status, Some(IssueStatus::ToDo));

    form.draft_mut().status = Some(IssueStatus::Done);
    let next = form.submit(&repository, now()).await.expect("updated");
    assert_eq!(next, Navigation::IssueDetail(IssueId(2)));

    let stored = &repository.stored()[0];
    assert_eq!(stored.status, IssueStatus::Done);
    assert_eq!(stored.update_date, now());
    assert_ne!(stored.creation_date, now());
    assert_eq!(
        repository.calls(),
        vec![Call::FetchById(IssueId(2)), Call::Update(IssueId(2))]
    );
}

#[tokio::test]
async fn load_for_missing_issue_reports_error() {
    let repository = FakeRepository::default();
    let mut form = IssueForm::edit(IssueId(9));
    form.load_for_edit(&repository).await;
    assert_eq!(form.error(), Some(LOAD_FOR_EDIT_ERROR));
    assert!(!form.is_loading());
}

#[tokio::test]
async fn backend_failure_on_save_surfaces_message() {
    let repository = FakeRepository::default();
    repository.set_failing(true);
    let mut form = IssueForm::create();
    fill(&mut form);

    form.submit(&repository, now()).await.expect_err("backend down");
    assert_eq!(form.error(), Some(CREATE_ERROR));
    assert!(!form.is_loading());
}

#[test]
fn cancel_returns_to_origin() {
    assert_eq!(IssueForm::create().cancel(), Navigation::Dashboard);
    assert_eq!(
        IssueForm::edit(IssueId(3)).cancel(),
        Navigation::IssueDetail(IssueId(3))
    );
    assert_eq!(Navigation::Dashboard.path(), "/issues/dashboard");
}

#[tokio::test]
async fn delete_goes_through_confirmation() {
    let repository = FakeRepository::with_issues(vec![sample_issue(6)]);
    let mut form = IssueForm::edit(IssueId(6));
    assert_eq!(
        form.request_delete().as_deref(),
        Some("Are you sure you want to delete \"this issue\"?")
    );
    form.cancel_delete();
    assert_eq!(form.confirm_delete(&repository).await.expect("noop"), None);
    assert!(repository.calls().is_empty());

    form.load_for_edit(&repository).await;
    assert_eq!(
        form.request_delete().as_deref(),
        Some("Are you sure you want to delete \"Issue 6\"?")
    );
    let next = form.confirm_delete(&repository).await.expect("deleted");
    assert_eq!(next, Some(Navigation::Dashboard));
    assert!(repository.stored().is_empty());
}

#[tokio::test]
async fn create_form_cannot_delete() {
    let repository = FakeRepository::default();
    let mut form = IssueForm::create();
    assert_eq!(form.request_delete(), None);
    assert_eq!(form.confirm_delete(&repository).await.expect("noop"), None);
}

#[tokio::test]
async fn failed_delete_reports_error() {
    let repository = FakeRepository::with_issues(vec![sample_issue(6)]);
    repository.set_failing(true);
    let mut form = IssueForm::edit(IssueId(6));
    form.request_delete();
    form.confirm_delete(&repository)
        .await
        .expect_err("backend down");
    assert_eq!(form.error(), Some(DELETE_ERROR));
}
