mod common;

use common::*;
use pretty_assertions::assert_eq;
use wiper_core::{FailureCause, Outcome, RunState, SemanticTarget, SequenceState, StrategyKind};
use wiper_engine::{
    InteractionSequencer, MessageHandle, MessageLocator, MessageReport, Scope, SnapshotEvent,
    SnapshotPage, WIPE_PLACEHOLDER,
};

async fn only_candidate(page: &SnapshotPage) -> MessageHandle {
    let run = RunState::new(StrategyKind::Scan, 0, 0);
    let mut candidates = MessageLocator::new(resolver())
        .find_candidates(page, Scope::Document, &run)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    candidates.remove(0)
}

async fn run_sequence(page: &SnapshotPage) -> MessageReport {
    init_logging();
    let message = only_candidate(page).await;
    InteractionSequencer::new(resolver(), settle())
        .run(page, &message)
        .await
}

#[tokio::test]
async fn inline_edit_wipes_then_deletes() {
    let page = SnapshotPage::from_html(&channel(&[own_message(1)]));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.reached, SequenceState::Done);
    assert_eq!(report.cause, None);
    assert_eq!(page.clicks(), INLINE_SEQUENCE);

    let events = page.events();
    assert!(events.contains(&SnapshotEvent::ReplaceText {
        label: "editor".into(),
        text: WIPE_PLACEHOLDER.into(),
    }));
    assert!(events.contains(&SnapshotEvent::PressEnter {
        label: "editor".into()
    }));
    assert_eq!(page.count("#chat-messages-1").unwrap(), 0);
}

#[tokio::test]
async fn wipe_is_committed_before_delete_is_opened() {
    let page = SnapshotPage::from_html(&channel(&[own_message(1)]));
    run_sequence(&page).await;

    let events = page.events();
    let commit = events
        .iter()
        .position(|e| matches!(e, SnapshotEvent::PressEnter { .. }))
        .unwrap();
    let delete = events
        .iter()
        .position(|e| *e == SnapshotEvent::Click { label: "message-actions-delete".into() })
        .unwrap();
    assert!(commit < delete);
}

#[tokio::test]
async fn menu_path_is_used_without_inline_edit() {
    let page = SnapshotPage::from_html(&channel(&[menu_only_message(1)]));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(
        page.clicks(),
        vec![
            "More",
            "message-actions-edit",
            "More",
            "message-actions-delete",
            "confirm"
        ]
    );
}

#[tokio::test]
async fn missing_edit_affordance_never_reaches_delete() {
    let menu_without_edit = r#"<div role="menu">
        <div id="message-actions-delete" role="menuitem">Delete Message</div>
      </div>"#;
    let page = SnapshotPage::from_html(&channel_with(
        &[menu_only_message(1)],
        &[EDITOR, menu_without_edit, CONFIRM],
    ));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.reached, SequenceState::Failed);
    assert_eq!(report.failed_at, Some(SequenceState::Revealed));
    assert_eq!(
        report.cause,
        Some(FailureCause::ElementNotFound {
            target: SemanticTarget::EditMenuItem
        })
    );
    assert_eq!(page.clicks(), vec!["More"]);
    assert_eq!(page.count("#chat-messages-1").unwrap(), 1);
}

#[tokio::test]
async fn missing_more_actions_fails_before_any_click() {
    let message = r#"<li id="chat-messages-1">
        <div class="buttonContainer-c3"><div aria-label="Edit"></div></div>
      </li>"#;
    let page = SnapshotPage::from_html(&channel(&[message.to_string()]));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(
        report.cause,
        Some(FailureCause::ElementNotFound {
            target: SemanticTarget::MoreActions
        })
    );
    assert!(page.clicks().is_empty());
}

#[tokio::test]
async fn missing_confirmation_leaves_message_in_place() {
    let page = SnapshotPage::from_html(&channel_with(&[own_message(1)], &[EDITOR, MENU]));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.reached, SequenceState::Failed);
    assert_eq!(report.failed_at, Some(SequenceState::DeleteConfirmOpen));
    assert_eq!(
        report.cause,
        Some(FailureCause::ElementNotFound {
            target: SemanticTarget::ConfirmDelete
        })
    );
    assert_eq!(page.count("#chat-messages-1").unwrap(), 1);
}

#[tokio::test]
async fn missing_editor_still_deletes() {
    let page = SnapshotPage::from_html(&channel_with(&[own_message(1)], &[MENU, CONFIRM]));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.reached, SequenceState::Done);
    assert_eq!(report.failed_at, None);
    assert!(!page
        .events()
        .iter()
        .any(|e| matches!(e, SnapshotEvent::ReplaceText { .. })));
    assert_eq!(page.clicks(), INLINE_SEQUENCE);
}

#[tokio::test]
async fn recycled_message_becomes_a_failed_report() {
    let page = SnapshotPage::from_html(&channel(&[own_message_with(1, "data-fixture-broken")]));
    let report = run_sequence(&page).await;

    assert_eq!(report.outcome, Outcome::Failure);
    assert_eq!(report.reached, SequenceState::Failed);
    assert_eq!(report.failed_at, Some(SequenceState::Start));
    assert!(matches!(
        report.cause,
        Some(FailureCause::Interaction { .. })
    ));
    assert!(page.clicks().is_empty());
}
