mod common;

use std::sync::mpsc;

use common::*;
use pretty_assertions::assert_eq;
use wiper_core::{RunParams, StopReason, StrategyKind};
use wiper_engine::{
    ChannelProgressSink, EngineEvent, MessageLocator, NullProgressSink, Page, PageError,
    RunController, ScanStrategy, Scope, SnapshotEvent, SnapshotPage,
};

fn scan_controller(limit: u32, max_attempts: u32) -> RunController {
    let strategy = ScanStrategy::new(MessageLocator::new(resolver()), None, settle());
    RunController::new(Box::new(strategy), resolver(), settle(), limit, max_attempts)
}

fn hovered(page: &SnapshotPage) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for event in page.events() {
        if let SnapshotEvent::Hover { label } = event {
            if labels.last() != Some(&label) {
                labels.push(label);
            }
        }
    }
    labels
}

#[tokio::test]
async fn limit_stops_before_touching_remaining_candidates() {
    init_logging();
    let messages: Vec<String> = (1..=5).map(own_message).collect();
    let page = SnapshotPage::from_html(&channel(&messages));

    let outcome = scan_controller(3, 0)
        .run(&page, &NullProgressSink)
        .await
        .unwrap();

    assert_eq!(outcome.summary.processed, 3);
    assert_eq!(outcome.summary.failed, 0);
    assert_eq!(outcome.summary.stop_reason, Some(StopReason::LimitReached));
    assert_eq!(
        hovered(&page),
        vec!["chat-messages-1", "chat-messages-2", "chat-messages-3"]
    );
    assert_eq!(page.count("#chat-messages-4").unwrap(), 1);
    assert_eq!(page.count("#chat-messages-5").unwrap(), 1);
}

#[tokio::test]
async fn failure_moves_on_to_the_next_candidate() {
    init_logging();
    let messages = vec![
        own_message(1),
        own_message_with(2, "data-fixture-broken"),
        own_message(3),
    ];
    let page = SnapshotPage::from_html(&channel(&messages));

    let outcome = scan_controller(2, 0)
        .run(&page, &NullProgressSink)
        .await
        .unwrap();

    assert_eq!(outcome.summary.processed, 2);
    assert_eq!(outcome.summary.failed, 1);
    let order: Vec<(&str, bool)> = outcome
        .reports
        .iter()
        .map(|r| (r.id.as_str(), r.succeeded()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("chat-messages-1", true),
            ("chat-messages-2", false),
            ("chat-messages-3", true)
        ]
    );
    assert!(!outcome.state.processed().contains(&"chat-messages-2".into()));
}

#[tokio::test]
async fn history_is_paginated_until_three_empty_batches() {
    init_logging();
    let messages = vec![
        own_message_with(1, r#"data-fixture-page="2""#),
        own_message_with(2, r#"data-fixture-page="1""#),
        own_message(3),
        own_message(4),
    ];
    let page = SnapshotPage::from_html(&channel(&messages));

    let outcome = scan_controller(0, 0)
        .run(&page, &NullProgressSink)
        .await
        .unwrap();

    assert_eq!(outcome.summary.processed, 4);
    assert_eq!(outcome.summary.stop_reason, Some(StopReason::Exhausted));
    assert_eq!(
        hovered(&page),
        vec![
            "chat-messages-3",
            "chat-messages-4",
            "chat-messages-2",
            "chat-messages-1"
        ]
    );
    assert_eq!(page.count("[id^=\"chat-messages-\"]").unwrap(), 0);
}

#[tokio::test]
async fn attempt_budget_lets_a_stuck_run_exhaust() {
    init_logging();
    let messages = vec![own_message_with(1, "data-fixture-broken"), own_message(2)];
    let page = SnapshotPage::from_html(&channel(&messages));

    let outcome = scan_controller(0, 2)
        .run(&page, &NullProgressSink)
        .await
        .unwrap();

    assert_eq!(outcome.summary.processed, 1);
    assert_eq!(outcome.summary.failed, 2);
    assert_eq!(outcome.summary.stop_reason, Some(StopReason::Exhausted));
}

#[tokio::test]
async fn unconfirmed_delete_is_retried_on_later_passes() {
    init_logging();
    let page = SnapshotPage::from_html(&channel_with(&[own_message(1)], &[EDITOR, MENU]));

    let outcome = scan_controller(0, 3)
        .run(&page, &NullProgressSink)
        .await
        .unwrap();

    assert_eq!(outcome.summary.processed, 0);
    assert_eq!(outcome.summary.failed, 3);
    assert!(outcome.state.processed().is_empty());
    assert_eq!(page.count("#chat-messages-1").unwrap(), 1);
}

#[tokio::test]
async fn search_requeries_before_every_result() {
    init_logging();
    let html = r#"<html><body>
        <div class="searchBar-f6"><div role="combobox" aria-label="Search"></div></div>
        <div class="searchResultsWrap-g7">
          <div class="searchResult-h8" id="search-result-1"
               data-fixture-reveal="r1" data-fixture-mirror="chat-messages-1">alice: one</div>
          <div class="searchResult-h8" id="search-result-2"
               data-fixture-reveal="r2" data-fixture-mirror="chat-messages-2">alice: two</div>
        </div>
        <ol class="scrollerInner-d4">
          <li id="chat-messages-1" class="backgroundFlash-i9" data-fixture-group="r1">
            <div class="buttonContainer-c3"><div aria-label="Edit"></div><div aria-label="More"></div></div>
          </li>
          <li id="chat-messages-2" class="backgroundFlash-i9" data-fixture-group="r2">
            <div class="buttonContainer-c3"><div aria-label="Edit"></div><div aria-label="More"></div></div>
          </li>
        </ol>
        <div id="editor" role="textbox" contenteditable="true"></div>
        <div role="menu">
          <div id="message-actions-edit" role="menuitem">Edit Message</div>
          <div id="message-actions-delete" role="menuitem">Delete Message</div>
        </div>
        <button id="confirm" type="submit" data-fixture-removes>Delete</button>
      </body></html>"#;
    let page = SnapshotPage::from_html(html);
    let params = RunParams {
        mode: StrategyKind::Search,
        server: Some("https://discord.com/channels/123".into()),
        author: Some("alice".into()),
        ..RunParams::default()
    };
    let controller = RunController::from_params(&params, resolver(), settle()).unwrap();
    assert_eq!(controller.strategy(), StrategyKind::Search);

    let outcome = controller.run(&page, &NullProgressSink).await.unwrap();

    assert_eq!(outcome.summary.processed, 2);
    assert_eq!(outcome.summary.stop_reason, Some(StopReason::Exhausted));

    let mut expected = vec!["Search", "search-result-1"];
    expected.extend(INLINE_SEQUENCE);
    expected.extend(["Search", "search-result-2"]);
    expected.extend(INLINE_SEQUENCE);
    expected.extend(["Search", "Search", "Search"]);
    assert_eq!(page.clicks(), expected);

    let queries: Vec<String> = page
        .events()
        .into_iter()
        .filter_map(|e| match e {
            SnapshotEvent::ReplaceText { label, text } if label == "Search" => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(queries, vec!["from: alice"; 5]);
    assert_eq!(
        page.events().first(),
        Some(&SnapshotEvent::Navigate {
            url: "https://discord.com/channels/123".into()
        })
    );
}

#[tokio::test]
async fn progress_events_end_with_the_summary() {
    init_logging();
    let page = SnapshotPage::from_html(&channel(&[own_message(1)]));
    let (tx, rx) = mpsc::channel();
    let sink = ChannelProgressSink::new(tx);

    let outcome = scan_controller(1, 0).run(&page, &sink).await.unwrap();
    let events: Vec<EngineEvent> = rx.try_iter().collect();

    assert_eq!(
        events.first(),
        Some(&EngineEvent::BatchScanned {
            pass: 1,
            candidates: 1
        })
    );
    assert!(matches!(events.get(1), Some(EngineEvent::MessageFinished(r)) if r.succeeded()));
    assert_eq!(events.last(), Some(&EngineEvent::RunFinished(outcome.summary)));
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn each_batch_releases_earlier_handles() {
    init_logging();
    let page = SnapshotPage::from_html(&channel(&[foreign_message(1), own_message(2)]));
    let stale = page
        .query_all(Scope::Document, "#chat-messages-1")
        .await
        .unwrap()[0];

    let outcome = scan_controller(1, 0).run(&page, &NullProgressSink).await.unwrap();

    assert_eq!(outcome.summary.processed, 1);
    assert_eq!(
        page.text_content(stale).await,
        Err(PageError::UnknownHandle(stale))
    );
}
