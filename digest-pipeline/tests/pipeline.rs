mod common;

use artifact_store::MemoryArtifactStore;
use chrono::{Duration, TimeZone, Utc};
use common::*;
use digest_core::ArtifactStore;
use digest_pipeline::{
    format_digest, DigestMode, PostCollector, SourceState, AGGREGATE_ARTIFACT, NO_POSTS_MESSAGE,
};
use llm_interface::USER_PROMPT;
use std::collections::HashSet;

#[tokio::test]
async fn test_equal_scores_are_stable_end_to_end() {
    let forum = FakeForum::default().with_items(
        "stocks",
        vec![
            recent_item("stocks", "post1", 5),
            recent_item("stocks", "post2", 20),
            recent_item("stocks", "post3", 20),
        ],
    );
    let orch = orchestrator(
        forum,
        FakeBackend::replying("1) $NVDA"),
        RecordingNotifier::default(),
        MemoryArtifactStore::new(),
    );

    let report = orch.run_source("stocks").await;
    assert_eq!(report.state, SourceState::Notified);

    let digest = orch.store().read("stocks.txt").await.unwrap();
    let order: Vec<usize> = ["post2", "post3", "post1"]
        .iter()
        .map(|id| digest.find(&format!("Title: title {id}\n")).unwrap())
        .collect();
    assert!(order[0] < order[1] && order[1] < order[2]);
    assert!(digest.starts_with("Today's Reddit r/stocks posts:\n\n~~~POST #1 START\nTitle: title post2"));
}

#[tokio::test]
async fn test_comment_cap_and_first_comment_dropped() {
    let forum = FakeForum::default()
        .with_items("wallstreetbets", vec![recent_item("wallstreetbets", "busy", 10)])
        .with_tree("busy", tree_with_comments(24));
    let collector = PostCollector::with_caps(forum, 8, 21);

    let posts = collector.collect("wallstreetbets").await.unwrap();
    assert_eq!(posts.len(), 1);

    let comments = &posts[0].comments;
    assert_eq!(comments.len(), 21);
    assert_eq!(comments[0], "comment 1 second line");
    assert_eq!(comments[20], "comment 21 second line");
    assert!(comments.iter().all(|body| !body.contains("rules")));
    assert!(comments.iter().all(|body| !body.contains('\n')));
}

#[tokio::test]
async fn test_fewer_eligible_comments_than_cap() {
    let forum = FakeForum::default()
        .with_items("stocks", vec![recent_item("stocks", "quiet", 1)])
        .with_tree("quiet", tree_with_comments(4));
    let posts = PostCollector::with_caps(forum, 8, 21)
        .collect("stocks")
        .await
        .unwrap();
    assert_eq!(posts[0].comments.len(), 4);
}

#[tokio::test]
async fn test_empty_source_still_summarized() {
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("Nothing notable."),
        RecordingNotifier::default(),
        MemoryArtifactStore::new(),
    );

    let report = orch.run_source("Economics").await;
    assert_eq!(report.state, SourceState::Notified);

    let artifacts = orch.store().snapshot().await;
    assert_eq!(artifacts["Economics.txt"], NO_POSTS_MESSAGE);
    assert_eq!(
        artifacts["Economics-summary.txt"],
        "📊 TODAY'S r/Economics SUMMARY\n\nNothing notable."
    );

    let prompts = orch.summarizer().backend().prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], format!("{}{}", USER_PROMPT, NO_POSTS_MESSAGE));
}

#[tokio::test]
async fn test_aggregation_reads_in_name_order() {
    let store = MemoryArtifactStore::with_artifacts([
        ("wallstreetbets-summary.txt", "  wsb summary\n"),
        ("stocks-summary.txt", "stocks summary"),
        ("stocks.txt", "raw digest"),
    ]);
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("1) $SPY"),
        RecordingNotifier::default(),
        store,
    );

    let aggregate = orch.aggregate().await.unwrap();
    assert_eq!(aggregate.sources_included, 2);
    assert_eq!(aggregate.summary, "📊 TODAY'S SUMMARY\n\n1) $SPY");
    assert!(aggregate.notified);

    let prompts = orch.summarizer().backend().prompts();
    assert_eq!(
        prompts[0],
        format!("{}stocks summary\n\nwsb summary", USER_PROMPT)
    );
    assert_eq!(
        orch.store().read(AGGREGATE_ARTIFACT).await.unwrap(),
        aggregate.summary
    );
    assert_eq!(orch.notifier().sent(), vec![aggregate.summary.clone()]);
}

#[tokio::test]
async fn test_aggregation_skips_empty_and_unreadable() {
    let store = PartlyUnreadableStore {
        inner: MemoryArtifactStore::with_artifacts([
            ("a-summary.txt", "alpha"),
            ("b-summary.txt", "   \n"),
            ("c-summary.txt", "corrupt"),
            ("d-summary.txt", "delta"),
        ]),
        unreadable: HashSet::from(["c-summary.txt".to_string()]),
    };
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("ok"),
        RecordingNotifier::default(),
        store,
    );

    let (combined, included) = orch.collect_summaries().await.unwrap();
    assert_eq!(combined, "alpha\n\ndelta");
    assert_eq!(included, 2);
}

#[tokio::test]
async fn test_time_window_boundary() {
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 16, 0, 0).unwrap();
    let cutoff = now - Duration::hours(24);
    let forum = FakeForum::default().with_items(
        "investing",
        vec![
            raw_item("investing", "fresh", 3, now - Duration::minutes(5)),
            raw_item("investing", "boundary", 2, cutoff),
            raw_item("investing", "stale", 9, cutoff - Duration::seconds(1)),
        ],
    );
    let collector = PostCollector::with_caps(forum, 8, 21);

    let posts = collector.collect_at("investing", now).await.unwrap();
    let titles: Vec<&str> = posts.iter().map(|post| post.title.as_str()).collect();
    assert_eq!(titles, vec!["title fresh", "title boundary"]);
    assert!(posts.iter().all(|post| post.created_at >= cutoff));
}

#[tokio::test]
async fn test_volume_cap_limits_request_and_result() {
    let items = (0..12)
        .map(|n| recent_item("stocks", &format!("p{n}"), n))
        .collect();
    let forum = FakeForum::default().with_items("stocks", items);
    let collector = PostCollector::with_caps(forum, 8, 21);

    let posts = collector.collect("stocks").await.unwrap();
    assert_eq!(posts.len(), 8);
    assert_eq!(
        *collector.forum().listed.lock().unwrap(),
        vec![("stocks".to_string(), 8)]
    );
}

#[tokio::test]
async fn test_body_excerpt_is_capped() {
    let mut item = recent_item("stocks", "essay", 1);
    item.body = "é".repeat(1200);
    let forum = FakeForum::default().with_items("stocks", vec![item]);

    let posts = PostCollector::with_caps(forum, 8, 21)
        .collect("stocks")
        .await
        .unwrap();
    assert_eq!(posts[0].body_excerpt.chars().count(), 1000);
}

#[tokio::test]
async fn test_comment_failure_keeps_post() {
    let forum = FakeForum::default()
        .with_items(
            "stocks",
            vec![recent_item("stocks", "flaky", 7), recent_item("stocks", "fine", 3)],
        )
        .with_tree("fine", tree_with_comments(2))
        .failing_tree("flaky");

    let posts = PostCollector::with_caps(forum, 8, 21)
        .collect("stocks")
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts[0].comments.is_empty());
    assert_eq!(posts[1].comments.len(), 2);
}

#[tokio::test]
async fn test_failed_source_does_not_stop_run() {
    let forum = FakeForum::default()
        .failing_source("wallstreetbets")
        .with_items("stocks", vec![recent_item("stocks", "s1", 4)]);
    let orch = orchestrator(
        forum,
        FakeBackend::replying("1) $AAPL"),
        RecordingNotifier::default(),
        MemoryArtifactStore::new(),
    );

    let report = orch.run(&sources(&["wallstreetbets", "stocks"]), false).await;

    let wsb = &report.sources[0];
    assert_eq!(wsb.state, SourceState::Failed);
    assert_eq!(wsb.summary, "");
    assert_eq!(wsb.failed_at, Some(SourceState::Pending));
    assert!(wsb.error.as_deref().unwrap_or_default().contains("503"));

    let stocks = &report.sources[1];
    assert_eq!(stocks.state, SourceState::Notified);
    assert_eq!(stocks.failed_at, None);
    assert_eq!(stocks.summary, "📊 TODAY'S r/stocks SUMMARY\n\n1) $AAPL");
    assert_eq!(report.failed_sources().count(), 1);

    let artifacts = orch.store().snapshot().await;
    assert!(!artifacts.contains_key("wallstreetbets.txt"));
    assert!(!artifacts.contains_key("wallstreetbets-summary.txt"));
    assert!(artifacts.contains_key(AGGREGATE_ARTIFACT));

    let aggregate = report.aggregate.expect("aggregate should run");
    assert_eq!(aggregate.sources_included, 1);
}

#[tokio::test]
async fn test_backend_failure_is_persisted_and_sent() {
    let forum = FakeForum::default().with_items("stocks", vec![recent_item("stocks", "s1", 4)]);
    let orch = orchestrator(
        forum,
        FakeBackend::failing(),
        RecordingNotifier::default(),
        MemoryArtifactStore::new(),
    );

    let report = orch.run_source("stocks").await;
    assert_eq!(report.state, SourceState::Notified);
    assert!(report.degraded);
    assert!(report
        .summary
        .starts_with("📊 TODAY'S r/stocks SUMMARY\n\nError generating summary: "));
    assert!(report.summary.contains("openai"));

    assert_eq!(
        orch.store().read("stocks-summary.txt").await.unwrap(),
        report.summary
    );
    assert_eq!(orch.notifier().sent(), vec![report.summary.clone()]);
}

#[tokio::test]
async fn test_notification_failure_is_tolerated() {
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("fine"),
        RecordingNotifier::failing(),
        MemoryArtifactStore::new(),
    );

    let report = orch.run(&sources(&["stocks"]), false).await;
    assert_eq!(report.sources[0].state, SourceState::Persisted);
    assert!(!report.sources[0].summary.is_empty());

    let aggregate = report.aggregate.unwrap();
    assert!(!aggregate.notified);
    assert!(orch.store().read(AGGREGATE_ARTIFACT).await.is_ok());
}

#[tokio::test]
async fn test_skip_aggregate() {
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("fine"),
        RecordingNotifier::default(),
        MemoryArtifactStore::new(),
    );

    let report = orch.run(&sources(&["stocks"]), true).await;
    assert!(report.aggregate.is_none());
    assert!(orch.store().read(AGGREGATE_ARTIFACT).await.is_err());
    assert_eq!(orch.notifier().sent().len(), 1);
}

#[tokio::test]
async fn test_stored_digest_is_resummarized() {
    let posts_text = format_digest("stocks", &[]);
    let store = MemoryArtifactStore::with_artifacts([("stocks.txt", posts_text.clone())]);
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("again"),
        RecordingNotifier::default(),
        store,
    )
    .with_mode(DigestMode::Stored);

    let report = orch.run(&sources(&["stocks", "investing"]), true).await;

    assert_eq!(report.sources[0].state, SourceState::Notified);
    assert_eq!(report.sources[1].state, SourceState::Failed);
    assert_eq!(report.sources[1].failed_at, Some(SourceState::Pending));
    assert!(orch.collector().forum().listed.lock().unwrap().is_empty());

    let prompts = orch.summarizer().backend().prompts();
    assert_eq!(prompts, vec![format!("{}{}", USER_PROMPT, posts_text)]);
    assert_eq!(
        orch.store().read("stocks-summary.txt").await.unwrap(),
        "📊 TODAY'S r/stocks SUMMARY\n\nagain"
    );
}

#[tokio::test]
async fn test_persist_failure_records_reached_state() {
    let orch = orchestrator(
        FakeForum::default(),
        FakeBackend::replying("fine"),
        RecordingNotifier::default(),
        FullDiskStore::default(),
    );

    let report = orch.run(&sources(&["stocks"]), false).await;

    let stocks = &report.sources[0];
    assert!(stocks.is_failed());
    assert_eq!(stocks.failed_at, Some(SourceState::Summarized));
    assert!(stocks
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("No space left on device"));
    assert!(report.aggregate.is_none());
    assert!(orch.notifier().sent().is_empty());
}
