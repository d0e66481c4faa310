mod common;

use std::sync::{Arc, Mutex};

use collector::models::{CollectOptions, RetryConfig, Stage};
use collector::pipeline::{CollectProgress, CollectionOrchestrator, run_collect};
use collector::services::PaginationDriver;
use collector::storage::{LocalRepository, Repository};
use common::{CHANNEL_ID, FakeThread, FakeVideo, MockTransport, sample_channel};
use tempfile::TempDir;

fn orchestrator(mock: &MockTransport) -> CollectionOrchestrator<&MockTransport> {
    CollectionOrchestrator::new(mock).with_pagination(PaginationDriver::new(RetryConfig::none()))
}

fn comment_ids(snapshot: &collector::models::ChannelSnapshot, video_id: &str) -> Vec<String> {
    snapshot
        .video(video_id)
        .map(|v| v.comments.iter().map(|c| c.comment_id.clone()).collect())
        .unwrap_or_default()
}

#[test]
fn three_single_stage_calls_match_one_full_call() {
    let staged_mock = MockTransport::new(sample_channel());
    let staged = orchestrator(&staged_mock);
    let s1 = staged.collect(CHANNEL_ID, &CollectOptions::channel_only(), None);
    let s2 = staged.collect(CHANNEL_ID, &CollectOptions::videos_only(), Some(s1));
    let s3 = staged.collect(CHANNEL_ID, &CollectOptions::comments_only(), Some(s2));

    let full_mock = MockTransport::new(sample_channel());
    let full = orchestrator(&full_mock).collect(CHANNEL_ID, &CollectOptions::all_stages(), None);

    assert!(s3.is_complete(), "{:?}", s3.errors);
    assert!(full.is_complete(), "{:?}", full.errors);
    assert_eq!(s3.videos, full.videos);
    assert_eq!(s3.name, "Fixture Channel");
    assert_eq!(s3.total_comments(), 10);
    assert!(s3.has_unique_videos());

    let delta = s3.delta.expect("delta against the previous call");
    assert_eq!(delta.comment_delta.new_comments, 10);
    assert_eq!(delta.comment_delta.videos_with_new_comments, 2);
}

#[test]
fn comments_are_flattened_thread_by_thread() {
    let mock = MockTransport::new(sample_channel());
    let snapshot = orchestrator(&mock).collect(CHANNEL_ID, &CollectOptions::all_stages(), None);

    assert_eq!(
        comment_ids(&snapshot, "vid-a"),
        vec!["a1", "a1.r1", "a1.r2", "a1.r3", "a2", "a3", "a3.r1"]
    );
    let a = snapshot.video("vid-a").unwrap();
    assert!(a.comments[1..4].iter().all(|c| c.parent_id.as_deref() == Some("a1")));
    assert_eq!(a.comment_count, 7);

    // a1 needs its replies paged, a3 and b1 come complete inline
    assert_eq!(mock.calls("comments"), 2);
    // vid-c has no comments and is skipped
    assert_eq!(mock.calls("commentThreads"), 3);
}

#[test]
fn later_call_reports_channel_video_and_comment_deltas() {
    let mut channel = sample_channel();
    channel.video_count = Some(250);
    let mock = MockTransport::new(channel);
    let orchestrator = orchestrator(&mock);

    let first = orchestrator.collect(CHANNEL_ID, &CollectOptions::all_stages(), None);
    assert!(first.delta.is_none());

    {
        let mut channel = mock.channel.borrow_mut();
        channel.subscribers = 12_000;
        channel.views = 5_500_000;
        channel.video_count = Some(255);
        channel.videos[1].views = 800;
        channel.videos[1].likes = 80;
        channel.videos[2].threads.push(FakeThread::new("c1", 0, 0));
        channel.videos.push(FakeVideo::new("vid-d", 5));
    }

    let second = orchestrator.collect(CHANNEL_ID, &CollectOptions::all_stages(), Some(first));
    let delta = second.delta.as_ref().expect("delta");

    assert_eq!(delta.channel_delta.subscriber_count, 2_000);
    assert_eq!(delta.channel_delta.view_count, 500_000);
    assert_eq!(delta.channel_delta.video_count, 5);

    let new_ids: Vec<_> = delta
        .video_delta
        .new_videos
        .iter()
        .map(|v| v.video_id.as_str())
        .collect();
    assert_eq!(new_ids, vec!["vid-d"]);

    let updated: Vec<_> = delta
        .video_delta
        .updated_videos
        .iter()
        .map(|u| (u.video_id.as_str(), u.views_delta, u.likes_delta, u.comment_count_delta))
        .collect();
    assert_eq!(updated, vec![("vid-b", 300, 30, 0), ("vid-c", 0, 0, 1)]);

    assert_eq!(delta.comment_delta.new_comments, 1);
    assert_eq!(delta.comment_delta.videos_with_new_comments, 1);
    assert_eq!(comment_ids(&second, "vid-c"), vec!["c1"]);
}

#[test]
fn repeated_identical_calls_change_nothing() {
    let mock = MockTransport::new(sample_channel());
    let orchestrator = orchestrator(&mock);
    let options = CollectOptions::all_stages();

    let first = orchestrator.collect(CHANNEL_ID, &options, None);
    let second = orchestrator.collect(CHANNEL_ID, &options, Some(first.clone()));

    assert_eq!(second.videos, first.videos);
    assert_eq!(second.subscriber_count, first.subscriber_count);
    assert!(!second.delta.unwrap().has_changes());
}

#[test]
fn progress_events_follow_the_stages() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let mock = MockTransport::new(sample_channel());
    let orchestrator = orchestrator(&mock).with_progress(Box::new(move |event| {
        sink.lock().unwrap().push(event.clone());
    }));
    orchestrator.collect(CHANNEL_ID, &CollectOptions::all_stages(), None);

    let events = events.lock().unwrap();
    let started: Vec<Stage> = events
        .iter()
        .filter_map(|e| match e {
            CollectProgress::StageStarted { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![Stage::Channel, Stage::Videos, Stage::Comments]);
    assert!(events.contains(&CollectProgress::VideosListed { count: 3 }));
}

#[test]
fn run_collect_persists_and_rotates_history() {
    let tmp = TempDir::new().unwrap();
    let repository = LocalRepository::new(tmp.path()).with_history(3);
    let mock = MockTransport::new(sample_channel());
    let orchestrator = orchestrator(&mock);
    let url = format!("https://www.youtube.com/channel/{CHANNEL_ID}");

    let first = run_collect(&orchestrator, &repository, &url, &CollectOptions::default()).unwrap();
    assert!(first.snapshot.delta.is_none());
    assert!(first.committed > 0);
    assert!(orchestrator.context().queue().is_empty());

    let stored = repository.get_by_id(CHANNEL_ID).unwrap().unwrap();
    assert_eq!(stored.videos.len(), 3);
    assert!(stored.delta.is_none());

    let options = CollectOptions::comments_only();
    let second = run_collect(&orchestrator, &repository, CHANNEL_ID, &options).unwrap();
    assert_eq!(second.snapshot.delta.unwrap().comment_delta.new_comments, 10);
    assert!(second.write.rotated);
    assert_eq!(repository.list_history(CHANNEL_ID).unwrap().len(), 1);
    assert_eq!(
        repository.get_by_id(CHANNEL_ID).unwrap().unwrap().total_comments(),
        10
    );
}

#[test]
fn run_collect_rejects_malformed_input_before_any_call() {
    let tmp = TempDir::new().unwrap();
    let repository = LocalRepository::new(tmp.path());
    let mock = MockTransport::new(sample_channel());

    let result = run_collect(
        &orchestrator(&mock),
        &repository,
        "https://example.com/not-a-channel",
        &CollectOptions::all_stages(),
    );

    assert!(result.is_err());
    assert_eq!(mock.total_calls(), 0);
}
