//! End-to-end bot lifecycle: scheduling, status reconciliation and transcript
//! collection against a mock provider.

use chrono::{DateTime, Duration, TimeZone, Utc};
use meetsync::bot::{
    BotLifecycleController, BotStatus, CreateOutcome, ManualClock, MeetingStatus, QuiescenceWindows,
    ReconciliationScheduler, TranscriptReadinessEvaluator,
};
use meetsync::config::{BotConfig, ProviderConfig};
use meetsync::db::{CalendarEventRecord, NewCalendarEvent, SqliteStore, Store, UserSettings};
use meetsync::provider::RecallProvider;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
}

struct World {
    server: MockServer,
    store: Arc<SqliteStore>,
    clock: Arc<ManualClock>,
    lifecycle: BotLifecycleController,
    scheduler: ReconciliationScheduler,
    event: CalendarEventRecord,
    user_id: i64,
}

async fn world() -> World {
    let server = MockServer::start().await;
    let provider = Arc::new(
        RecallProvider::new(&ProviderConfig {
            base_url: server.uri(),
            api_key: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap(),
    );
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(at(12, 0)));

    let user_id = store.upsert_user("ada@example.com").await.unwrap();
    store
        .save_settings(
            user_id,
            UserSettings {
                bot_join_minutes_before: 10,
                auto_record: false,
            },
        )
        .await
        .unwrap();
    let event = store
        .upsert_calendar_event(NewCalendarEvent {
            user_id,
            calendar_account: None,
            external_id: "evt-1".to_string(),
            title: "Planning".to_string(),
            start_time: at(15, 0),
            end_time: at(15, 30),
            meeting_url: Some("https://meet.google.com/abc-defg-hij".to_string()),
            platform: "google_meet".to_string(),
            recording_enabled: true,
            attendees: Vec::new(),
        })
        .await
        .unwrap();

    let lifecycle = BotLifecycleController::new(
        store.clone(),
        provider.clone(),
        clock.clone(),
        BotConfig::default(),
        "meeting_captions".to_string(),
    );
    let evaluator = TranscriptReadinessEvaluator::new(
        store.clone(),
        provider.clone(),
        clock.clone(),
        QuiescenceWindows::default(),
    );
    let scheduler = ReconciliationScheduler::new(
        store.clone(),
        provider,
        evaluator,
        std::time::Duration::from_secs(60),
    );

    World {
        server,
        store,
        clock,
        lifecycle,
        scheduler,
        event,
        user_id,
    }
}

async fn mount_bot(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/bot/bot-xyz/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn schedule(w: &World) -> i64 {
    Mock::given(method("POST"))
        .and(path("/bot/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "bot-xyz"})))
        .mount(&w.server)
        .await;

    match w.lifecycle.create_bot_for_event(&w.event, w.user_id).await.unwrap() {
        CreateOutcome::Created { bot, meeting } => {
            assert_eq!(bot.join_at, at(14, 50));
            assert_eq!(bot.status, BotStatus::Scheduled);
            assert_eq!(meeting.status, MeetingStatus::Scheduled);
            meeting.id
        }
        other => panic!("expected a new bot, got {:?}", other),
    }
}

#[tokio::test]
async fn bot_runs_from_schedule_to_transcript() {
    let w = world().await;
    let meeting_id = schedule(&w).await;

    // recording
    mount_bot(
        &w.server,
        json!({
            "id": "bot-xyz",
            "status_changes": [
                {"code": "ready", "created_at": "2024-06-01T14:50:00Z"},
                {"code": "joining_call", "created_at": "2024-06-01T14:51:00Z"},
                {"code": "in_call_recording", "created_at": "2024-06-01T15:00:00Z"}
            ]
        }),
    )
    .await;
    w.clock.set(at(15, 5));
    let report = w.scheduler.sweep().await;
    assert_eq!((report.polled, report.transitioned, report.errors), (1, 1, 0));
    let meeting = w.store.get_meeting(meeting_id).await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::InProgress);

    // call ended, transcript finished at 15:45
    w.server.reset().await;
    mount_bot(
        &w.server,
        json!({
            "id": "bot-xyz",
            "status_changes": [
                {"code": "in_call_recording", "created_at": "2024-06-01T15:00:00Z"},
                {"code": "done", "created_at": "2024-06-01T15:40:00Z"}
            ],
            "recordings": [{
                "id": "rec-1",
                "completed_at": "2024-06-01T15:40:00Z",
                "transcription_completed_at": "2024-06-01T15:45:00Z"
            }]
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bot/bot-xyz/transcript/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&w.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recording/rec-1/transcript/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"speaker": "Ada", "words": [{"text": "Hello"}]},
            {"speaker": "Bob", "words": [{"text": "world"}]}
        ])))
        .mount(&w.server)
        .await;

    w.clock.set(at(15, 46));
    let report = w.scheduler.sweep().await;
    assert_eq!(report.transitioned, 1);
    assert_eq!(report.not_ready, 1);
    assert_eq!(report.transcripts_stored, 0);
    let meeting = w.store.get_meeting(meeting_id).await.unwrap().unwrap();
    assert_eq!(meeting.status, MeetingStatus::Completed);
    assert!(meeting.transcript.is_none());

    w.clock.set(at(15, 48));
    let report = w.scheduler.sweep().await;
    assert_eq!(report.polled, 0);
    assert_eq!(report.transcripts_stored, 1);
    let meeting = w.store.get_meeting(meeting_id).await.unwrap().unwrap();
    assert_eq!(meeting.transcript.as_deref(), Some("Hello world"));

    // nothing left to do
    let report = w.scheduler.sweep().await;
    assert_eq!(report.transcripts_stored, 0);
    assert_eq!(report.not_ready, 0);
}

#[tokio::test]
async fn repeated_scheduling_calls_provider_once() {
    let w = world().await;
    schedule(&w).await;

    let again = w
        .lifecycle
        .create_bot_for_event(&w.event, w.user_id)
        .await
        .unwrap();
    assert!(matches!(again, CreateOutcome::AlreadyScheduled { .. }));

    let posts = w
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 1);
}

#[tokio::test]
async fn provider_rejection_fails_meeting() {
    let w = world().await;
    Mock::given(method("POST"))
        .and(path("/bot/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&w.server)
        .await;

    assert!(w
        .lifecycle
        .create_bot_for_event(&w.event, w.user_id)
        .await
        .is_err());

    let meeting = w
        .store
        .get_meeting_by_calendar_event_id(w.event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(meeting.status, MeetingStatus::Failed);
    assert!(meeting.transcript.unwrap().contains("upstream down"));

    let report = w.scheduler.sweep().await;
    assert_eq!(report.polled, 0);
}

#[tokio::test]
async fn disabled_transcription_leaves_meeting_untouched() {
    let w = world().await;
    let meeting_id = schedule(&w).await;
    mount_bot(
        &w.server,
        json!({
            "id": "bot-xyz",
            "status_changes": [{"code": "done", "created_at": "2024-06-01T15:40:00Z"}],
            "recordings": [{"id": "rec-1", "completed_at": "2024-06-01T15:40:00Z"}],
            "transcription_options": {"provider": "none"}
        }),
    )
    .await;

    w.clock.set(at(15, 40) + Duration::hours(1));
    let report = w.scheduler.sweep().await;
    assert_eq!(report.transitioned, 1);
    assert_eq!(report.transcripts_stored, 0);
    assert_eq!(report.errors, 0);

    let meeting = w.store.get_meeting(meeting_id).await.unwrap().unwrap();
    assert!(meeting.transcript.is_none());

    let transcript_requests = w
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().contains("transcript"))
        .count();
    assert_eq!(transcript_requests, 0);
}

#[tokio::test]
async fn join_time_in_past_skips_silently() {
    let w = world().await;
    w.clock.set(at(14, 55));

    let outcome = w
        .lifecycle
        .create_bot_for_event(&w.event, w.user_id)
        .await
        .unwrap();
    assert!(matches!(outcome, CreateOutcome::SkippedPastJoinTime { .. }));
    assert!(w.server.received_requests().await.unwrap().is_empty());
}
