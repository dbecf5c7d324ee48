mod support;

use std::sync::Arc;
use std::time::Duration;

use bitbond::discovery::{IntentSink, IntentSubmitter, LoadOutcome, Point};
use bitbond::{
    AppContext, CandidateId, Config, Decision, DiscoveryEngine, DiscoveryError, FeedView,
    SessionGate, SubmissionStatus, Verdict,
};
use support::{candidates, profile, Calls, FakeBackend};
use tokio::sync::broadcast;

fn signed_in_engine(backend: Arc<FakeBackend>) -> (DiscoveryEngine, Arc<IntentSubmitter>) {
    let ctx = AppContext::new(Config::with_base_url("http://test"), backend);
    ctx.gate().sign_in(profile("me"));
    ctx.discovery_engine()
}

fn swipe(engine: &mut DiscoveryEngine, dx: f32) -> Option<Decision> {
    engine.pointer_down(Point::new(200.0, 300.0));
    engine.pointer_move(Point::new(200.0 + dx / 2.0, 305.0));
    engine.pointer_move(Point::new(200.0 + dx, 310.0));
    engine.pointer_up()
}

async fn settled(outcomes: &mut broadcast::Receiver<Decision>, n: usize) -> Vec<Decision> {
    let mut out = Vec::new();
    while out.len() < n {
        out.push(outcomes.recv().await.unwrap());
    }
    out
}

#[tokio::test]
async fn test_swipe_threshold_tap_and_failed_submission() {
    let backend = FakeBackend::new().shared();
    backend.script_feed(Some(candidates(&["A", "B", "C"])));
    backend.fail_intent_for("A");
    let (mut engine, submitter) = signed_in_engine(backend.clone());
    let mut outcomes = submitter.subscribe();

    assert_eq!(engine.fetch_initial().await.unwrap(), LoadOutcome::Loaded(3));

    // Past the threshold to the right: interested, A leaves the queue
    let decision = swipe(&mut engine, 150.0).unwrap();
    assert_eq!(decision.candidate_id.as_str(), "A");
    assert_eq!(decision.verdict, Verdict::Interested);
    assert_eq!(decision.status, SubmissionStatus::Pending);
    assert_eq!(engine.position(), 1);

    // Short drag snaps back: no decision, no movement
    assert!(swipe(&mut engine, 40.0).is_none());
    assert_eq!(engine.position(), 1);
    match engine.view() {
        FeedView::Card { candidate, pose, .. } => {
            assert_eq!(candidate.id().as_str(), "B");
            assert_eq!(pose.offset.dx, 0.0);
        }
        other => panic!("expected a card, got {:?}", other),
    }

    // Button path
    let decision = engine.tap(Verdict::Ignored).unwrap();
    assert_eq!(decision.candidate_id.as_str(), "B");
    assert_eq!(engine.position(), 2);

    let mut results = settled(&mut outcomes, 2).await;
    results.sort_by(|a, b| a.candidate_id.as_str().cmp(b.candidate_id.as_str()));
    assert_eq!(results[0].status, SubmissionStatus::Failed);
    assert_eq!(results[1].status, SubmissionStatus::Sent);
    assert_eq!(results[1].verdict, Verdict::Ignored);

    // A's failure does not rewind or re-queue anything
    assert_eq!(engine.position(), 2);
    assert_eq!(engine.current().unwrap().id().as_str(), "C");
    assert_eq!(backend.intent_count(), 2);
}

#[tokio::test]
async fn test_exactly_one_request_per_candidate() {
    let backend = FakeBackend::new().shared();
    backend.hold_intents();
    let submitter = IntentSubmitter::new(backend.clone());
    let mut outcomes = submitter.subscribe();
    let id = CandidateId::new("A");

    submitter.submit(&id, Verdict::Interested);
    let repeat = submitter.submit(&id, Verdict::Ignored);
    assert_eq!(repeat.verdict, Verdict::Interested);
    assert_eq!(repeat.status, SubmissionStatus::Pending);
    assert_eq!(submitter.pending(), 1);

    backend.release_intents();
    assert_eq!(settled(&mut outcomes, 1).await[0].status, SubmissionStatus::Sent);

    // Terminal status does not reopen the candidate either
    assert_eq!(submitter.submit(&id, Verdict::Interested).status, SubmissionStatus::Sent);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(backend.intent_count(), 1);
    assert_eq!(submitter.status(&id), Some(SubmissionStatus::Sent));
}

#[tokio::test]
async fn test_queue_advances_before_submission_resolves() {
    let backend = FakeBackend::new().shared();
    backend.script_feed(Some(candidates(&["A", "B"])));
    backend.hold_intents();
    let (mut engine, submitter) = signed_in_engine(backend.clone());
    engine.fetch_initial().await.unwrap();

    engine.tap(Verdict::Interested);
    assert_eq!(engine.current().unwrap().id().as_str(), "B");
    assert_eq!(
        submitter.status(&CandidateId::new("A")),
        Some(SubmissionStatus::Pending)
    );

    let mut outcomes = submitter.subscribe();
    backend.release_intents();
    settled(&mut outcomes, 1).await;
    assert_eq!(submitter.pending(), 0);
}

#[tokio::test]
async fn test_exhausted_until_refill() {
    let backend = FakeBackend::new().shared();
    backend.script_feed(Some(candidates(&["A"])));
    let (mut engine, _submitter) = signed_in_engine(backend.clone());
    engine.fetch_initial().await.unwrap();

    engine.tap(Verdict::Ignored);
    assert_eq!(engine.view(), FeedView::Exhausted);
    assert!(engine.tap(Verdict::Interested).is_none());
    assert!(swipe(&mut engine, 300.0).is_none());

    // A second initial fetch is a no-op; only refill fetches again
    assert_eq!(engine.fetch_initial().await.unwrap(), LoadOutcome::AlreadyLoaded);
    assert_eq!(Calls::get(&backend.calls.feed), 1);

    backend.script_feed(Some(candidates(&["A", "D", "D"])));
    assert_eq!(engine.refill().await.unwrap(), 1);
    assert_eq!(engine.position(), 0);
    assert_eq!(engine.current().unwrap().id().as_str(), "D");
}

#[tokio::test]
async fn test_failed_refill_keeps_queue() {
    let backend = FakeBackend::new().shared();
    backend.script_feed(Some(candidates(&["A", "B"])));
    backend.script_feed(None);
    let (mut engine, _submitter) = signed_in_engine(backend.clone());
    engine.fetch_initial().await.unwrap();
    engine.tap(Verdict::Ignored);

    assert!(matches!(engine.refill().await, Err(DiscoveryError::Fetch(_))));
    assert_eq!(engine.position(), 1);
    assert_eq!(engine.current().unwrap().id().as_str(), "B");
}

#[tokio::test]
async fn test_fetch_rejected_until_session_resolves() {
    let backend = FakeBackend::new().shared();
    let gate = SessionGate::new();
    let submitter = Arc::new(IntentSubmitter::new(backend.clone()));
    let mut engine = DiscoveryEngine::new(gate.clone(), backend.clone(), submitter, 100.0);

    assert!(matches!(
        engine.fetch_initial().await,
        Err(DiscoveryError::SessionUnresolved)
    ));
    assert_eq!(engine.view(), FeedView::CheckingSession);

    gate.sign_out();
    assert!(matches!(engine.fetch_initial().await, Err(DiscoveryError::SignedOut)));
    assert_eq!(engine.view(), FeedView::SignedOut);
    assert_eq!(Calls::get(&backend.calls.feed), 0);
}

#[tokio::test(start_paused = true)]
async fn test_when_ready_defers_initial_fetch() {
    let backend = FakeBackend::signed_in("me").shared();
    *backend.profile_delay.lock().unwrap() = Duration::from_millis(500);
    backend.script_feed(Some(candidates(&["A", "B"])));

    let gate = SessionGate::new();
    let submitter = Arc::new(IntentSubmitter::new(backend.clone()));
    let mut engine = DiscoveryEngine::new(gate.clone(), backend.clone(), submitter, 100.0);

    let (loaded, state) = tokio::join!(engine.when_ready(), gate.resolve(backend.as_ref()));
    assert!(state.is_authenticated());
    assert_eq!(loaded.unwrap(), LoadOutcome::Loaded(2));
    assert_eq!(Calls::get(&backend.calls.feed), 1);
    assert_eq!(Calls::get(&backend.calls.profile), 1);
}
