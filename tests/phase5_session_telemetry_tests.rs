use std::sync::Arc;

use attune::kernel::gate::ReplyDirective;
use attune::kernel::session::ConversationSession;
use attune::kernel::telemetry::event::TelemetryEvent;
use attune::kernel::telemetry::recorder::TelemetryRecorder;
use attune::{ConversationCluster, DetectionResult, Role, StateDetector};

fn session(capacity: usize) -> ConversationSession {
    ConversationSession::new(Arc::new(StateDetector::builtin().unwrap()), capacity)
}

#[test]
fn test_session_tracks_turn_progression() {
    let mut session = session(100);

    let first = session.step("hello there");
    assert_eq!(first.turn, 0);
    assert_eq!(first.result.cluster, Some(ConversationCluster::Engagement));
    session.record_reply("Hi! What's on your mind?");

    // No cues: turn-count fallback sees 2 prior turns
    let second = session.step("12345");
    assert_eq!(second.turn, 2);
    assert!(second.result.used_fallback);
    assert_eq!(second.result.cluster, Some(ConversationCluster::Engagement));

    let third = session.step("tell me more about my human design");
    assert_eq!(third.turn, 3);
    assert_eq!(third.result.cluster, Some(ConversationCluster::Exploration));
    assert_eq!(third.result.sub_state.as_deref(), Some("curiosity"));

    let fourth = session.step("12345");
    assert_eq!(fourth.turn, 4);
    assert_eq!(fourth.result.cluster, Some(ConversationCluster::Clarification));

    assert_eq!(session.history().len(), 5);
}

#[test]
fn test_closure_appends_acknowledgement() {
    let mut session = session(100);
    let step = session.step("thanks!");

    assert!(matches!(step.directive, ReplyDirective::Acknowledge(_)));
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "thanks!");
    assert_eq!(history[1].role, Role::Assistant);

    let snap = session.telemetry.snapshot();
    assert_eq!(snap.gate_stats.closures, 1);
    assert_eq!(snap.count(ConversationCluster::Closure), 1);
}

#[test]
fn test_empty_message_is_not_recorded() {
    let mut session = session(100);
    let step = session.step("  ");

    assert_eq!(step.result, DetectionResult::neutral());
    assert_eq!(step.directive, ReplyDirective::Unguided);
    assert!(session.history().is_empty());

    let events: Vec<&TelemetryEvent> = session.telemetry.events().collect();
    assert_eq!(events, vec![&TelemetryEvent::NeutralGuard]);
}

#[test]
fn test_reset_clears_history_only() {
    let mut session = session(100);
    session.step("hello there");
    session.step("are you an AI?");
    session.reset();

    assert!(session.history().is_empty());
    assert_eq!(session.telemetry.snapshot().classification_stats.classified, 2);
    assert_eq!(session.step("12345").turn, 0);
}

#[test]
fn test_snapshot_aggregates() {
    let mut session = session(100);
    session.step("hey, I'm feeling kind of lost");
    session.step("12345");
    session.step("");
    session.step("thanks!");

    let snap = session.telemetry.snapshot();
    let stats = &snap.classification_stats;
    assert_eq!(stats.classified, 3);
    assert_eq!(stats.fallbacks, 1);
    assert_eq!(stats.neutral, 1);
    assert_eq!(stats.collisions, 1);
    assert_eq!(snap.gate_stats.closures, 1);
    assert_eq!(snap.count(ConversationCluster::Validation), 1);
    assert_eq!(snap.count(ConversationCluster::Frustration), 0);
    assert!(stats.avg_confidence > 0.0 && stats.avg_confidence <= 1.0);
}

#[test]
fn test_telemetry_never_carries_message_text() {
    let mut session = session(100);
    let messages = [
        "hey, I'm feeling kind of lost",
        "my parents won't let me move out",
        "ugh, I'm so sick of this",
        "thanks!",
    ];
    for message in messages {
        session.step(message);
    }

    let dump = serde_json::to_string(&session.telemetry.events().collect::<Vec<_>>()).unwrap();
    for phrase in ["lost", "parents", "sick of", "thanks!", "hey"] {
        assert!(!dump.contains(phrase), "telemetry leaked '{}': {}", phrase, dump);
    }
}

#[test]
fn test_recorder_is_bounded() {
    let mut recorder = TelemetryRecorder::with_capacity(3);
    for _ in 0..5 {
        recorder.record(TelemetryEvent::NeutralGuard);
    }
    recorder.record(TelemetryEvent::ClosureGate { sub_state: None });

    assert_eq!(recorder.len(), 3);
    // Oldest evicted first
    assert_eq!(recorder.events().last(), Some(&TelemetryEvent::ClosureGate { sub_state: None }));

    recorder.clear();
    assert!(recorder.is_empty());

    // Zero is clamped to one slot
    let mut tiny = TelemetryRecorder::with_capacity(0);
    tiny.record(TelemetryEvent::NeutralGuard);
    tiny.record(TelemetryEvent::NeutralGuard);
    assert_eq!(tiny.len(), 1);
}

#[test]
fn test_events_from_result() {
    let result = StateDetector::shared().detect("hey, I'm feeling kind of lost", &[]);
    let events = TelemetryEvent::from_result(&result);

    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        TelemetryEvent::CollisionResolved {
            rule: "greeting_vs_validation".to_string()
        }
    );
    match &events[1] {
        TelemetryEvent::Classified {
            cluster,
            sub_state,
            signal_count,
            used_fallback,
            ..
        } => {
            assert_eq!(*cluster, ConversationCluster::Validation);
            assert_eq!(sub_state, "vulnerable");
            assert_eq!(*signal_count, 4);
            assert!(!used_fallback);
        }
        other => panic!("Expected Classified, got {:?}", other),
    }

    assert_eq!(
        TelemetryEvent::from_result(&DetectionResult::neutral()),
        vec![TelemetryEvent::NeutralGuard]
    );
}
