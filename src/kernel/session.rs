use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::detector::{DetectionResult, StateDetector};
use super::event::ChatTurn;
use super::gate::{ReplyDirective, ReplyGate};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::TelemetryRecorder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStep {
    /// History length the message was classified against.
    pub turn: usize,
    pub result: DetectionResult,
    pub directive: ReplyDirective,
}

/// Caller-side conversation owner. Holds the history the classifier does not keep.
pub struct ConversationSession {
    detector: Arc<StateDetector>,
    gate: ReplyGate,
    history: Vec<ChatTurn>,
    pub telemetry: TelemetryRecorder,
}

impl ConversationSession {
    pub fn new(detector: Arc<StateDetector>, telemetry_capacity: usize) -> Self {
        Self {
            detector,
            gate: ReplyGate::new(),
            history: Vec::new(),
            telemetry: TelemetryRecorder::with_capacity(telemetry_capacity),
        }
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Classify one user message, then record it.
    ///
    /// **ORDER**: the message is classified against the history as it was BEFORE
    /// this message. Empty messages get the neutral result and are not recorded.
    pub fn step(&mut self, message: &str) -> SessionStep {
        let turn = self.history.len();
        let result = self.detector.detect(message, &self.history);
        self.telemetry.record_detection(&result);

        let directive = self.gate.decide(&result);

        if result.is_active {
            self.history.push(ChatTurn::user(message));
        }

        if let ReplyDirective::Acknowledge(text) = &directive {
            // Closure: the acknowledgement IS the reply.
            self.telemetry.record(TelemetryEvent::ClosureGate {
                sub_state: result.sub_state.clone(),
            });
            self.history.push(ChatTurn::assistant(text));
            info!(turn, "Closure gate: acknowledged without generation");
        }

        SessionStep {
            turn,
            result,
            directive,
        }
    }

    /// Append a reply produced outside the session (e.g. by a generator).
    pub fn record_reply(&mut self, text: &str) {
        self.history.push(ChatTurn::assistant(text));
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
