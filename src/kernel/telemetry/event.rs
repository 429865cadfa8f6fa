use serde::{Deserialize, Serialize};

use crate::kernel::cluster::ConversationCluster;
use crate::kernel::detector::DetectionResult;

// Allowed: catalog ids, counts, confidence, flags
// Forbidden: message text, matched substrings

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    Classified {
        cluster: ConversationCluster,
        sub_state: String,
        confidence: f32,
        signal_count: usize,
        used_fallback: bool,
    },

    CollisionResolved {
        rule: String,
    },

    /// An empty or absent message was answered with the neutral result.
    NeutralGuard,

    /// Closure short-circuited reply generation.
    ClosureGate {
        sub_state: Option<String>,
    },
}

impl TelemetryEvent {
    /// Content-free events describing one classification.
    pub fn from_result(result: &DetectionResult) -> Vec<TelemetryEvent> {
        let Some(cluster) = result.cluster else {
            return vec![TelemetryEvent::NeutralGuard];
        };

        let mut events: Vec<TelemetryEvent> = result
            .collisions
            .iter()
            .map(|rule| TelemetryEvent::CollisionResolved { rule: rule.clone() })
            .collect();

        events.push(TelemetryEvent::Classified {
            cluster,
            sub_state: result.sub_state.clone().unwrap_or_default(),
            confidence: result.confidence,
            signal_count: result.signals.len(),
            used_fallback: result.used_fallback,
        });
        events
    }
}
