use serde::{Deserialize, Serialize};

use crate::kernel::cluster::ConversationCluster;
use crate::kernel::detector::DetectionResult;

/// What the reply stage should do with a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "directive", content = "data", rename_all = "snake_case")]
pub enum ReplyDirective {
    /// Closure gate: send this minimal acknowledgement. The language model is NOT invoked.
    Acknowledge(String),
    /// Generate a reply. `instruction` carries the opening rule verbatim.
    /// `allowed_next` is for logging only; nothing enforces it.
    Generate {
        instruction: String,
        allowed_next: Vec<ConversationCluster>,
    },
    /// Neutral classification: generate without a state-specific instruction.
    Unguided,
}

pub struct ReplyGate;

impl ReplyGate {
    pub fn new() -> Self {
        Self
    }

    /// Decide the reply directive for a classification.
    /// Strict Rule: closure never reaches the generator.
    pub fn decide(&self, result: &DetectionResult) -> ReplyDirective {
        match result.cluster {
            None => ReplyDirective::Unguided,
            Some(ConversationCluster::Closure) => {
                ReplyDirective::Acknowledge(acknowledgement(result.sub_state.as_deref()).to_string())
            }
            Some(_) => ReplyDirective::Generate {
                instruction: compose_instruction(result),
                allowed_next: result.allowed_next_clusters.clone(),
            },
        }
    }
}

impl Default for ReplyGate {
    fn default() -> Self {
        Self::new()
    }
}

fn acknowledgement(sub_state: Option<&str>) -> &'static str {
    match sub_state {
        Some("gratitude") => "You're welcome. I'm here whenever you want to pick this up again.",
        Some("farewell") => "Take care. Talk soon.",
        Some("completion") => "Glad that helped. Come back any time.",
        _ => "Take care.",
    }
}

/// Instruction block for the reply generator. The opening rule is embedded verbatim.
pub fn compose_instruction(result: &DetectionResult) -> String {
    let state = match (&result.cluster, &result.sub_state) {
        (Some(cluster), Some(sub)) => format!("{}/{}", cluster, sub),
        (Some(cluster), None) => cluster.to_string(),
        _ => "unknown".to_string(),
    };
    format!("Conversation state: {}\nOpening rule: {}", state, result.opening_rule)
}
