use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The ten top-level conversation clusters.
/// Declaration order is the ordinal order; ties in scoring resolve to the lowest ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationCluster {
    /// Greetings, small talk, playful openers.
    Engagement,
    Exploration,
    Clarification,
    Decision,
    Reflection,
    /// Emotional self-disclosure. Outranks a bare greeting (see collision rules).
    Validation,
    Constraint,
    Frustration,
    /// Talk about the conversation or the assistant itself.
    MetaDialogue,
    /// Natural end of the conversation. Carries an empty allow-list.
    Closure,
}

pub const CLUSTER_COUNT: usize = 10;

impl ConversationCluster {
    pub const ALL: [ConversationCluster; CLUSTER_COUNT] = [
        ConversationCluster::Engagement,
        ConversationCluster::Exploration,
        ConversationCluster::Clarification,
        ConversationCluster::Decision,
        ConversationCluster::Reflection,
        ConversationCluster::Validation,
        ConversationCluster::Constraint,
        ConversationCluster::Frustration,
        ConversationCluster::MetaDialogue,
        ConversationCluster::Closure,
    ];

    /// Position in the fixed-size catalog table.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationCluster::Engagement => "engagement",
            ConversationCluster::Exploration => "exploration",
            ConversationCluster::Clarification => "clarification",
            ConversationCluster::Decision => "decision",
            ConversationCluster::Reflection => "reflection",
            ConversationCluster::Validation => "validation",
            ConversationCluster::Constraint => "constraint",
            ConversationCluster::Frustration => "frustration",
            ConversationCluster::MetaDialogue => "meta_dialogue",
            ConversationCluster::Closure => "closure",
        }
    }
}

impl fmt::Display for ConversationCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cluster id '{0}'")]
pub struct UnknownClusterId(pub String);

impl FromStr for ConversationCluster {
    type Err = UnknownClusterId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConversationCluster::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownClusterId(s.to_string()))
    }
}
