use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::kernel::catalog::RuleCatalog;
use crate::kernel::cluster::ConversationCluster;
use crate::kernel::event::ChatTurn;
use crate::kernel::scoring::{resolve_collisions, score_signals, select_winner};
use crate::kernel::signals::{extract_all, DetectionSignal, SignalBreakdown};

/// Used when a cluster has no catalog entry.
pub const FALLBACK_OPENING_RULE: &str = "start with a new lens or next step; do not restate prior emotional context";

static SHARED: OnceLock<StateDetector> = OnceLock::new();

/// Outcome of classifying one utterance. Owned by the caller; the detector keeps no record of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// `None` only for the neutral result.
    pub cluster: Option<ConversationCluster>,
    pub sub_state: Option<String>,
    /// Always within [0, 1].
    pub confidence: f32,
    pub signals: Vec<DetectionSignal>,
    pub opening_rule: String,
    pub allowed_next_clusters: Vec<ConversationCluster>,
    pub is_active: bool,
    /// True when no rule fired and the turn-count heuristic picked the cluster.
    pub used_fallback: bool,
    /// Ids of collision rules that adjusted the scores.
    pub collisions: Vec<String>,
}

impl DetectionResult {
    /// What callers get for an absent or empty message.
    pub fn neutral() -> Self {
        Self {
            cluster: None,
            sub_state: None,
            confidence: 0.0,
            signals: Vec::new(),
            opening_rule: String::new(),
            allowed_next_clusters: Vec::new(),
            is_active: false,
            used_fallback: false,
            collisions: Vec::new(),
        }
    }

    pub fn is_closure(&self) -> bool {
        self.cluster == Some(ConversationCluster::Closure)
    }
}

/// Opening rule and allowed follow-ups for a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub opening_rule: String,
    pub allowed_next: Vec<ConversationCluster>,
}

/// The classifier. Pure and synchronous; safe to share across threads.
#[derive(Debug, Clone)]
pub struct StateDetector {
    catalog: RuleCatalog,
}

impl StateDetector {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self { catalog }
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(RuleCatalog::builtin()?))
    }

    /// Process-wide detector over the builtin catalog, built on first use.
    pub fn shared() -> &'static StateDetector {
        SHARED.get_or_init(|| {
            debug!("Compiling builtin rule catalog (first use)");
            StateDetector::builtin().expect("builtin rule catalog must be valid")
        })
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Classify one utterance. `history` is only used for its length.
    pub fn detect(&self, message: &str, history: &[ChatTurn]) -> DetectionResult {
        if message.trim().is_empty() {
            return DetectionResult::neutral();
        }

        // 1. Extract
        let signals = extract_all(&self.catalog, message);

        // 2. Score + resolve
        let mut scores = score_signals(&signals);
        let collisions = resolve_collisions(&signals, &mut scores);

        // 3. Select
        let winner = select_winner(&scores, history.len());
        let sub_state = self.detect_sub_state(winner.cluster, message);
        let policy = self.resolve_policy(winner.cluster);

        debug!(
            cluster = %winner.cluster,
            sub_state = sub_state.as_deref().unwrap_or("-"),
            confidence = winner.confidence,
            signals = signals.len(),
            fallback = winner.used_fallback,
            "Utterance classified"
        );

        DetectionResult {
            cluster: Some(winner.cluster),
            sub_state,
            confidence: winner.confidence,
            signals,
            opening_rule: policy.opening_rule,
            allowed_next_clusters: policy.allowed_next,
            is_active: true,
            used_fallback: winner.used_fallback,
            collisions: collisions.into_iter().map(str::to_string).collect(),
        }
    }

    /// Same as `detect`, for callers that may not have a message at all.
    pub fn detect_opt(&self, message: Option<&str>, history: &[ChatTurn]) -> DetectionResult {
        match message {
            Some(text) => self.detect(text, history),
            None => DetectionResult::neutral(),
        }
    }

    /// Every matched rule per family, without scoring. No effect on `detect`.
    pub fn signal_breakdown(&self, message: &str) -> SignalBreakdown {
        if message.trim().is_empty() {
            return SignalBreakdown::default();
        }
        SignalBreakdown::collect(&self.catalog, message)
    }

    /// First sub-state of `cluster` whose pattern matches, else its first declared sub-state.
    pub fn detect_sub_state(&self, cluster: ConversationCluster, message: &str) -> Option<String> {
        let def = self.catalog.get(cluster)?;
        let sub = def
            .sub_states
            .iter()
            .find(|s| s.first_match(message).is_some())
            .unwrap_or_else(|| def.default_sub_state());
        Some(sub.id.clone())
    }

    pub fn resolve_policy(&self, cluster: ConversationCluster) -> Policy {
        match self.catalog.get(cluster) {
            Some(def) => Policy {
                opening_rule: def.opening_rule.clone(),
                allowed_next: def.allowed_next.clone(),
            },
            None => {
                warn!(%cluster, "No catalog entry for cluster, using fallback policy");
                Policy {
                    opening_rule: FALLBACK_OPENING_RULE.to_string(),
                    allowed_next: Vec::new(),
                }
            }
        }
    }
}
