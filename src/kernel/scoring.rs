use std::collections::BTreeMap;

use tracing::debug;

use crate::kernel::cluster::ConversationCluster;
use crate::kernel::signals::{DetectionSignal, SignalKind};

/// Cumulative weight that maps to confidence 1.0.
pub const CONFIDENCE_CEILING: f32 = 3.0;

/// Confidence reported when no rule fired and the turn-count heuristic decided.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Per-cluster score map. Only clusters that received at least one boost are present.
/// Iteration is in cluster ordinal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterScores {
    scores: BTreeMap<ConversationCluster, f32>,
}

impl ClusterScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, cluster: ConversationCluster, weight: f32) {
        *self.scores.entry(cluster).or_insert(0.0) += weight;
    }

    pub fn get(&self, cluster: ConversationCluster) -> Option<f32> {
        self.scores.get(&cluster).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConversationCluster, f32)> + '_ {
        self.scores.iter().map(|(c, s)| (*c, *s))
    }
}

/// Pure accumulation: every boost of every signal lands on its cluster.
pub fn score_signals(signals: &[DetectionSignal]) -> ClusterScores {
    let mut scores = ClusterScores::new();
    for signal in signals {
        for boost in &signal.boosts {
            scores.add(boost.cluster, boost.weight);
        }
    }
    scores
}

// --- Collision resolution -------------------------------------------------

/// Explicit precedence correction between two competing cue families.
/// When a `trigger` signal and a `witness` signal co-occur, `favored` gains `increment`.
#[derive(Clone, Copy)]
pub struct CollisionRule {
    pub id: &'static str,
    pub trigger: fn(&DetectionSignal) -> bool,
    pub witness: fn(&DetectionSignal) -> bool,
    pub favored: ConversationCluster,
    pub increment: f32,
}

fn is_greeting(signal: &DetectionSignal) -> bool {
    signal.id == "greeting" && matches!(signal.kind, SignalKind::Paralinguistic | SignalKind::ClusterPattern)
}

fn is_validation_pattern(signal: &DetectionSignal) -> bool {
    signal.kind == SignalKind::ClusterPattern && signal.targets(ConversationCluster::Validation)
}

// "hey, I'm feeling kind of lost" is disclosure, not a greeting.
pub const COLLISION_RULES: &[CollisionRule] = &[CollisionRule {
    id: "greeting_vs_validation",
    trigger: is_greeting,
    witness: is_validation_pattern,
    favored: ConversationCluster::Validation,
    increment: 0.4,
}];

/// Applies every rule whose trigger and witness both fired. Only the score map
/// changes; signals stay untouched. Returns the ids of the rules applied.
pub fn resolve_collisions(signals: &[DetectionSignal], scores: &mut ClusterScores) -> Vec<&'static str> {
    let mut applied = Vec::new();
    for rule in COLLISION_RULES {
        let triggered = signals.iter().any(|s| (rule.trigger)(s));
        let witnessed = signals.iter().any(|s| (rule.witness)(s));
        if triggered && witnessed {
            scores.add(rule.favored, rule.increment);
            debug!(rule = rule.id, favored = %rule.favored, "Collision rule applied");
            applied.push(rule.id);
        }
    }
    applied
}

// --- Winner selection -----------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Winner {
    pub cluster: ConversationCluster,
    pub confidence: f32,
    pub used_fallback: bool,
}

/// Each history entry counts as one turn, so a 9-entry history is past the
/// clarification band. Halving the length would keep lengths 3 and 4 in engagement.
pub fn turn_count(history_len: usize) -> usize {
    history_len
}

pub fn fallback_cluster(turn_count: usize) -> ConversationCluster {
    match turn_count {
        0..=2 => ConversationCluster::Engagement,
        3..=5 => ConversationCluster::Clarification,
        _ => ConversationCluster::Decision,
    }
}

pub fn confidence_for(score: f32) -> f32 {
    (score / CONFIDENCE_CEILING).clamp(0.0, 1.0)
}

/// Highest score wins; equal scores go to the lowest cluster ordinal.
/// An empty map falls back to the turn-count heuristic.
pub fn select_winner(scores: &ClusterScores, history_len: usize) -> Winner {
    let mut best: Option<(ConversationCluster, f32)> = None;
    for (cluster, score) in scores.iter() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((cluster, score)),
        }
    }

    match best {
        Some((cluster, score)) => Winner {
            cluster,
            confidence: confidence_for(score),
            used_fallback: false,
        },
        None => {
            let turns = turn_count(history_len);
            let cluster = fallback_cluster(turns);
            debug!(turns, %cluster, "No signals fired, using turn-count fallback");
            Winner {
                cluster,
                confidence: FALLBACK_CONFIDENCE,
                used_fallback: true,
            }
        }
    }
}
