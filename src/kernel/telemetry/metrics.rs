use std::collections::{BTreeMap, VecDeque};

use super::event::TelemetryEvent;
use crate::kernel::cluster::ConversationCluster;

#[derive(Debug, Clone, Default)]
pub struct TelemetrySnapshot {
    pub classification_stats: ClassificationStats,
    pub cluster_counts: BTreeMap<ConversationCluster, u64>,
    pub gate_stats: GateStats,
}

#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    pub classified: u64,
    pub fallbacks: u64,
    pub neutral: u64,
    pub collisions: u64,
    pub total_signals: u64,
    pub avg_confidence: f64,
    pub avg_signals: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GateStats {
    pub closures: u64,
}

impl TelemetrySnapshot {
    pub fn count(&self, cluster: ConversationCluster) -> u64 {
        self.cluster_counts.get(&cluster).copied().unwrap_or(0)
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    let mut confidence_sum = 0.0f64;

    for event in events {
        match event {
            TelemetryEvent::Classified {
                cluster,
                confidence,
                signal_count,
                used_fallback,
                ..
            } => {
                snap.classification_stats.classified += 1;
                snap.classification_stats.total_signals += *signal_count as u64;
                if *used_fallback {
                    snap.classification_stats.fallbacks += 1;
                }
                confidence_sum += f64::from(*confidence);
                *snap.cluster_counts.entry(*cluster).or_insert(0) += 1;
            }
            TelemetryEvent::CollisionResolved { .. } => snap.classification_stats.collisions += 1,
            TelemetryEvent::NeutralGuard => snap.classification_stats.neutral += 1,
            TelemetryEvent::ClosureGate { .. } => snap.gate_stats.closures += 1,
        }
    }

    // Compute Averages
    let classified = snap.classification_stats.classified;
    if classified > 0 {
        snap.classification_stats.avg_confidence = confidence_sum / classified as f64;
        snap.classification_stats.avg_signals = snap.classification_stats.total_signals as f64 / classified as f64;
    }

    snap
}
