//! Signal Extractors
//!
//! One extractor per rule family. Each rule in a family is evaluated
//! independently against the utterance and contributes at most one signal
//! (its first match). Output order is catalog order within the family.

use serde::{Deserialize, Serialize};

use crate::kernel::catalog::{ClusterBoost, HintRule, RuleCatalog};
use crate::kernel::cluster::ConversationCluster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Paralinguistic,
    SentenceForm,
    DiscourseMarker,
    ClusterPattern,
}

/// A single rule match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSignal {
    pub kind: SignalKind,
    /// Rule id. For cluster patterns this is the sub-state id.
    pub id: String,
    pub matched: String,
    /// Total score mass this signal contributes (sum of `boosts`).
    pub weight: f32,
    pub boosts: Vec<ClusterBoost>,
}

impl DetectionSignal {
    fn new(kind: SignalKind, id: &str, matched: &str, boosts: Vec<ClusterBoost>) -> Self {
        Self {
            kind,
            id: id.to_string(),
            matched: matched.to_string(),
            weight: boosts.iter().map(|b| b.weight).sum(),
            boosts,
        }
    }

    pub fn targets(&self, cluster: ConversationCluster) -> bool {
        self.boosts.iter().any(|b| b.cluster == cluster)
    }
}

pub fn extract_paralinguistic(catalog: &RuleCatalog, text: &str) -> Vec<DetectionSignal> {
    catalog
        .paralinguistic()
        .iter()
        .filter_map(|rule| {
            rule.regex
                .find(text)
                .map(|m| DetectionSignal::new(SignalKind::Paralinguistic, &rule.id, m.as_str(), vec![rule.boost]))
        })
        .collect()
}

pub fn extract_sentence_forms(catalog: &RuleCatalog, text: &str) -> Vec<DetectionSignal> {
    extract_hints(catalog.sentence_forms(), SignalKind::SentenceForm, text)
}

pub fn extract_discourse_markers(catalog: &RuleCatalog, text: &str) -> Vec<DetectionSignal> {
    extract_hints(catalog.discourse_markers(), SignalKind::DiscourseMarker, text)
}

/// Scans every sub-state of every cluster. A sub-state with several
/// patterns still yields one signal, weighted by its cluster's base weight.
pub fn extract_cluster_patterns(catalog: &RuleCatalog, text: &str) -> Vec<DetectionSignal> {
    let mut signals = Vec::new();
    for def in catalog.clusters() {
        for sub in &def.sub_states {
            if let Some(matched) = sub.first_match(text) {
                let boost = ClusterBoost {
                    cluster: def.cluster,
                    weight: def.weight,
                };
                signals.push(DetectionSignal::new(SignalKind::ClusterPattern, &sub.id, matched, vec![boost]));
            }
        }
    }
    signals
}

fn extract_hints(rules: &[HintRule], kind: SignalKind, text: &str) -> Vec<DetectionSignal> {
    rules
        .iter()
        .filter_map(|rule| {
            rule.regex
                .find(text)
                .map(|m| DetectionSignal::new(kind, &rule.id, m.as_str(), rule.boosts.clone()))
        })
        .collect()
}

/// Runs all four extractors in family order and concatenates the result.
pub fn extract_all(catalog: &RuleCatalog, text: &str) -> Vec<DetectionSignal> {
    let mut signals = extract_paralinguistic(catalog, text);
    signals.extend(extract_sentence_forms(catalog, text));
    signals.extend(extract_discourse_markers(catalog, text));
    signals.extend(extract_cluster_patterns(catalog, text));
    signals
}

/// Every matched rule per family, unscored. Debugging view only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub paralinguistic: Vec<DetectionSignal>,
    pub sentence_form: Vec<DetectionSignal>,
    pub discourse_markers: Vec<DetectionSignal>,
    pub cluster_patterns: Vec<DetectionSignal>,
}

impl SignalBreakdown {
    pub fn collect(catalog: &RuleCatalog, text: &str) -> Self {
        Self {
            paralinguistic: extract_paralinguistic(catalog, text),
            sentence_form: extract_sentence_forms(catalog, text),
            discourse_markers: extract_discourse_markers(catalog, text),
            cluster_patterns: extract_cluster_patterns(catalog, text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paralinguistic.is_empty()
            && self.sentence_form.is_empty()
            && self.discourse_markers.is_empty()
            && self.cluster_patterns.is_empty()
    }

    pub fn total(&self) -> usize {
        self.paralinguistic.len() + self.sentence_form.len() + self.discourse_markers.len() + self.cluster_patterns.len()
    }
}
