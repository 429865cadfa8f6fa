//! Rule Catalog
//!
//! The immutable table every classification reads from: paralinguistic
//! cues, sentence-form hints, discourse markers and per-cluster sub-state
//! patterns, plus the routing table (opening rule and allowed next clusters).
//!
//! # INTEGRITY INVARIANT
//! A `RuleCatalog` only exists if it passed validation. Every cluster is
//! defined exactly once, every referenced id resolves, every pattern
//! compiles. Nothing on the classification path re-checks any of this.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogError;
use crate::kernel::cluster::{ConversationCluster, CLUSTER_COUNT};

/// The catalog shipped with the crate.
pub const BUILTIN_CATALOG: &str = include_str!("builtin.json");

// --- Raw (on-disk) form ---------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCatalog {
    pub paralinguistic: Vec<RawParalinguisticRule>,
    pub sentence_forms: Vec<RawHintRule>,
    pub discourse_markers: Vec<RawHintRule>,
    pub clusters: Vec<RawClusterDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParalinguisticRule {
    pub id: String,
    pub pattern: String,
    pub boost: RawStateBoost,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStateBoost {
    pub cluster: String,
    pub sub_state: String,
    pub weight: f32,
}

/// Shared shape of sentence-form hints and discourse markers.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawHintRule {
    pub id: String,
    pub pattern: String,
    pub boosts: Vec<RawBoost>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBoost {
    pub cluster: String,
    pub weight: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawClusterDef {
    pub id: String,
    pub weight: f32,
    pub description: String,
    pub sub_states: Vec<RawSubState>,
    pub opening_rule: String,
    pub allowed_next: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSubState {
    pub id: String,
    #[serde(default)]
    pub examples: Vec<String>,
    pub patterns: Vec<String>,
}

// --- Compiled form --------------------------------------------------------

/// Score contribution directed at one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterBoost {
    pub cluster: ConversationCluster,
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct ParalinguisticRule {
    pub id: String,
    pub regex: Regex,
    pub boost: ClusterBoost,
    /// Sub-state the cue is associated with. Informational: validated at load,
    /// but sub-state selection only looks at the winner's own sub-state patterns.
    pub sub_state: String,
}

#[derive(Debug, Clone)]
pub struct HintRule {
    pub id: String,
    pub regex: Regex,
    pub boosts: Vec<ClusterBoost>,
}

#[derive(Debug, Clone)]
pub struct SubStateRule {
    pub id: String,
    pub examples: Vec<String>,
    pub patterns: Vec<Regex>,
}

impl SubStateRule {
    /// First matching pattern's matched text, if any.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns
            .iter()
            .find_map(|p| p.find(text))
            .map(|m| m.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClusterDef {
    pub cluster: ConversationCluster,
    pub weight: f32,
    pub description: String,
    /// Never empty.
    pub sub_states: Vec<SubStateRule>,
    pub opening_rule: String,
    pub allowed_next: Vec<ConversationCluster>,
}

impl ClusterDef {
    pub fn sub_state(&self, id: &str) -> Option<&SubStateRule> {
        self.sub_states.iter().find(|s| s.id == id)
    }

    pub fn default_sub_state(&self) -> &SubStateRule {
        // Validation guarantees at least one sub-state.
        &self.sub_states[0]
    }
}

#[derive(Debug, Clone)]
pub struct RuleCatalog {
    paralinguistic: Vec<ParalinguisticRule>,
    sentence_forms: Vec<HintRule>,
    discourse_markers: Vec<HintRule>,
    clusters: [ClusterDef; CLUSTER_COUNT],
}

impl RuleCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse, validate and compile in one pass.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(text)?;
        Self::compile(raw)
    }

    pub fn compile(raw: RawCatalog) -> Result<Self, CatalogError> {
        // 1. Clusters first: everything else references them.
        let mut slots: Vec<Option<ClusterDef>> = (0..CLUSTER_COUNT).map(|_| None).collect();
        for def in raw.clusters {
            let cluster: ConversationCluster = def
                .id
                .parse()
                .map_err(|_| CatalogError::UnknownCluster(def.id.clone()))?;
            if slots[cluster.index()].is_some() {
                return Err(CatalogError::DuplicateCluster(def.id));
            }
            slots[cluster.index()] = Some(compile_cluster(cluster, def)?);
        }

        let mut ordered = Vec::with_capacity(CLUSTER_COUNT);
        for (cluster, slot) in ConversationCluster::ALL.iter().zip(slots) {
            let def = slot.ok_or_else(|| CatalogError::MissingCluster(cluster.as_str().to_string()))?;
            ordered.push(def);
        }
        let clusters: [ClusterDef; CLUSTER_COUNT] = ordered
            .try_into()
            .map_err(|_| CatalogError::MissingCluster("<incomplete cluster table>".to_string()))?;

        // 2. Paralinguistic cues target a concrete sub-state.
        let mut paralinguistic = Vec::with_capacity(raw.paralinguistic.len());
        for rule in raw.paralinguistic {
            let context = format!("paralinguistic.{}", rule.id);
            let cluster = resolve_cluster(&rule.boost.cluster, &context)?;
            if clusters[cluster.index()].sub_state(&rule.boost.sub_state).is_none() {
                return Err(CatalogError::UnknownSubState {
                    context,
                    cluster: rule.boost.cluster,
                    sub_state: rule.boost.sub_state,
                });
            }
            check_weight(rule.boost.weight, &context)?;
            paralinguistic.push(ParalinguisticRule {
                regex: compile_pattern(&rule.pattern, &context)?,
                boost: ClusterBoost {
                    cluster,
                    weight: rule.boost.weight,
                },
                sub_state: rule.boost.sub_state,
                id: rule.id,
            });
        }

        // 3. Fan-out families.
        let sentence_forms = compile_hints(raw.sentence_forms, "sentence_forms")?;
        let discourse_markers = compile_hints(raw.discourse_markers, "discourse_markers")?;

        let catalog = Self {
            paralinguistic,
            sentence_forms,
            discourse_markers,
            clusters,
        };

        info!(
            paralinguistic = catalog.paralinguistic.len(),
            sentence_forms = catalog.sentence_forms.len(),
            discourse_markers = catalog.discourse_markers.len(),
            sub_states = catalog.clusters.iter().map(|c| c.sub_states.len()).sum::<usize>(),
            "Rule catalog loaded"
        );

        Ok(catalog)
    }

    pub fn paralinguistic(&self) -> &[ParalinguisticRule] {
        &self.paralinguistic
    }

    pub fn sentence_forms(&self) -> &[HintRule] {
        &self.sentence_forms
    }

    pub fn discourse_markers(&self) -> &[HintRule] {
        &self.discourse_markers
    }

    /// All cluster definitions in ordinal order.
    pub fn clusters(&self) -> &[ClusterDef] {
        &self.clusters
    }

    pub fn cluster(&self, cluster: ConversationCluster) -> &ClusterDef {
        &self.clusters[cluster.index()]
    }

    pub fn get(&self, cluster: ConversationCluster) -> Option<&ClusterDef> {
        self.clusters.get(cluster.index())
    }
}

fn compile_cluster(cluster: ConversationCluster, def: RawClusterDef) -> Result<ClusterDef, CatalogError> {
    let context = format!("clusters.{}", def.id);
    check_weight(def.weight, &context)?;

    if def.sub_states.is_empty() {
        return Err(CatalogError::EmptySubStates(def.id));
    }

    let mut sub_states = Vec::with_capacity(def.sub_states.len());
    for sub in def.sub_states {
        let sub_context = format!("{}.{}", context, sub.id);
        if sub.patterns.is_empty() {
            return Err(CatalogError::EmptyPatterns(sub_context));
        }
        let patterns = sub
            .patterns
            .iter()
            .map(|p| compile_pattern(p, &sub_context))
            .collect::<Result<Vec<_>, _>>()?;
        sub_states.push(SubStateRule {
            id: sub.id,
            examples: sub.examples,
            patterns,
        });
    }

    let allowed_context = format!("{}.allowed_next", context);
    let allowed_next = def
        .allowed_next
        .iter()
        .map(|id| resolve_cluster(id, &allowed_context))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClusterDef {
        cluster,
        weight: def.weight,
        description: def.description,
        sub_states,
        opening_rule: def.opening_rule,
        allowed_next,
    })
}

fn compile_hints(rules: Vec<RawHintRule>, family: &str) -> Result<Vec<HintRule>, CatalogError> {
    let mut compiled = Vec::with_capacity(rules.len());
    for rule in rules {
        let context = format!("{}.{}", family, rule.id);
        let mut boosts = Vec::with_capacity(rule.boosts.len());
        for boost in &rule.boosts {
            check_weight(boost.weight, &context)?;
            boosts.push(ClusterBoost {
                cluster: resolve_cluster(&boost.cluster, &context)?,
                weight: boost.weight,
            });
        }
        compiled.push(HintRule {
            regex: compile_pattern(&rule.pattern, &context)?,
            boosts,
            id: rule.id,
        });
    }
    Ok(compiled)
}

fn resolve_cluster(id: &str, context: &str) -> Result<ConversationCluster, CatalogError> {
    id.parse().map_err(|_| CatalogError::DanglingReference {
        context: context.to_string(),
        id: id.to_string(),
    })
}

fn check_weight(weight: f32, context: &str) -> Result<(), CatalogError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidWeight {
            context: context.to_string(),
            weight,
        })
    }
}

fn compile_pattern(pattern: &str, context: &str) -> Result<Regex, CatalogError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| CatalogError::InvalidPattern {
            context: context.to_string(),
            source,
        })
}
