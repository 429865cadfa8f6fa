use attune::error::CatalogError;
use attune::kernel::catalog::{RuleCatalog, BUILTIN_CATALOG};
use attune::ConversationCluster;
use serde_json::{json, Value};

// Helper: builtin catalog with one targeted edit applied before loading
fn load_mutated(edit: impl FnOnce(&mut Value)) -> Result<RuleCatalog, CatalogError> {
    let mut raw: Value = serde_json::from_str(BUILTIN_CATALOG).unwrap();
    edit(&mut raw);
    RuleCatalog::from_json(&raw.to_string())
}

#[test]
fn test_builtin_catalog_loads() {
    let catalog = RuleCatalog::builtin().expect("builtin catalog must validate");

    // Table is indexed by ordinal
    let order: Vec<ConversationCluster> = catalog.clusters().iter().map(|c| c.cluster).collect();
    assert_eq!(order, ConversationCluster::ALL.to_vec());

    for def in catalog.clusters() {
        assert!(!def.sub_states.is_empty(), "{} must declare sub-states", def.cluster);
        assert!(!def.opening_rule.is_empty(), "{} must carry an opening rule", def.cluster);
        for sub in &def.sub_states {
            assert!(!sub.examples.is_empty(), "{}.{} should ship an example", def.cluster, sub.id);
        }
    }

    assert!(!catalog.paralinguistic().is_empty());
    assert!(!catalog.sentence_forms().is_empty());
    assert!(!catalog.discourse_markers().is_empty());
}

#[test]
fn test_closure_has_empty_allow_list() {
    let catalog = RuleCatalog::builtin().unwrap();
    assert!(catalog.cluster(ConversationCluster::Closure).allowed_next.is_empty());

    // Every other cluster routes somewhere
    for def in catalog.clusters().iter().filter(|d| d.cluster != ConversationCluster::Closure) {
        assert!(!def.allowed_next.is_empty(), "{} should have follow-ups", def.cluster);
    }
}

#[test]
fn test_dangling_allow_list_reference_fails_at_load() {
    let result = load_mutated(|raw| {
        raw["clusters"][9]["allowed_next"] = json!(["engagement", "small_talk_forever"]);
    });

    match result {
        Err(CatalogError::DanglingReference { context, id }) => {
            assert_eq!(id, "small_talk_forever");
            assert!(context.contains("closure"), "context should name the cluster: {}", context);
        }
        other => panic!("Expected DanglingReference, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_dangling_boost_reference_fails_at_load() {
    let result = load_mutated(|raw| {
        raw["sentence_forms"][0]["boosts"][1]["cluster"] = json!("indecision");
    });
    assert!(matches!(result, Err(CatalogError::DanglingReference { ref id, .. }) if id == "indecision"));

    let result = load_mutated(|raw| {
        raw["paralinguistic"][0]["boost"]["cluster"] = json!("hello");
    });
    assert!(matches!(result, Err(CatalogError::DanglingReference { .. })));
}

#[test]
fn test_unknown_paralinguistic_sub_state_fails() {
    let result = load_mutated(|raw| {
        raw["paralinguistic"][0]["boost"]["sub_state"] = json!("waving");
    });
    assert!(matches!(
        result,
        Err(CatalogError::UnknownSubState { ref sub_state, .. }) if sub_state == "waving"
    ));
}

#[test]
fn test_missing_cluster_fails() {
    let result = load_mutated(|raw| {
        raw["clusters"].as_array_mut().unwrap().pop();
    });
    assert!(matches!(result, Err(CatalogError::MissingCluster(ref id)) if id == "closure"));
}

#[test]
fn test_duplicate_cluster_fails() {
    let result = load_mutated(|raw| {
        let first = raw["clusters"][0].clone();
        raw["clusters"].as_array_mut().unwrap().push(first);
    });
    assert!(matches!(result, Err(CatalogError::DuplicateCluster(ref id)) if id == "engagement"));
}

#[test]
fn test_unknown_cluster_definition_fails() {
    let result = load_mutated(|raw| {
        raw["clusters"][4]["id"] = json!("rumination");
    });
    assert!(matches!(result, Err(CatalogError::UnknownCluster(ref id)) if id == "rumination"));
}

#[test]
fn test_malformed_pattern_fails() {
    let result = load_mutated(|raw| {
        raw["discourse_markers"][0]["pattern"] = json!("(unclosed");
    });
    assert!(matches!(result, Err(CatalogError::InvalidPattern { .. })));

    let result = load_mutated(|raw| {
        raw["clusters"][2]["sub_states"][0]["patterns"][0] = json!("[z-a]");
    });
    assert!(matches!(result, Err(CatalogError::InvalidPattern { .. })));
}

#[test]
fn test_empty_sub_states_and_patterns_fail() {
    let result = load_mutated(|raw| {
        raw["clusters"][3]["sub_states"] = json!([]);
    });
    assert!(matches!(result, Err(CatalogError::EmptySubStates(ref id)) if id == "decision"));

    let result = load_mutated(|raw| {
        raw["clusters"][3]["sub_states"][0]["patterns"] = json!([]);
    });
    assert!(matches!(result, Err(CatalogError::EmptyPatterns(_))));
}

#[test]
fn test_negative_weight_fails() {
    let result = load_mutated(|raw| {
        raw["discourse_markers"][0]["boosts"][0]["weight"] = json!(-0.5);
    });
    assert!(matches!(result, Err(CatalogError::InvalidWeight { .. })));
}

#[test]
fn test_unknown_field_is_a_parse_error() {
    let result = load_mutated(|raw| {
        raw["clusters"][0]["colour"] = json!("teal");
    });
    assert!(matches!(result, Err(CatalogError::Parse(_))));

    assert!(matches!(RuleCatalog::from_json("not json"), Err(CatalogError::Parse(_))));
}

#[test]
fn test_catalog_from_path() {
    let path = std::env::temp_dir().join(format!("attune_catalog_{}.json", std::process::id()));
    std::fs::write(&path, BUILTIN_CATALOG).unwrap();

    let catalog = RuleCatalog::from_path(&path).expect("catalog file should load");
    assert_eq!(catalog.clusters().len(), 10);
    std::fs::remove_file(&path).unwrap();

    // Gone now
    assert!(matches!(RuleCatalog::from_path(&path), Err(CatalogError::Io(_))));
}
