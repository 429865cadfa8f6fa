//! Error types for attune.
//!
//! Classification itself never fails. Only loading a rule catalog and
//! reading configuration can, and both happen once at startup.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rule catalog integrity errors. Any of these means the catalog is unusable.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cluster '{0}' is not defined in the catalog")]
    MissingCluster(String),

    #[error("Cluster '{0}' is defined more than once")]
    DuplicateCluster(String),

    #[error("Cluster definition uses unknown id '{0}'")]
    UnknownCluster(String),

    #[error("Dangling cluster reference '{id}' in {context}")]
    DanglingReference { context: String, id: String },

    #[error("Sub-state '{sub_state}' does not exist in cluster '{cluster}' (referenced by {context})")]
    UnknownSubState {
        context: String,
        cluster: String,
        sub_state: String,
    },

    #[error("Cluster '{0}' declares no sub-states")]
    EmptySubStates(String),

    #[error("Rule '{0}' declares no patterns")]
    EmptyPatterns(String),

    #[error("Invalid weight {weight} in {context}")]
    InvalidWeight { context: String, weight: f32 },

    #[error("Invalid pattern in {context}: {source}")]
    InvalidPattern {
        context: String,
        #[source]
        source: regex::Error,
    },
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
