pub mod config;
pub mod error;
pub mod kernel;

// Re-export specific items for convenient access
pub use kernel::cluster::ConversationCluster;
pub use kernel::detector::{DetectionResult, StateDetector};
pub use kernel::event::{ChatTurn, Role};
pub use kernel::signals::{DetectionSignal, SignalBreakdown, SignalKind};

use crate::config::AttuneConfig;
use crate::error::Error;
use crate::kernel::catalog::RuleCatalog;

/// Classify with the process-wide detector over the builtin catalog.
pub fn detect_state(message: &str, history: &[ChatTurn]) -> DetectionResult {
    StateDetector::shared().detect(message, history)
}

/// Diagnostic breakdown with the process-wide detector.
pub fn signal_breakdown(message: &str) -> SignalBreakdown {
    StateDetector::shared().signal_breakdown(message)
}

/// Build a detector for `config`: its catalog file when one is set, the builtin catalog otherwise.
pub fn load_detector(config: &AttuneConfig) -> Result<StateDetector, Error> {
    let catalog = match &config.catalog_path {
        Some(path) => RuleCatalog::from_path(path)?,
        None => RuleCatalog::builtin()?,
    };
    Ok(StateDetector::new(catalog))
}
