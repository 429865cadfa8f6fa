//! Classification Telemetry
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside classification logic (Extractors, Scorer, Gate).
//! It exists solely for observability and verification.
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain user content (message text or matched substrings).
//! Only catalog ids (clusters, sub-states, rules), counts and confidences are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
