//! kdt_registry — the atomic snapshot registry and evaluation
//! orchestration: snapshot read, deferred-value resolution with
//! cycle detection, diagnostics assembly, and the FAST/EXPLAIN/SHADOW modes.
//! `kdt_algo::select` is the pure per-feature decision; this crate is what
//! turns a sequence of those decisions into the registry's public contract.

pub mod evaluate;
pub mod observability;
pub mod registry;

pub use evaluate::{EvaluationResult, ShadowMismatch};
pub use registry::{ConfigurationDiff, HistoryEntry, HistoryKind, Registry, RegistryConfig};

pub mod prelude {
    pub use crate::evaluate::{EvaluationResult, ShadowMismatch};
    pub use crate::registry::{ConfigurationDiff, HistoryEntry, HistoryKind, Registry, RegistryConfig};
}
