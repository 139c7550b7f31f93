//! kdt_core — Core types, targeting model, and deterministic evaluation
//! primitives for the Konditional feature-flag engine.
//!
//! This crate is **I/O-free**: it defines the stable types and algorithms
//! shared across the workspace (`kdt_io`, `kdt_algo`, `kdt_registry`,
//! `kdt_report`, `kdt_cli`), but never touches a filesystem or network.
//!
//! - Identity & versioning: [`ids::StableId`], [`version::Version`]
//! - Rollout: [`rampup::RampUp`], [`bucketing`]
//! - Targeting: [`context::Context`], [`targeting::Targeting`]
//! - Rules & flags: [`rule::Rule`], [`flag::FlagDefinition`]
//! - Whole-namespace snapshot: [`config::Configuration`], [`config::ConfigurationPatch`]
//! - Errors: [`errors::CoreError`]
//! - Observability seams: [`observability`]
//!
//! Serialization derives are gated behind the `serde` feature; the SHA-256
//! bucketing function is gated behind `hash` (on by default).
//!
//! Unlike a purely numeric offline engine, Konditional's data model carries
//! caller-supplied JSON scalars at its core (axis values, typed feature
//! defaults) — so this crate links `std` and `serde_json` unconditionally
//! rather than staying `no_std`.

pub mod errors;
pub mod ids;
pub mod version;
pub mod rampup;
pub mod locale;
pub mod platform;
pub mod axis;
pub mod context;
pub mod targeting;
pub mod rule;
pub mod flag;
pub mod config;
pub mod diagnostics;
pub mod determinism;
pub mod observability;

#[cfg(feature = "hash")]
pub mod bucketing;

pub mod prelude {
    pub use crate::axis::AxisValue;
    pub use crate::config::{Configuration, ConfigurationPatch, FeatureValue};
    pub use crate::context::Context;
    pub use crate::diagnostics::{EvaluationDiagnostics, EvaluationMode, RuleOutcome};
    pub use crate::errors::CoreError;
    pub use crate::flag::FlagDefinition;
    pub use crate::ids::StableId;
    pub use crate::locale::AppLocale;
    pub use crate::platform::Platform;
    pub use crate::rampup::RampUp;
    pub use crate::rule::{DeferredFn, Rule, RuleValue};
    pub use crate::targeting::{ExtensionFn, Targeting};
    pub use crate::version::{Version, VersionRange};
}
