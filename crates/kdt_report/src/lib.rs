//! kdt_report — offline rendering of evaluation diagnostics and configuration
//! diffs. Pure and I/O-free: callers (`kdt_cli`, or any other
//! embedder) supply already-computed view models; this crate only formats
//! them as JSON or HTML. No recomputation, no network, no filesystem access.

#![deny(unsafe_code)]

pub mod structure;

#[cfg(feature = "render_json")]
pub mod render_json;

#[cfg(feature = "render_html")]
pub mod render_html;

pub use structure::{DiagnosticsView, DiffView, FeatureValueView, RuleOutcomeView, ShadowView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    Serialize(String),
    Template(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Serialize(msg) => write!(f, "serialize error: {msg}"),
            ReportError::Template(msg) => write!(f, "template error: {msg}"),
        }
    }
}

impl std::error::Error for ReportError {}

pub mod prelude {
    pub use crate::structure::{DiagnosticsView, DiffView, FeatureValueView, RuleOutcomeView, ShadowView};
    pub use crate::ReportError;

    #[cfg(feature = "render_json")]
    pub use crate::render_json::{render_diagnostics_json, render_diff_json, render_shadow_batch_json, render_shadow_json};

    #[cfg(feature = "render_html")]
    pub use crate::render_html::{render_diagnostics_html, render_diff_html};
}
