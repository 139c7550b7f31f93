//! JSON rendering of the view models in [`crate::structure`]. Field order is
//! deterministic (struct declaration order), as required by the
//! diagnostics contract.

use crate::structure::{DiagnosticsView, DiffView, ShadowView};
use crate::ReportError;

pub fn render_diagnostics_json(view: &DiagnosticsView) -> Result<String, ReportError> {
    serde_json::to_string(view).map_err(|e| ReportError::Serialize(e.to_string()))
}

pub fn render_diff_json(view: &DiffView) -> Result<String, ReportError> {
    serde_json::to_string(view).map_err(|e| ReportError::Serialize(e.to_string()))
}

pub fn render_shadow_json(view: &ShadowView) -> Result<String, ReportError> {
    serde_json::to_string(view).map_err(|e| ReportError::Serialize(e.to_string()))
}

pub fn render_shadow_batch_json(views: &[ShadowView]) -> Result<String, ReportError> {
    serde_json::to_string(views).map_err(|e| ReportError::Serialize(e.to_string()))
}
