//! Pure view models rendered by [`crate::render_json`]/[`crate::render_html`].
//!
//! No recomputation happens here: every field is copied straight out of an
//! [`kdt_core::diagnostics::EvaluationDiagnostics`] or a caller-supplied diff/
//! shadow summary. This crate never talks to the registry directly — it
//! takes already-computed values rather than re-deriving them.

use kdt_core::diagnostics::EvaluationDiagnostics;

/// JSON-friendly rendering of a [`kdt_core::config::FeatureValue`].
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "render_json", serde(tag = "type", content = "value", rename_all = "lowercase"))]
pub enum FeatureValueView {
    Bool(bool),
    Str(String),
    Int(i64),
    Double(f64),
    Enum(String),
    Object(serde_json::Value),
}

impl From<&kdt_core::config::FeatureValue> for FeatureValueView {
    fn from(v: &kdt_core::config::FeatureValue) -> Self {
        use kdt_core::config::FeatureValue as FV;
        match v {
            FV::Bool(b) => FeatureValueView::Bool(*b),
            FV::Str(s) => FeatureValueView::Str(s.clone()),
            FV::Int(i) => FeatureValueView::Int(*i),
            FV::Double(d) => FeatureValueView::Double(*d),
            FV::Enum(s) => FeatureValueView::Enum(s.clone()),
            FV::Object(o) => FeatureValueView::Object(o.clone()),
        }
    }
}

/// One rule's matched/skipped outcome, as shown in an EXPLAIN trace.
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct RuleOutcomeView {
    pub rule_index: usize,
    pub targeting_matched: Option<bool>,
    pub allowlisted: bool,
    pub rampup_admitted: Option<bool>,
    pub selected: bool,
}

/// The full decision trace for one feature/context pair (EXPLAIN).
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct DiagnosticsView {
    pub feature_id: String,
    pub value: FeatureValueView,
    pub rule_outcomes: Vec<RuleOutcomeView>,
    pub selected_rule_index: Option<usize>,
    pub used_default: bool,
    pub bucket: Option<u32>,
    pub feature_disabled: bool,
    pub missing_stable_id: bool,
}

impl DiagnosticsView {
    /// Build a view from the resolved value and its diagnostics trace.
    /// Takes the pieces separately (rather than `kdt_registry::EvaluationResult`
    /// directly) so this crate never depends on the registry crate.
    pub fn new(value: &kdt_core::config::FeatureValue, diagnostics: &EvaluationDiagnostics) -> Self {
        DiagnosticsView {
            feature_id: diagnostics.feature_id.clone(),
            value: value.into(),
            rule_outcomes: diagnostics
                .rule_outcomes
                .iter()
                .map(|r| RuleOutcomeView {
                    rule_index: r.rule_index,
                    targeting_matched: r.targeting_matched,
                    allowlisted: r.allowlisted,
                    rampup_admitted: r.rampup_admitted,
                    selected: r.selected,
                })
                .collect(),
            selected_rule_index: diagnostics.selected_rule_index,
            used_default: diagnostics.used_default,
            bucket: diagnostics.bucket,
            feature_disabled: diagnostics.feature_disabled,
            missing_stable_id: diagnostics.missing_stable_id,
        }
    }
}

/// Feature ids added/removed/changed between two snapshots (Registry
/// API's `diff`). Plain `String` fields — not `kdt_registry::ConfigurationDiff`
/// itself — so this crate stays decoupled from the registry crate.
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, Default)]
pub struct DiffView {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl DiffView {
    pub fn new(added: Vec<String>, removed: Vec<String>, changed: Vec<String>) -> Self {
        DiffView { added, removed, changed }
    }
}

/// A SHADOW-mode disagreement between a baseline and a candidate configuration.
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug)]
pub struct ShadowView {
    pub feature_id: String,
    pub context_fingerprint: String,
    pub baseline: FeatureValueView,
    pub candidate: FeatureValueView,
}

impl ShadowView {
    pub fn new(
        feature_id: impl Into<String>,
        context_fingerprint: impl Into<String>,
        baseline: &kdt_core::config::FeatureValue,
        candidate: &kdt_core::config::FeatureValue,
    ) -> Self {
        ShadowView {
            feature_id: feature_id.into(),
            context_fingerprint: context_fingerprint.into(),
            baseline: baseline.into(),
            candidate: candidate.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdt_core::config::FeatureValue;

    #[test]
    fn diagnostics_view_copies_fields() {
        let mut diag = EvaluationDiagnostics::new("dark_mode");
        diag.used_default = true;
        diag.bucket = Some(42);
        let view = DiagnosticsView::new(&FeatureValue::Bool(true), &diag);
        assert_eq!(view.feature_id, "dark_mode");
        assert_eq!(view.value, FeatureValueView::Bool(true));
        assert!(view.used_default);
        assert_eq!(view.bucket, Some(42));
    }

    #[test]
    fn diff_view_holds_three_lists() {
        let view = DiffView::new(vec!["a".into()], vec!["b".into()], vec!["c".into()]);
        assert_eq!(view.added, vec!["a".to_string()]);
        assert_eq!(view.removed, vec!["b".to_string()]);
        assert_eq!(view.changed, vec!["c".to_string()]);
    }
}
