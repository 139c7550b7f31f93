//! Evaluation modes and the diagnostic trace `EXPLAIN`/`SHADOW` produce.

/// How `evaluate`/`evaluate_safely` should execute.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum EvaluationMode {
    /// Select-and-return only; no diagnostic trace is built.
    #[default]
    Fast,
    /// Build a full [`EvaluationDiagnostics`] trace alongside the result.
    Explain,
    /// Evaluate against both the current and a proposed `Configuration`,
    /// recording whether the outcome would change.
    Shadow,
}

/// Why a particular rule was or wasn't selected, used by `EXPLAIN` mode to
/// render a full evaluation trace without recomputation downstream.
#[derive(Clone, Debug)]
pub struct RuleOutcome {
    pub rule_index: usize,
    pub targeting_matched: Option<bool>,
    pub allowlisted: bool,
    pub rampup_admitted: Option<bool>,
    pub selected: bool,
}

/// The full trace of how a feature resolved for one context (the
/// observability contract).
#[derive(Clone, Debug)]
pub struct EvaluationDiagnostics {
    pub feature_id: String,
    pub rule_outcomes: Vec<RuleOutcome>,
    pub selected_rule_index: Option<usize>,
    pub used_default: bool,
    pub bucket: Option<u32>,
    /// Set when the feature's `isActive` was `false`, distinguishing a
    /// registry-disabled feature from an ordinary no-rule-matched fallthrough.
    pub feature_disabled: bool,
    /// Set when no `StableId` was supplied and a ramp-up gated rule could
    /// therefore not be bucketed, distinguishing that case from a rule that
    /// is simply 100% open.
    pub missing_stable_id: bool,
}

impl EvaluationDiagnostics {
    pub fn new(feature_id: impl Into<String>) -> Self {
        EvaluationDiagnostics {
            feature_id: feature_id.into(),
            rule_outcomes: Vec::new(),
            selected_rule_index: None,
            used_default: false,
            bucket: None,
            feature_disabled: false,
            missing_stable_id: false,
        }
    }
}
