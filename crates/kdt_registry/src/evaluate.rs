//! The Evaluation API: `evaluate`, `evaluate_safely`,
//! `explain`, `evaluate_with_shadow`, plus the `FeatureResolver` wiring
//! deferred rule values recurse through, with cycle detection.

use std::cell::RefCell;

use kdt_core::config::{Configuration, FeatureValue};
use kdt_core::context::Context;
use kdt_core::diagnostics::EvaluationDiagnostics;
use kdt_core::errors::ParseError;
use kdt_core::rule::{FeatureResolver, RuleValue};

use crate::registry::Registry;

/// `explain`'s return value: the resolved value plus its full decision trace.
#[derive(Clone, Debug)]
pub struct EvaluationResult {
    pub value: FeatureValue,
    pub diagnostics: EvaluationDiagnostics,
}

/// Emitted by `evaluate_with_shadow` whenever the baseline and candidate
/// configurations disagree on a feature's resolved value.
#[derive(Clone, Debug)]
pub struct ShadowMismatch {
    pub feature_id: String,
    pub context_fingerprint: String,
    pub baseline: FeatureValue,
    pub candidate: FeatureValue,
}

/// Per-call resolution context: owns the in-progress feature-id stack a
/// chain of deferred rules recurses through. Constructed fresh for every
/// top-level `evaluate*` call — never stored on `Registry` itself — so
/// there is no shared or thread-local mutable state across calls: deferred
/// evaluation must not capture or require thread-local mutable state.
struct ResolverCtx<'a> {
    registry: &'a Registry,
    stack: RefCell<Vec<String>>,
}

impl<'a> FeatureResolver for ResolverCtx<'a> {
    fn resolve(&self, feature_id: &str, ctx: &Context) -> Result<FeatureValue, ParseError> {
        if self.stack.borrow().iter().any(|f| f == feature_id) {
            self.registry.observer.record_cycle_detected(feature_id);
            return Err(ParseError::CycleDetected(feature_id.to_string()));
        }
        self.stack.borrow_mut().push(feature_id.to_string());
        let result = self.registry.select_and_resolve(feature_id, ctx, self).map(|(v, _)| v);
        self.stack.borrow_mut().pop();
        result
    }
}

impl Registry {
    /// Run selection for one feature against the live snapshot (or a test
    /// override), resolving a deferred rule value through `resolver`.
    pub(crate) fn select_and_resolve(
        &self,
        feature_id: &str,
        ctx: &Context,
        resolver: &dyn FeatureResolver,
    ) -> Result<(FeatureValue, EvaluationDiagnostics), ParseError> {
        if let Some(value) = self.override_for(feature_id) {
            let mut diagnostics = EvaluationDiagnostics::new(feature_id);
            diagnostics.used_default = false;
            return Ok((value, diagnostics));
        }

        let snapshot = self.current();
        let def = snapshot
            .get(feature_id)
            .ok_or_else(|| ParseError::FeatureNotFound(feature_id.to_string()))?;

        let stable_id = ctx.stable_id.as_ref();
        let selection = kdt_algo::select(def, ctx, stable_id);
        let value = match selection.selected {
            kdt_algo::Selected::Default => def.default_value.clone(),
            kdt_algo::Selected::Rule { value, .. } => match value {
                RuleValue::Eager(v) => v.clone(),
                RuleValue::Deferred(f) => f.resolve(ctx, resolver),
            },
        };
        Ok((value, selection.diagnostics))
    }

    fn evaluate_entry(&self, feature_id: &str, ctx: &Context) -> Result<(FeatureValue, EvaluationDiagnostics), ParseError> {
        let resolver = ResolverCtx { registry: self, stack: RefCell::new(vec![feature_id.to_string()]) };
        self.select_and_resolve(feature_id, ctx, &resolver)
    }

    /// Total evaluation: falls back to `fallback` if `feature_id`
    /// isn't declared in the current snapshot at all. A declared feature
    /// with no matching rule already falls back to its own `defaultValue`
    /// inside `select` — `fallback` only covers the "feature never
    /// registered" case `evaluate_safely` surfaces as `FeatureNotFound`.
    pub fn evaluate(&self, feature_id: &str, ctx: &Context, fallback: FeatureValue) -> FeatureValue {
        match self.evaluate_entry(feature_id, ctx) {
            Ok((value, diagnostics)) => {
                self.observer.log_evaluation(feature_id, diagnostics.used_default);
                self.observer.record_evaluation(feature_id, diagnostics.used_default);
                value
            }
            Err(e) => {
                self.observer.log_parse_error(&e.to_string());
                fallback
            }
        }
    }

    /// Never raises: `Err` only for `FeatureNotFound`/`CycleDetected`.
    pub fn evaluate_safely(&self, feature_id: &str, ctx: &Context) -> Result<FeatureValue, ParseError> {
        self.evaluate_entry(feature_id, ctx).map(|(value, diagnostics)| {
            self.observer.log_evaluation(feature_id, diagnostics.used_default);
            self.observer.record_evaluation(feature_id, diagnostics.used_default);
            value
        })
    }

    /// Value plus a full decision trace (EXPLAIN mode).
    pub fn explain(&self, feature_id: &str, ctx: &Context) -> Result<EvaluationResult, ParseError> {
        self.evaluate_entry(feature_id, ctx).map(|(value, diagnostics)| EvaluationResult { value, diagnostics })
    }

    /// Evaluate `feature_id` against `baseline` and `candidate` side by
    /// side, reporting a mismatch if they disagree; the baseline value is
    /// always the one returned (SHADOW mode).
    pub fn evaluate_with_shadow(
        &self,
        feature_id: &str,
        baseline: &Configuration,
        candidate: &Configuration,
        ctx: &Context,
    ) -> (FeatureValue, Option<ShadowMismatch>) {
        let resolve_against = |cfg: &Configuration| -> Option<FeatureValue> {
            let def = cfg.get(feature_id)?;
            let selection = kdt_algo::select(def, ctx, ctx.stable_id.as_ref());
            Some(match selection.selected {
                kdt_algo::Selected::Default => def.default_value.clone(),
                kdt_algo::Selected::Rule { value, .. } => match value {
                    RuleValue::Eager(v) => v.clone(),
                    // Shadow comparisons never recurse into deferred rules —
                    // they compare two static snapshots, not a live registry.
                    RuleValue::Deferred(_) => def.default_value.clone(),
                },
            })
        };

        let baseline_value = resolve_against(baseline).unwrap_or_else(|| FeatureValue::Bool(false));
        let Some(candidate_value) = resolve_against(candidate) else {
            return (baseline_value, None);
        };

        if candidate_value == baseline_value {
            (baseline_value, None)
        } else {
            let mismatch = ShadowMismatch {
                feature_id: feature_id.to_string(),
                context_fingerprint: ctx.fingerprint(),
                baseline: baseline_value.clone(),
                candidate: candidate_value,
            };
            self.observer.log_parse_error(&format!("shadow mismatch on {feature_id}"));
            (baseline_value, Some(mismatch))
        }
    }
}

impl FeatureResolver for Registry {
    fn resolve(&self, feature_id: &str, ctx: &Context) -> Result<FeatureValue, ParseError> {
        self.evaluate_safely(feature_id, ctx)
    }
}
