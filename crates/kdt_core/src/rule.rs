//! `Rule<T>` and the `Eager`/`Deferred` value it yields when selected.

use crate::ids::StableId;
use crate::rampup::RampUp;
use crate::targeting::Targeting;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A value a deferred rule computes lazily. Implementors receive the
/// resolving context and a resolver capable of evaluating *other* features
/// in the same registry (`RuleValue` is `Eager(T) | Deferred(fn)`).
pub trait DeferredFn<T>: Send + Sync {
    fn resolve(&self, ctx: &crate::context::Context, resolver: &dyn FeatureResolver) -> T;
}

impl<T, F> DeferredFn<T> for F
where
    F: Fn(&crate::context::Context, &dyn FeatureResolver) -> T + Send + Sync,
{
    fn resolve(&self, ctx: &crate::context::Context, resolver: &dyn FeatureResolver) -> T {
        (self)(ctx, resolver)
    }
}

/// What a deferred rule's closure uses to recurse into other features.
/// Implemented by `kdt_registry::Registry`; kept here as a trait object seam
/// so `kdt_core` never depends on the registry crate.
pub trait FeatureResolver {
    /// Resolve another feature's value for the same context, tracking the
    /// in-progress call stack for cycle detection.
    fn resolve(
        &self,
        feature_id: &str,
        ctx: &crate::context::Context,
    ) -> Result<crate::config::FeatureValue, crate::errors::ParseError>;
}

/// The value a matched rule yields: immediately (`Eager`) or lazily by
/// invoking another feature's evaluation (`Deferred`).
#[derive(Clone)]
pub enum RuleValue<T> {
    Eager(T),
    Deferred(Arc<dyn DeferredFn<T>>),
}

impl<T: fmt::Debug> fmt::Debug for RuleValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleValue::Eager(v) => f.debug_tuple("Eager").field(v).finish(),
            RuleValue::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// One conditional override within a [`crate::flag::FlagDefinition`].
#[derive(Clone, Debug)]
pub struct Rule<T> {
    pub rampup: RampUp,
    pub note: Option<String>,
    pub targeting: Targeting,
    pub value: RuleValue<T>,
    pub allowlist: BTreeSet<StableId>,
}

impl<T> Rule<T> {
    pub fn new(targeting: Targeting, value: RuleValue<T>) -> Self {
        Rule { rampup: RampUp::FULL, note: None, targeting, value, allowlist: BTreeSet::new() }
    }

    pub fn with_rampup(mut self, rampup: RampUp) -> Self {
        self.rampup = rampup;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_allowlist(mut self, allowlist: BTreeSet<StableId>) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Rule-level allowlist bypass: an id on this rule's
    /// allowlist is admitted regardless of targeting match or ramp-up.
    pub fn allowlists(&self, id: &StableId) -> bool {
        self.allowlist.contains(id)
    }
}
