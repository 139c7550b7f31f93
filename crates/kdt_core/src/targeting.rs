//! `Targeting` — the predicate a [`crate::rule::Rule`] matches a [`crate::context::Context`] against.

use crate::context::Context;
use crate::locale::AppLocale;
use crate::platform::Platform;
use crate::version::VersionRange;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A caller-supplied matcher for targeting conditions the built-in variants
/// don't cover. Returns `None` when the context doesn't declare whatever the
/// predicate needs — same "missing capability never errors" contract as the
/// built-in variants.
#[derive(Clone)]
pub struct ExtensionFn(Arc<dyn Fn(&Context) -> Option<bool> + Send + Sync>);

impl ExtensionFn {
    pub fn new(f: impl Fn(&Context) -> Option<bool> + Send + Sync + 'static) -> Self {
        ExtensionFn(Arc::new(f))
    }

    pub fn call(&self, ctx: &Context) -> Option<bool> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for ExtensionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtensionFn(..)")
    }
}

impl PartialEq for ExtensionFn {
    /// Extension predicates are compared by pointer identity — there is no
    /// other notion of equality for an opaque closure.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The targeting predicate on a rule. Each leaf variant carries exactly what
/// it needs to match; `All` composes other `Targeting`s with AND semantics.
/// Specificity is flat per leaf (`1`), summed across an `All`'s children.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum Targeting {
    /// Matches every context unconditionally. Specificity `0`.
    Always,
    /// AND-composite over its children: matches only if every child matches.
    All { children: Vec<Targeting> },
    Locale { locales: Vec<AppLocale> },
    Platform { platforms: Vec<Platform> },
    Version { range: VersionRange },
    /// A caller-defined axis equality match (generic `AxisValue` targeting).
    Axis { axis_id: String, value: serde_json::Value },
    /// A caller-supplied predicate outside the built-in vocabulary.
    #[cfg_attr(feature = "serde", serde(skip))]
    Extension(ExtensionFn),
}

impl Targeting {
    /// Evaluate this targeting against a context. `None` only ever comes
    /// from a leaf variant whose required capability the context didn't
    /// declare, or from an `All` composite where no child definitely failed
    /// but at least one child's capability was missing.
    pub fn matches(&self, ctx: &Context) -> Option<bool> {
        match self {
            Targeting::Always => Some(true),
            Targeting::All { children } => {
                let mut saw_unknown = false;
                for child in children {
                    match child.matches(ctx) {
                        Some(false) => return Some(false),
                        None => saw_unknown = true,
                        Some(true) => {}
                    }
                }
                if saw_unknown {
                    None
                } else {
                    Some(true)
                }
            }
            Targeting::Locale { locales } => ctx.locale.as_ref().map(|l| locales.contains(l)),
            Targeting::Platform { platforms } => ctx.platform.map(|p| platforms.contains(&p)),
            Targeting::Version { range } => ctx.app_version.map(|v| range.contains(v)),
            Targeting::Axis { axis_id, value } => ctx.axis(axis_id).map(|v| v == value),
            Targeting::Extension(f) => f.call(ctx),
        }
    }

    /// Specificity rank used for rule precedence: higher is more
    /// specific. Every leaf carries specificity `1`; `All` sums its
    /// children's specificity. Ties within a rank are broken by declaration
    /// order (`kdt_algo::select`), not by this function.
    pub fn specificity(&self) -> u32 {
        match self {
            Targeting::Always => 0,
            Targeting::All { children } => children.iter().map(Targeting::specificity).sum(),
            Targeting::Locale { .. }
            | Targeting::Platform { .. }
            | Targeting::Version { .. }
            | Targeting::Axis { .. }
            | Targeting::Extension(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_matches_empty_context() {
        assert_eq!(Targeting::Always.matches(&Context::new()), Some(true));
    }

    #[test]
    fn all_composite_is_and_over_children() {
        let locale_en = Targeting::Locale { locales: vec!["en".parse().unwrap()] };
        let ios = Targeting::Platform { platforms: vec![crate::platform::Platform::Ios] };
        let all = Targeting::All { children: vec![locale_en, ios] };

        let ctx = Context::new()
            .with_locale("en".parse().unwrap())
            .with_platform(crate::platform::Platform::Ios);
        assert_eq!(all.matches(&ctx), Some(true));

        let wrong_platform = Context::new()
            .with_locale("en".parse().unwrap())
            .with_platform(crate::platform::Platform::Android);
        assert_eq!(all.matches(&wrong_platform), Some(false));

        // Missing capability on one child, no definite failure on the other:
        // the composite can't yet be ruled out, so it reports unknown.
        let missing_platform = Context::new().with_locale("en".parse().unwrap());
        assert_eq!(all.matches(&missing_platform), None);
    }

    #[test]
    fn locale_targeting_requires_capability() {
        let t = Targeting::Locale { locales: vec!["en-US".parse().unwrap()] };
        assert_eq!(t.matches(&Context::new()), None);

        let ctx = Context::new().with_locale("en-US".parse().unwrap());
        assert_eq!(t.matches(&ctx), Some(true));

        let ctx_fr = Context::new().with_locale("fr-FR".parse().unwrap());
        assert_eq!(t.matches(&ctx_fr), Some(false));
    }

    #[test]
    fn extension_predicate_runs_closure() {
        let t = Targeting::Extension(ExtensionFn::new(|ctx| ctx.has_axis("beta").then_some(true)));
        assert_eq!(t.matches(&Context::new()), None);
        let ctx = Context::new().with_axis(crate::axis::AxisValue::new("beta", serde_json::json!(true)).unwrap());
        assert_eq!(t.matches(&ctx), Some(true));
    }

    #[test]
    fn specificity_is_flat_per_leaf_and_summed_for_all() {
        let always = Targeting::Always;
        let locale = Targeting::Locale { locales: vec!["en".parse().unwrap()] };
        let axis = Targeting::Axis { axis_id: "cohort".into(), value: serde_json::json!("x") };
        assert_eq!(locale.specificity(), 1);
        assert_eq!(axis.specificity(), 1);
        assert_eq!(always.specificity(), 0);

        let composite = Targeting::All { children: vec![locale, axis] };
        assert_eq!(composite.specificity(), 2);
    }
}
