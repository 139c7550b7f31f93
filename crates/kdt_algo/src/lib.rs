//! kdt_algo — pure rule-selection algorithm (the per-definition selection
//! loop). Depends only on `kdt_core`; has no notion of a registry, deferred
//! resolution, or cycle detection — those live in `kdt_registry`, which
//! calls `select` once per feature and takes it from there.

use kdt_core::bucketing::bucket_for;
use kdt_core::context::Context;
use kdt_core::diagnostics::{EvaluationDiagnostics, RuleOutcome};
use kdt_core::flag::FlagDefinition;
use kdt_core::ids::StableId;
use kdt_core::rule::RuleValue;

/// The outcome of running `select`: either the feature's default applies,
/// or one rule (by precedence-sorted index) was admitted.
pub enum Selected<'a, T> {
    Default,
    Rule { index: usize, value: &'a RuleValue<T> },
}

pub struct Selection<'a, T> {
    pub selected: Selected<'a, T>,
    pub diagnostics: EvaluationDiagnostics,
}

/// Run the selection algorithm for one feature against one context.
///
/// `stable_id`, when present, is what bucketing and allowlists key
/// on; without it, only fully-open (100% ramp-up) rules can be admitted,
/// since there is no identity to bucket.
pub fn select<'a, T>(
    def: &'a FlagDefinition<T>,
    ctx: &Context,
    stable_id: Option<&StableId>,
) -> Selection<'a, T> {
    let mut diagnostics = EvaluationDiagnostics::new(def.feature_id.clone());

    if !def.is_active {
        diagnostics.used_default = true;
        diagnostics.feature_disabled = true;
        return Selection { selected: Selected::Default, diagnostics };
    }

    // Feature-level allowlist admits the identity onto every rule's
    // ramp-up gate uniformly; it never bypasses targeting — targeting
    // must match first at both the feature and rule level.
    let feature_allowlisted = stable_id.map(|id| def.allowlists(id)).unwrap_or(false);

    for (index, rule) in def.rules().iter().enumerate() {
        let targeting_matched = rule.targeting.matches(ctx);
        let rule_allowlisted = stable_id.map(|id| rule.allowlists(id)).unwrap_or(false);
        let allowlisted = rule_allowlisted || feature_allowlisted;

        if targeting_matched != Some(true) {
            diagnostics.rule_outcomes.push(RuleOutcome {
                rule_index: index,
                targeting_matched,
                allowlisted,
                rampup_admitted: None,
                selected: false,
            });
            continue;
        }

        let (rampup_admitted, bucket) = if allowlisted || rule.rampup.as_f64() >= 100.0 {
            (true, None)
        } else {
            match stable_id {
                Some(id) => {
                    let bucket = bucket_for(&def.salt, &def.feature_id, id.as_str());
                    (rule.rampup.admits(bucket), Some(bucket))
                }
                None => {
                    diagnostics.missing_stable_id = true;
                    (false, None)
                }
            }
        };

        diagnostics.rule_outcomes.push(RuleOutcome {
            rule_index: index,
            targeting_matched,
            allowlisted,
            rampup_admitted: Some(rampup_admitted),
            selected: rampup_admitted,
        });

        if rampup_admitted {
            if let Some(b) = bucket {
                diagnostics.bucket = Some(b);
            }
            diagnostics.selected_rule_index = Some(index);
            return Selection { selected: Selected::Rule { index, value: &rule.value }, diagnostics };
        }
    }

    diagnostics.used_default = true;
    Selection { selected: Selected::Default, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdt_core::config::FeatureValue;
    use kdt_core::rampup::RampUp;
    use kdt_core::rule::Rule;
    use kdt_core::targeting::Targeting;

    fn feature_value_bool(b: bool) -> FeatureValue {
        FeatureValue::Bool(b)
    }

    #[test]
    fn falls_back_to_default_with_no_rules() {
        let def = FlagDefinition::new("f1", feature_value_bool(false));
        let sel = select(&def, &Context::new(), None);
        assert!(matches!(sel.selected, Selected::Default));
        assert!(sel.diagnostics.used_default);
    }

    #[test]
    fn inactive_feature_always_uses_default() {
        let rule = Rule::new(Targeting::Always, RuleValue::Eager(feature_value_bool(true)));
        let def = FlagDefinition::new("f1", feature_value_bool(false))
            .with_rules(vec![rule])
            .with_active(false);
        let sel = select(&def, &Context::new(), None);
        assert!(matches!(sel.selected, Selected::Default));
        assert!(sel.diagnostics.feature_disabled);
    }

    #[test]
    fn missing_stable_id_is_recorded_distinctly_from_an_open_rule() {
        let gated = Rule::new(Targeting::Always, RuleValue::Eager(feature_value_bool(true)))
            .with_rampup(RampUp::new(50.0).unwrap());
        let def = FlagDefinition::new("f1", feature_value_bool(false)).with_rules(vec![gated]);
        let sel = select(&def, &Context::new(), None);
        assert!(matches!(sel.selected, Selected::Default));
        assert!(sel.diagnostics.missing_stable_id);

        let open = Rule::new(Targeting::Always, RuleValue::Eager(feature_value_bool(true)));
        let def_open = FlagDefinition::new("f2", feature_value_bool(false)).with_rules(vec![open]);
        let sel_open = select(&def_open, &Context::new(), None);
        assert!(matches!(sel_open.selected, Selected::Rule { .. }));
        assert!(!sel_open.diagnostics.missing_stable_id);
    }

    #[test]
    fn matching_fully_open_rule_is_selected() {
        let rule = Rule::new(Targeting::Always, RuleValue::Eager(feature_value_bool(true)));
        let def = FlagDefinition::new("f1", feature_value_bool(false)).with_rules(vec![rule]);
        let sel = select(&def, &Context::new(), None);
        assert!(matches!(sel.selected, Selected::Rule { index: 0, .. }));
    }

    #[test]
    fn non_matching_targeting_falls_through_to_default() {
        let rule = Rule::new(
            Targeting::Locale { locales: vec!["en".parse().unwrap()] },
            RuleValue::Eager(feature_value_bool(true)),
        );
        let def = FlagDefinition::new("f1", feature_value_bool(false)).with_rules(vec![rule]);
        let ctx = Context::new().with_locale("fr".parse().unwrap());
        let sel = select(&def, &ctx, None);
        assert!(matches!(sel.selected, Selected::Default));
    }

    #[test]
    fn zero_rampup_blocks_even_with_matching_targeting() {
        let rule = Rule::new(Targeting::Always, RuleValue::Eager(feature_value_bool(true)))
            .with_rampup(RampUp::NONE);
        let def = FlagDefinition::new("f1", feature_value_bool(false)).with_rules(vec![rule]);
        let id = StableId::of_opaque("user-1").unwrap();
        let sel = select(&def, &Context::new(), Some(&id));
        assert!(matches!(sel.selected, Selected::Default));
    }

    #[test]
    fn allowlisted_identity_bypasses_rampup_but_not_targeting() {
        let id = StableId::of_opaque("vip-1").unwrap();
        let allowlist = std::collections::BTreeSet::from([id.clone()]);

        let rule = Rule::new(
            Targeting::Locale { locales: vec!["en".parse().unwrap()] },
            RuleValue::Eager(feature_value_bool(true)),
        )
        .with_rampup(RampUp::NONE)
        .with_allowlist(allowlist);
        let def = FlagDefinition::new("f1", feature_value_bool(false)).with_rules(vec![rule]);

        // targeting doesn't match: allowlist does not help.
        let sel = select(&def, &Context::new(), Some(&id));
        assert!(matches!(sel.selected, Selected::Default));

        // targeting matches: allowlist bypasses the zero ramp-up.
        let ctx = Context::new().with_locale("en".parse().unwrap());
        let sel = select(&def, &ctx, Some(&id));
        assert!(matches!(sel.selected, Selected::Rule { index: 0, .. }));
    }

    #[test]
    fn bucketing_is_deterministic_across_repeated_selection() {
        let rule = Rule::new(Targeting::Always, RuleValue::Eager(feature_value_bool(true)))
            .with_rampup(RampUp::new(50.0).unwrap());
        let def = FlagDefinition::new("f1", feature_value_bool(false)).with_rules(vec![rule]);
        let id = StableId::of_opaque("user-42").unwrap();

        let first = select(&def, &Context::new(), Some(&id));
        let second = select(&def, &Context::new(), Some(&id));
        assert_eq!(
            matches!(first.selected, Selected::Rule { .. }),
            matches!(second.selected, Selected::Rule { .. })
        );
    }
}
