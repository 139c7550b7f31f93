//! `FlagDefinition<T>` — a named feature's default value and ordered rule set.

use crate::determinism::rule_precedence_cmp;
use crate::ids::StableId;
use crate::rule::Rule;
use std::collections::BTreeSet;

/// A single feature's full definition. Rules are stored
/// already sorted into evaluation-precedence order — the builder computes
/// and freezes that order once, rather than re-sorting on every evaluation.
#[derive(Clone, Debug)]
pub struct FlagDefinition<T> {
    pub feature_id: String,
    pub default_value: T,
    rules: Vec<Rule<T>>,
    pub salt: String,
    pub is_active: bool,
    pub allowlist: BTreeSet<StableId>,
}

impl<T> FlagDefinition<T> {
    pub fn new(feature_id: impl Into<String>, default_value: T) -> Self {
        let feature_id = feature_id.into();
        FlagDefinition {
            salt: "v1".to_string(),
            feature_id,
            default_value,
            rules: Vec::new(),
            is_active: true,
            allowlist: BTreeSet::new(),
        }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_allowlist(mut self, allowlist: BTreeSet<StableId>) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Append rules, then freeze precedence order (descending
    /// specificity, ties broken by ascending insertion index). The
    /// insertion index used for tie-breaking is each rule's position in
    /// `rules` *before* this sort, so pushing rules in declaration order and
    /// calling this once at construction time is the intended usage.
    pub fn with_rules(mut self, rules: Vec<Rule<T>>) -> Self {
        let mut indexed: Vec<(usize, Rule<T>)> = rules.into_iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            rule_precedence_cmp(a.targeting.specificity(), *ia, b.targeting.specificity(), *ib)
        });
        self.rules = indexed.into_iter().map(|(_, r)| r).collect();
        self
    }

    /// Rules in frozen precedence order (most specific first).
    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    /// Feature-level allowlist bypass: an id here is admitted onto every
    /// rule's ramp-up gate uniformly, bypassing ramp-up (not targeting) on
    /// the first rule whose targeting matches; it falls back to the default
    /// value only if no rule's targeting matches at all.
    pub fn allowlists(&self, id: &StableId) -> bool {
        self.allowlist.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleValue;
    use crate::targeting::Targeting;

    #[test]
    fn rules_are_sorted_by_specificity_then_insertion_order() {
        let general = Rule::new(Targeting::Always, RuleValue::Eager(false));
        let specific = Rule::new(
            Targeting::Axis { axis_id: "cohort".into(), value: serde_json::json!("beta") },
            RuleValue::Eager(true),
        );
        let def = FlagDefinition::new("f1", false).with_rules(vec![general, specific]);

        assert_eq!(def.rules().len(), 2);
        assert_eq!(def.rules()[0].targeting.specificity(), 1);
        assert_eq!(def.rules()[1].targeting.specificity(), 0);
    }

    #[test]
    fn ties_preserve_declaration_order() {
        let first = Rule::new(Targeting::Always, RuleValue::Eager(1));
        let second = Rule::new(Targeting::Always, RuleValue::Eager(2));
        let def = FlagDefinition::new("f1", 0).with_rules(vec![first, second]);
        match (&def.rules()[0].value, &def.rules()[1].value) {
            (RuleValue::Eager(a), RuleValue::Eager(b)) => {
                assert_eq!(*a, 1);
                assert_eq!(*b, 2);
            }
            _ => panic!("expected eager values"),
        }
    }
}
