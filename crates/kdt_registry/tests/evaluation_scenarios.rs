//! The concrete end-to-end evaluation scenarios.

use kdt_core::config::{Configuration, FeatureValue};
use kdt_core::context::Context;
use kdt_core::flag::FlagDefinition;
use kdt_core::ids::StableId;
use kdt_core::platform::Platform;
use kdt_core::rampup::RampUp;
use kdt_core::rule::{Rule, RuleValue};
use kdt_core::targeting::Targeting;
use kdt_io::schema::{FeatureSchemaBuilder, FeatureType};
use kdt_io::wire::{decode, SnapshotLoadOptions};
use kdt_registry::{Registry, RegistryConfig};
use std::collections::BTreeMap;

fn hex_id(tail: &str) -> StableId {
    let padded = format!("{:0>32}", tail);
    StableId::of(&padded).unwrap()
}

#[test]
fn scenario_1_default_only() {
    let def = FlagDefinition::new("dark_mode", FeatureValue::Bool(false));
    let reg = Registry::new(RegistryConfig::default());
    reg.load(Configuration::from_features(BTreeMap::from([("dark_mode".to_string(), def)])));

    let ctx = Context::new()
        .with_locale("en-US".parse().unwrap())
        .with_platform(Platform::Ios)
        .with_stable_id(hex_id("0"));

    assert_eq!(reg.evaluate_safely("dark_mode", &ctx).unwrap(), FeatureValue::Bool(false));
}

#[test]
fn scenario_2_full_platform_targeting() {
    let rule = Rule::new(
        Targeting::Platform { platforms: vec![Platform::Ios] },
        RuleValue::Eager(FeatureValue::Bool(true)),
    )
    .with_rampup(RampUp::FULL);
    let def = FlagDefinition::new("new_onboarding", FeatureValue::Bool(false)).with_rules(vec![rule]);
    let reg = Registry::new(RegistryConfig::default());
    reg.load(Configuration::from_features(BTreeMap::from([("new_onboarding".to_string(), def)])));

    let id = hex_id("1");
    let ios_ctx = Context::new().with_platform(Platform::Ios).with_stable_id(id.clone());
    assert_eq!(reg.evaluate_safely("new_onboarding", &ios_ctx).unwrap(), FeatureValue::Bool(true));

    let android_ctx = Context::new().with_platform(Platform::Android).with_stable_id(id);
    assert_eq!(reg.evaluate_safely("new_onboarding", &android_ctx).unwrap(), FeatureValue::Bool(false));
}

#[test]
fn scenario_3_deterministic_fifty_percent_rollout() {
    let rule = Rule::new(Targeting::Always, RuleValue::Eager(FeatureValue::Bool(true))).with_rampup(RampUp::new(50.0).unwrap());
    let def = FlagDefinition::new("exp", FeatureValue::Bool(false)).with_rules(vec![rule]).with_salt("v1");
    let reg = Registry::new(RegistryConfig::default());
    reg.load(Configuration::from_features(BTreeMap::from([("exp".to_string(), def)])));

    let sample_size = 20_000;
    let mut admitted = 0usize;
    for i in 0..sample_size {
        let id = hex_id(&format!("{i:x}"));
        let ctx = Context::new().with_stable_id(id);
        if reg.evaluate_safely("exp", &ctx).unwrap() == FeatureValue::Bool(true) {
            admitted += 1;
        }
    }
    let rate = admitted as f64 / sample_size as f64;
    assert!((0.49..0.51).contains(&rate), "rate={rate}");

    let fixed = StableId::of("a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6").unwrap();
    let ctx = Context::new().with_stable_id(fixed);
    let first = reg.evaluate_safely("exp", &ctx).unwrap();
    let second = reg.evaluate_safely("exp", &ctx).unwrap();
    assert_eq!(first, second);
}

#[test]
fn scenario_4_specificity_overrides_insertion_order() {
    let r1 = Rule::new(Targeting::Always, RuleValue::Eager(FeatureValue::Str("A".into())));
    let r2 = Rule::new(
        Targeting::Platform { platforms: vec![Platform::Ios] },
        RuleValue::Eager(FeatureValue::Str("B".into())),
    );
    let def = FlagDefinition::new("variant", FeatureValue::Str("default".into())).with_rules(vec![r1, r2]);
    let reg = Registry::new(RegistryConfig::default());
    reg.load(Configuration::from_features(BTreeMap::from([("variant".to_string(), def)])));

    let id = hex_id("2");
    let ios_ctx = Context::new().with_platform(Platform::Ios).with_stable_id(id.clone());
    assert_eq!(reg.evaluate_safely("variant", &ios_ctx).unwrap(), FeatureValue::Str("B".into()));

    let android_ctx = Context::new().with_platform(Platform::Android).with_stable_id(id);
    assert_eq!(reg.evaluate_safely("variant", &android_ctx).unwrap(), FeatureValue::Str("A".into()));
}

#[test]
fn scenario_5_allowlist_bypass() {
    let vip = hex_id("3");
    let rule = Rule::new(
        Targeting::Platform { platforms: vec![Platform::Ios] },
        RuleValue::Eager(FeatureValue::Bool(true)),
    )
    .with_rampup(RampUp::NONE);
    let def = FlagDefinition::new("vip_feature", FeatureValue::Bool(false))
        .with_rules(vec![rule])
        .with_allowlist(std::collections::BTreeSet::from([vip.clone()]));
    let reg = Registry::new(RegistryConfig::default());
    reg.load(Configuration::from_features(BTreeMap::from([("vip_feature".to_string(), def)])));

    let vip_ctx = Context::new().with_platform(Platform::Ios).with_stable_id(vip);
    assert_eq!(reg.evaluate_safely("vip_feature", &vip_ctx).unwrap(), FeatureValue::Bool(true));

    let other_ctx = Context::new().with_platform(Platform::Ios).with_stable_id(hex_id("4"));
    assert_eq!(reg.evaluate_safely("vip_feature", &other_ctx).unwrap(), FeatureValue::Bool(false));
}

#[test]
fn scenario_6_parse_failure_preserves_previous_snapshot() {
    let schema = FeatureSchemaBuilder::new().declare("dark_mode", FeatureType::Bool).build();
    let good_json = r#"{"flags": [{"key": "dark_mode", "type": "BOOLEAN", "defaultValue": true, "rules": [], "isActive": true, "allowlist": []}]}"#;
    let c1 = decode(good_json, &schema, SnapshotLoadOptions::default()).unwrap();

    let reg = Registry::new(RegistryConfig::default());
    reg.load(c1);
    assert_eq!(
        reg.evaluate_safely("dark_mode", &Context::new()).unwrap(),
        FeatureValue::Bool(true)
    );

    let err = decode("not-json", &schema, SnapshotLoadOptions::default());
    assert!(err.is_err());

    // The rejected snapshot was never loaded; evaluators still see C1.
    assert_eq!(
        reg.evaluate_safely("dark_mode", &Context::new()).unwrap(),
        FeatureValue::Bool(true)
    );
}
