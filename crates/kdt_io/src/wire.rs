//! Wire-format structs and the `decode`/`apply_patch`/`encode` functions
//! that cross the parse boundary.
//!
//! Targeting is decoded by hand rather than through `#[serde(tag = "kind")]`
//! directly on `kdt_core::targeting::Targeting`, because the wire format
//! needs a knob for unrecognized `kind` tags: either fail the whole snapshot
//! (the default) or skip just that rule ([`SnapshotLoadOptions::skip_unknown_keys`]).
//! A derive-based tagged enum can't express "skip and keep going" — it only
//! knows how to fail the whole deserialization.

use std::collections::BTreeMap;

use kdt_core::config::{Configuration, ConfigurationMetadata, ConfigurationPatch, FeatureValue};
use kdt_core::errors::ParseError;
use kdt_core::flag::FlagDefinition;
use kdt_core::ids::StableId;
use kdt_core::locale::AppLocale;
use kdt_core::platform::Platform;
use kdt_core::rampup::RampUp;
use kdt_core::rule::{Rule, RuleValue};
use kdt_core::targeting::Targeting;
use kdt_core::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FeatureSchema, FeatureType};

/// Options controlling tolerance of a decode, mirroring the closed-world vs.
/// forward-compatible reading postures a namespace owner might want when
/// consuming a snapshot produced by a newer writer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotLoadOptions {
    /// Rules whose `targeting.kind` isn't recognized are dropped instead of
    /// failing the whole decode.
    pub skip_unknown_keys: bool,
}

/// The wire spelling of [`FeatureType`] — `BOOLEAN|STRING|INT|DOUBLE|ENUM|OBJECT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum FeatureTypeWire {
    Boolean,
    String,
    Int,
    Double,
    Enum,
    Object,
}

impl FeatureTypeWire {
    fn to_feature_type(self) -> FeatureType {
        match self {
            FeatureTypeWire::Boolean => FeatureType::Bool,
            FeatureTypeWire::String => FeatureType::Str,
            FeatureTypeWire::Int => FeatureType::Int,
            FeatureTypeWire::Double => FeatureType::Double,
            FeatureTypeWire::Enum => FeatureType::Enum,
            FeatureTypeWire::Object => FeatureType::Object,
        }
    }

    fn from_feature_type(ty: FeatureType) -> Self {
        match ty {
            FeatureType::Bool => FeatureTypeWire::Boolean,
            FeatureType::Str => FeatureTypeWire::String,
            FeatureType::Int => FeatureTypeWire::Int,
            FeatureType::Double => FeatureTypeWire::Double,
            FeatureType::Enum => FeatureTypeWire::Enum,
            FeatureType::Object => FeatureTypeWire::Object,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleWire {
    #[serde(default = "default_rampup")]
    ramp_up: f64,
    #[serde(default)]
    note: Option<String>,
    targeting: Value,
    value: Value,
    #[serde(default)]
    allowlist: Vec<String>,
}

fn default_rampup() -> f64 {
    100.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlagDefinitionWire {
    key: String,
    #[serde(rename = "type")]
    ty: FeatureTypeWire,
    default_value: Value,
    #[serde(default)]
    rules: Vec<RuleWire>,
    #[serde(default)]
    salt: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    allowlist: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataWire {
    #[serde(flatten)]
    entries: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationWire {
    #[serde(default)]
    metadata: Option<MetadataWire>,
    flags: Vec<FlagDefinitionWire>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatchWire {
    #[serde(default)]
    flags: Vec<FlagDefinitionWire>,
    #[serde(default)]
    remove_keys: Vec<String>,
}

fn invalid(msg: impl Into<String>) -> ParseError {
    ParseError::InvalidSnapshot(msg.into())
}

fn parse_stable_id(s: &str) -> Result<StableId, ParseError> {
    StableId::of_opaque(s).map_err(|_| invalid(format!("malformed allowlist entry: {s}")))
}

fn parse_allowlist(entries: &[String]) -> Result<std::collections::BTreeSet<StableId>, ParseError> {
    entries.iter().map(|s| parse_stable_id(s)).collect()
}

/// Decode one targeting entry. Returns `Ok(None)` when the `kind` tag isn't
/// recognized and `options.skip_unknown_keys` allows dropping the rule.
fn decode_targeting(v: &Value, options: SnapshotLoadOptions) -> Result<Option<Targeting>, ParseError> {
    let kind = v
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("targeting entry missing \"kind\""))?;

    let targeting = match kind {
        "always" => Targeting::Always,
        "all" => {
            let children = v
                .get("children")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("\"all\" targeting missing \"children\""))?
                .iter()
                .map(|child| decode_targeting(child, options))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect();
            Targeting::All { children }
        }
        "locale" => {
            let locales = v
                .get("locales")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("locale targeting missing \"locales\""))?
                .iter()
                .map(|l| {
                    l.as_str()
                        .ok_or_else(|| invalid("locale entry is not a string"))
                        .and_then(|s| s.parse::<AppLocale>().map_err(|_| invalid(format!("bad locale: {s}"))))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Targeting::Locale { locales }
        }
        "platform" => {
            let platforms = v
                .get("platforms")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("platform targeting missing \"platforms\""))?
                .iter()
                .map(|p| {
                    p.as_str()
                        .ok_or_else(|| invalid("platform entry is not a string"))
                        .and_then(|s| s.parse::<Platform>().map_err(|_| invalid(format!("bad platform: {s}"))))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Targeting::Platform { platforms }
        }
        "version" => {
            let min_inclusive = match v.get("minInclusive").and_then(Value::as_str) {
                Some(s) => Some(s.parse::<Version>().map_err(|_| invalid(format!("bad version: {s}")))?),
                None => None,
            };
            let max_inclusive = match v.get("maxInclusive").and_then(Value::as_str) {
                Some(s) => Some(s.parse::<Version>().map_err(|_| invalid(format!("bad version: {s}")))?),
                None => None,
            };
            Targeting::Version { range: VersionRange { min_inclusive, max_inclusive } }
        }
        "axis" => {
            let axis_id = v
                .get("axisId")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("axis targeting missing \"axisId\""))?
                .to_string();
            let value = v.get("value").cloned().unwrap_or(Value::Null);
            Targeting::Axis { axis_id, value }
        }
        other => {
            if options.skip_unknown_keys {
                return Ok(None);
            }
            return Err(invalid(format!("unrecognized targeting kind: {other}")));
        }
    };
    Ok(Some(targeting))
}

fn decode_value(v: &Value, feature_id: &str, ty: FeatureType) -> Result<FeatureValue, ParseError> {
    let mismatch = |found: &'static str| ParseError::TypeMismatch {
        feature_id: feature_id.to_string(),
        expected: ty.as_str(),
        found,
    };

    match ty {
        FeatureType::Bool => v.as_bool().map(FeatureValue::Bool).ok_or_else(|| mismatch(kind_name(v))),
        FeatureType::Str => v.as_str().map(|s| FeatureValue::Str(s.to_string())).ok_or_else(|| mismatch(kind_name(v))),
        FeatureType::Int => v.as_i64().map(FeatureValue::Int).ok_or_else(|| mismatch(kind_name(v))),
        FeatureType::Double => v.as_f64().map(FeatureValue::Double).ok_or_else(|| mismatch(kind_name(v))),
        FeatureType::Enum => v.as_str().map(|s| FeatureValue::Enum(s.to_string())).ok_or_else(|| mismatch(kind_name(v))),
        FeatureType::Object => {
            if v.is_object() {
                Ok(FeatureValue::Object(v.clone()))
            } else {
                Err(mismatch(kind_name(v)))
            }
        }
    }
}

#[cfg(feature = "schemaval")]
fn validate_object_value(feature_id: &str, value: &FeatureValue, schema: &FeatureSchema) -> Result<(), ParseError> {
    if let FeatureValue::Object(obj) = value {
        schema.validate_object(feature_id, obj).map_err(invalid)?;
    }
    Ok(())
}

#[cfg(not(feature = "schemaval"))]
fn validate_object_value(_feature_id: &str, _value: &FeatureValue, _schema: &FeatureSchema) -> Result<(), ParseError> {
    Ok(())
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_flag(
    wire: FlagDefinitionWire,
    schema: &FeatureSchema,
    options: SnapshotLoadOptions,
) -> Result<FlagDefinition<FeatureValue>, ParseError> {
    let feature_id = wire.key;
    let ty = schema.type_of(&feature_id).ok_or_else(|| ParseError::FeatureNotFound(feature_id.clone()))?;

    let declared = FeatureTypeWire::from_feature_type(ty);
    if wire.ty != declared {
        return Err(ParseError::TypeMismatch {
            feature_id: feature_id.clone(),
            expected: ty.as_str(),
            found: "wrong wire type tag",
        });
    }

    let default_value = decode_value(&wire.default_value, &feature_id, ty)?;
    validate_object_value(&feature_id, &default_value, schema)?;
    let allowlist = parse_allowlist(&wire.allowlist)?;

    let mut rules = Vec::with_capacity(wire.rules.len());
    for rule_wire in wire.rules {
        let Some(targeting) = decode_targeting(&rule_wire.targeting, options)? else {
            continue;
        };
        let rampup = RampUp::new(rule_wire.ramp_up).map_err(|_| invalid(format!("bad rampUp on feature {feature_id}")))?;
        let value = decode_value(&rule_wire.value, &feature_id, ty)?;
        validate_object_value(&feature_id, &value, schema)?;
        let rule_allowlist = parse_allowlist(&rule_wire.allowlist)?;
        let mut rule = Rule::new(targeting, RuleValue::Eager(value)).with_rampup(rampup).with_allowlist(rule_allowlist);
        if let Some(note) = rule_wire.note {
            rule = rule.with_note(note);
        }
        rules.push(rule);
    }

    let mut def = FlagDefinition::new(feature_id, default_value)
        .with_active(wire.is_active)
        .with_allowlist(allowlist);
    if let Some(salt) = wire.salt {
        def = def.with_salt(salt);
    }
    Ok(def.with_rules(rules))
}

/// Decode a full namespace snapshot. Every feature id present in
/// the JSON must be declared in `schema`; an undeclared id is a hard error,
/// never a silently-ignored entry.
pub fn decode(json: &str, schema: &FeatureSchema, options: SnapshotLoadOptions) -> Result<Configuration, ParseError> {
    let wire: ConfigurationWire =
        serde_json::from_str(json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let mut features = BTreeMap::new();
    for flag_wire in wire.flags {
        let feature_id = flag_wire.key.clone();
        let def = decode_flag(flag_wire, schema, options)?;
        features.insert(feature_id, def);
    }
    let mut cfg = Configuration::from_features(features);
    if let Some(metadata) = wire.metadata {
        cfg = cfg.with_metadata(ConfigurationMetadata::from_entries(metadata.entries));
    }
    Ok(cfg)
}

/// Decode a patch: `flags` entries follow the same rules as a
/// full snapshot's features; `removeKeys` is taken as-is.
pub fn patch_from_wire(
    json: &str,
    schema: &FeatureSchema,
    options: SnapshotLoadOptions,
) -> Result<ConfigurationPatch, ParseError> {
    let wire: PatchWire = serde_json::from_str(json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let mut patch = ConfigurationPatch::new();
    for flag_wire in wire.flags {
        let def = decode_flag(flag_wire, schema, options)?;
        patch = patch.adding(def);
    }
    for feature_id in wire.remove_keys {
        patch = patch.removing(feature_id);
    }
    Ok(patch)
}

fn encode_value(v: &FeatureValue) -> Value {
    match v {
        FeatureValue::Bool(b) => Value::Bool(*b),
        FeatureValue::Str(s) | FeatureValue::Enum(s) => Value::String(s.clone()),
        FeatureValue::Int(i) => Value::Number((*i).into()),
        FeatureValue::Double(d) => serde_json::Number::from_f64(*d).map(Value::Number).unwrap_or(Value::Null),
        FeatureValue::Object(o) => o.clone(),
    }
}

fn encode_targeting(t: &Targeting) -> Value {
    match t {
        Targeting::Always => serde_json::json!({"kind": "always"}),
        Targeting::All { children } => serde_json::json!({
            "kind": "all",
            "children": children.iter().map(encode_targeting).collect::<Vec<_>>(),
        }),
        Targeting::Locale { locales } => serde_json::json!({
            "kind": "locale",
            "locales": locales.iter().map(|l| l.as_str()).collect::<Vec<_>>(),
        }),
        Targeting::Platform { platforms } => serde_json::json!({
            "kind": "platform",
            "platforms": platforms.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        }),
        Targeting::Version { range } => {
            let mut obj = serde_json::Map::new();
            obj.insert("kind".into(), Value::String("version".into()));
            if let Some(min) = range.min_inclusive {
                obj.insert("minInclusive".into(), Value::String(min.to_string()));
            }
            if let Some(max) = range.max_inclusive {
                obj.insert("maxInclusive".into(), Value::String(max.to_string()));
            }
            Value::Object(obj)
        }
        Targeting::Axis { axis_id, value } => serde_json::json!({
            "kind": "axis",
            "axisId": axis_id,
            "value": value,
        }),
        Targeting::Extension(_) => serde_json::json!({"kind": "extension"}),
    }
}

/// Encode a snapshot back to canonical JSON. Deferred rule values
/// cannot be re-serialized — encoding a `Configuration` built by `kdt_registry`
/// with deferred rules baked in will render them as their already-resolved
/// eager value at the call site instead; `kdt_io` itself never constructs
/// deferred rules, so this is unreachable from `decode`'s own output.
pub fn encode(config: &Configuration) -> String {
    let mut flags = Vec::new();
    for feature_id in config.feature_ids() {
        let def = config.get(feature_id).expect("feature_ids() only yields present keys");
        let ty = FeatureTypeWire::from_feature_type(match &def.default_value {
            FeatureValue::Bool(_) => FeatureType::Bool,
            FeatureValue::Str(_) => FeatureType::Str,
            FeatureValue::Int(_) => FeatureType::Int,
            FeatureValue::Double(_) => FeatureType::Double,
            FeatureValue::Enum(_) => FeatureType::Enum,
            FeatureValue::Object(_) => FeatureType::Object,
        });
        let rules: Vec<Value> = def
            .rules()
            .iter()
            .map(|r| {
                let value = match &r.value {
                    RuleValue::Eager(v) => encode_value(v),
                    RuleValue::Deferred(_) => Value::Null,
                };
                serde_json::json!({
                    "rampUp": r.rampup.as_f64(),
                    "note": r.note,
                    "targeting": encode_targeting(&r.targeting),
                    "value": value,
                    "allowlist": r.allowlist.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();

        flags.push(serde_json::json!({
            "key": feature_id,
            "type": ty,
            "defaultValue": encode_value(&def.default_value),
            "rules": rules,
            "salt": def.salt,
            "isActive": def.is_active,
            "allowlist": def.allowlist.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        }));
    }

    let mut whole = serde_json::Map::new();
    if let Some(metadata) = config.metadata() {
        let entries: serde_json::Map<String, Value> =
            metadata.entries().map(|(k, v)| (k.to_string(), v.clone())).collect();
        whole.insert("metadata".into(), Value::Object(entries));
    }
    whole.insert("flags".into(), Value::Array(flags));

    String::from_utf8(crate::canonical_json::to_canonical_json_bytes(&Value::Object(whole)))
        .expect("canonical JSON bytes are always valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureSchemaBuilder;

    fn schema() -> FeatureSchema {
        FeatureSchemaBuilder::new()
            .declare("checkout.enabled", FeatureType::Bool)
            .declare("checkout.limit", FeatureType::Int)
            .build()
    }

    #[test]
    fn decodes_minimal_snapshot() {
        let json = r#"{
            "flags": [
                {
                    "key": "checkout.enabled",
                    "type": "BOOLEAN",
                    "defaultValue": false,
                    "rules": [
                        { "rampUp": 100.0, "targeting": {"kind": "always"}, "value": true, "allowlist": [] }
                    ],
                    "isActive": true,
                    "allowlist": []
                }
            ]
        }"#;
        let cfg = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap();
        assert!(cfg.contains("checkout.enabled"));
        assert_eq!(cfg.get("checkout.enabled").unwrap().rules().len(), 1);
    }

    #[test]
    fn decodes_metadata() {
        let json = r#"{
            "metadata": { "version": 3, "generatedBy": "ops" },
            "flags": [
                { "key": "checkout.enabled", "type": "BOOLEAN", "defaultValue": true, "rules": [], "isActive": true, "allowlist": [] }
            ]
        }"#;
        let cfg = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap();
        let metadata = cfg.metadata().unwrap();
        assert_eq!(metadata.get("version"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn undeclared_feature_is_an_error() {
        let json = r#"{"flags": [{"key": "unknown.flag", "type": "BOOLEAN", "defaultValue": true, "rules": [], "isActive": true, "allowlist": []}]}"#;
        let err = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::FeatureNotFound(_)));
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let json = r#"{"flags": [{"key": "checkout.enabled", "type": "BOOLEAN", "defaultValue": 1, "rules": [], "isActive": true, "allowlist": []}]}"#;
        let err = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::TypeMismatch { .. }));
    }

    #[test]
    fn wire_type_tag_mismatching_schema_is_rejected() {
        let json = r#"{"flags": [{"key": "checkout.enabled", "type": "INT", "defaultValue": true, "rules": [], "isActive": true, "allowlist": []}]}"#;
        let err = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_targeting_kind_fails_by_default_but_can_be_skipped() {
        let json = r#"{
            "flags": [
                {
                    "key": "checkout.enabled",
                    "type": "BOOLEAN",
                    "defaultValue": false,
                    "rules": [
                        { "rampUp": 100.0, "targeting": {"kind": "geo-fence"}, "value": true, "allowlist": [] }
                    ],
                    "isActive": true,
                    "allowlist": []
                }
            ]
        }"#;
        assert!(decode(json, &schema(), SnapshotLoadOptions::default()).is_err());

        let lenient = SnapshotLoadOptions { skip_unknown_keys: true };
        let cfg = decode(json, &schema(), lenient).unwrap();
        assert_eq!(cfg.get("checkout.enabled").unwrap().rules().len(), 0);
    }

    #[test]
    fn all_targeting_decodes_its_children() {
        let json = r#"{
            "flags": [
                {
                    "key": "checkout.enabled",
                    "type": "BOOLEAN",
                    "defaultValue": false,
                    "rules": [
                        { "rampUp": 100.0, "targeting": {"kind": "all", "children": [
                            {"kind": "platform", "platforms": ["ios"]},
                            {"kind": "always"}
                        ]}, "value": true, "allowlist": [] }
                    ],
                    "isActive": true,
                    "allowlist": []
                }
            ]
        }"#;
        let cfg = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap();
        let rule = &cfg.get("checkout.enabled").unwrap().rules()[0];
        assert_eq!(rule.targeting.specificity(), 1);
    }

    #[test]
    fn encode_then_decode_preserves_rule_count_and_default() {
        let json = r#"{
            "flags": [
                {
                    "key": "checkout.limit",
                    "type": "INT",
                    "defaultValue": 10,
                    "rules": [
                        { "rampUp": 50.0, "targeting": {"kind": "always"}, "value": 20, "allowlist": [] }
                    ],
                    "isActive": true,
                    "allowlist": []
                }
            ]
        }"#;
        let cfg = decode(json, &schema(), SnapshotLoadOptions::default()).unwrap();
        let rendered = encode(&cfg);
        let roundtripped = decode(&rendered, &schema(), SnapshotLoadOptions::default()).unwrap();
        assert_eq!(roundtripped.get("checkout.limit").unwrap().rules().len(), 1);
    }
}
