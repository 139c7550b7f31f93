//! Declared feature schema — explicit declaration, not reflection.
//!
//! The wire format never carries a feature's type — it is declared once, up
//! front, by the namespace owner via [`FeatureSchemaBuilder`], and every
//! decode reconciles incoming values against that declaration. This is the
//! "declared field schema instead of reflection" principle: there is no
//! lazy/implicit registration path.

use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeatureType {
    Bool,
    Str,
    Int,
    Double,
    Enum,
    Object,
}

impl FeatureType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Bool => "bool",
            FeatureType::Str => "string",
            FeatureType::Int => "int",
            FeatureType::Double => "double",
            FeatureType::Enum => "enum",
            FeatureType::Object => "object",
        }
    }
}

/// The set of feature ids a namespace owner has declared, and the type each
/// one must decode to.
#[derive(Clone, Debug, Default)]
pub struct FeatureSchema {
    declared: BTreeMap<String, FeatureType>,
    #[cfg(feature = "schemaval")]
    object_schemas: BTreeMap<String, serde_json::Value>,
}

impl FeatureSchema {
    pub fn type_of(&self, feature_id: &str) -> Option<FeatureType> {
        self.declared.get(feature_id).copied()
    }

    pub fn is_declared(&self, feature_id: &str) -> bool {
        self.declared.contains_key(feature_id)
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.declared.keys().map(String::as_str)
    }

    /// Validate an `Object`-typed feature's decoded value against its
    /// registered JSON Schema, if any was declared. A feature with no
    /// schema registered always validates.
    #[cfg(feature = "schemaval")]
    pub fn validate_object(&self, feature_id: &str, value: &serde_json::Value) -> Result<(), String> {
        let Some(schema) = self.object_schemas.get(feature_id) else {
            return Ok(());
        };
        let compiled = jsonschema::JSONSchema::compile(schema)
            .map_err(|e| format!("invalid schema for {feature_id}: {e}"))?;
        compiled
            .validate(value)
            .map_err(|errors| {
                let msgs: Vec<String> = errors.map(|e| e.to_string()).collect();
                format!("{feature_id} failed schema validation: {}", msgs.join("; "))
            })
    }
}

#[derive(Clone, Debug, Default)]
pub struct FeatureSchemaBuilder {
    declared: BTreeMap<String, FeatureType>,
    #[cfg(feature = "schemaval")]
    object_schemas: BTreeMap<String, serde_json::Value>,
}

impl FeatureSchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(mut self, feature_id: impl Into<String>, ty: FeatureType) -> Self {
        self.declared.insert(feature_id.into(), ty);
        self
    }

    /// Attach a JSON Schema (draft 2020-12) that an `Object`-typed feature's
    /// value must additionally satisfy. Optional: most features only need
    /// the closed [`FeatureType`] check `decode` already performs.
    #[cfg(feature = "schemaval")]
    pub fn declare_object_schema(mut self, feature_id: impl Into<String>, schema: serde_json::Value) -> Self {
        self.object_schemas.insert(feature_id.into(), schema);
        self
    }

    pub fn build(self) -> FeatureSchema {
        FeatureSchema {
            declared: self.declared,
            #[cfg(feature = "schemaval")]
            object_schemas: self.object_schemas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_declares_types_up_front() {
        let schema = FeatureSchemaBuilder::new()
            .declare("checkout.enabled", FeatureType::Bool)
            .declare("checkout.limit", FeatureType::Int)
            .build();

        assert_eq!(schema.type_of("checkout.enabled"), Some(FeatureType::Bool));
        assert_eq!(schema.type_of("checkout.limit"), Some(FeatureType::Int));
        assert!(!schema.is_declared("unknown"));
    }
}
