//! `Registry` — the atomic snapshot container.

use std::collections::VecDeque;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use kdt_core::config::{Configuration, ConfigurationPatch, FeatureValue};
use kdt_core::determinism::sort_feature_ids;
use parking_lot::Mutex;

use crate::observability::Observer;

/// One entry in the registry's bounded update history.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub feature_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryKind {
    Load,
    Update,
}

/// Tunables for a [`Registry`] instance — namespace name and history
/// capacity. These are the only two knobs, carried directly on
/// `RegistryConfig` rather than a broader config object.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    pub namespace: String,
    pub history_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig { namespace: "default".to_string(), history_capacity: 32 }
    }
}

/// Feature ids that differ between the registry's current snapshot and a
/// candidate `Configuration` (used by `kdt_report`'s diff rendering).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigurationDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

pub(crate) fn diff_configurations(base: &Configuration, other: &Configuration) -> ConfigurationDiff {
    let mut diff = ConfigurationDiff::default();
    for id in other.feature_ids() {
        if !base.contains(id) {
            diff.added.push(id.to_string());
        }
    }
    for id in base.feature_ids() {
        if !other.contains(id) {
            diff.removed.push(id.to_string());
        } else {
            let a = base.get(id).expect("feature_ids() only yields present keys");
            let b = other.get(id).expect("feature_ids() only yields present keys");
            if a.default_value != b.default_value || a.rules().len() != b.rules().len() || a.is_active != b.is_active {
                diff.changed.push(id.to_string());
            }
        }
    }
    sort_feature_ids(&mut diff.added);
    sort_feature_ids(&mut diff.removed);
    sort_feature_ids(&mut diff.changed);
    diff
}

/// Atomically-published `Configuration` snapshots plus bounded history and
/// per-instance test overrides.
pub struct Registry {
    pub(crate) config: RegistryConfig,
    current: ArcSwap<Configuration>,
    history: Mutex<VecDeque<HistoryEntry>>,
    overrides: DashMap<String, FeatureValue>,
    pub(crate) observer: Arc<dyn Observer>,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Registry::with_observer(config, crate::observability::default_observer())
    }

    pub fn with_observer(config: RegistryConfig, observer: Arc<dyn Observer>) -> Self {
        Registry {
            config,
            current: ArcSwap::new(Arc::new(Configuration::new())),
            history: Mutex::new(VecDeque::new()),
            overrides: DashMap::new(),
            observer,
        }
    }

    /// One atomic read of the live snapshot: exactly one atomic
    /// load of the registry's current `Configuration` pointer.
    pub fn current(&self) -> Arc<Configuration> {
        self.current.load_full()
    }

    /// Atomically publish `c`. Clears test overrides — they MUST NOT persist
    /// across `load`.
    pub fn load(&self, c: Configuration) {
        let feature_count = c.len();
        self.current.store(Arc::new(c));
        self.overrides.clear();
        self.record(HistoryKind::Load, feature_count);
    }

    /// Compare-and-swap a patch onto the current snapshot:
    /// repeatedly read `current`, compute `patch.applyTo(current)`, publish.
    pub fn update(&self, patch: &ConfigurationPatch) -> Configuration {
        let updated = self.current.rcu(|current| Arc::new(current.apply_patch(patch)));
        self.record(HistoryKind::Update, updated.len());
        (*updated).clone()
    }

    fn record(&self, kind: HistoryKind, feature_count: usize) {
        {
            let mut h = self.history.lock();
            if h.len() == self.config.history_capacity {
                h.pop_front();
            }
            h.push_back(HistoryEntry { kind, feature_count });
        }
        self.observer.log_registry_update(&self.config.namespace, feature_count);
        self.observer.record_registry_update(&self.config.namespace);
    }

    /// Test-only override admitted ahead of every rule and default.
    /// Scoped to this instance, cleared by `load`.
    pub fn set_override(&self, feature_id: impl Into<String>, value: FeatureValue) {
        self.overrides.insert(feature_id.into(), value);
    }

    pub fn clear_override(&self, feature_id: &str) {
        self.overrides.remove(feature_id);
    }

    pub(crate) fn override_for(&self, feature_id: &str) -> Option<FeatureValue> {
        self.overrides.get(feature_id).map(|entry| entry.value().clone())
    }

    /// A snapshot of the bounded update history, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().iter().cloned().collect()
    }

    /// Feature ids added, removed, or changed between the current snapshot
    /// and `other` (Registry API's `diff`).
    pub fn diff(&self, other: &Configuration) -> ConfigurationDiff {
        diff_configurations(&self.current(), other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdt_core::flag::FlagDefinition;

    fn flag(id: &str, default: bool) -> FlagDefinition<FeatureValue> {
        FlagDefinition::new(id, FeatureValue::Bool(default))
    }

    #[test]
    fn load_publishes_and_clears_overrides() {
        let reg = Registry::new(RegistryConfig::default());
        reg.set_override("f1", FeatureValue::Bool(true));
        assert!(reg.override_for("f1").is_some());

        let cfg = Configuration::from_features(std::collections::BTreeMap::from([("f1".to_string(), flag("f1", false))]));
        reg.load(cfg);
        assert!(reg.override_for("f1").is_none());
        assert_eq!(reg.current().len(), 1);
    }

    #[test]
    fn update_is_compare_and_swap() {
        let reg = Registry::new(RegistryConfig::default());
        let patch = ConfigurationPatch::new().adding(flag("f1", true));
        let next = reg.update(&patch);
        assert!(next.contains("f1"));
        assert_eq!(reg.current().len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let reg = Registry::new(RegistryConfig { namespace: "ns".into(), history_capacity: 2 });
        for i in 0..5 {
            reg.update(&ConfigurationPatch::new().adding(flag(&format!("f{i}"), true)));
        }
        assert_eq!(reg.history().len(), 2);
    }

    #[test]
    fn diff_reports_added_removed_changed() {
        let reg = Registry::new(RegistryConfig::default());
        reg.load(Configuration::from_features(std::collections::BTreeMap::from([
            ("a".to_string(), flag("a", true)),
            ("b".to_string(), flag("b", false)),
        ])));

        let other = Configuration::from_features(std::collections::BTreeMap::from([
            ("a".to_string(), flag("a", false)),
            ("c".to_string(), flag("c", true)),
        ]));

        let diff = reg.diff(&other);
        assert_eq!(diff.added, vec!["c".to_string()]);
        assert_eq!(diff.removed, vec!["b".to_string()]);
        assert_eq!(diff.changed, vec!["a".to_string()]);
    }
}
