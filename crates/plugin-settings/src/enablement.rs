//! The persisted plugin → enabled-project record.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{BackendError, EntityId, PluginId};

/// Enabled project IDs per plugin.
///
/// Every [`PluginId`] always has an entry. IDs are unique within one plugin
/// and keep first-insertion order, so the serialized record is deterministic.
/// Serializes to the wire shape `{"graduation": [..], "github": [..], ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnablementMap {
    ids: BTreeMap<PluginId, Vec<EntityId>>,
}

impl Default for EnablementMap {
    fn default() -> Self {
        Self {
            ids: PluginId::ALL.into_iter().map(|p| (p, Vec::new())).collect(),
        }
    }
}

impl EnablementMap {
    /// Map with nothing enabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self, plugin: PluginId) -> &[EntityId] {
        self.ids.get(&plugin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, plugin: PluginId, id: EntityId) -> bool {
        self.ids(plugin).contains(&id)
    }

    pub fn count(&self, plugin: PluginId) -> usize {
        self.ids(plugin).len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.values().all(Vec::is_empty)
    }

    /// Plugins and their IDs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PluginId, &[EntityId])> + '_ {
        PluginId::ALL.into_iter().map(move |p| (p, self.ids(p)))
    }

    /// Builder-style replace, mostly for tests and fixtures.
    pub fn with(mut self, plugin: PluginId, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.replace(plugin, ids);
        self
    }

    /// Replace one plugin's IDs, dropping duplicates but keeping first-seen order.
    pub fn replace(&mut self, plugin: PluginId, ids: impl IntoIterator<Item = EntityId>) {
        self.ids.insert(plugin, dedup(ids));
    }

    /// Run `updater` on a copy of one plugin's IDs and store the result.
    ///
    /// Returns whether the sequence changed (structural comparison). The
    /// result is re-deduplicated so an updater cannot break uniqueness.
    pub fn update<F>(&mut self, plugin: PluginId, updater: F) -> bool
    where
        F: FnOnce(&mut Vec<EntityId>),
    {
        let current = self.ids.entry(plugin).or_default();
        let mut next = current.clone();
        updater(&mut next);
        let next = dedup(next);

        if *current == next {
            return false;
        }
        *current = next;
        true
    }

    /// Decode the backend's raw record.
    ///
    /// Unknown keys are ignored, `null` counts as an empty list and missing
    /// plugins stay empty. Anything else that is not a list of non-negative
    /// integers is rejected.
    pub fn from_wire(record: &BTreeMap<String, Value>) -> Result<Self, BackendError> {
        let mut map = Self::default();

        for (key, value) in record {
            let Ok(plugin) = key.parse::<PluginId>() else {
                tracing::debug!(key = %key, "ignoring unknown plugin key in settings");
                continue;
            };

            let ids = match value {
                Value::Null => Vec::new(),
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_u64().ok_or_else(|| {
                            BackendError::Decode(format!(
                                "{key}: expected a project id, got {item}"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                other => {
                    return Err(BackendError::Decode(format!(
                        "{key}: expected a list of project ids, got {other}"
                    )))
                }
            };
            map.replace(plugin, ids);
        }

        Ok(map)
    }
}

fn dedup(ids: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
    let mut out: Vec<EntityId> = Vec::new();
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
