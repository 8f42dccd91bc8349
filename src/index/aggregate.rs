//! @acp:module "Aggregator"
//! @acp:summary "Cross-file accumulation of exports and merge of state observations"
//! @acp:domain cli
//! @acp:layer service
//!
//! Exports are only concatenated per unit and side. State observations are
//! merged on `(name, scope)`: owning units are unioned, disagreeing types
//! widen to `any` for good, and replication flags are OR-folded. The result
//! does not depend on the order files were added in.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{ExportRecord, Replication, Side, StateRecord, StateScope, ValueType};
use crate::parse::ScanResult;

// ============================================================================
// Snapshot types
// ============================================================================

/// @acp:summary "Exports of one unit grouped by side, sorted by identifier"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitExports {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client: Vec<ExportRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server: Vec<ExportRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared: Vec<ExportRecord>,
}

impl UnitExports {
    pub fn side(&self, side: Side) -> &[ExportRecord] {
        match side {
            Side::Client => &self.client,
            Side::Server => &self.server,
            Side::Shared => &self.shared,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<ExportRecord> {
        match side {
            Side::Client => &mut self.client,
            Side::Server => &mut self.server,
            Side::Shared => &mut self.shared,
        }
    }

    /// Non-empty sides in client, server, shared order
    pub fn sides(&self) -> impl Iterator<Item = (Side, &[ExportRecord])> {
        [Side::Client, Side::Server, Side::Shared]
            .into_iter()
            .map(move |side| (side, self.side(side)))
            .filter(|(_, records)| !records.is_empty())
    }
}

/// @acp:summary "Merged view of one (name, scope) key"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedState {
    pub name: String,
    pub value_type: ValueType,
    pub scope: StateScope,
    #[serde(default)]
    pub replicated: bool,
    pub owning_units: Vec<String>,
}

/// @acp:summary "Per-entity key with both accessors folded together"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub name: String,
    pub value_type: ValueType,
    pub replication: Replication,
    pub owning_units: Vec<String>,
}

/// Observed vs merged count for one record kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Count {
    pub observed: usize,
    pub unique: usize,
}

/// @acp:summary "Reporting counts derived from aggregator sizes"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub exports: Count,
    pub global_states: Count,
    pub entity_states: Count,
}

/// @acp:summary "Final in-memory hand-off to the renderer"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub exports: BTreeMap<String, UnitExports>,
    pub global_states: Vec<MergedState>,
    pub entity_states: Vec<EntityState>,
    pub summary: Summary,
}

// ============================================================================
// Exports
// ============================================================================

/// @acp:summary "Append-only export lists keyed by unit"
#[derive(Debug, Clone, Default)]
pub struct ExportAggregator {
    units: BTreeMap<String, UnitExports>,
    observed: usize,
}

impl ExportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file's exports; duplicates are kept
    pub fn add_exports(&mut self, unit: &str, records: Vec<ExportRecord>) {
        if records.is_empty() {
            return;
        }
        self.observed += records.len();
        let entry = self.units.entry(unit.to_string()).or_default();
        for record in records {
            entry.side_mut(record.side).push(record);
        }
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Distinct (unit, side, identifier) triples
    pub fn unique(&self) -> usize {
        self.units
            .values()
            .flat_map(|unit| unit.sides().map(|(_, records)| records))
            .map(|records| {
                let mut names: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
                names.sort_unstable();
                names.dedup();
                names.len()
            })
            .sum()
    }

    /// Per-unit lists, stably sorted by identifier
    pub fn sorted(&self) -> BTreeMap<String, UnitExports> {
        let mut units = self.units.clone();
        for unit in units.values_mut() {
            for side in [Side::Client, Side::Server, Side::Shared] {
                unit.side_mut(side)
                    .sort_by(|a, b| a.identifier.cmp(&b.identifier));
            }
        }
        units
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone)]
struct StateEntry {
    value_type: ValueType,
    replicated: bool,
    owning_units: Vec<String>,
}

impl StateEntry {
    fn observe(&mut self, unit: &str, record: &StateRecord) {
        self.value_type = self.value_type.widen(record.value_type);
        self.replicated |= record.replicated;
        if !self.owning_units.iter().any(|u| u == unit) {
            self.owning_units.push(unit.to_string());
        }
    }
}

/// @acp:summary "Global accumulator of state observations keyed by (name, scope)"
#[derive(Debug, Clone, Default)]
pub struct StateAggregator {
    entries: HashMap<(String, StateScope), StateEntry>,
    observed_global: usize,
    observed_entity: usize,
}

impl StateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global_states(&mut self, unit: &str, records: Vec<StateRecord>) {
        for record in &records {
            self.observe(unit, record);
        }
    }

    pub fn add_entity_states(&mut self, unit: &str, records: Vec<StateRecord>) {
        for record in &records {
            self.observe(unit, record);
        }
    }

    fn observe(&mut self, unit: &str, record: &StateRecord) {
        if record.scope.is_entity() {
            self.observed_entity += 1;
        } else {
            self.observed_global += 1;
        }

        self.entries
            .entry((record.name.clone(), record.scope))
            .and_modify(|entry| entry.observe(unit, record))
            .or_insert_with(|| StateEntry {
                value_type: record.value_type,
                replicated: record.replicated,
                owning_units: vec![unit.to_string()],
            });
    }

    /// Merged entry for one key, owning units in order of first sight
    pub fn get(&self, name: &str, scope: StateScope) -> Option<MergedState> {
        self.entries
            .get(&(name.to_string(), scope))
            .map(|entry| merged(name, scope, entry))
    }

    /// Global keys sorted by name
    pub fn global_states(&self) -> Vec<MergedState> {
        let mut states: Vec<MergedState> = self
            .entries
            .iter()
            .filter(|((_, scope), _)| *scope == StateScope::Global)
            .map(|((name, scope), entry)| {
                let mut state = merged(name, *scope, entry);
                state.owning_units.sort();
                state
            })
            .collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    /// Per-entity keys folded across both accessors, sorted by name
    pub fn entity_states(&self) -> Vec<EntityState> {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter(|(_, scope)| scope.is_entity())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();

        names
            .into_iter()
            .filter_map(|name| {
                let server = self.entries.get(&(name.to_string(), StateScope::EntityServer));
                let client = self.entries.get(&(name.to_string(), StateScope::EntityClient));
                let replication =
                    Replication::resolve(server.map(|e| e.replicated), client.map(|e| e.replicated))?;

                let value_type = match (server, client) {
                    (Some(s), Some(c)) => s.value_type.widen(c.value_type),
                    (Some(e), None) | (None, Some(e)) => e.value_type,
                    (None, None) => return None,
                };

                let mut owning_units: Vec<String> = server
                    .into_iter()
                    .chain(client)
                    .flat_map(|e| e.owning_units.iter().cloned())
                    .collect();
                owning_units.sort();
                owning_units.dedup();

                Some(EntityState {
                    name: name.to_string(),
                    value_type,
                    replication,
                    owning_units,
                })
            })
            .collect()
    }

    pub fn global_count(&self) -> Count {
        Count {
            observed: self.observed_global,
            unique: self
                .entries
                .keys()
                .filter(|(_, scope)| !scope.is_entity())
                .count(),
        }
    }

    pub fn entity_count(&self) -> Count {
        let mut names: Vec<&str> = self
            .entries
            .keys()
            .filter(|(_, scope)| scope.is_entity())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        Count {
            observed: self.observed_entity,
            unique: names.len(),
        }
    }
}

fn merged(name: &str, scope: StateScope, entry: &StateEntry) -> MergedState {
    MergedState {
        name: name.to_string(),
        value_type: entry.value_type,
        scope,
        replicated: entry.replicated,
        owning_units: entry.owning_units.clone(),
    }
}

// ============================================================================
// Facade
// ============================================================================

/// @acp:summary "Owns both accumulators for one run"
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    exports: ExportAggregator,
    states: StateAggregator,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_exports(&mut self, unit: &str, records: Vec<ExportRecord>) {
        self.exports.add_exports(unit, records);
    }

    pub fn add_global_states(&mut self, unit: &str, records: Vec<StateRecord>) {
        self.states.add_global_states(unit, records);
    }

    pub fn add_entity_states(&mut self, unit: &str, records: Vec<StateRecord>) {
        self.states.add_entity_states(unit, records);
    }

    /// Feed all three record kinds of one scanned file
    pub fn add_scan(&mut self, unit: &str, scan: ScanResult) {
        self.add_exports(unit, scan.exports);
        self.add_global_states(unit, scan.global_states);
        self.add_entity_states(unit, scan.entity_states);
    }

    pub fn exports(&self) -> &ExportAggregator {
        &self.exports
    }

    pub fn states(&self) -> &StateAggregator {
        &self.states
    }

    pub fn summary(&self) -> Summary {
        Summary {
            exports: Count {
                observed: self.exports.observed(),
                unique: self.exports.unique(),
            },
            global_states: self.states.global_count(),
            entity_states: self.states.entity_count(),
        }
    }

    /// @acp:summary "Produce the sorted, merged view"
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            exports: self.exports.sorted(),
            global_states: self.states.global_states(),
            entity_states: self.states.entity_states(),
            summary: self.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceLocation;

    fn export(identifier: &str, side: Side, file: &str) -> ExportRecord {
        ExportRecord {
            identifier: identifier.to_string(),
            side,
            params: vec![],
            returns: vec![],
            description: String::new(),
            deprecated: None,
            location: SourceLocation {
                file: file.to_string(),
                line: 1,
            },
        }
    }

    fn state(name: &str, value_type: ValueType, scope: StateScope, replicated: bool) -> StateRecord {
        StateRecord {
            name: name.to_string(),
            value_type,
            scope,
            replicated,
            side: Side::Shared,
            location: SourceLocation::default(),
        }
    }

    #[test]
    fn test_exports_concatenate_and_sort() {
        let mut agg = Aggregator::new();
        agg.add_exports("jobs", vec![export("Zed", Side::Server, "a.lua"), export("Add", Side::Server, "a.lua")]);
        agg.add_exports("jobs", vec![export("Add", Side::Server, "b.lua"), export("Ui", Side::Client, "c.lua")]);

        let snap = agg.snapshot();
        let jobs = &snap.exports["jobs"];
        let server: Vec<_> = jobs.server.iter().map(|r| (r.identifier.as_str(), r.location.file.as_str())).collect();
        assert_eq!(server, vec![("Add", "a.lua"), ("Add", "b.lua"), ("Zed", "a.lua")]);
        assert_eq!(jobs.client.len(), 1);
        assert_eq!(snap.summary.exports, Count { observed: 4, unique: 3 });
    }

    #[test]
    fn test_state_merge_unions_units_in_first_sight_order() {
        let mut agg = StateAggregator::new();
        agg.add_global_states("b", vec![state("time", ValueType::Number, StateScope::Global, false)]);
        agg.add_global_states("a", vec![state("time", ValueType::Number, StateScope::Global, false)]);
        agg.add_global_states("b", vec![state("time", ValueType::Number, StateScope::Global, false)]);

        let merged = agg.get("time", StateScope::Global).unwrap();
        assert_eq!(merged.owning_units, vec!["b", "a"]);
        assert_eq!(merged.value_type, ValueType::Number);
        assert_eq!(agg.global_count(), Count { observed: 3, unique: 1 });
    }

    #[test]
    fn test_same_name_different_scope_not_merged() {
        let mut agg = StateAggregator::new();
        agg.add_global_states("a", vec![state("job", ValueType::String, StateScope::Global, false)]);
        agg.add_entity_states("a", vec![state("job", ValueType::Table, StateScope::EntityServer, true)]);

        assert_eq!(agg.global_states()[0].value_type, ValueType::String);
        assert_eq!(agg.entity_states()[0].value_type, ValueType::Table);
    }

    #[test]
    fn test_replication_flag_folds_with_or() {
        let mut agg = StateAggregator::new();
        agg.add_entity_states("a", vec![state("k", ValueType::Boolean, StateScope::EntityServer, false)]);
        agg.add_entity_states("b", vec![state("k", ValueType::Boolean, StateScope::EntityServer, true)]);

        let view = agg.entity_states();
        assert_eq!(view[0].replication, Replication::ToClient);
        assert_eq!(view[0].owning_units, vec!["a", "b"]);
    }
}
