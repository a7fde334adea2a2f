use serde_json::{Map, Value as JsonValue};

use crate::foundation::error::{ComposerError, ComposerResult};
use crate::param::kind::ParamKind;
use crate::param::parameter::Parameter;
use crate::param::table::{ParamId, ParamSlot, ParamTable};
use crate::render::outcome::{RenderAbort, RenderResult};

/// Named parameters of one layer.
///
/// Holds ids into the template's [`ParamTable`]; names are unique and keep insertion order.
#[derive(Clone, Debug, Default)]
pub struct ParameterSet {
    entries: Vec<(String, ParamId)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        table: &mut ParamTable,
        name: impl Into<String>,
        id: ParamId,
    ) -> ComposerResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ComposerError::validation(format!(
                "duplicate input name \"{name}\""
            )));
        }
        if !table.retain(id) {
            return Err(ComposerError::validation(format!(
                "input \"{name}\" refers to a released parameter"
            )));
        }
        self.entries.push((name, id));
        Ok(())
    }

    /// Insert `param` into `table` and add it under `name`.
    pub fn declare<K: ParamKind>(
        &mut self,
        table: &mut ParamTable,
        name: impl Into<String>,
        param: Parameter<K>,
    ) -> ComposerResult<ParamId> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ComposerError::validation(format!(
                "duplicate input name \"{name}\""
            )));
        }
        let id = table.insert(param);
        self.add(table, name, id)?;
        Ok(id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.id(name).is_some()
    }

    pub fn id(&self, name: &str) -> Option<ParamId> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn slot<'t>(&self, table: &'t ParamTable, name: &str) -> Option<&'t ParamSlot> {
        table.slot(self.id(name)?)
    }

    pub fn slot_mut<'t>(&self, table: &'t mut ParamTable, name: &str) -> Option<&'t mut ParamSlot> {
        table.slot_mut(self.id(name)?)
    }

    /// Typed lookup; `None` when absent or of another kind.
    pub fn get<'t, K: ParamKind>(
        &self,
        table: &'t ParamTable,
        name: &str,
    ) -> Option<&'t Parameter<K>> {
        table.get::<K>(self.id(name)?)
    }

    pub fn get_mut<'t, K: ParamKind>(
        &self,
        table: &'t mut ParamTable,
        name: &str,
    ) -> Option<&'t mut Parameter<K>> {
        table.get_mut::<K>(self.id(name)?)
    }

    pub fn value<K: ParamKind>(&self, table: &ParamTable, name: &str) -> Option<K::Value> {
        self.get::<K>(table, name)?.get_value()
    }

    /// Value for render code. Absent or invalid inputs skip the current module.
    pub fn require<K: ParamKind>(&self, table: &ParamTable, name: &str) -> RenderResult<K::Value> {
        let param = self
            .get::<K>(table, name)
            .ok_or_else(|| RenderAbort::skip(format!("no {} input \"{name}\"", K::TAG)))?;
        param
            .get_value()
            .ok_or_else(|| RenderAbort::skip(format!("input \"{name}\" is not valid")))
    }

    /// Share `names` from `other` under the same names.
    pub fn copy_from(
        &mut self,
        table: &mut ParamTable,
        other: &ParameterSet,
        names: &[&str],
    ) -> ComposerResult<()> {
        for name in names {
            self.copy_one(table, other, name, name)?;
        }
        Ok(())
    }

    /// Share parameters from `other`, each pair being `(name in other, name here)`.
    pub fn copy_from_renamed(
        &mut self,
        table: &mut ParamTable,
        other: &ParameterSet,
        pairs: &[(&str, &str)],
    ) -> ComposerResult<()> {
        for (from, to) in pairs {
            self.copy_one(table, other, from, to)?;
        }
        Ok(())
    }

    fn copy_one(
        &mut self,
        table: &mut ParamTable,
        other: &ParameterSet,
        from: &str,
        to: &str,
    ) -> ComposerResult<()> {
        let id = other
            .id(from)
            .ok_or_else(|| ComposerError::validation(format!("no input \"{from}\" to copy")))?;
        self.add(table, to, id)
    }

    /// Insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamId)> {
        self.entries.iter().map(|(n, id)| (n.as_str(), *id))
    }

    /// Editor layout order: stable sort on each parameter's `order`.
    pub fn sorted(&self, table: &ParamTable) -> Vec<(&str, ParamId)> {
        let mut out: Vec<(&str, ParamId)> = self.iter().collect();
        out.sort_by_key(|(_, id)| table.slot(*id).map_or(i32::MAX, ParamSlot::order));
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_valid(&self, table: &ParamTable) -> bool {
        self.entries
            .iter()
            .all(|(_, id)| table.slot(*id).is_some_and(ParamSlot::is_valid))
    }

    /// Parameters the user can act on: with an editor and not disabled.
    pub fn user_inputs(&self, table: &ParamTable) -> usize {
        self.entries
            .iter()
            .filter_map(|(_, id)| table.slot(*id))
            .filter(|s| !s.is_headless() && !s.is_disabled())
            .count()
    }

    pub fn serialize(&self, table: &ParamTable) -> Map<String, JsonValue> {
        self.entries
            .iter()
            .map(|(name, id)| {
                let v = table.slot(*id).map_or(JsonValue::Null, ParamSlot::serialize);
                (name.clone(), v)
            })
            .collect()
    }

    /// Apply persisted values by name. Names not in `inputs` keep their defaults.
    pub fn deserialize(
        &self,
        table: &mut ParamTable,
        inputs: &Map<String, JsonValue>,
    ) -> ComposerResult<()> {
        for (name, id) in &self.entries {
            let Some(json) = inputs.get(name) else {
                continue;
            };
            let slot = table.slot_mut(*id).ok_or_else(|| {
                ComposerError::validation(format!("input \"{name}\" refers to a released parameter"))
            })?;
            slot.deserialize(json)?;
        }
        for name in inputs.keys().filter(|k| !self.contains(k)) {
            tracing::debug!(input = %name, "ignoring persisted value for unknown input");
        }
        Ok(())
    }

    /// Drop this set's references. The set is empty afterwards.
    pub fn release_all(&mut self, table: &mut ParamTable) {
        for (_, id) in self.entries.drain(..) {
            table.release(id);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/param/set.rs"]
mod tests;
