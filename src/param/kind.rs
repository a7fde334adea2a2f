use serde_json::Value as JsonValue;

use crate::foundation::error::ComposerResult;
use crate::param::parameter::Parameter;
use crate::param::table::ParamSlot;

/// A value kind a [`Parameter`] can hold: its editor handle, parser and JSON converter.
///
/// The set of kinds is closed; each kind has a matching [`ParamSlot`] variant so parameters of
/// different kinds can share one table.
pub trait ParamKind: Sized + 'static {
    /// Value produced by a successful read.
    type Value: Clone + PartialEq + std::fmt::Debug;
    /// Editor-side state the shell binds a widget to.
    type Handle: std::fmt::Debug;

    /// Short name used in diagnostics.
    const TAG: &'static str;

    /// Build the editor handle. `None` makes the parameter headless.
    fn create_handle(&self) -> Option<Self::Handle>;

    /// Parse the handle's current content. Fails with `InvalidInput` when it does not parse.
    fn read_value(&self, handle: &Self::Handle) -> ComposerResult<Self::Value>;

    /// Overwrite the handle's content. Never notifies listeners.
    fn write_value(&self, handle: &mut Self::Handle, value: &Self::Value);

    fn is_semantically_valid(&self, _value: &Self::Value) -> bool {
        true
    }

    fn to_json(&self, value: &Self::Value) -> JsonValue;

    fn from_json(&self, json: &JsonValue) -> Result<Self::Value, String>;

    fn into_slot(param: Parameter<Self>) -> ParamSlot;

    fn from_slot(slot: &ParamSlot) -> Option<&Parameter<Self>>;

    fn from_slot_mut(slot: &mut ParamSlot) -> Option<&mut Parameter<Self>>;
}
