//! Drawable layers: modules on the template stack and the effects chained after them.

pub mod composite;
pub mod effect;
pub mod handle;
pub mod module;

use crate::foundation::core::Canvas;
use crate::foundation::error::ComposerResult;
use crate::layer::handle::Viewport;
use crate::param::kind::ParamKind;
use crate::param::parameter::Parameter;
use crate::param::set::ParameterSet;
use crate::param::table::{ParamId, ParamTable};

/// State every layer carries: names, editor flag and its inputs.
#[derive(Debug)]
pub struct LayerState {
    type_name: String,
    display_name: Option<String>,
    editor: bool,
    inputs: ParameterSet,
}

impl LayerState {
    pub(crate) fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            display_name: None,
            editor: false,
            inputs: ParameterSet::new(),
        }
    }

    /// Catalog key this layer was built from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name shown in layer lists: the user's rename, else the type name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.type_name)
    }

    pub fn custom_display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn set_display_name(&mut self, name: Option<String>) {
        self.display_name = name.filter(|n| !n.trim().is_empty());
    }

    pub fn is_editor(&self) -> bool {
        self.editor
    }

    pub(crate) fn set_editor(&mut self, editor: bool) {
        self.editor = editor;
    }

    pub fn inputs(&self) -> &ParameterSet {
        &self.inputs
    }

    pub fn is_valid(&self, table: &ParamTable) -> bool {
        self.inputs.is_valid(table)
    }

    pub fn user_inputs(&self, table: &ParamTable) -> usize {
        self.inputs.user_inputs(table)
    }

    pub(crate) fn release(&mut self, table: &mut ParamTable) {
        self.inputs.release_all(table);
    }
}

/// Declaration target handed to a layer once, at construction.
pub struct Inputs<'a> {
    set: &'a mut ParameterSet,
    table: &'a mut ParamTable,
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(set: &'a mut ParameterSet, table: &'a mut ParamTable) -> Self {
        Self { set, table }
    }

    pub fn add<K: ParamKind>(&mut self, name: &str, param: Parameter<K>) -> ComposerResult<ParamId> {
        self.set.declare(self.table, name, param)
    }

    /// Share parameters of another layer under the same names.
    pub fn copy_from(&mut self, other: &ParameterSet, names: &[&str]) -> ComposerResult<()> {
        self.set.copy_from(self.table, other, names)
    }

    pub fn copy_from_renamed(
        &mut self,
        other: &ParameterSet,
        pairs: &[(&str, &str)],
    ) -> ComposerResult<()> {
        self.set.copy_from_renamed(self.table, other, pairs)
    }

    pub fn table(&mut self) -> &mut ParamTable {
        &mut *self.table
    }
}

/// Read-only view of the document a module or effect draws against.
#[derive(Clone, Copy)]
pub struct DrawCx<'a> {
    pub table: &'a ParamTable,
    pub editor: bool,
    pub canvas: Canvas,
    pub viewport: Viewport,
}

/// Mutable view handed to input-event handlers.
pub struct EventCx<'a> {
    pub table: &'a mut ParamTable,
    pub editor: bool,
    pub canvas: Canvas,
}

/// Entries of a layer's context menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuItem {
    Rename,
    AddEffect,
    MoveUp,
    MoveDown,
    Remove,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rename => "Rename",
            Self::AddEffect => "Add Effect",
            Self::MoveUp => "Move Up",
            Self::MoveDown => "Move Down",
            Self::Remove => "Remove",
        }
    }
}
