//! Templates: the ordered module stack, its canvas, and the parameter table behind it.

pub mod catalog;
pub mod persist;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::layer::effect::Effect;
use crate::layer::module::Module;
use crate::param::table::ParamTable;

/// Addresses a module (by stack index) or one of its effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerRef {
    Module(usize),
    Effect { module: usize, effect: usize },
}

/// A layer menu action with its argument, as chosen in the shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Rename(Option<String>),
    AddEffect(String),
    MoveUp,
    MoveDown,
    Remove,
}

/// An editable document: modules (index 0 is the top of the stack) over a fixed-size canvas.
///
/// The template owns the [`ParamTable`] every one of its modules and effects declares into;
/// modules must be built against [`Template::params_mut`].
#[derive(Debug)]
pub struct Template {
    name: String,
    canvas: Canvas,
    modules: Vec<Module>,
    params: ParamTable,
    editor: bool,
}

impl Template {
    pub fn new(name: impl Into<String>, canvas: Canvas) -> Self {
        Self {
            name: name.into(),
            canvas,
            modules: Vec::new(),
            params: ParamTable::new(),
            editor: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn is_editor(&self) -> bool {
        self.editor
    }

    /// Switch editor mode on every module, effect and child.
    pub fn set_editor(&mut self, editor: bool) {
        self.editor = editor;
        for m in &mut self.modules {
            m.set_editor(editor);
        }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, index: usize) -> Option<&Module> {
        self.modules.get(index)
    }

    pub fn module_mut(&mut self, index: usize) -> Option<&mut Module> {
        self.modules.get_mut(index)
    }

    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamTable {
        &mut self.params
    }

    /// Split borrow for passes that walk modules while touching parameters.
    pub fn parts_mut(&mut self) -> (&mut [Module], &mut ParamTable) {
        (&mut self.modules, &mut self.params)
    }

    /// Insert at `index` (clamped); index 0 puts the module on top.
    pub fn insert_module(&mut self, index: usize, mut module: Module) -> usize {
        module.set_editor(self.editor);
        let index = index.min(self.modules.len());
        self.modules.insert(index, module);
        index
    }

    /// Append at the bottom of the stack.
    pub fn push_module(&mut self, module: Module) -> usize {
        let at = self.modules.len();
        self.insert_module(at, module)
    }

    /// Remove a module and drop its parameters (shared ones survive while still referenced).
    pub fn remove_module(&mut self, index: usize) -> ComposerResult<()> {
        if index >= self.modules.len() {
            return Err(ComposerError::validation(format!(
                "no module at index {index}"
            )));
        }
        let mut module = self.modules.remove(index);
        module.release(&mut self.params);
        Ok(())
    }

    pub fn move_module(&mut self, from: usize, to: usize) -> bool {
        if from >= self.modules.len() || to >= self.modules.len() {
            return false;
        }
        let m = self.modules.remove(from);
        self.modules.insert(to, m);
        true
    }

    pub fn add_effect(&mut self, module: usize, effect: Effect) -> ComposerResult<usize> {
        let m = self
            .modules
            .get_mut(module)
            .ok_or_else(|| ComposerError::validation(format!("no module at index {module}")))?;
        m.add_effect(effect);
        Ok(m.effects().len() - 1)
    }

    pub fn remove_effect(&mut self, module: usize, effect: usize) -> ComposerResult<()> {
        let mut removed = self
            .modules
            .get_mut(module)
            .and_then(|m| m.remove_effect(effect))
            .ok_or_else(|| {
                ComposerError::validation(format!("no effect {effect} on module {module}"))
            })?;
        removed.release(&mut self.params);
        Ok(())
    }

    /// Apply a menu action that needs no catalog. `AddEffect` is rejected here.
    pub fn apply_menu(&mut self, target: LayerRef, action: &MenuAction) -> ComposerResult<()> {
        match (target, action) {
            (_, MenuAction::AddEffect(_)) => Err(ComposerError::validation(
                "adding an effect needs a catalog",
            )),
            (LayerRef::Module(i), MenuAction::Rename(name)) => {
                self.module_at(i)?.layer_mut().set_display_name(name.clone());
                Ok(())
            }
            (LayerRef::Module(i), MenuAction::Remove) => self.remove_module(i),
            (LayerRef::Module(i), MenuAction::MoveUp) => {
                self.module_at(i)?;
                if i > 0 {
                    self.move_module(i, i - 1);
                }
                Ok(())
            }
            (LayerRef::Module(i), MenuAction::MoveDown) => {
                self.module_at(i)?;
                if i + 1 < self.modules.len() {
                    self.move_module(i, i + 1);
                }
                Ok(())
            }
            (LayerRef::Effect { module, effect }, MenuAction::Rename(name)) => {
                let e = self
                    .module_at(module)?
                    .effects_mut()
                    .get_mut(effect)
                    .ok_or_else(|| ComposerError::validation(format!("no effect {effect}")))?;
                e.layer_mut().set_display_name(name.clone());
                Ok(())
            }
            (LayerRef::Effect { module, effect }, MenuAction::Remove) => {
                self.remove_effect(module, effect)
            }
            (LayerRef::Effect { module, effect }, MenuAction::MoveUp) => {
                let m = self.module_at(module)?;
                if effect > 0 {
                    m.move_effect(effect, effect - 1);
                }
                Ok(())
            }
            (LayerRef::Effect { module, effect }, MenuAction::MoveDown) => {
                let m = self.module_at(module)?;
                m.move_effect(effect, effect + 1);
                Ok(())
            }
        }
    }

    /// Every module valid, including each module's effects.
    pub fn is_valid(&self) -> bool {
        self.modules.iter().all(|m| m.is_valid(&self.params))
    }

    pub fn user_inputs(&self) -> usize {
        self.modules.iter().map(|m| m.user_inputs(&self.params)).sum()
    }

    fn module_at(&mut self, index: usize) -> ComposerResult<&mut Module> {
        self.modules
            .get_mut(index)
            .ok_or_else(|| ComposerError::validation(format!("no module at index {index}")))
    }
}

impl Drop for Template {
    fn drop(&mut self) {
        tracing::trace!(template = %self.name, modules = self.modules.len(), "dropping template");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/template.rs"]
mod tests;
