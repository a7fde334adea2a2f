use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Region;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::layer::effect::Effect;
use crate::layer::handle::{PointerEvent, ResizeHandle, Viewport};
use crate::layer::{DrawCx, EventCx, Inputs, LayerState, MenuItem};
use crate::param::kinds::RegionKind;
use crate::param::table::ParamTable;
use crate::render::outcome::{RenderAbort, RenderResult};
use crate::render::surface::{RetainedVisual, Surface};

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique module identity, used for effect back-references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl ModuleId {
    fn next() -> Self {
        Self(NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a module type does. [`Module`] owns the shared plumbing around it.
///
/// A procedural module draws into its surface every pass. A node module (`is_node`) instead
/// hands the compositor a [`RetainedVisual`], which is bound into the surface and passed to
/// effects as the related node.
pub trait ModuleBehavior: Any {
    fn type_name(&self) -> &'static str;

    /// Called exactly once, while the module is constructed.
    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()>;

    fn draw(
        &mut self,
        _layer: &LayerState,
        _surface: &mut Surface,
        _cx: &DrawCx<'_>,
    ) -> RenderResult<()> {
        Ok(())
    }

    fn is_node(&self) -> bool {
        false
    }

    fn retained_visual(
        &mut self,
        _layer: &LayerState,
        _cx: &DrawCx<'_>,
    ) -> RenderResult<RetainedVisual> {
        Err(RenderAbort::Fail(ComposerError::render(format!(
            "module \"{}\" has no retained visual",
            self.type_name()
        ))))
    }

    /// Pre-pass hook with write access to parameters, run before layout.
    fn prepare(&mut self, _layer: &LayerState, _table: &mut ParamTable) -> ComposerResult<()> {
        Ok(())
    }

    fn request_layout(
        &mut self,
        _layer: &LayerState,
        _viewport: &mut Viewport,
        _table: &mut ParamTable,
    ) -> RenderResult<()> {
        Ok(())
    }

    /// Returns `true` when the event was consumed.
    fn on_input_event(
        &mut self,
        _layer: &LayerState,
        _event: &PointerEvent,
        _cx: &mut EventCx<'_>,
    ) -> ComposerResult<bool> {
        Ok(false)
    }

    fn on_selection_change(&mut self, _layer: &LayerState, _selected: bool, _table: &mut ParamTable) {}

    fn bounds(&self, layer: &LayerState, table: &ParamTable) -> Option<Region> {
        layer.inputs().value::<RegionKind>(table, "Location")
    }

    fn link_resize_handle(&self, layer: &LayerState, handle: &mut ResizeHandle, _table: &ParamTable) {
        match layer.inputs().id("Location") {
            Some(id) => handle.link(id, true),
            None => handle.unlink(),
        }
    }

    fn set_editor(&mut self, _editor: bool) {}

    fn release(&mut self, _table: &mut ParamTable) {}
}

/// One entry of a template's stack: a behavior, its inputs, its effect chain and its surface.
pub struct Module {
    id: ModuleId,
    layer: LayerState,
    effects: Vec<Effect>,
    behavior: Box<dyn ModuleBehavior>,
    surface: Surface,
}

impl Module {
    pub fn new(mut behavior: Box<dyn ModuleBehavior>, table: &mut ParamTable) -> ComposerResult<Self> {
        let mut layer = LayerState::new(behavior.type_name());
        behavior.declare_inputs(&mut Inputs::new(&mut layer.inputs, table))?;
        Ok(Self {
            id: ModuleId::next(),
            layer,
            effects: Vec::new(),
            behavior,
            surface: Surface::new(0, 0),
        })
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn layer(&self) -> &LayerState {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut LayerState {
        &mut self.layer
    }

    pub fn type_name(&self) -> &str {
        self.layer.type_name()
    }

    pub fn display_name(&self) -> &str {
        self.layer.display_name()
    }

    pub fn is_node(&self) -> bool {
        self.behavior.is_node()
    }

    pub fn behavior(&self) -> &dyn ModuleBehavior {
        self.behavior.as_ref()
    }

    pub fn behavior_as<T: ModuleBehavior>(&self) -> Option<&T> {
        (self.behavior.as_ref() as &dyn Any).downcast_ref::<T>()
    }

    pub fn behavior_as_mut<T: ModuleBehavior>(&mut self) -> Option<&mut T> {
        (self.behavior.as_mut() as &mut dyn Any).downcast_mut::<T>()
    }

    /// Run `f` against the concrete behavior alongside the module's layer state.
    pub fn with_behavior_mut<T: ModuleBehavior, R>(
        &mut self,
        f: impl FnOnce(&mut T, &LayerState) -> R,
    ) -> Option<R> {
        let behavior = (self.behavior.as_mut() as &mut dyn Any).downcast_mut::<T>()?;
        Some(f(behavior, &self.layer))
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut [Effect] {
        &mut self.effects
    }

    /// Take ownership of `effect`, pointing its back-reference here.
    pub fn add_effect(&mut self, effect: Effect) {
        let at = self.effects.len();
        self.insert_effect(at, effect);
    }

    pub fn insert_effect(&mut self, index: usize, mut effect: Effect) {
        effect.attach(self.id, self.layer.is_editor());
        let index = index.min(self.effects.len());
        self.effects.insert(index, effect);
    }

    /// Detach and return the effect at `index`; its back-reference is cleared.
    pub fn remove_effect(&mut self, index: usize) -> Option<Effect> {
        if index >= self.effects.len() {
            return None;
        }
        let mut effect = self.effects.remove(index);
        effect.detach();
        Some(effect)
    }

    pub fn move_effect(&mut self, from: usize, to: usize) -> bool {
        if from >= self.effects.len() || to >= self.effects.len() {
            return false;
        }
        let effect = self.effects.remove(from);
        self.effects.insert(to, effect);
        true
    }

    /// Set the editor flag on this module, its effects and any children.
    pub fn set_editor(&mut self, editor: bool) {
        self.layer.set_editor(editor);
        for effect in &mut self.effects {
            effect.layer_mut().set_editor(editor);
        }
        self.behavior.set_editor(editor);
    }

    /// Own inputs valid and every effect valid.
    pub fn is_valid(&self, table: &ParamTable) -> bool {
        self.layer.is_valid(table) && self.effects.iter().all(|e| e.is_valid(table))
    }

    pub fn user_inputs(&self, table: &ParamTable) -> usize {
        self.layer.user_inputs(table)
            + self
                .effects
                .iter()
                .map(|e| e.user_inputs(table))
                .sum::<usize>()
    }

    pub fn bounds(&self, table: &ParamTable) -> Option<Region> {
        self.behavior.bounds(&self.layer, table)
    }

    pub fn link_resize_handle(&self, handle: &mut ResizeHandle, table: &ParamTable) {
        self.behavior.link_resize_handle(&self.layer, handle, table);
    }

    pub fn on_input_event(&mut self, event: &PointerEvent, cx: &mut EventCx<'_>) -> ComposerResult<bool> {
        self.behavior.on_input_event(&self.layer, event, cx)
    }

    pub fn on_selection_change(&mut self, selected: bool, table: &mut ParamTable) {
        self.behavior.on_selection_change(&self.layer, selected, table);
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        vec![
            MenuItem::Rename,
            MenuItem::AddEffect,
            MenuItem::MoveUp,
            MenuItem::MoveDown,
            MenuItem::Remove,
        ]
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub(crate) fn prepare(&mut self, table: &mut ParamTable) -> ComposerResult<()> {
        self.behavior.prepare(&self.layer, table)
    }

    pub(crate) fn request_layout(
        &mut self,
        viewport: &mut Viewport,
        table: &mut ParamTable,
    ) -> RenderResult<()> {
        self.behavior.request_layout(&self.layer, viewport, table)
    }

    pub(crate) fn clear_surface(&mut self, width: u32, height: u32, origin: (i32, i32)) {
        self.surface.reset(width, height, origin);
    }

    /// Draw (or bind the retained visual), then reset and apply each effect in chain order.
    ///
    /// The surface must already be cleared for this pass.
    pub(crate) fn render(&mut self, cx: &DrawCx<'_>) -> RenderResult<()> {
        let related = if self.behavior.is_node() {
            let visual = self.behavior.retained_visual(&self.layer, cx)?;
            visual.bind(&mut self.surface)?;
            Some(visual)
        } else {
            self.behavior.draw(&self.layer, &mut self.surface, cx)?;
            None
        };
        for effect in &mut self.effects {
            effect.run(&mut self.surface, related.as_ref(), cx)?;
        }
        Ok(())
    }

    /// Release this module's parameter references, including effects and children.
    pub(crate) fn release(&mut self, table: &mut ParamTable) {
        self.layer.release(table);
        for effect in &mut self.effects {
            effect.release(table);
        }
        self.behavior.release(table);
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("type", &self.layer.type_name())
            .field("display_name", &self.layer.display_name())
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/module.rs"]
mod tests;
