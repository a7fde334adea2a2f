use std::any::Any;

use crate::foundation::error::ComposerResult;
use crate::layer::module::ModuleId;
use crate::layer::{DrawCx, Inputs, LayerState, MenuItem};
use crate::param::table::ParamTable;
use crate::render::outcome::RenderResult;
use crate::render::surface::{RetainedVisual, Surface};

/// A post-processing transform over its module's rendered surface.
pub trait EffectBehavior: Any {
    fn type_name(&self) -> &'static str;

    /// Called exactly once, while the effect is constructed.
    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()>;

    /// Drop per-pass state. Runs before every [`EffectBehavior::apply`].
    fn reset(&mut self);

    /// Transform `surface` in place. `related` is the owning module's retained visual, if any.
    fn apply(
        &mut self,
        layer: &LayerState,
        surface: &mut Surface,
        related: Option<&RetainedVisual>,
        cx: &DrawCx<'_>,
    ) -> RenderResult<()>;
}

/// An effect instance bound to at most one module.
pub struct Effect {
    layer: LayerState,
    owner: Option<ModuleId>,
    behavior: Box<dyn EffectBehavior>,
}

impl Effect {
    pub fn new(mut behavior: Box<dyn EffectBehavior>, table: &mut ParamTable) -> ComposerResult<Self> {
        let mut layer = LayerState::new(behavior.type_name());
        behavior.declare_inputs(&mut Inputs::new(&mut layer.inputs, table))?;
        Ok(Self {
            layer,
            owner: None,
            behavior,
        })
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

    /// Module currently holding this effect.
    pub fn owner(&self) -> Option<ModuleId> {
        self.owner
    }

    pub fn behavior_as<T: EffectBehavior>(&self) -> Option<&T> {
        (self.behavior.as_ref() as &dyn Any).downcast_ref::<T>()
    }

    pub fn is_valid(&self, table: &ParamTable) -> bool {
        self.layer.is_valid(table)
    }

    pub fn user_inputs(&self, table: &ParamTable) -> usize {
        self.layer.user_inputs(table)
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        vec![
            MenuItem::Rename,
            MenuItem::MoveUp,
            MenuItem::MoveDown,
            MenuItem::Remove,
        ]
    }

    pub(crate) fn attach(&mut self, owner: ModuleId, editor: bool) {
        self.owner = Some(owner);
        self.layer.set_editor(editor);
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
    }

    pub(crate) fn run(
        &mut self,
        surface: &mut Surface,
        related: Option<&RetainedVisual>,
        cx: &DrawCx<'_>,
    ) -> RenderResult<()> {
        self.behavior.reset();
        self.behavior.apply(&self.layer, surface, related, cx)
    }

    pub(crate) fn release(&mut self, table: &mut ParamTable) {
        self.layer.release(table);
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("type", &self.layer.type_name())
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
