use std::any::Any;

use crate::foundation::core::Region;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::layer::handle::{ResizeHandle, Viewport};
use crate::layer::module::{Module, ModuleBehavior};
use crate::layer::{DrawCx, Inputs, LayerState};
use crate::param::table::ParamTable;
use crate::render::outcome::{RenderAbort, RenderResult};
use crate::render::surface::Surface;

/// A module assembled from child modules.
///
/// Children are built once by [`CompositeBehavior::compose_children`]; the composite then
/// re-exposes whichever child inputs it wants by sharing them into its own set.
pub trait CompositeBehavior: Any {
    fn type_name(&self) -> &'static str;

    fn compose_children(&mut self, table: &mut ParamTable) -> ComposerResult<Vec<Module>>;

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>, children: &[Module]) -> ComposerResult<()>;

    /// Position children for this pass; may grow the viewport.
    fn request_layout(
        &mut self,
        layer: &LayerState,
        children: &mut [Module],
        viewport: &mut Viewport,
        table: &mut ParamTable,
    ) -> RenderResult<()>;

    /// Child whose bounds and resize handle stand for the whole composite.
    fn primary_child(&self) -> usize {
        0
    }

    fn resize_draggable(&self) -> bool {
        false
    }
}

/// [`ModuleBehavior`] adapter over a [`CompositeBehavior`].
///
/// Children render bottom-to-top (last child first), each into a scratch surface that is then
/// composited into the composite's own surface.
pub struct CompositeModule<B> {
    inner: B,
    children: Vec<Module>,
    composed: bool,
}

impl<B: CompositeBehavior> CompositeModule<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            children: Vec::new(),
            composed: false,
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn children(&self) -> &[Module] {
        &self.children
    }

    fn primary(&self) -> Option<&Module> {
        self.children.get(self.inner.primary_child())
    }
}

impl<B: CompositeBehavior> ModuleBehavior for CompositeModule<B> {
    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    fn declare_inputs(&mut self, inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        if self.composed {
            return Err(ComposerError::validation(format!(
                "composite \"{}\" already composed",
                self.inner.type_name()
            )));
        }
        self.children = self.inner.compose_children(inputs.table())?;
        self.composed = true;
        self.inner.declare_inputs(inputs, &self.children)
    }

    fn draw(&mut self, _layer: &LayerState, surface: &mut Surface, cx: &DrawCx<'_>) -> RenderResult<()> {
        let (w, h, origin) = (surface.width(), surface.height(), surface.origin());
        for (i, child) in self.children.iter_mut().enumerate().rev() {
            child.clear_surface(w, h, origin);
            match child.render(cx) {
                Ok(()) => surface.draw_surface(child.surface(), 1.0)?,
                // A skipped child leaves a hole; the rest of the composite still draws.
                Err(RenderAbort::Skip(reason)) => {
                    tracing::debug!(child = i, kind = child.type_name(), %reason, "child skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn prepare(&mut self, _layer: &LayerState, table: &mut ParamTable) -> ComposerResult<()> {
        for child in &mut self.children {
            child.prepare(table)?;
        }
        Ok(())
    }

    fn request_layout(
        &mut self,
        layer: &LayerState,
        viewport: &mut Viewport,
        table: &mut ParamTable,
    ) -> RenderResult<()> {
        self.inner
            .request_layout(layer, &mut self.children, viewport, table)?;
        for (i, child) in self.children.iter_mut().enumerate() {
            match child.request_layout(viewport, table) {
                Ok(()) => {}
                // A skipped child stays blank; its siblings still lay out.
                Err(RenderAbort::Skip(reason)) => {
                    tracing::debug!(child = i, kind = child.type_name(), %reason, "child layout skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn bounds(&self, _layer: &LayerState, table: &ParamTable) -> Option<Region> {
        self.primary()?.bounds(table)
    }

    fn link_resize_handle(&self, _layer: &LayerState, handle: &mut ResizeHandle, table: &ParamTable) {
        match self.primary() {
            Some(child) => {
                child.link_resize_handle(handle, table);
                handle.set_draggable(self.inner.resize_draggable());
            }
            None => handle.unlink(),
        }
    }

    fn set_editor(&mut self, editor: bool) {
        for child in &mut self.children {
            child.set_editor(editor);
        }
    }

    fn release(&mut self, table: &mut ParamTable) {
        for child in &mut self.children {
            child.release(table);
        }
    }
}
