//! The editing session: one active template driven from the UI thread.

use std::rc::Rc;

use crate::context::{AppContext, UiMessage};
use crate::foundation::core::Canvas;
use crate::foundation::error::{ComposerError, ComposerResult, LayerKind};
use crate::layer::EventCx;
use crate::layer::handle::{PointerEvent, PointerKind, ResizeHandle};
use crate::modules::{ImageModule, ImportStatus};
use crate::param::undo::{UndoEntry, UndoLog};
use crate::render::compositor::{Compositor, FrameRGBA, RenderMode, RenderedFrame};
use crate::template::persist::TemplateDef;
use crate::template::{LayerRef, MenuAction, Template};

/// Owns the active template and everything needed to edit and render it.
///
/// Parameters of an installed template are wired once: their update listeners request a render
/// from the scheduler and their changes are routed into the context's undo sink.
pub struct Session {
    cx: AppContext,
    template: Option<Template>,
    compositor: Compositor,
    mode: RenderMode,
    selected: Option<usize>,
    handle: ResizeHandle,
    // Parameters with a lower table index are already wired.
    wired_upto: usize,
    last_frame: Option<RenderedFrame>,
}

impl Session {
    pub fn new(cx: AppContext) -> Self {
        let compositor = Compositor::new(cx.opts.clone());
        Self {
            cx,
            template: None,
            compositor,
            mode: RenderMode::Display,
            selected: None,
            handle: ResizeHandle::new(),
            wired_upto: 0,
            last_frame: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.cx
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Direct access for parameter edits. Structural changes should go through the session.
    pub fn template_mut(&mut self) -> Option<&mut Template> {
        self.template.as_mut()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        if self.mode != mode {
            self.mode = mode;
            self.cx.scheduler.request();
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn resize_handle(&self) -> &ResizeHandle {
        &self.handle
    }

    /// Frame from the latest pass, partial if that pass failed.
    pub fn last_frame(&self) -> Option<&RenderedFrame> {
        self.last_frame.as_ref()
    }

    /// Load a stored template and make it active. On failure the current template stays.
    #[tracing::instrument(skip(self))]
    pub fn open(&mut self, name: &str) -> ComposerResult<()> {
        let template = self
            .cx
            .catalog
            .load_template(name)?
            .ok_or_else(|| ComposerError::validation(format!("no template named \"{name}\"")))?;
        self.install(template);
        Ok(())
    }

    pub fn open_def(&mut self, def: &TemplateDef) -> ComposerResult<()> {
        let template = Template::from_def(def, self.cx.catalog.as_ref())?;
        self.install(template);
        Ok(())
    }

    pub fn new_template(&mut self, name: &str, width: u32, height: u32) -> ComposerResult<()> {
        let canvas = Canvas::new(width, height)?;
        self.install(Template::new(name, canvas));
        Ok(())
    }

    /// Make `template` active, replacing (and dropping) the current one.
    ///
    /// Parameter ids restart with every template, so the undo history is cleared.
    pub fn install(&mut self, mut template: Template) {
        template.set_editor(true);
        self.cx.undo.clear();
        self.template = Some(template);
        self.selected = None;
        self.handle.unlink();
        self.wired_upto = 0;
        self.last_frame = None;
        self.wire_new_params();
        self.cx.scheduler.request();
    }

    pub fn close(&mut self) -> Option<Template> {
        self.selected = None;
        self.handle.unlink();
        self.last_frame = None;
        self.template.take()
    }

    pub fn save(&self) -> ComposerResult<()> {
        self.cx.catalog.save_template(self.active()?)
    }

    pub fn add_module(&mut self, type_name: &str, index: usize) -> ComposerResult<usize> {
        let catalog = Rc::clone(&self.cx.catalog);
        let template = self.active_mut()?;
        let module = catalog
            .create_module(type_name, template.params_mut())?
            .ok_or_else(|| ComposerError::missing_type(LayerKind::Module, type_name))?;
        let at = template.insert_module(index, module);
        if let Some(sel) = self.selected.as_mut()
            && *sel >= at
        {
            *sel += 1;
        }
        self.wire_new_params();
        self.cx.scheduler.request();
        Ok(at)
    }

    pub fn add_effect(&mut self, module: usize, name: &str) -> ComposerResult<usize> {
        let catalog = Rc::clone(&self.cx.catalog);
        let template = self.active_mut()?;
        let effect = catalog
            .create_effect(name, template.params_mut())?
            .ok_or_else(|| ComposerError::missing_type(LayerKind::Effect, name))?;
        let at = template.add_effect(module, effect)?;
        self.wire_new_params();
        self.cx.scheduler.request();
        Ok(at)
    }

    /// Carry out a layer menu choice.
    pub fn menu_action(&mut self, target: LayerRef, action: MenuAction) -> ComposerResult<()> {
        if let MenuAction::AddEffect(name) = &action {
            let module = match target {
                LayerRef::Module(i) | LayerRef::Effect { module: i, .. } => i,
            };
            return self.add_effect(module, name).map(|_| ());
        }
        let restructures = matches!(
            (target, &action),
            (
                LayerRef::Module(_),
                MenuAction::Remove | MenuAction::MoveUp | MenuAction::MoveDown
            )
        );
        if restructures {
            self.select(None)?;
        }
        self.active_mut()?.apply_menu(target, &action)?;
        self.cx.scheduler.request();
        Ok(())
    }

    /// Change the selected module, notifying both sides and relinking the resize handle.
    pub fn select(&mut self, index: Option<usize>) -> ComposerResult<()> {
        let previous = self.selected;
        let Some(template) = self.template.as_mut() else {
            self.selected = None;
            return Ok(());
        };
        let (modules, table) = template.parts_mut();
        if let Some(i) = index
            && i >= modules.len()
        {
            return Err(ComposerError::validation(format!("no module at index {i}")));
        }
        if previous == index {
            return Ok(());
        }
        if let Some(m) = previous.and_then(|i| modules.get_mut(i)) {
            m.on_selection_change(false, table);
        }
        self.handle.unlink();
        if let Some(m) = index.and_then(|i| modules.get_mut(i)) {
            m.on_selection_change(true, table);
            m.link_resize_handle(&mut self.handle, table);
        }
        self.selected = index;
        Ok(())
    }

    /// Route pointer input: the resize handle first, then the selected module.
    pub fn pointer_event(&mut self, event: PointerEvent) -> ComposerResult<bool> {
        let Some(i) = self.selected else {
            return Ok(false);
        };
        let Some(template) = self.template.as_mut() else {
            return Ok(false);
        };
        let canvas = template.canvas();
        let editor = template.is_editor();
        let (modules, table) = template.parts_mut();

        match event.kind {
            PointerKind::Press if self.handle.begin_drag(table, event.position) => return Ok(true),
            PointerKind::Drag if self.handle.is_dragging() => {
                self.handle.drag_to(table, event.position);
                return Ok(true);
            }
            PointerKind::Release if self.handle.is_dragging() => {
                self.handle.end_drag();
                return Ok(true);
            }
            _ => {}
        }

        let Some(module) = modules.get_mut(i) else {
            return Ok(false);
        };
        let mut ecx = EventCx {
            table,
            editor,
            canvas,
        };
        let consumed = module.on_input_event(&event, &mut ecx)?;
        // Hovering changes no parameter, so nothing else asks for the redraw.
        if consumed && event.kind == PointerKind::Hover {
            self.cx.scheduler.request();
        }
        Ok(consumed)
    }

    /// Hand encoded image bytes to an image module.
    pub fn import_image(&mut self, module: usize, bytes: Vec<u8>) -> ComposerResult<ImportStatus> {
        let notify = self.cx.dispatcher.sender();
        let template = self.active_mut()?;
        let (modules, table) = template.parts_mut();
        let m = modules
            .get_mut(module)
            .ok_or_else(|| ComposerError::validation(format!("no module at index {module}")))?;
        m.with_behavior_mut::<ImageModule, _>(|img, layer| {
            img.import(layer, table, bytes, Some(notify))
        })
        .ok_or_else(|| ComposerError::validation(format!("module {module} is not an image module")))?
    }

    /// Drain deferred work, then run one coalesced render if any was requested.
    ///
    /// Returns `true` when a pass ran. A failed deferred task is logged and reported after the
    /// render, so one bad task does not starve the rest of the queue.
    pub fn pump(&mut self) -> ComposerResult<bool> {
        let mut first_err = None;
        for msg in self.cx.dispatcher.drain()? {
            match msg {
                UiMessage::RequestRender => self.cx.scheduler.request(),
                UiMessage::Run(task) => {
                    if let Err(e) = task(self) {
                        tracing::error!(error = %e, "deferred task failed");
                        first_err.get_or_insert(e);
                    }
                }
            }
        }

        let scheduler = self.cx.scheduler.clone();
        let rendered = match scheduler.flush(|| self.render_pass()) {
            None => false,
            Some(result) => {
                result?;
                true
            }
        };
        match first_err {
            Some(e) => Err(e),
            None => Ok(rendered),
        }
    }

    /// Render immediately, bypassing coalescing.
    pub fn render_now(&mut self) -> ComposerResult<&RenderedFrame> {
        self.render_pass()?;
        self.last_frame
            .as_ref()
            .ok_or_else(|| ComposerError::validation("no template is open"))
    }

    /// Render for output: no checkerboard, editor mode off for the pass.
    pub fn export(&mut self) -> ComposerResult<FrameRGBA> {
        let template = self.template.as_mut().ok_or_else(no_template)?;
        template.set_editor(false);
        let result = self.compositor.render(template, RenderMode::Export);
        template.set_editor(true);
        match result {
            Ok(out) => Ok(out.frame),
            Err(failure) => {
                tracing::error!(module = ?failure.module, error = %failure.error, "export aborted");
                Err(failure.error)
            }
        }
    }

    /// Step back through `log`. Returns `false` when there was nothing to undo.
    pub fn undo(&mut self, log: &UndoLog) -> ComposerResult<bool> {
        match log.pop_undo() {
            Some(entry) => self.apply_entry(&entry, false),
            None => Ok(false),
        }
    }

    pub fn redo(&mut self, log: &UndoLog) -> ComposerResult<bool> {
        match log.pop_redo() {
            Some(entry) => self.apply_entry(&entry, true),
            None => Ok(false),
        }
    }

    fn apply_entry(&mut self, entry: &UndoEntry, forward: bool) -> ComposerResult<bool> {
        let Some(id) = entry.param else {
            return Ok(false);
        };
        let template = self.active_mut()?;
        let Some(slot) = template.params_mut().slot_mut(id) else {
            tracing::debug!(label = %entry.label, "undo target no longer exists");
            return Ok(false);
        };
        slot.restore(if forward { &entry.after } else { &entry.before })?;
        Ok(true)
    }

    fn render_pass(&mut self) -> ComposerResult<()> {
        let Some(template) = self.template.as_mut() else {
            return Ok(());
        };
        match self.compositor.render(template, self.mode) {
            Ok(frame) => {
                self.last_frame = Some(frame);
                Ok(())
            }
            Err(failure) => {
                tracing::error!(module = ?failure.module, error = %failure.error, "render pass aborted");
                self.last_frame = Some(failure.partial);
                Err(failure.error)
            }
        }
    }

    fn wire_new_params(&mut self) {
        let Some(template) = self.template.as_mut() else {
            return;
        };
        let listener = self.cx.scheduler.listener();
        let mut next = self.wired_upto;
        for (id, slot) in template.params_mut().iter_mut() {
            if id.index() < self.wired_upto {
                continue;
            }
            slot.register_update_listener(Rc::clone(&listener));
            slot.register_undo_once(&self.cx.undo);
            next = next.max(id.index() + 1);
        }
        self.wired_upto = next;
    }

    fn active(&self) -> ComposerResult<&Template> {
        self.template.as_ref().ok_or_else(no_template)
    }

    fn active_mut(&mut self) -> ComposerResult<&mut Template> {
        self.template.as_mut().ok_or_else(no_template)
    }
}

fn no_template() -> ComposerError {
    ComposerError::validation("no template is open")
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("template", &self.template.as_ref().map(Template::name))
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/session/session.rs"]
mod tests;
