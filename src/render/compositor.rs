use crate::foundation::core::{Canvas, Color};
use crate::foundation::error::ComposerError;
use crate::layer::DrawCx;
use crate::layer::handle::Viewport;
use crate::render::composite::checkerboard;
use crate::render::outcome::RenderAbort;
use crate::render::surface::Surface;
use crate::template::Template;

/// Compositor configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositorOpts {
    /// Edge length of one checkerboard square, in pixels.
    pub checker_cell: u32,
    pub checker_light: [u8; 4],
    pub checker_dark: [u8; 4],
    /// Export background. `None` leaves it transparent.
    pub clear_rgba: Option<[u8; 4]>,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            checker_cell: 5,
            checker_light: [255, 255, 255, 255],
            checker_dark: [211, 211, 211, 255],
            clear_rgba: None,
        }
    }
}

impl CompositorOpts {
    /// Defaults, with `TESSERA_CHECKER_CELL` overriding the cell size when set to a positive integer.
    pub fn from_env() -> Self {
        let checker_cell = std::env::var("TESSERA_CHECKER_CELL")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(5);
        Self {
            checker_cell,
            ..Self::default()
        }
    }

    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Editor display: checkerboard behind transparent areas.
    #[default]
    Display,
    /// Final output: no checkerboard.
    Export,
}

/// A composited frame. `data` is RGBA8, premultiplied unless converted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Convert to straight alpha (no-op if already straight).
    pub fn into_straight(mut self) -> Self {
        if self.premultiplied {
            crate::foundation::math::unpremultiply_in_place(&mut self.data);
            self.premultiplied = false;
        }
        self
    }
}

/// A module that skipped its draw this pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedModule {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct RenderedFrame {
    pub frame: FrameRGBA,
    /// Where canvas `(0, 0)` sits in the frame.
    pub origin: (i32, i32),
    pub skipped: Vec<SkippedModule>,
}

/// A pass aborted by an unexpected failure. `partial` holds everything composited anyway.
#[derive(Debug, thiserror::Error)]
#[error("render pass aborted{}: {error}", module.map(|i| format!(" at module {i}")).unwrap_or_default())]
pub struct RenderFailure {
    pub module: Option<usize>,
    #[source]
    pub error: ComposerError,
    pub partial: RenderedFrame,
}

/// Runs render passes over a template's module stack.
#[derive(Debug)]
pub struct Compositor {
    opts: CompositorOpts,
    background: Surface,
}

impl Compositor {
    pub fn new(opts: CompositorOpts) -> Self {
        Self {
            opts,
            background: Surface::new(0, 0),
        }
    }

    pub fn opts(&self) -> &CompositorOpts {
        &self.opts
    }

    /// One full pass: prepare, layout, clear, background, draw back to front, composite.
    ///
    /// A skipped module stays blank and the pass continues. Any other failure stops the pass;
    /// modules above the failing one stay blank and the partial frame rides on the error.
    #[tracing::instrument(skip_all, fields(template = %template.name(), mode = ?mode))]
    pub fn render(
        &mut self,
        template: &mut Template,
        mode: RenderMode,
    ) -> Result<RenderedFrame, RenderFailure> {
        let canvas = template.canvas();
        let editor = template.is_editor();
        let (modules, table) = template.parts_mut();
        let n = modules.len();

        let mut skipped = Vec::new();
        let mut failure: Option<(Option<usize>, ComposerError)> = None;
        let mut active = vec![true; n];

        for (i, m) in modules.iter_mut().enumerate() {
            if let Err(e) = m.prepare(table) {
                failure = Some((Some(i), e));
                break;
            }
        }

        let mut viewport = Viewport::new(canvas);
        if failure.is_none() {
            for (i, m) in modules.iter_mut().enumerate() {
                match m.request_layout(&mut viewport, table) {
                    Ok(()) => {}
                    Err(RenderAbort::Skip(reason)) => {
                        tracing::debug!(module = i, %reason, "layout skipped");
                        active[i] = false;
                        skipped.push(SkippedModule { index: i, reason });
                    }
                    Err(RenderAbort::Fail(e)) => {
                        failure = Some((Some(i), e));
                        break;
                    }
                }
            }
        }

        if failure.is_none()
            && let Err(e) = Canvas::new(viewport.width(), viewport.height())
        {
            failure = Some((None, e));
        }
        if failure.is_some() {
            viewport = Viewport::new(canvas);
        }
        let (vw, vh, origin) = (viewport.width(), viewport.height(), viewport.origin());

        for m in modules.iter_mut() {
            m.clear_surface(vw, vh, origin);
        }

        self.background.reset(vw, vh, origin);
        match mode {
            RenderMode::Display => checkerboard(
                self.background.data_mut(),
                vw,
                origin,
                self.opts.checker_cell,
                self.opts.checker_light,
                self.opts.checker_dark,
            ),
            RenderMode::Export => {
                if let Some(rgba) = self.opts.clear_rgba {
                    let premul = Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]).to_premul();
                    for px in self.background.data_mut().chunks_exact_mut(4) {
                        px.copy_from_slice(&premul);
                    }
                }
            }
        }

        if failure.is_none() {
            let cx = DrawCx {
                table: &*table,
                editor,
                canvas,
                viewport,
            };
            for i in (0..n).rev() {
                if !active[i] {
                    continue;
                }
                let m = &mut modules[i];
                match m.render(&cx) {
                    Ok(()) => {}
                    Err(RenderAbort::Skip(reason)) => {
                        tracing::debug!(module = i, kind = m.type_name(), %reason, "module skipped");
                        m.clear_surface(vw, vh, origin);
                        skipped.push(SkippedModule { index: i, reason });
                    }
                    Err(RenderAbort::Fail(e)) => {
                        m.clear_surface(vw, vh, origin);
                        failure = Some((Some(i), e));
                        break;
                    }
                }
            }
        }

        let mut out = self.background.clone();
        for m in modules.iter().rev() {
            if let Err(e) = out.draw_surface(m.surface(), 1.0) {
                failure.get_or_insert((None, e));
                break;
            }
        }

        skipped.sort_by_key(|s| s.index);
        let frame = RenderedFrame {
            frame: FrameRGBA {
                width: vw,
                height: vh,
                data: out.into_data(),
                premultiplied: true,
            },
            origin,
            skipped,
        };
        match failure {
            None => Ok(frame),
            Some((module, error)) => Err(RenderFailure {
                module,
                error,
                partial: frame,
            }),
        }
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(CompositorOpts::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
