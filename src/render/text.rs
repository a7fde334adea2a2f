use std::borrow::Cow;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::foundation::core::Color;
use crate::foundation::error::{ComposerError, ComposerResult};

/// Paint carried by every glyph run of a layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Color> for TextBrush {
    fn from(c: Color) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// How one block of text is shaped.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub family: String,
    /// CSS-style weight, 100 (thin) to 900 (black).
    pub weight: f32,
    pub italic: bool,
    pub size: f32,
    pub color: Color,
    /// Line-breaking width in pixels; `None` keeps each paragraph on one line.
    pub wrap: Option<f32>,
}

/// Shaped, line-broken text. Glyph positions are relative to the layout's top-left corner.
pub struct TextLayout {
    layout: parley::Layout<TextBrush>,
}

impl TextLayout {
    pub fn width(&self) -> f32 {
        self.layout.width()
    }

    pub fn height(&self) -> f32 {
        self.layout.height()
    }

    /// Pixel size, rounded up.
    pub fn size(&self) -> (u32, u32) {
        (
            self.width().max(0.0).ceil() as u32,
            self.height().max(0.0).ceil() as u32,
        )
    }

    pub(crate) fn parley(&self) -> &parley::Layout<TextBrush> {
        &self.layout
    }
}

impl std::fmt::Debug for TextLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayout")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    families: Vec<String>,
}

/// Fonts registered from raw bytes plus the contexts that shape text with them.
///
/// Only registered fonts are visible, so layout does not depend on the host's installed fonts.
/// Clones share one book.
#[derive(Clone)]
pub struct FontBook {
    engine: Rc<RefCell<TextEngine>>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBook {
    /// Environment variable naming a directory of fonts to load.
    pub const DIR_ENV: &'static str = "TESSERA_FONT_DIR";

    pub fn new() -> Self {
        Self {
            engine: Rc::new(RefCell::new(TextEngine {
                font_ctx: parley::FontContext::default(),
                layout_ctx: parley::LayoutContext::new(),
                families: Vec::new(),
            })),
        }
    }

    /// An empty book, plus every font in `TESSERA_FONT_DIR` when it is set.
    pub fn from_env() -> Self {
        let book = Self::new();
        if let Some(dir) = std::env::var_os(Self::DIR_ENV)
            && let Err(e) = book.load_dir(Path::new(&dir))
        {
            tracing::warn!(error = %e, "font directory not loaded");
        }
        book
    }

    /// Register a TTF/OTF/TTC blob. Returns the family names it added.
    pub fn register_font(&self, bytes: &[u8]) -> ComposerResult<Vec<String>> {
        let mut engine = self.engine.borrow_mut();
        let engine = &mut *engine;
        let registered = engine
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
        if registered.is_empty() {
            return Err(ComposerError::validation("no font families in font data"));
        }

        let mut names = Vec::new();
        for (id, _) in registered {
            let Some(name) = engine.font_ctx.collection.family_name(id) else {
                continue;
            };
            let name = name.to_string();
            if !engine.families.iter().any(|f| f.eq_ignore_ascii_case(&name)) {
                engine.families.push(name.clone());
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Register every `.ttf`, `.otf` and `.ttc` file in `dir`, in file name order.
    ///
    /// Unreadable or unparsable files are logged and skipped. Returns how many loaded.
    pub fn load_dir(&self, dir: &Path) -> ComposerResult<usize> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("read font dir '{}': {e}", dir.display()))?;
        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
            })
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let registered = std::fs::read(&path)
                .map_err(|e| ComposerError::from(anyhow::anyhow!("read font: {e}")))
                .and_then(|bytes| self.register_font(&bytes));
            match registered {
                Ok(families) => {
                    tracing::debug!(path = %path.display(), ?families, "font registered");
                    loaded += 1;
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "font skipped"),
            }
        }
        Ok(loaded)
    }

    /// Family names in registration order.
    pub fn families(&self) -> Vec<String> {
        self.engine.borrow().families.clone()
    }

    /// Registered spelling of `name`, matched case-insensitively.
    pub fn family(&self, name: &str) -> Option<String> {
        self.engine
            .borrow()
            .families
            .iter()
            .find(|f| f.eq_ignore_ascii_case(name.trim()))
            .cloned()
    }

    /// Shape and break `text`. The family must be registered.
    pub fn layout(&self, text: &str, style: &TextStyle) -> ComposerResult<TextLayout> {
        if !style.size.is_finite() || style.size <= 0.0 {
            return Err(ComposerError::validation("text size must be finite and > 0"));
        }
        let family = self.family(&style.family).ok_or_else(|| {
            ComposerError::validation(format!("font family \"{}\" is not registered", style.family))
        })?;

        let mut engine = self.engine.borrow_mut();
        let engine = &mut *engine;
        let mut builder = engine
            .layout_ctx
            .ranged_builder(&mut engine.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(style.weight),
        ));
        if style.italic {
            builder.push_default(parley::style::StyleProperty::FontStyle(
                parley::style::FontStyle::Italic,
            ));
        }
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush::from(style.color)));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        match style.wrap.filter(|w| w.is_finite() && *w > 0.0) {
            Some(w) => {
                layout.break_all_lines(Some(w));
                layout.align(
                    Some(w),
                    parley::Alignment::Start,
                    parley::AlignmentOptions::default(),
                );
            }
            None => layout.break_all_lines(None),
        }
        Ok(TextLayout { layout })
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.engine.borrow().families)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
