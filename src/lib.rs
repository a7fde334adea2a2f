//! Tessera is a layered image composer.
//!
//! A [`Template`] is a fixed-size canvas with an ordered stack of modules, each drawing into its
//! own surface and post-processed by a chain of effects. Every user-editable value is a typed
//! [`Parameter`] held in the template's [`ParamTable`], so layers can share inputs and templates
//! round-trip through JSON.
//!
//! - Build or load a [`Template`] through a [`Catalog`] (the builtin [`Registry`] covers the
//!   stock modules and effects)
//! - Render it with a [`Compositor`], or drive it interactively through a [`Session`]
#![forbid(unsafe_code)]

mod foundation;

/// Built-in effects.
pub mod effects;
/// Modules, effects and the layer plumbing they share.
pub mod layer;
/// Built-in modules.
pub mod modules;
/// Typed, validated, persistable parameters.
pub mod param;
/// Surfaces, rasterization and the render pass.
pub mod render;
/// Templates, their persisted form, and catalogs.
pub mod template;

pub mod context;
pub mod session;

pub use crate::foundation::core::{Affine, Canvas, Color, Point, Rect, Region, Vec2};
pub use crate::foundation::error::{ComposerError, ComposerResult, LayerKind};

pub use crate::context::{AppContext, UiDispatcher, UiMessage, UiSender};
pub use crate::layer::effect::{Effect, EffectBehavior};
pub use crate::layer::handle::{PointerEvent, PointerKind, ResizeHandle, Viewport};
pub use crate::layer::module::{Module, ModuleBehavior, ModuleId};
pub use crate::layer::{DrawCx, EventCx, Inputs, LayerState, MenuItem};
pub use crate::param::parameter::{Parameter, Validity};
pub use crate::param::set::ParameterSet;
pub use crate::param::table::{ParamId, ParamSlot, ParamTable};
pub use crate::param::undo::{UndoEntry, UndoHistory, UndoLog};
pub use crate::render::compositor::{
    Compositor, CompositorOpts, FrameRGBA, RenderFailure, RenderMode, RenderedFrame,
};
pub use crate::render::outcome::{RenderAbort, RenderResult};
pub use crate::render::scheduler::RenderScheduler;
pub use crate::render::surface::{RetainedVisual, Surface};
pub use crate::render::text::{FontBook, TextLayout, TextStyle};
pub use crate::session::Session;
pub use crate::template::catalog::{Catalog, Registry};
pub use crate::template::persist::{EffectDef, ModuleDef, TemplateDef};
pub use crate::template::{LayerRef, MenuAction, Template};
