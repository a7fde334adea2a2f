//! Built-in module types.

mod banner;
mod bitmap;
mod brush;
mod solid;
mod text;

pub use banner::Banner;
pub use bitmap::{DelegateMode, ImageModule, ImportStatus};
pub use brush::{Brush, BrushMode};
pub use solid::Solid;
pub use text::{FontWeight, Posture, Text};
