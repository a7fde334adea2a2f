//! Built-in effects.

mod blur;
mod opacity;
mod shadow;

pub use blur::Blur;
pub use opacity::Opacity;
pub use shadow::DropShadow;

#[cfg(test)]
#[path = "../../tests/unit/effects/builtin.rs"]
mod tests;
