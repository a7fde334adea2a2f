use crate::foundation::error::ComposerError;

/// Why a module or effect stopped drawing for this pass.
#[derive(Debug, thiserror::Error)]
pub enum RenderAbort {
    /// Expected: required input missing, invalid, or degenerate. The module renders blank.
    #[error("skipped: {0}")]
    Skip(String),

    /// Anything else. Ends the whole pass.
    #[error(transparent)]
    Fail(#[from] ComposerError),
}

impl RenderAbort {
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip(reason.into())
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// `Ok`, [`RenderAbort::Skip`] or [`RenderAbort::Fail`].
pub type RenderResult<T> = Result<T, RenderAbort>;
