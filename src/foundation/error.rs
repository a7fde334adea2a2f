pub type ComposerResult<T> = Result<T, ComposerError>;

#[derive(thiserror::Error, Debug)]
pub enum ComposerError {
    /// A parameter handle holds content that cannot be parsed into its value type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    /// A persisted document names a module or effect type the catalog cannot build.
    #[error("template uses {kind} \"{name}\" which is missing")]
    MissingType { kind: LayerKind, name: String },

    #[error("render error: {0}")]
    Render(String),

    /// Document state was touched from a thread other than the one that owns it.
    #[error("wrong thread: {0}")]
    WrongThread(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Which side of the catalog a missing type name was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Module,
    Effect,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => f.write_str("module"),
            Self::Effect => f.write_str("effect"),
        }
    }
}

impl ComposerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn missing_type(kind: LayerKind, name: impl Into<String>) -> Self {
        Self::MissingType {
            kind,
            name: name.into(),
        }
    }

    pub fn wrong_thread(msg: impl Into<String>) -> Self {
        Self::WrongThread(msg.into())
    }
}

impl From<serde_json::Error> for ComposerError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
