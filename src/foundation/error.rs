/// Convenience result type used across eventscope.
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Top-level error taxonomy.
///
/// `Configuration` errors abort widget construction. `Data` errors describe a single offending
/// item; the binder logs and skips such items instead of returning them.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError {
    /// Invalid options or event set (no place key, non-positive period, empty events, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A single event or place that cannot be used.
    #[error("data error: {0}")]
    Data(String),

    /// Errors when serializing or deserializing input documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Errors raised by a drawing surface.
    #[error("render error: {0}")]
    Render(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScopeError {
    /// Build [`ScopeError::Configuration`].
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build [`ScopeError::Data`].
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Build [`ScopeError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build [`ScopeError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// True for errors that must halt construction.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<serde_json::Error> for ScopeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
