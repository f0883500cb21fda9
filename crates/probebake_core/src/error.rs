//! Error types for the bake pipeline.

use probebake_cache::CacheError;

/// A renderer's report that one probe could not be captured.
///
/// Never fatal to a bake: the probe stays unbaked and is retried on a later tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("render failed: {reason}")]
pub struct RenderError {
    /// Description of the failure.
    pub reason: String,
}

impl RenderError {
    /// Creates a render error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors that stop a scheduler tick.
#[derive(Debug, thiserror::Error)]
pub enum BakeError {
    /// A rendered texture could not be written to the cache.
    #[error("failed to store baked texture: {0}")]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn render_error_display() {
        let err = RenderError::new("device lost");
        assert_eq!(err.to_string(), "render failed: device lost");
    }

    #[test]
    fn bake_error_wraps_cache_error() {
        let err: BakeError = CacheError::Io {
            path: PathBuf::from("textures/a.bake"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("failed to store baked texture"));
        assert!(msg.contains("a.bake"));
    }
}
