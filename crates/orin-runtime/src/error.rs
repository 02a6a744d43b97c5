//! Runtime error types.

use orin_engine::Raised;

/// Errors that can occur while driving a unit of work.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A guest exception left the unit of work unhandled
    #[error("Uncaught exception: {0}")]
    Uncaught(#[from] Raised),
}

impl RuntimeError {
    /// The unhandled exception, when that is what this error carries
    pub fn exception(&self) -> Option<&std::sync::Arc<orin_engine::Exception>> {
        match self {
            RuntimeError::Uncaught(raised) => Some(&raised.0),
        }
    }
}
