//! Session entry point.
//!
//! A session owns the shared runtime state with the standard globals
//! installed, and drives units of work on fresh thread contexts. An
//! exception that escapes a unit of work terminates it: the record is
//! reported to the error sink and surfaced to the embedder.

use crate::bootstrap::{install_standard_globals, RuntimeOptions};
use crate::error::RuntimeError;
use orin_engine::{EngineResult, RuntimeState, ThreadContext};
use std::io::Write;
use std::sync::Arc;

/// A configured runtime instance
pub struct Session {
    state: Arc<RuntimeState>,
}

impl Session {
    /// Create a session writing diagnostics to stderr
    pub fn new(options: RuntimeOptions) -> Session {
        Session::with_sink(options, Box::new(std::io::stderr()))
    }

    /// Create a session with an explicit error sink
    pub fn with_sink(options: RuntimeOptions, sink: Box<dyn Write + Send>) -> Session {
        let state = RuntimeState::with_sink(sink);
        install_standard_globals(&state, &options);
        Session {
            state: Arc::new(state),
        }
    }

    /// The shared runtime state
    pub fn state(&self) -> &Arc<RuntimeState> {
        &self.state
    }

    /// Run a unit of work on a fresh thread context
    ///
    /// An unhandled exception is reported (kind, message, backtrace) to the
    /// error sink and returned as [`RuntimeError::Uncaught`].
    pub fn run<T, F>(&self, work: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(&RuntimeState, &ThreadContext) -> EngineResult<T>,
    {
        let ctx = ThreadContext::new();
        match work(&self.state, &ctx) {
            Ok(value) => Ok(value),
            Err(raised) => {
                self.state.write_error(&format!("{}\n", raised.0.render()));
                Err(RuntimeError::Uncaught(raised))
            }
        }
    }
}
