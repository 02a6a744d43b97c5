//! Process-wide shared runtime state
//!
//! Shared state is injected by reference wherever it is needed; nothing in
//! the engine reaches for ambient globals. One `RuntimeState` exists per
//! runtime instance and is shared across all of its threads.

use crate::globals::GlobalRegistry;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};

/// Name of the debug-mode variable consulted by the raise pipeline
pub const DEBUG_VARIABLE: &str = "$DEBUG";

/// Shared state for a runtime instance
///
/// Owns the global variable registry and the error sink that diagnostics,
/// warnings, and unhandled-exception reports are written to.
pub struct RuntimeState {
    globals: GlobalRegistry,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl RuntimeState {
    /// Create state writing diagnostics to stderr
    pub fn new() -> RuntimeState {
        RuntimeState::with_sink(Box::new(io::stderr()))
    }

    /// Create state with an explicit error sink
    pub fn with_sink(sink: Box<dyn Write + Send>) -> RuntimeState {
        RuntimeState {
            globals: GlobalRegistry::new(),
            sink: Mutex::new(sink),
        }
    }

    /// The global variable registry
    pub fn globals(&self) -> &GlobalRegistry {
        &self.globals
    }

    /// Whether the debug-mode variable reads truthy
    pub fn debug_enabled(&self) -> bool {
        self.globals.read(DEBUG_VARIABLE).is_truthy()
    }

    /// Write text to the error sink
    ///
    /// Sink failures are swallowed: diagnostics must never unwind.
    pub fn write_error(&self, text: &str) {
        let mut sink = self.sink.lock();
        let _ = sink.write_all(text.as_bytes());
        let _ = sink.flush();
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState").finish_non_exhaustive()
    }
}
