//! Call-site frames and backtrace snapshots
//!
//! A backtrace is an ordered snapshot of the guest call stack taken at raise
//! time, most recent frame first. Frames describe guest calls only; runtime
//! internals never appear here.

use std::fmt;

/// A single call-site frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Name of the function being executed
    pub function: String,

    /// Source line of the call site
    pub line: u32,

    /// Source column of the call site
    pub column: u32,
}

impl Frame {
    /// Create a frame
    pub fn new(function: impl Into<String>, line: u32, column: u32) -> Frame {
        Frame {
            function: function.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}:{})", self.function, self.line, self.column)
    }
}

/// Ordered snapshot of call-site frames, most recent first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backtrace {
    frames: Vec<Frame>,
}

impl Backtrace {
    /// Build a backtrace from frames ordered most recent first
    pub fn new(frames: Vec<Frame>) -> Backtrace {
        Backtrace { frames }
    }

    /// The captured frames, most recent first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of captured frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Render the backtrace under a `name: message` header line
    ///
    /// The header omits the message when it is empty. Each frame renders as
    /// an indented `at` line below the header.
    pub fn render(&self, name: &str, message: &str) -> String {
        let mut out = if message.is_empty() {
            name.to_string()
        } else {
            format!("{}: {}", name, message)
        };
        for frame in &self.frames {
            out.push_str(&format!("\n    at {}", frame));
        }
        out
    }
}
