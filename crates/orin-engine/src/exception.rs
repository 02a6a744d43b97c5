//! Exception records
//!
//! An exception carries a kind tag, a message, and three pieces of metadata
//! that are each established at most once over the record's lifetime: the
//! backtrace snapshot, the cause link, and the originating scope. Records are
//! shared behind `Arc` so the in-flight slot, cause chains, and handlers all
//! observe the same instance.

use crate::backtrace::{Backtrace, Frame};
use crate::context::ThreadContext;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Exception taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    /// A value of the wrong type was supplied
    TypeMismatch,

    /// Write to a read-only variable
    ReadOnly,

    /// Malformed argument (wrong shape, negative count)
    InvalidArgument,

    /// Generic runtime failure
    Runtime,
}

impl ExceptionKind {
    /// The kind's display name, used in backtrace headers and reports
    pub fn name(&self) -> &'static str {
        match self {
            ExceptionKind::TypeMismatch => "TypeMismatch",
            ExceptionKind::ReadOnly => "ReadOnlyViolation",
            ExceptionKind::InvalidArgument => "InvalidArgument",
            ExceptionKind::Runtime => "RuntimeError",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An exception record
#[derive(Debug)]
pub struct Exception {
    kind: ExceptionKind,
    message: String,

    /// Captured at most once, immutable afterwards
    backtrace: OnceCell<Backtrace>,

    /// Previously in-flight exception, linked at most once, never to self
    cause: OnceCell<Arc<Exception>>,

    /// Originating scope, attached at most once
    scope: OnceCell<Frame>,
}

impl Exception {
    /// Create a bare record with no backtrace, cause, or scope
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Exception {
        Exception {
            kind,
            message: message.into(),
            backtrace: OnceCell::new(),
            cause: OnceCell::new(),
            scope: OnceCell::new(),
        }
    }

    /// The kind tag
    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    /// The message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Derive a fresh instance of the same kind carrying `message`
    ///
    /// The derived record starts with empty metadata; it is a new instance,
    /// not a view of this one.
    pub fn derive(&self, message: impl Into<String>) -> Exception {
        Exception::new(self.kind, message)
    }

    /// The backtrace snapshot, if one has been captured
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.get()
    }

    /// Whether a backtrace has been captured
    pub fn has_backtrace(&self) -> bool {
        self.backtrace.get().is_some()
    }

    /// Capture a backtrace from `ctx`, skipping `skip` innermost frames
    ///
    /// Idempotent: a record that already carries a snapshot keeps it.
    pub fn capture_backtrace(&self, ctx: &ThreadContext, skip: usize) {
        self.backtrace.get_or_init(|| ctx.snapshot_backtrace(skip));
    }

    /// The cause link, if one has been established
    pub fn cause(&self) -> Option<&Arc<Exception>> {
        self.cause.get()
    }

    /// Link `cause` as this record's cause
    ///
    /// The link is established at most once; later calls and self-links are
    /// ignored.
    pub fn link_cause(&self, cause: Arc<Exception>) {
        if std::ptr::eq(self as *const Exception, Arc::as_ptr(&cause)) {
            return;
        }
        let _ = self.cause.set(cause);
    }

    /// The originating scope, if one has been attached
    pub fn scope(&self) -> Option<&Frame> {
        self.scope.get()
    }

    /// Attach the originating scope, at most once
    pub fn attach_scope(&self, scope: Frame) {
        let _ = self.scope.set(scope);
    }

    /// Render the record with its backtrace for reporting
    pub fn render(&self) -> String {
        match self.backtrace.get() {
            Some(trace) => trace.render(self.kind.name(), &self.message),
            None if self.message.is_empty() => self.kind.name().to_string(),
            None => format!("{}: {}", self.kind.name(), self.message),
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind.name())
        } else {
            write!(f, "{}: {}", self.kind.name(), self.message)
        }
    }
}
