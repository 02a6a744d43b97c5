//! Per-thread execution context
//!
//! Each logical thread of execution owns one `ThreadContext`: the guest
//! call-frame stack and the in-flight exception slot. One thread's in-flight
//! exception is never visible to another; contexts are shared with hook
//! closures on the same thread, so state lives behind mutexes.

use crate::backtrace::{Backtrace, Frame};
use crate::exception::{Exception, ExceptionKind};
use crate::raise::{raise, RaiseRequest};
use crate::state::RuntimeState;
use crate::EngineResult;
use parking_lot::Mutex;
use std::sync::Arc;

/// Execution state owned by a single logical thread
#[derive(Debug, Default)]
pub struct ThreadContext {
    /// Guest call stack, innermost frame last
    call_stack: Mutex<Vec<Frame>>,

    /// Currently in-flight exception (if any)
    current_exception: Mutex<Option<Arc<Exception>>>,
}

impl ThreadContext {
    /// Create an empty context
    pub fn new() -> ThreadContext {
        ThreadContext {
            call_stack: Mutex::new(Vec::new()),
            current_exception: Mutex::new(None),
        }
    }

    /// Push a frame onto the call stack
    pub fn push_frame(&self, frame: Frame) {
        self.call_stack.lock().push(frame);
    }

    /// Pop the innermost frame from the call stack
    pub fn pop_frame(&self) -> Option<Frame> {
        self.call_stack.lock().pop()
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        self.call_stack.lock().len()
    }

    /// The innermost frame, if any
    pub fn innermost_frame(&self) -> Option<Frame> {
        self.call_stack.lock().last().cloned()
    }

    /// Snapshot the call stack as a backtrace, skipping `skip` innermost
    /// frames, most recent first
    pub fn snapshot_backtrace(&self, skip: usize) -> Backtrace {
        let stack = self.call_stack.lock();
        Backtrace::new(stack.iter().rev().skip(skip).cloned().collect())
    }

    /// Query the live call stack, like a backtrace but without raising
    ///
    /// Skips `omit` innermost frames and returns at most `length` frames when
    /// a bound is given. A negative bound is an invalid-argument failure.
    pub fn caller_frames(
        &self,
        state: &RuntimeState,
        omit: usize,
        length: Option<i64>,
    ) -> EngineResult<Vec<Frame>> {
        let limit = match length {
            Some(n) if n < 0 => {
                return Err(raise(
                    state,
                    self,
                    RaiseRequest::Kind(ExceptionKind::InvalidArgument),
                    Some(format!("negative size ({})", n)),
                    None,
                ));
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        let stack = self.call_stack.lock();
        let frames = stack.iter().rev().skip(omit);
        Ok(match limit {
            Some(n) => frames.take(n).cloned().collect(),
            None => frames.cloned().collect(),
        })
    }

    /// Get the in-flight exception (if any)
    pub fn current_exception(&self) -> Option<Arc<Exception>> {
        self.current_exception.lock().clone()
    }

    /// Set the in-flight exception
    pub fn set_exception(&self, exception: Arc<Exception>) {
        *self.current_exception.lock() = Some(exception);
    }

    /// Clear the in-flight exception
    pub fn clear_exception(&self) {
        *self.current_exception.lock() = None;
    }

    /// Check whether an exception is in flight
    pub fn has_exception(&self) -> bool {
        self.current_exception.lock().is_some()
    }
}
