//! Orin Runtime Engine
//!
//! This crate provides the kernel services of the Orin runtime:
//! - **Values**: dynamic tagged values shared by all runtime facilities (`value` module)
//! - **Globals**: the hooked global variable registry (`globals` module)
//! - **Exceptions**: exception records, backtraces, and the raise pipeline
//!   (`exception`, `backtrace`, `raise` modules)
//! - **Contexts**: per-thread execution state (`context` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use orin_engine::{RuntimeState, ThreadContext, Value};
//! use orin_engine::raise::{raise_value, rescue};
//!
//! let state = RuntimeState::new();
//! let ctx = ThreadContext::new();
//!
//! let result: i64 = rescue(
//!     &ctx,
//!     || Err(raise_value(&state, &ctx, Some(Value::str("boom")), None, None)),
//!     |exc| Ok(exc.message().len() as i64),
//! )?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Backtrace frames and rendering
pub mod backtrace;

/// Per-thread execution context
pub mod context;

/// Exception records and kinds
pub mod exception;

/// Hooked global variable registry
pub mod globals;

/// Exception raise pipeline and handler helpers
pub mod raise;

/// Process-wide shared runtime state
pub mod state;

/// Dynamic tagged values
pub mod value;

pub use backtrace::{Backtrace, Frame};
pub use context::ThreadContext;
pub use exception::{Exception, ExceptionKind};
pub use globals::{GlobalEntry, GlobalRegistry, GlobalStore};
pub use raise::{raise, raise_value, rescue, rescue_matching, RaiseRequest};
pub use state::RuntimeState;
pub use value::Value;

use std::sync::Arc;

/// An exception in flight, propagated as a Rust error.
///
/// Raising transfers control by returning this token through `Result`;
/// callers that do not handle it pass it up with `?`. The wrapped record is
/// shared so handlers and cause links observe the same instance.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct Raised(pub Arc<Exception>);

/// Result type for engine operations that may unwind
pub type EngineResult<T> = Result<T, Raised>;
