//! Orin Runtime
//!
//! Binds the Orin engine with the standard runtime surface: the global
//! variables installed at startup, warning emission, and the session entry
//! point that runs units of work and reports unhandled exceptions.

pub mod bootstrap;
pub mod error;
pub mod session;
pub mod warning;

pub use bootstrap::{install_standard_globals, RuntimeOptions};
pub use error::RuntimeError;
pub use session::Session;
