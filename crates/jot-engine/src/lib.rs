//! Jot Engine
//!
//! Focus runtime for the Jot journal. Owns the document, the focus
//! controllers bound to it and the clock that drives deferred focus moves.
//!
//! # Example
//! ```rust,ignore
//! use jot_engine::{Config, FocusRuntime};
//!
//! let mut runtime = FocusRuntime::new(Config::default())?;
//! let dialog = runtime.document_mut().create_element("div");
//! let body = runtime.document().body();
//! runtime.document_mut().append_child(body, dialog)?;
//! let trap = runtime.create_trap(dialog)?;
//! runtime.activate_trap(trap, true)?;
//! ```

mod config;
mod error;
mod runtime;
pub mod clock;
pub mod logging;

pub use config::Config;
pub use error::EngineError;
pub use runtime::{FocusRuntime, ObserverId, RovingId, TrapId};
pub use clock::{Clock, ManualClock, SystemClock};

// Re-export sub-crates for advanced usage
pub use jot_dom as dom;
pub use jot_a11y as a11y;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
