//! Core application primitives (HTTP server, runtime wiring, scheduler)

pub mod http;
pub mod runtime;
pub mod scheduler;

pub use http::*;
pub use runtime::*;
pub use scheduler::*;
