//! Trace providers
//!
//! - [`geth`]: `debug_traceTransaction` with the built-in call tracer
//! - [`http`]: JSON trace API serving the [`RawTraceNode`] wire format
//!
//! Both produce the same [`crate::types::TraceNode`] tree. The geth tracer has
//! no storage nodes; the HTTP format may include them.

pub mod geth;
pub mod http;

pub use geth::GethTraceProvider;
pub use http::{HttpTraceProvider, RawTraceNode};
