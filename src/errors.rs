//! Error types for trace annotation
//!
//! The engine distinguishes four kinds of failure:
//! - Decode misses: expected, absorbed by the decoder and the extractor
//! - Lookup failures: external services that did not answer, absorbed by the resolver
//! - Invalid trace identifiers: rejected before any network call
//! - Unavailable traces: the provider had nothing to return
//!
//! Only the last two ever reach a caller of [`crate::TraceAnnotator`] once it is built.

use thiserror::Error;

use crate::types::TraceId;

/// Top-level error surfaced to the presentation boundary
#[derive(Debug, Error)]
pub enum AnnotateError {
    /// Input is not a structurally valid transaction hash
    #[error("Invalid transaction hash: {0:?}")]
    InvalidTraceIdentifier(String),

    /// Provider returned nothing for this transaction or failed to respond
    #[error("Trace unavailable for {id}: {reason}")]
    TraceUnavailable { id: TraceId, reason: String },

    /// Knowledge store could not be opened
    #[error("Knowledge store error: {0}")]
    Store(#[from] StoreError),

    /// Collaborator could not be constructed from configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A selector, result or log that the current registry cannot decode
///
/// Not a failure of the engine: it is what drives the resolution loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No matching signature in registry")]
pub struct DecodeMiss;

/// Errors from an external lookup service
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport-level failure
    #[error("Lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with something we could not interpret
    #[error("Unexpected lookup response: {0}")]
    InvalidResponse(String),

    /// Request exceeded the configured timeout
    #[error("Lookup timed out")]
    Timeout,
}

/// Errors from a trace provider
#[derive(Debug, Error)]
pub enum TraceError {
    /// Transport-level failure against an HTTP endpoint
    #[error("Trace request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON-RPC failure
    #[error("Trace RPC failed: {0}")]
    Rpc(String),

    /// Invalid endpoint URL
    #[error("Invalid trace endpoint: {0}")]
    InvalidUrl(String),

    /// A node whose kind-specific fields are missing or inconsistent
    #[error("Malformed trace node: {0}")]
    MalformedNode(String),

    /// Provider answered with a tracer output we do not understand
    #[error("Unsupported trace format: {0}")]
    UnsupportedFormat(String),
}

/// Errors from the knowledge persistence store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value for {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
