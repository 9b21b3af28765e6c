//! Collaborator traits at the engine's boundaries
//!
//! The engine never talks to the network or to disk directly. Each outside
//! concern sits behind one of these traits:
//! - `TraceProvider`: raw trace tree for a transaction
//! - `SignatureLookup`: candidate text signatures for a selector
//! - `SourceLookup`: contract name and ABI for an address
//! - `KnowledgeStore`: string key/value persistence for the knowledge base
//!
//! Concrete HTTP implementations live in [`crate::lookup`] and
//! [`crate::provider`]; in-memory and file stores in [`crate::knowledge`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::{LookupError, StoreError, TraceError},
    types::{Address, ContractProfile, Selector, TraceId, TraceNode},
};

/// Source of raw execution traces
#[async_trait]
pub trait TraceProvider: Send + Sync {
    /// Fetches the trace for a transaction
    ///
    /// # Returns
    /// * `Ok(Some(node))` - Root call of the transaction
    /// * `Ok(None)` - The provider does not know this transaction
    /// * `Err(_)` - Transport or format failure
    async fn fetch_trace(&self, id: TraceId) -> Result<Option<TraceNode>, TraceError>;
}

/// Directory mapping 4-byte selectors to text signatures
#[async_trait]
pub trait SignatureLookup: Send + Sync {
    /// Returns candidate signatures for a selector, best candidate first
    async fn lookup_selector(&self, selector: Selector) -> Result<Vec<String>, LookupError>;
}

/// Verified-source service mapping addresses to names and ABIs
#[async_trait]
pub trait SourceLookup: Send + Sync {
    /// Returns the contract profile, already normalised (empty strings are absent)
    async fn lookup_address(&self, address: Address) -> Result<ContractProfile, LookupError>;
}

/// Generic persisted key/value store
pub trait KnowledgeStore: Send + Sync {
    /// Reads the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: TraceProvider + ?Sized> TraceProvider for Arc<T> {
    async fn fetch_trace(&self, id: TraceId) -> Result<Option<TraceNode>, TraceError> {
        (**self).fetch_trace(id).await
    }
}

#[async_trait]
impl<T: SignatureLookup + ?Sized> SignatureLookup for Arc<T> {
    async fn lookup_selector(&self, selector: Selector) -> Result<Vec<String>, LookupError> {
        (**self).lookup_selector(selector).await
    }
}

#[async_trait]
impl<T: SourceLookup + ?Sized> SourceLookup for Arc<T> {
    async fn lookup_address(&self, address: Address) -> Result<ContractProfile, LookupError> {
        (**self).lookup_address(address).await
    }
}

impl<T: KnowledgeStore + ?Sized> KnowledgeStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}
