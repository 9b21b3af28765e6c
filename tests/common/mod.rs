//! In-memory collaborators shared by the integration tests
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use alloy::primitives::{Address, Selector};
use async_trait::async_trait;
use parking_lot::Mutex;
use trace_annotator::{
    errors::{LookupError, TraceError},
    traits::{SignatureLookup, SourceLookup, TraceProvider},
    types::{CallData, CallKind, ContractProfile, TraceId, TraceNode},
};

pub const TX_A: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
pub const TX_B: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
pub const TX_MISSING: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

pub fn id(hash: &str) -> TraceId {
    TraceId::parse(hash).unwrap()
}

pub fn call(from: Address, to: Address, input: Vec<u8>, children: Vec<TraceNode>) -> TraceNode {
    TraceNode::call(CallData::new(CallKind::Call, from, to).with_input(input), children)
}

#[derive(Default)]
pub struct FakeProvider {
    pub traces: HashMap<TraceId, TraceNode>,
    pub fetches: AtomicUsize,
    pub broken: bool,
}

impl FakeProvider {
    pub fn with_trace(mut self, hash: &str, root: TraceNode) -> Self {
        self.traces.insert(id(hash), root);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TraceProvider for FakeProvider {
    async fn fetch_trace(&self, id: TraceId) -> Result<Option<TraceNode>, TraceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(TraceError::Rpc("connection refused".into()));
        }
        Ok(self.traces.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct FakeSignatures {
    answers: HashMap<Selector, Vec<String>>,
    pub requests: Mutex<Vec<Selector>>,
}

impl FakeSignatures {
    pub fn with(mut self, selector: Selector, candidates: &[&str]) -> Self {
        self.answers
            .insert(selector, candidates.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl SignatureLookup for FakeSignatures {
    async fn lookup_selector(&self, selector: Selector) -> Result<Vec<String>, LookupError> {
        self.requests.lock().push(selector);
        Ok(self.answers.get(&selector).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeSources {
    profiles: HashMap<Address, ContractProfile>,
    pub requests: Mutex<Vec<Address>>,
}

impl FakeSources {
    pub fn with(mut self, address: Address, name: &str, abi: Option<&str>) -> Self {
        self.profiles
            .insert(address, ContractProfile::from_source(Some(name), abi));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl SourceLookup for FakeSources {
    async fn lookup_address(&self, address: Address) -> Result<ContractProfile, LookupError> {
        self.requests.lock().push(address);
        match self.profiles.get(&address) {
            Some(profile) => Ok(profile.clone()),
            // Unverified contracts and EOAs answer with nothing
            None => Ok(ContractProfile::default()),
        }
    }
}

/// Lookups that always fail
pub struct Offline;

#[async_trait]
impl SignatureLookup for Offline {
    async fn lookup_selector(&self, _selector: Selector) -> Result<Vec<String>, LookupError> {
        Err(LookupError::InvalidResponse("offline".into()))
    }
}

#[async_trait]
impl SourceLookup for Offline {
    async fn lookup_address(&self, _address: Address) -> Result<ContractProfile, LookupError> {
        Err(LookupError::Timeout)
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
