//! Core types for trace annotation
//!
//! This module defines the data structures shared across the engine:
//! - The raw trace tree as supplied by a trace provider
//! - The annotated tree handed to a renderer
//! - Transaction identifiers and their structural validation
//! - Contract profiles and the facts learned by the resolver

use std::{collections::HashMap, fmt, str::FromStr};

pub use alloy::primitives::{Address, Bytes, Selector, TxHash, B256, U256};
use alloy::json_abi::JsonAbi;
use serde::{Deserialize, Serialize};

use crate::errors::AnnotateError;

/// Length of a function selector in bytes
pub const SELECTOR_LEN: usize = 4;

/// Contract profiles keyed by lower-cased `0x` address
pub type ContractProfiles = HashMap<String, ContractProfile>;

/// Returns the canonical knowledge-base key for an address
///
/// Addresses are compared case-insensitively, so every lookup and every
/// persisted key goes through this lower-cased `0x` form.
pub fn address_key(address: &Address) -> String {
    format!("{address:#x}")
}

/// Flat kind of a trace node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    Call,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
    SStore,
    SLoad,
    Log,
}

impl NodeKind {
    /// Whether nodes of this kind may carry children
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            NodeKind::Call
                | NodeKind::DelegateCall
                | NodeKind::StaticCall
                | NodeKind::Create
                | NodeKind::Create2
        )
    }
}

/// Scheme of a call or contract creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    Call,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
}

impl CallKind {
    /// Contract creations carry init code instead of selector-prefixed calldata
    pub fn is_create(&self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2)
    }
}

/// Storage access kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    SStore,
    SLoad,
}

/// Fields of a call or creation node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallData {
    /// Call scheme
    pub kind: CallKind,
    /// Caller address
    pub from: Option<Address>,
    /// Callee address (or created contract)
    pub to: Option<Address>,
    /// Raw calldata or init code
    pub input: Option<Bytes>,
    /// Raw return data
    pub output: Option<Bytes>,
    /// Native value sent with the call, in wei
    pub value: Option<U256>,
    /// Revert payload when the call failed
    pub error: Option<Bytes>,
}

impl CallData {
    /// Creates call data with only the scheme and endpoints populated
    pub fn new(kind: CallKind, from: Address, to: Address) -> Self {
        Self {
            kind,
            from: Some(from),
            to: Some(to),
            input: None,
            output: None,
            value: None,
            error: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<Bytes>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_error(mut self, error: impl Into<Bytes>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Function selector of the input, if this is a selector-prefixed call
    pub fn selector(&self) -> Option<Selector> {
        if self.kind.is_create() {
            return None;
        }
        let input = self.input.as_ref()?;
        if input.len() < SELECTOR_LEN {
            return None;
        }
        Some(Selector::from_slice(&input[..SELECTOR_LEN]))
    }
}

/// A storage read or write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccess {
    pub kind: StorageKind,
    pub slot: B256,
    pub before: B256,
    pub after: B256,
}

/// An emitted event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Emitting contract, when the provider reports it
    pub address: Option<Address>,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Kind-specific payload of a trace node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeData {
    Call(CallData),
    Storage(StorageAccess),
    Log(LogEntry),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Call(call) => match call.kind {
                CallKind::Call => NodeKind::Call,
                CallKind::DelegateCall => NodeKind::DelegateCall,
                CallKind::StaticCall => NodeKind::StaticCall,
                CallKind::Create => NodeKind::Create,
                CallKind::Create2 => NodeKind::Create2,
            },
            NodeData::Storage(access) => match access.kind {
                StorageKind::SStore => NodeKind::SStore,
                StorageKind::SLoad => NodeKind::SLoad,
            },
            NodeData::Log(_) => NodeKind::Log,
        }
    }
}

/// Raw execution trace node
///
/// Built once from a provider response and never mutated afterwards.
/// Only call nodes carry children; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceNode {
    pub data: NodeData,
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Creates a call node with its nested calls, logs and storage accesses
    pub fn call(call: CallData, children: Vec<TraceNode>) -> Self {
        Self { data: NodeData::Call(call), children }
    }

    pub fn storage(access: StorageAccess) -> Self {
        Self { data: NodeData::Storage(access), children: Vec::new() }
    }

    pub fn log(log: LogEntry) -> Self {
        Self { data: NodeData::Log(log), children: Vec::new() }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Number of nodes in this subtree, including itself
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TraceNode::len).sum::<usize>()
    }

    /// A node always contains at least itself
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Human-readable fields derived from a raw node
///
/// Every field stays `None` when decoding did not succeed, so a renderer can
/// tell a decoded value from a raw fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    /// Decoded function or event with arguments, e.g. `transfer(to=0x..,value=1)`
    pub pretty_name: Option<String>,
    /// Decoded return values
    pub pretty_result: Option<String>,
    /// Contract name of the callee
    pub pretty_address_label: Option<String>,
    /// Native value in base units
    pub pretty_value: Option<String>,
    /// `Error(string)` revert reason
    pub pretty_error: Option<String>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self == &Annotations::default()
    }
}

/// Trace node with its derived annotations
///
/// Mirrors the shape of the [`TraceNode`] it was produced from one to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    pub data: NodeData,
    pub annotations: Annotations,
    pub children: Vec<AnnotatedNode>,
}

impl AnnotatedNode {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Pre-order iterator over this node and its descendants
    pub fn iter(&self) -> impl Iterator<Item = &AnnotatedNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Validated transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(TxHash);

impl TraceId {
    /// Validates a user-supplied transaction hash
    ///
    /// Accepts `0x` followed by exactly 64 hex digits, in any case.
    pub fn parse(input: &str) -> Result<Self, AnnotateError> {
        let invalid = || AnnotateError::InvalidTraceIdentifier(input.to_string());
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix("0x").ok_or_else(invalid)?;
        if digits.len() != 64 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        TxHash::from_str(trimmed).map(TraceId).map_err(|_| invalid())
    }

    pub fn hash(&self) -> TxHash {
        self.0
    }
}

impl From<TxHash> for TraceId {
    fn from(hash: TxHash) -> Self {
        TraceId(hash)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Human name and optional ABI for a contract address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractProfile {
    pub name: Option<String>,
    pub abi: Option<JsonAbi>,
}

impl ContractProfile {
    /// Builds a profile from a source lookup answer
    ///
    /// Empty names and empty or unparsable ABI strings are treated as absent.
    pub fn from_source(name: Option<&str>, abi: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let abi = abi
            .map(str::trim)
            .filter(|abi| !abi.is_empty())
            .and_then(|abi| serde_json::from_str::<JsonAbi>(abi).ok());
        Self { name, abi }
    }
}

/// Facts produced by one resolver batch
#[derive(Debug, Clone, Default)]
pub struct LearnedFacts {
    /// Text signatures, first candidate per selector
    pub signatures: Vec<String>,
    /// Profiles for looked-up addresses; failed lookups are omitted
    pub profiles: Vec<(Address, ContractProfile)>,
}

impl LearnedFacts {
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty() && self.profiles.is_empty()
    }
}
