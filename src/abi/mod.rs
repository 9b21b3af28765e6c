//! Interface registry
//!
//! Holds every function and event signature currently usable for decoding.
//! A registry is never mutated once built: when new signatures are learned a
//! fresh one is built with [`RegistryBuilder`], so decode results depend only
//! on the signature set and never on the order of calls.
//!
//! # Modules
//!
//! - [`seed`]: Bundled well-known interfaces every registry starts from
//! - [`format`]: Rendering of decoded values

pub mod format;
pub mod seed;

use std::collections::{hash_map::Entry, HashMap};

use alloy::{
    dyn_abi::{DynSolValue, EventExt, FunctionExt, JsonAbiExt},
    json_abi::{Event, Function, JsonAbi},
    primitives::{keccak256, Selector, B256},
};
use tracing::debug;

use crate::{errors::DecodeMiss, types::SELECTOR_LEN};

/// Successfully decoded call or event
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// Function or event name
    pub name: String,
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub signature: String,
    /// Arguments in declaration order; names are empty when unknown
    pub args: Vec<(String, DynSolValue)>,
}

impl DecodedCall {
    /// Renders `name(arg=value,...)`
    pub fn pretty(&self) -> String {
        format::format_call(&self.name, &self.args)
    }
}

/// Decoded return data
pub type DecodedValues = Vec<(String, DynSolValue)>;

/// Immutable set of known signatures
#[derive(Debug, Clone, Default)]
pub struct InterfaceRegistry {
    functions: HashMap<Selector, Vec<Function>>,
    events: HashMap<B256, Vec<Event>>,
}

impl InterfaceRegistry {
    /// Builds a registry from the seed interfaces plus text signatures
    pub fn build<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RegistryBuilder::new().with_signatures(signatures).build()
    }

    /// Registry holding only the bundled seed interfaces
    pub fn seeded() -> Self {
        RegistryBuilder::new().build()
    }

    /// Whether a function with this selector is known
    pub fn knows_selector(&self, selector: &Selector) -> bool {
        self.functions.contains_key(selector)
    }

    /// Number of distinct function selectors
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Decodes calldata against every candidate for its selector
    ///
    /// Candidates are tried in insertion order; the first whose parameter
    /// types decode the payload wins. Selector collisions are therefore
    /// resolved by the payload shape rather than by assumption.
    pub fn decode_call(&self, selector: Selector, input: &[u8]) -> Result<DecodedCall, DecodeMiss> {
        let candidates = self.functions.get(&selector).ok_or(DecodeMiss)?;
        let body = input.get(SELECTOR_LEN..).ok_or(DecodeMiss)?;
        candidates
            .iter()
            .find_map(|function| {
                let values = function.abi_decode_input(body).ok()?;
                let args = function
                    .inputs
                    .iter()
                    .map(|param| param.name.clone())
                    .zip(values)
                    .collect();
                Some(DecodedCall {
                    name: function.name.clone(),
                    signature: function.signature(),
                    args,
                })
            })
            .ok_or(DecodeMiss)
    }

    /// Decodes return data for a signature previously resolved by [`Self::decode_call`]
    pub fn decode_result(&self, signature: &str, output: &[u8]) -> Result<DecodedValues, DecodeMiss> {
        let selector = Selector::from_slice(&keccak256(signature.as_bytes())[..SELECTOR_LEN]);
        let candidates = self.functions.get(&selector).ok_or(DecodeMiss)?;
        candidates
            .iter()
            .filter(|function| function.signature() == signature)
            .find_map(|function| {
                // Signatures learned from a directory declare no outputs
                if function.outputs.is_empty() {
                    return None;
                }
                let values = function.abi_decode_output(output).ok()?;
                Some(
                    function
                        .outputs
                        .iter()
                        .map(|param| param.name.clone())
                        .zip(values)
                        .collect(),
                )
            })
            .ok_or(DecodeMiss)
    }

    /// Decodes a log by its first topic
    ///
    /// Anonymous events and indexed/unindexed layout mismatches resolve to
    /// [`DecodeMiss`] instead of failing.
    pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<DecodedCall, DecodeMiss> {
        let topic0 = topics.first().ok_or(DecodeMiss)?;
        let candidates = self.events.get(topic0).ok_or(DecodeMiss)?;
        candidates
            .iter()
            .find_map(|event| {
                let decoded = event.decode_log_parts(topics.iter().copied(), data).ok()?;
                let mut indexed = decoded.indexed.into_iter();
                let mut body = decoded.body.into_iter();
                let args = event
                    .inputs
                    .iter()
                    .map(|param| {
                        let value = if param.indexed { indexed.next() } else { body.next() };
                        value.map(|value| (param.name.clone(), value))
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(DecodedCall {
                    name: event.name.clone(),
                    signature: event.signature(),
                    args,
                })
            })
            .ok_or(DecodeMiss)
    }
}

/// Assembles an [`InterfaceRegistry`]
///
/// Sources are layered in the order they are added: seed interfaces first,
/// then learned text signatures, then contract ABIs. A function already known
/// under the same canonical signature is not added twice; of the two
/// declarations the more detailed one is kept (declared outputs first, then
/// named parameters), so a verified ABI replaces a bare directory signature
/// whatever order they arrive in.
#[must_use = "builders do nothing unless you call `build` on them"]
pub struct RegistryBuilder {
    registry: InterfaceRegistry,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Starts from the bundled seed interfaces
    pub fn new() -> Self {
        Self::empty()
            .with_functions(seed::SEED.functions.iter().cloned())
            .with_events(seed::SEED.events.iter().cloned())
    }

    /// Starts from nothing; mostly useful in tests
    pub fn empty() -> Self {
        Self { registry: InterfaceRegistry::default() }
    }

    /// Adds text signatures such as `transfer(address,uint256)`
    ///
    /// Unparsable text is skipped.
    pub fn with_signatures<I, S>(self, signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let functions = signatures.into_iter().filter_map(|text| {
            let text = text.as_ref();
            Function::parse(text)
                .map_err(|err| debug!(target: "trace_annotator::abi", %text, %err, "Skipping unparsable signature"))
                .ok()
        });
        self.with_functions(functions)
    }

    /// Adds every function and event of a contract ABI
    pub fn with_abi(self, abi: &JsonAbi) -> Self {
        self.with_functions(abi.functions().cloned())
            .with_events(abi.events().cloned())
    }

    pub fn with_functions(mut self, functions: impl IntoIterator<Item = Function>) -> Self {
        for function in functions {
            match self.registry.functions.entry(function.selector()) {
                Entry::Occupied(mut entry) => {
                    let signature = function.signature();
                    match entry.get_mut().iter_mut().find(|known| known.signature() == signature) {
                        Some(known) => {
                            if detail(&function) > detail(known) {
                                *known = function;
                            }
                        }
                        None => {
                            debug!(target: "trace_annotator::abi", selector = %entry.key(), %signature, "Selector collision");
                            entry.get_mut().push(function);
                        }
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(vec![function]);
                }
            }
        }
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        for event in events {
            if event.anonymous {
                continue;
            }
            let candidates = self.registry.events.entry(event.selector()).or_default();
            let duplicate = candidates.iter().any(|known| {
                known.signature() == event.signature()
                    && known.inputs.iter().map(|p| p.indexed).eq(event.inputs.iter().map(|p| p.indexed))
            });
            if !duplicate {
                candidates.push(event);
            }
        }
        self
    }

    pub fn build(self) -> InterfaceRegistry {
        self.registry
    }
}

/// How much a declaration adds beyond its canonical signature
fn detail(function: &Function) -> (bool, bool) {
    (
        !function.outputs.is_empty(),
        function.inputs.iter().any(|param| !param.name.is_empty()),
    )
}
