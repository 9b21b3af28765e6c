//! Knowledge base and its persistence
//!
//! The knowledge base is the only state that outlives a single trace: every
//! signature and contract profile the resolver has ever learned. It only
//! grows. It is loaded once from a [`KnowledgeStore`] and written back after
//! every merge, under two fixed keys:
//! - `"signatures"`: JSON array of text signatures
//! - `"contractAddresses"`: JSON object of lower-cased address to profile

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{
    abi::{InterfaceRegistry, RegistryBuilder},
    errors::StoreError,
    traits::KnowledgeStore,
    types::{address_key, ContractProfiles, LearnedFacts},
};

/// Store key of the signature list
pub const SIGNATURES_KEY: &str = "signatures";

/// Store key of the contract profile map
pub const CONTRACTS_KEY: &str = "contractAddresses";

/// Everything learned so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    /// Learned text signatures in learning order; duplicates are harmless
    pub signatures: Vec<String>,
    /// Contract profiles keyed by lower-cased address
    pub contracts: ContractProfiles,
}

impl KnowledgeBase {
    /// Merges newly learned facts
    ///
    /// Signatures are appended; a profile replaces any earlier profile for the
    /// same address. Nothing is ever removed.
    ///
    /// # Returns
    /// `true` if the knowledge base changed
    pub fn merge(&mut self, facts: LearnedFacts) -> bool {
        let mut changed = false;
        for signature in facts.signatures {
            if !self.signatures.contains(&signature) {
                changed = true;
            }
            self.signatures.push(signature);
        }
        for (address, profile) in facts.profiles {
            let previous = self.contracts.insert(address_key(&address), profile.clone());
            changed |= previous.as_ref() != Some(&profile);
        }
        changed
    }

    /// Builds the registry for this knowledge: seed, learned signatures, then contract ABIs
    pub fn registry(&self) -> InterfaceRegistry {
        let mut builder = RegistryBuilder::new().with_signatures(&self.signatures);
        // Sorted so the registry does not depend on hash map iteration order
        let mut addresses = self.contracts.keys().collect::<Vec<_>>();
        addresses.sort();
        for address in addresses {
            if let Some(abi) = self.contracts.get(address).and_then(|profile| profile.abi.as_ref()) {
                builder = builder.with_abi(abi);
            }
        }
        builder.build()
    }
}

/// Knowledge base bound to its persistence store
///
/// Readers take cheap snapshots; the single writer per resolution merges
/// through [`KnowledgeCache::merge`] and writes back through
/// [`KnowledgeCache::persist`].
pub struct KnowledgeCache {
    store: Box<dyn KnowledgeStore>,
    knowledge: RwLock<KnowledgeBase>,
    writer: Mutex<()>,
}

impl KnowledgeCache {
    /// Loads the knowledge base from a store
    ///
    /// Missing keys start empty. A corrupt value is logged and replaced by an
    /// empty one so a bad cache never blocks annotation.
    pub fn load(store: impl KnowledgeStore + 'static) -> Self {
        let signatures = read_key::<Vec<String>>(&store, SIGNATURES_KEY).unwrap_or_default();
        let contracts = read_key::<ContractProfiles>(&store, CONTRACTS_KEY).unwrap_or_default();
        debug!(
            target: "trace_annotator::knowledge",
            signatures = signatures.len(),
            contracts = contracts.len(),
            "Loaded knowledge base"
        );
        Self {
            store: Box::new(store),
            knowledge: RwLock::new(KnowledgeBase { signatures, contracts }),
            writer: Mutex::new(()),
        }
    }

    /// Copy of the current knowledge
    pub fn snapshot(&self) -> KnowledgeBase {
        self.knowledge.read().clone()
    }

    /// Merges facts into the in-memory knowledge
    ///
    /// Nothing is written to the store; call [`KnowledgeCache::persist`]
    /// once the merge has been acted on.
    ///
    /// # Returns
    /// The knowledge after the merge and whether it changed
    pub fn merge(&self, facts: LearnedFacts) -> (KnowledgeBase, bool) {
        let mut knowledge = self.knowledge.write();
        let changed = knowledge.merge(facts);
        (knowledge.clone(), changed)
    }

    /// Writes the current knowledge to the store
    ///
    /// Writers are serialized and each one writes the snapshot taken after it
    /// got its turn, so the store never goes back to an older state.
    pub fn persist(&self) -> Result<(), StoreError> {
        let _turn = self.writer.lock();
        let knowledge = self.snapshot();
        write_key(self.store.as_ref(), SIGNATURES_KEY, &knowledge.signatures)?;
        write_key(self.store.as_ref(), CONTRACTS_KEY, &knowledge.contracts)
    }
}

fn read_key<T: DeserializeOwned>(store: &dyn KnowledgeStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(target: "trace_annotator::knowledge", key, %err, "Failed to read knowledge");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(source) => {
            let err = StoreError::Corrupt { key: key.to_string(), source };
            warn!(target: "trace_annotator::knowledge", %err, "Discarding corrupt knowledge");
            None
        }
    }
}

fn write_key<T: Serialize>(store: &dyn KnowledgeStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)
        .map_err(|source| StoreError::Serialize { key: key.to_string(), source })?;
    store.set(key, &raw)
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KnowledgeStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store, one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KnowledgeStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Write then rename so a crash never leaves a half-written file
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, ContractProfile};
    use alloy::primitives::address;
    use std::sync::Arc;

    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

    fn facts(signatures: &[&str], profiles: Vec<(Address, ContractProfile)>) -> LearnedFacts {
        LearnedFacts {
            signatures: signatures.iter().map(|s| s.to_string()).collect(),
            profiles,
        }
    }

    #[test]
    fn test_merge_is_monotonic() {
        let mut knowledge = KnowledgeBase::default();
        let weth = ContractProfile { name: Some("WETH9".into()), abi: None };
        assert!(knowledge.merge(facts(&["mystery(uint256)"], vec![(WETH, weth.clone())])));

        let before = knowledge.clone();
        let renamed = ContractProfile { name: Some("WrappedEther".into()), abi: None };
        assert!(knowledge.merge(facts(&["riddle()"], vec![(WETH, renamed)])));

        for signature in &before.signatures {
            assert!(knowledge.signatures.contains(signature));
        }
        for address in before.contracts.keys() {
            assert!(knowledge.contracts.contains_key(address));
        }
        // Latest profile wins
        assert_eq!(
            knowledge.contracts[&address_key(&WETH)].name.as_deref(),
            Some("WrappedEther")
        );
    }

    #[test]
    fn test_duplicate_signature_is_not_a_change() {
        let mut knowledge = KnowledgeBase::default();
        assert!(knowledge.merge(facts(&["mystery(uint256)"], vec![])));
        assert!(!knowledge.merge(facts(&["mystery(uint256)"], vec![])));
        assert!(!knowledge.merge(LearnedFacts::default()));
        // Duplicates are kept but harmless
        assert_eq!(knowledge.signatures.len(), 2);
    }

    #[test]
    fn test_cache_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let cache = KnowledgeCache::load(store.clone());
        assert_eq!(cache.snapshot(), KnowledgeBase::default());

        let weth = ContractProfile { name: Some("WETH9".into()), abi: None };
        let (after, changed) = cache.merge(facts(&["mystery(uint256)"], vec![(WETH, weth)]));
        assert!(changed);
        // Merging alone leaves the store untouched
        assert_eq!(store.get(CONTRACTS_KEY).unwrap(), None);
        cache.persist().unwrap();

        let raw = store.get(CONTRACTS_KEY).unwrap().unwrap();
        assert!(raw.contains("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));

        let reloaded = KnowledgeCache::load(store);
        assert_eq!(reloaded.snapshot(), after);
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let store = MemoryStore::new();
        store.set(SIGNATURES_KEY, "not json").unwrap();
        store.set(CONTRACTS_KEY, "{}").unwrap();
        let cache = KnowledgeCache::load(store);
        assert_eq!(cache.snapshot(), KnowledgeBase::default());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("knowledge")).unwrap();
        assert_eq!(store.get(SIGNATURES_KEY).unwrap(), None);
        store.set(SIGNATURES_KEY, "[\"riddle()\"]").unwrap();
        assert_eq!(store.get(SIGNATURES_KEY).unwrap().as_deref(), Some("[\"riddle()\"]"));
    }

    #[test]
    fn test_registry_includes_learned_abi() {
        let abi = serde_json::from_str(
            r#"[{"type":"function","name":"poke","inputs":[{"name":"who","type":"address"}],"outputs":[],"stateMutability":"nonpayable"}]"#,
        )
        .unwrap();
        let mut knowledge = KnowledgeBase::default();
        let seeded = knowledge.registry().function_count();
        knowledge.merge(facts(&["riddle()"], vec![(WETH, ContractProfile { name: None, abi: Some(abi) })]));
        assert_eq!(knowledge.registry().function_count(), seeded + 2);
    }
}
