//! Trace annotation session engine
//!
//! [`TraceAnnotator`] ties the pieces together for one viewer:
//!
//! 1. [`TraceAnnotator::load`] validates the identifier, makes it the active
//!    trace, fetches the raw tree and publishes a first-pass annotation
//! 2. [`TraceAnnotator::resolve`] extracts unknowns and runs the
//!    [`Resolver`]; every batch it learns is merged into the knowledge base,
//!    the registry is rebuilt and the *raw* tree re-decoded, and the new
//!    snapshot replaces the old one as a unit
//! 3. [`TraceAnnotator::open`] does both, resolving in the background
//!
//! Consumers follow progress through [`TraceAnnotator::subscribe`].
//!
//! Resolution runs at most once per trace. Loading a different trace (or
//! calling [`TraceAnnotator::close`]) abandons any resolution still running
//! for the previous one: its remaining results are neither merged nor
//! published. An abandoned trace may be resolved again once it is loaded
//! back.

use std::{collections::HashSet, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    decoder::decode,
    errors::AnnotateError,
    knowledge::{KnowledgeBase, KnowledgeCache, MemoryStore},
    resolver::{MergeOutcome, ResolutionReport, Resolver, ResolverConfig},
    traits::{KnowledgeStore, SignatureLookup, SourceLookup, TraceProvider},
    types::{AnnotatedNode, LearnedFacts, TraceId, TraceNode},
    unknowns::{unknown_addresses, unknown_selectors},
};

/// One published view of a trace
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTrace {
    pub id: TraceId,
    /// Raw tree as fetched; every revision is decoded from this
    pub raw: Arc<TraceNode>,
    pub annotated: AnnotatedNode,
    /// 0 for the first pass, incremented by every merge that changed knowledge
    pub revision: u64,
}

/// Latest published snapshot, if any trace is loaded
pub type TraceUpdates = watch::Receiver<Option<Arc<AnnotatedTrace>>>;

type SharedResolver = Resolver<Arc<dyn SignatureLookup>, Arc<dyn SourceLookup>>;

struct Inner {
    provider: Arc<dyn TraceProvider>,
    resolver: SharedResolver,
    knowledge: KnowledgeCache,
    active: RwLock<Option<TraceId>>,
    resolved: Mutex<HashSet<TraceId>>,
    updates: watch::Sender<Option<Arc<AnnotatedTrace>>>,
}

/// Progressive trace annotator
///
/// Cheap to clone; clones share the same knowledge base and active trace.
#[derive(Clone)]
pub struct TraceAnnotator {
    inner: Arc<Inner>,
}

impl TraceAnnotator {
    pub fn builder() -> AnnotatorBuilder {
        AnnotatorBuilder::default()
    }

    /// Receiver of every published snapshot
    pub fn subscribe(&self) -> TraceUpdates {
        self.inner.updates.subscribe()
    }

    /// Trace currently being viewed
    pub fn active(&self) -> Option<TraceId> {
        *self.inner.active.read()
    }

    /// Copy of the knowledge base
    pub fn knowledge(&self) -> KnowledgeBase {
        self.inner.knowledge.snapshot()
    }

    /// Stops viewing the active trace
    ///
    /// Any resolution still running for it is abandoned at its next merge.
    pub fn close(&self) {
        if let Some(id) = self.inner.active.write().take() {
            debug!(target: "trace_annotator::annotator", %id, "Closed trace");
        }
        self.inner.updates.send_replace(None);
    }

    /// Loads a trace and publishes its first-pass annotation
    ///
    /// # Errors
    /// * `InvalidTraceIdentifier` - `input` is not a transaction hash; nothing is fetched
    /// * `TraceUnavailable` - the provider failed or does not know the transaction
    pub async fn load(&self, input: &str) -> Result<Arc<AnnotatedTrace>, AnnotateError> {
        let id = TraceId::parse(input)?;
        *self.inner.active.write() = Some(id);

        let raw = match self.inner.provider.fetch_trace(id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(self.unavailable(id, "transaction not found".into())),
            Err(err) => {
                warn!(target: "trace_annotator::annotator", %id, %err, "Trace fetch failed");
                return Err(self.unavailable(id, err.to_string()));
            }
        };

        let knowledge = self.inner.knowledge.snapshot();
        let registry = knowledge.registry();
        let trace = Arc::new(AnnotatedTrace {
            id,
            annotated: decode(&registry, &knowledge.contracts, &raw),
            raw: Arc::new(raw),
            revision: 0,
        });

        let active = self.inner.active.read();
        if *active == Some(id) {
            self.inner.updates.send_replace(Some(trace.clone()));
        } else {
            debug!(target: "trace_annotator::annotator", %id, "Trace replaced while loading; not published");
        }
        Ok(trace)
    }

    /// Resolves the unknowns of a loaded trace
    ///
    /// Returns `None` if this trace was already resolved once or is being
    /// resolved right now. A run that was abandoned does not count.
    pub async fn resolve(&self, trace: &AnnotatedTrace) -> Option<ResolutionReport> {
        let id = trace.id;
        if !self.inner.resolved.lock().insert(id) {
            debug!(target: "trace_annotator::annotator", %id, "Trace already resolved");
            return None;
        }

        let (selectors, addresses) = {
            let knowledge = self.inner.knowledge.snapshot();
            let registry = knowledge.registry();
            (
                unknown_selectors(&registry, &trace.raw),
                unknown_addresses(&knowledge.contracts, &trace.raw),
            )
        };
        if selectors.is_empty() && addresses.is_empty() {
            return Some(ResolutionReport::default());
        }
        info!(
            target: "trace_annotator::annotator",
            %id,
            selectors = selectors.len(),
            addresses = addresses.len(),
            "Resolving unknowns"
        );

        let mut revision = trace.revision;
        let report = self
            .inner
            .resolver
            .run(selectors, addresses, |facts| self.apply(trace, &mut revision, facts))
            .await;
        if report.abandoned {
            // Returning to this trace later resolves whatever is still unknown
            self.inner.resolved.lock().remove(&id);
        }

        info!(
            target: "trace_annotator::annotator",
            %id,
            signatures = report.signatures_learned,
            profiles = report.profiles_learned,
            abandoned = report.abandoned,
            "Resolution finished"
        );
        Some(report)
    }

    /// Loads a trace, then resolves it in the background
    ///
    /// Returns the first-pass snapshot; later revisions arrive through
    /// [`TraceAnnotator::subscribe`].
    pub async fn open(&self, input: &str) -> Result<Arc<AnnotatedTrace>, AnnotateError> {
        let trace = self.load(input).await?;
        let annotator = self.clone();
        let pending = trace.clone();
        tokio::spawn(async move {
            annotator.resolve(&pending).await;
        });
        Ok(trace)
    }

    /// Clears the published view if the failed trace is still the active one
    fn unavailable(&self, id: TraceId, reason: String) -> AnnotateError {
        if *self.inner.active.read() == Some(id) {
            self.inner.updates.send_replace(None);
        }
        AnnotateError::TraceUnavailable { id, reason }
    }

    fn apply(&self, trace: &AnnotatedTrace, revision: &mut u64, facts: LearnedFacts) -> MergeOutcome {
        let (knowledge, changed) = {
            let active = self.inner.active.read();
            if *active != Some(trace.id) {
                info!(target: "trace_annotator::annotator", id = %trace.id, "Trace no longer active; dropping results");
                return MergeOutcome::Abandoned;
            }
            self.inner.knowledge.merge(facts)
        };
        if !changed {
            return MergeOutcome::Applied;
        }

        let registry = knowledge.registry();
        let annotated = decode(&registry, &knowledge.contracts, &trace.raw);
        let outcome = {
            // Held only for the check and the send so a concurrent load cannot interleave
            let active = self.inner.active.read();
            if *active == Some(trace.id) {
                *revision += 1;
                let snapshot = AnnotatedTrace {
                    id: trace.id,
                    raw: trace.raw.clone(),
                    annotated,
                    revision: *revision,
                };
                self.inner.updates.send_replace(Some(Arc::new(snapshot)));
                debug!(target: "trace_annotator::annotator", id = %trace.id, revision = *revision, "Published revision");
                MergeOutcome::Applied
            } else {
                info!(target: "trace_annotator::annotator", id = %trace.id, "Trace replaced while re-annotating; not published");
                MergeOutcome::Abandoned
            }
        };

        if let Err(err) = self.inner.knowledge.persist() {
            warn!(target: "trace_annotator::annotator", %err, "Failed to persist knowledge");
        }
        outcome
    }
}

/// Builder for [`TraceAnnotator`]
///
/// A trace provider and both lookups are required. The knowledge store
/// defaults to a [`MemoryStore`].
#[derive(Default)]
#[must_use = "builders do nothing unless built"]
pub struct AnnotatorBuilder {
    provider: Option<Arc<dyn TraceProvider>>,
    signatures: Option<Arc<dyn SignatureLookup>>,
    sources: Option<Arc<dyn SourceLookup>>,
    knowledge: Option<KnowledgeCache>,
    resolver_config: ResolverConfig,
}

impl AnnotatorBuilder {
    pub fn with_provider(mut self, provider: impl TraceProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn with_signature_lookup(mut self, lookup: impl SignatureLookup + 'static) -> Self {
        self.signatures = Some(Arc::new(lookup));
        self
    }

    pub fn with_source_lookup(mut self, lookup: impl SourceLookup + 'static) -> Self {
        self.sources = Some(Arc::new(lookup));
        self
    }

    /// Loads the knowledge base from `store`
    pub fn with_store(mut self, store: impl KnowledgeStore + 'static) -> Self {
        self.knowledge = Some(KnowledgeCache::load(store));
        self
    }

    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    pub fn build(self) -> Result<TraceAnnotator, AnnotateError> {
        let missing = |what: &str| AnnotateError::Config(format!("missing {what}"));
        let provider = self.provider.ok_or_else(|| missing("trace provider"))?;
        let signatures = self.signatures.ok_or_else(|| missing("signature lookup"))?;
        let sources = self.sources.ok_or_else(|| missing("source lookup"))?;
        let knowledge = self
            .knowledge
            .unwrap_or_else(|| KnowledgeCache::load(MemoryStore::new()));

        let (updates, _) = watch::channel(None);
        Ok(TraceAnnotator {
            inner: Arc::new(Inner {
                provider,
                resolver: Resolver::new(signatures, sources, self.resolver_config),
                knowledge,
                active: RwLock::new(None),
                resolved: Mutex::new(HashSet::new()),
                updates,
            }),
        })
    }
}
