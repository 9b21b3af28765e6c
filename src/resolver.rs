//! Resolver for unknown selectors and addresses
//!
//! Turns the output of [`crate::unknowns`] into [`LearnedFacts`] by querying
//! the two lookup collaborators:
//! - All selectors in one concurrent batch, with no rate limit
//! - Addresses in groups of `address_group_size`, with a fixed cooldown
//!   between groups when the total number of addresses reaches the group size
//!
//! After the selector batch and after every address group the caller's
//! `apply` callback receives the facts of that batch. Returning
//! [`MergeOutcome::Abandoned`] stops the run: no further group is dispatched.
//!
//! Lookup failures and timeouts never escape the resolver. They are logged
//! and count as "no answer" for that selector or address.

use std::{future::Future, time::Duration};

use futures::future::join_all;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::{
    errors::LookupError,
    traits::{SignatureLookup, SourceLookup},
    types::{Address, ContractProfile, LearnedFacts, Selector},
};

/// Addresses looked up per group
pub const DEFAULT_ADDRESS_GROUP_SIZE: usize = 5;

/// Pause between address groups, sized to a 5 requests/second quota
pub const DEFAULT_ADDRESS_COOLDOWN: Duration = Duration::from_millis(1010);

/// Upper bound on any single lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Batching and rate-limit parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub address_group_size: usize,
    pub address_cooldown: Duration,
    pub lookup_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            address_group_size: DEFAULT_ADDRESS_GROUP_SIZE,
            address_cooldown: DEFAULT_ADDRESS_COOLDOWN,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

/// What the caller did with a batch of facts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Facts were merged and published; keep going
    Applied,
    /// The trace is no longer active; stop dispatching
    Abandoned,
}

/// Summary of one resolver run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub selectors_requested: usize,
    pub signatures_learned: usize,
    pub addresses_requested: usize,
    pub profiles_learned: usize,
    /// Address groups actually dispatched
    pub address_groups: usize,
    /// Cooldowns actually waited
    pub cooldowns: usize,
    /// Whether `apply` stopped the run early
    pub abandoned: bool,
}

/// Queries lookup services for unknowns and hands results to a merge callback
#[derive(Debug)]
pub struct Resolver<S, C> {
    signatures: S,
    sources: C,
    config: ResolverConfig,
}

impl<S: SignatureLookup, C: SourceLookup> Resolver<S, C> {
    pub fn new(signatures: S, sources: C, config: ResolverConfig) -> Self {
        Self { signatures, sources, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves the given unknowns
    ///
    /// # Arguments
    /// * `selectors` - Deduplicated unknown selectors
    /// * `addresses` - Deduplicated unknown addresses, in dispatch order
    /// * `apply` - Merge callback, invoked once per non-empty batch
    pub async fn run<F>(&self, selectors: Vec<Selector>, addresses: Vec<Address>, mut apply: F) -> ResolutionReport
    where
        F: FnMut(LearnedFacts) -> MergeOutcome,
    {
        let mut report = ResolutionReport::default();

        if !selectors.is_empty() {
            report.selectors_requested = selectors.len();
            let signatures = self.lookup_selectors(&selectors).await;
            report.signatures_learned = signatures.len();
            let facts = LearnedFacts { signatures, profiles: Vec::new() };
            if apply(facts) == MergeOutcome::Abandoned {
                report.abandoned = true;
                return report;
            }
        }

        report.addresses_requested = addresses.len();
        let group_size = self.config.address_group_size.max(1);
        let rate_limited = addresses.len() >= group_size;
        let groups = addresses.chunks(group_size).collect::<Vec<_>>();

        for (index, group) in groups.iter().enumerate() {
            if index > 0 && rate_limited {
                debug!(
                    target: "trace_annotator::resolver",
                    cooldown_ms = self.config.address_cooldown.as_millis() as u64,
                    "Cooling down before next address group"
                );
                sleep(self.config.address_cooldown).await;
                report.cooldowns += 1;
            }

            report.address_groups += 1;
            let profiles = self.lookup_addresses(group).await;
            report.profiles_learned += profiles.len();
            let facts = LearnedFacts { signatures: Vec::new(), profiles };
            if apply(facts) == MergeOutcome::Abandoned {
                info!(
                    target: "trace_annotator::resolver",
                    remaining = groups.len() - index - 1,
                    "Resolution abandoned"
                );
                report.abandoned = true;
                break;
            }
        }

        report
    }

    async fn lookup_selectors(&self, selectors: &[Selector]) -> Vec<String> {
        let answers = join_all(selectors.iter().map(|&selector| async move {
            let result = self.bounded(self.signatures.lookup_selector(selector)).await;
            (selector, result)
        }))
        .await;

        answers
            .into_iter()
            .filter_map(|(selector, result)| match result {
                // Directory candidates are ambiguous; the first one wins
                Ok(candidates) => candidates.into_iter().next(),
                Err(err) => {
                    warn!(target: "trace_annotator::resolver", %selector, %err, "Signature lookup failed");
                    None
                }
            })
            .collect()
    }

    async fn lookup_addresses(&self, group: &[Address]) -> Vec<(Address, ContractProfile)> {
        let answers = join_all(group.iter().map(|&address| async move {
            let result = self.bounded(self.sources.lookup_address(address)).await;
            (address, result)
        }))
        .await;

        answers
            .into_iter()
            .filter_map(|(address, result)| match result {
                Ok(profile) => Some((address, profile)),
                Err(err) => {
                    warn!(target: "trace_annotator::resolver", %address, %err, "Source lookup failed");
                    None
                }
            })
            .collect()
    }

    async fn bounded<T>(&self, lookup: impl Future<Output = Result<T, LookupError>>) -> Result<T, LookupError> {
        timeout(self.config.lookup_timeout, lookup)
            .await
            .unwrap_or(Err(LookupError::Timeout))
    }
}
