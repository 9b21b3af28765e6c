//! # EVM Trace Annotator
//!
//! A library for turning raw EVM execution traces into progressively
//! annotated, human-readable trees.
//!
//! ## Core Features
//!
//! - **Decoding**
//!   - Function calls and return values against a growable interface registry
//!   - Event logs matched by their first topic
//!   - `Error(string)` revert reasons
//!   - Native value in base units
//!
//! - **Resolution**
//!   - Unknown selectors looked up in a signature directory
//!   - Unknown addresses looked up in a verified-source service, rate limited
//!   - Incremental re-annotation after every learned batch
//!
//! - **Knowledge**
//!   - Seeded with common token, name-service and router interfaces
//!   - Learned signatures and contract profiles persisted across sessions
//!
//! ## Features
//!
//! - `rustls-tls`: Uses rustls as the TLS implementation instead of native-tls (OpenSSL).
//!
//!   Usage example:
//!   ```toml
//!   [dependencies]
//!   trace-annotator = { version = "0.1.0", default-features = false, features = ["rustls-tls"] }
//!   ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trace_annotator::{
//!     knowledge::FileStore,
//!     lookup::{http_client, EtherscanClient, FourByteClient},
//!     provider::GethTraceProvider,
//!     TraceAnnotator,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = http_client(Duration::from_secs(10))?;
//! let annotator = TraceAnnotator::builder()
//!     .with_provider(GethTraceProvider::connect("https://eth.llamarpc.com").await?)
//!     .with_signature_lookup(FourByteClient::new(client.clone(), "https://www.4byte.directory")?)
//!     .with_source_lookup(EtherscanClient::new(client, "https://api.etherscan.io/api", None)?)
//!     .with_store(FileStore::open(".trace-annotator")?)
//!     .build()?;
//!
//! // First pass uses only what is already known
//! let trace = annotator
//!     .load("0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060")
//!     .await?;
//!
//! // Look up unknowns; each learned batch publishes a better revision
//! let mut updates = annotator.subscribe();
//! annotator.resolve(&trace).await;
//!
//! if let Some(latest) = updates.borrow_and_update().as_ref() {
//!     for node in latest.annotated.iter() {
//!         if let Some(name) = &node.annotations.pretty_name {
//!             println!("{name}");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `types`: Trace model, annotations and learned facts
//! - `abi`: Interface registry, seed interfaces and value rendering
//! - `decoder`: Raw tree to annotated tree
//! - `unknowns`: Selectors and addresses the current knowledge cannot explain
//! - `resolver`: Batched, rate-limited lookups
//! - `knowledge`: Knowledge base and its persistence
//! - `annotator`: Session engine publishing snapshots
//! - `lookup`, `provider`: HTTP and RPC collaborators
//! - `traits`: Collaborator interfaces
//! - `config`: File and environment configuration
//! - `errors`: Error types
//! - `utils`: Revert reasons and unit formatting

pub mod abi;
pub mod annotator;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod knowledge;
pub mod lookup;
pub mod provider;
pub mod resolver;
pub mod traits;
pub mod types;
pub mod unknowns;
pub mod utils;

// Re-export only the essential types and functions
pub use abi::{InterfaceRegistry, RegistryBuilder};
pub use annotator::{AnnotatedTrace, AnnotatorBuilder, TraceAnnotator};
pub use config::AnnotatorConfig;
pub use decoder::decode;
pub use errors::AnnotateError;
pub use resolver::{ResolutionReport, Resolver, ResolverConfig};
pub use types::{AnnotatedNode, Annotations, TraceId, TraceNode};
