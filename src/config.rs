//! Annotator configuration
//!
//! Loaded from an optional TOML file, then overridden by `TRACE_ANNOTATOR_*`
//! environment variables (for example `TRACE_ANNOTATOR_ETHERSCAN_API_KEY`).
//! Every field has a default, so an empty configuration is valid as long as a
//! trace source is given.

use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    annotator::AnnotatorBuilder,
    errors::AnnotateError,
    knowledge::{FileStore, MemoryStore},
    lookup::{
        etherscan::DEFAULT_ETHERSCAN_URL, four_byte::DEFAULT_FOUR_BYTE_URL, http_client, EtherscanClient,
        FourByteClient,
    },
    provider::{GethTraceProvider, HttpTraceProvider},
    resolver::{ResolverConfig, DEFAULT_ADDRESS_COOLDOWN, DEFAULT_ADDRESS_GROUP_SIZE, DEFAULT_LOOKUP_TIMEOUT},
};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TRACE_ANNOTATOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Node RPC endpoint with the debug API; takes precedence over `trace_api_url`
    pub rpc_url: Option<String>,
    /// Base URL of the JSON trace API
    pub trace_api_url: Option<String>,
    pub four_byte_url: String,
    pub etherscan_url: String,
    pub etherscan_api_key: Option<String>,
    /// Directory of the persisted knowledge base; in-memory when absent
    pub knowledge_dir: Option<PathBuf>,
    pub address_group_size: usize,
    pub address_cooldown_ms: u64,
    pub lookup_timeout_secs: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            trace_api_url: None,
            four_byte_url: DEFAULT_FOUR_BYTE_URL.to_string(),
            etherscan_url: DEFAULT_ETHERSCAN_URL.to_string(),
            etherscan_api_key: None,
            knowledge_dir: None,
            address_group_size: DEFAULT_ADDRESS_GROUP_SIZE,
            address_cooldown_ms: DEFAULT_ADDRESS_COOLDOWN.as_millis() as u64,
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT.as_secs(),
        }
    }
}

impl AnnotatorConfig {
    /// Loads configuration from `path` (if given and present) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!(target: "trace_annotator::config", path = %path.display(), "Loading config file");
            builder = builder.add_source(File::from(path).required(false));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("failed to parse configuration")
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            address_group_size: self.address_group_size.max(1),
            address_cooldown: Duration::from_millis(self.address_cooldown_ms),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
        }
    }

    /// Builder wired with the HTTP collaborators this configuration describes
    pub async fn builder(&self) -> Result<AnnotatorBuilder, AnnotateError> {
        let config_error = |err: &dyn std::fmt::Display| AnnotateError::Config(err.to_string());
        let client = http_client(Duration::from_secs(self.lookup_timeout_secs)).map_err(|e| config_error(&e))?;

        let mut builder = AnnotatorBuilder::default()
            .with_resolver_config(self.resolver_config())
            .with_signature_lookup(
                FourByteClient::new(client.clone(), &self.four_byte_url).map_err(|e| config_error(&e))?,
            )
            .with_source_lookup(
                EtherscanClient::new(client.clone(), &self.etherscan_url, self.etherscan_api_key.clone())
                    .map_err(|e| config_error(&e))?,
            );

        builder = match (&self.rpc_url, &self.trace_api_url) {
            (Some(rpc_url), _) => {
                builder.with_provider(GethTraceProvider::connect(rpc_url).await.map_err(|e| config_error(&e))?)
            }
            (None, Some(api_url)) => {
                builder.with_provider(HttpTraceProvider::new(client, api_url).map_err(|e| config_error(&e))?)
            }
            (None, None) => return Err(AnnotateError::Config("no rpc_url or trace_api_url configured".into())),
        };

        builder = match &self.knowledge_dir {
            Some(dir) => builder.with_store(FileStore::open(dir)?),
            None => builder.with_store(MemoryStore::new()),
        };
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.resolver_config(), ResolverConfig::default());
        assert_eq!(config.four_byte_url, "https://www.4byte.directory");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
trace_api_url = "http://localhost:8080"
etherscan_api_key = "KEY"
address_group_size = 3
address_cooldown_ms = 250
"#
        )
        .unwrap();

        let config = AnnotatorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.trace_api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.etherscan_api_key.as_deref(), Some("KEY"));
        assert_eq!(config.resolver_config().address_group_size, 3);
        assert_eq!(config.resolver_config().address_cooldown, Duration::from_millis(250));
        // Untouched fields keep their defaults
        assert_eq!(config.lookup_timeout_secs, 10);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnnotatorConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.etherscan_url, DEFAULT_ETHERSCAN_URL);
    }

    #[tokio::test]
    async fn test_builder_requires_trace_source() {
        let err = AnnotatorConfig::default().builder().await.err().unwrap();
        assert!(matches!(err, AnnotateError::Config(_)));
    }
}
