//! Verified-source client
//!
//! Queries an Etherscan-compatible `getsourcecode` endpoint and turns the
//! first result into a [`ContractProfile`]. Unverified contracts come back
//! with an empty name and a placeholder ABI string; both normalise to absent.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    errors::LookupError,
    traits::SourceLookup,
    types::{Address, ContractProfile},
};

/// Default Etherscan API endpoint for mainnet
pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";

#[derive(Debug, Deserialize)]
struct SourceResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceEntry {
    #[serde(default)]
    contract_name: String,
    #[serde(default, rename = "ABI")]
    abi: String,
}

/// Client for an Etherscan-compatible source API
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl EtherscanClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Result<Self, LookupError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| LookupError::InvalidResponse(format!("invalid source API URL: {err}")))?;
        Ok(Self { client, base_url, api_key })
    }

    fn source_url(&self, address: Address) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("module", "contract")
                .append_pair("action", "getsourcecode")
                .append_pair("address", &format!("{address:#x}"));
            if let Some(key) = &self.api_key {
                query.append_pair("apikey", key);
            }
        }
        url
    }
}

#[async_trait]
impl SourceLookup for EtherscanClient {
    async fn lookup_address(&self, address: Address) -> Result<ContractProfile, LookupError> {
        debug!(target: "trace_annotator::lookup", %address, "Querying source API");
        let response: SourceResponse = self
            .client
            .get(self.source_url(address))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_response(response)
    }
}

fn parse_response(response: SourceResponse) -> Result<ContractProfile, LookupError> {
    // Rate-limit and key errors arrive as status "0" with a string result
    if response.status != "1" {
        let detail = response.result.as_str().unwrap_or(&response.message);
        return Err(LookupError::InvalidResponse(detail.to_string()));
    }
    let entries: Vec<SourceEntry> = serde_json::from_value(response.result)
        .map_err(|err| LookupError::InvalidResponse(err.to_string()))?;
    let entry = entries.into_iter().next().unwrap_or_default();
    Ok(ContractProfile::from_source(Some(&entry.contract_name), Some(&entry.abi)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn parse(raw: &str) -> Result<ContractProfile, LookupError> {
        parse_response(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn test_source_url() {
        let client = EtherscanClient::new(reqwest::Client::new(), DEFAULT_ETHERSCAN_URL, Some("KEY".into())).unwrap();
        let url = client.source_url(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"));
        assert_eq!(
            url.as_str(),
            "https://api.etherscan.io/api?module=contract&action=getsourcecode&address=0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2&apikey=KEY"
        );
    }

    #[test]
    fn test_verified_contract() {
        let profile = parse(
            r#"{"status":"1","message":"OK","result":[{"ContractName":"WETH9","ABI":"[{\"type\":\"function\",\"name\":\"deposit\",\"inputs\":[],\"outputs\":[],\"stateMutability\":\"payable\"}]"}]}"#,
        )
        .unwrap();
        assert_eq!(profile.name.as_deref(), Some("WETH9"));
        assert_eq!(profile.abi.unwrap().functions().count(), 1);
    }

    #[test]
    fn test_unverified_contract_is_absent() {
        let profile = parse(
            r#"{"status":"1","message":"OK","result":[{"ContractName":"","ABI":"Contract source code not verified"}]}"#,
        )
        .unwrap();
        assert_eq!(profile, ContractProfile::default());
    }

    #[test]
    fn test_error_status() {
        let err = parse(r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#).unwrap_err();
        assert!(matches!(err, LookupError::InvalidResponse(detail) if detail == "Max rate limit reached"));
    }
}
