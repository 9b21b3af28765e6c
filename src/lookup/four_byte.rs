//! Signature directory client
//!
//! Queries `GET {base}/api/v1/signatures/?hex_signature=0x<selector>` and
//! returns the `text_signature` of every result, in the order served.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{errors::LookupError, traits::SignatureLookup, types::Selector};

/// Default public signature directory
pub const DEFAULT_FOUR_BYTE_URL: &str = "https://www.4byte.directory";

#[derive(Debug, Deserialize)]
struct SignaturePage {
    #[serde(default)]
    results: Vec<SignatureEntry>,
}

#[derive(Debug, Deserialize)]
struct SignatureEntry {
    text_signature: String,
}

/// Client for a 4byte-style signature directory
#[derive(Debug, Clone)]
pub struct FourByteClient {
    client: reqwest::Client,
    base_url: Url,
}

impl FourByteClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, LookupError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| LookupError::InvalidResponse(format!("invalid signature directory URL: {err}")))?;
        Ok(Self { client, base_url })
    }

    fn signatures_url(&self, selector: Selector) -> Result<Url, LookupError> {
        let mut url = self
            .base_url
            .join("api/v1/signatures/")
            .map_err(|err| LookupError::InvalidResponse(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair("hex_signature", &selector.to_string());
        Ok(url)
    }
}

#[async_trait]
impl SignatureLookup for FourByteClient {
    async fn lookup_selector(&self, selector: Selector) -> Result<Vec<String>, LookupError> {
        let url = self.signatures_url(selector)?;
        debug!(target: "trace_annotator::lookup", %selector, "Querying signature directory");
        let page: SignaturePage = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_page(page))
    }
}

fn parse_page(page: SignaturePage) -> Vec<String> {
    page.results
        .into_iter()
        .map(|entry| entry.text_signature)
        .filter(|text| !text.is_empty())
        .collect()
}
