//! HTTP trace API provider
//!
//! Fetches `GET {base}/eth/{hash}?executionTrace=true` and parses the body as a
//! [`RawTraceNode`] tree. A 404 or a `null` body means the API does not know
//! the transaction.
//!
//! Wire format, one object per node:
//!
//! ```json
//! {"type": "CALL", "from": "0x..", "to": "0x..", "input": "0x..", "output": "0x..",
//!  "value": "0x..", "error": "0x..", "children": [..]}
//! {"type": "SSTORE", "slot": "0x..", "before": "0x..", "after": "0x.."}
//! {"type": "LOG", "address": "0x..", "topics": ["0x.."], "data": "0x.."}
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    errors::TraceError,
    traits::TraceProvider,
    types::{
        Address, Bytes, CallData, CallKind, LogEntry, NodeKind, StorageAccess, StorageKind, TraceId,
        TraceNode, B256, U256,
    },
};

/// Trace node as served by the trace API
///
/// Every kind-specific field is optional on the wire; conversion into
/// [`TraceNode`] checks that the fields of the node's kind are present and
/// that no other kind's fields are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTraceNode {
    #[serde(rename = "type")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<B256>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawTraceNode>,
}

impl RawTraceNode {
    fn has_call_fields(&self) -> bool {
        self.from.is_some()
            || self.to.is_some()
            || self.input.is_some()
            || self.output.is_some()
            || self.value.is_some()
            || self.error.is_some()
    }

    fn has_storage_fields(&self) -> bool {
        self.slot.is_some() || self.before.is_some() || self.after.is_some()
    }

    fn has_log_fields(&self) -> bool {
        self.address.is_some() || self.topics.is_some() || self.data.is_some()
    }
}

impl TryFrom<RawTraceNode> for TraceNode {
    type Error = TraceError;

    fn try_from(raw: RawTraceNode) -> Result<Self, Self::Error> {
        let kind = raw
            .kind
            .ok_or_else(|| TraceError::MalformedNode("missing node type".into()))?;
        let malformed = |what: &str| TraceError::MalformedNode(format!("{kind:?} node {what}"));

        let call_kind = match kind {
            NodeKind::Call => Some(CallKind::Call),
            NodeKind::DelegateCall => Some(CallKind::DelegateCall),
            NodeKind::StaticCall => Some(CallKind::StaticCall),
            NodeKind::Create => Some(CallKind::Create),
            NodeKind::Create2 => Some(CallKind::Create2),
            _ => None,
        };

        if let Some(call_kind) = call_kind {
            if raw.has_storage_fields() || raw.has_log_fields() {
                return Err(malformed("carries storage or log fields"));
            }
            if raw.from.is_none() {
                return Err(malformed("is missing `from`"));
            }
            let call = CallData {
                kind: call_kind,
                from: raw.from,
                to: raw.to,
                input: raw.input,
                output: raw.output,
                value: raw.value,
                error: raw.error,
            };
            let children = raw
                .children
                .into_iter()
                .map(TraceNode::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(TraceNode::call(call, children));
        }

        if !raw.children.is_empty() {
            return Err(malformed("has children"));
        }
        if raw.has_call_fields() {
            return Err(malformed("carries call fields"));
        }

        match kind {
            NodeKind::SStore | NodeKind::SLoad => {
                if raw.has_log_fields() {
                    return Err(malformed("carries log fields"));
                }
                let (Some(slot), Some(before), Some(after)) = (raw.slot, raw.before, raw.after) else {
                    return Err(malformed("is missing slot, before or after"));
                };
                let kind = if kind == NodeKind::SStore { StorageKind::SStore } else { StorageKind::SLoad };
                Ok(TraceNode::storage(StorageAccess { kind, slot, before, after }))
            }
            NodeKind::Log => {
                if raw.has_storage_fields() {
                    return Err(malformed("carries storage fields"));
                }
                let topics = raw.topics.ok_or_else(|| malformed("is missing topics"))?;
                Ok(TraceNode::log(LogEntry {
                    address: raw.address,
                    topics,
                    data: raw.data.unwrap_or_default(),
                }))
            }
            _ => Err(malformed("has an unexpected kind")),
        }
    }
}

/// Trace provider for the JSON trace API
#[derive(Debug, Clone)]
pub struct HttpTraceProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTraceProvider {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, TraceError> {
        let mut base_url = Url::parse(base_url).map_err(|err| TraceError::InvalidUrl(format!("{base_url}: {err}")))?;
        // Keep any path prefix when joining
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        Ok(Self { client, base_url })
    }

    fn trace_url(&self, id: TraceId) -> Result<Url, TraceError> {
        let mut url = self
            .base_url
            .join(&format!("eth/{id}"))
            .map_err(|err| TraceError::InvalidUrl(err.to_string()))?;
        url.query_pairs_mut().append_pair("executionTrace", "true");
        Ok(url)
    }
}

#[async_trait]
impl TraceProvider for HttpTraceProvider {
    async fn fetch_trace(&self, id: TraceId) -> Result<Option<TraceNode>, TraceError> {
        let url = self.trace_url(id)?;
        debug!(target: "trace_annotator::provider", %id, %url, "Requesting execution trace");
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: Option<RawTraceNode> = response.error_for_status()?.json().await?;
        raw.map(TraceNode::try_from).transpose()
    }
}
