//! Node-backed trace provider
//!
//! Calls `debug_traceTransaction` with `callTracer` and `withLog: true`, then
//! converts the returned [`CallFrame`] tree. Logs are interleaved with child
//! calls by their reported position so the tree reads in execution order.

use alloy::{
    providers::{ext::DebugApi, DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::types::trace::geth::{
        CallFrame, CallLogFrame, GethDebugBuiltInTracerType, GethDebugTracerConfig, GethDebugTracerType,
        GethDebugTracingOptions, GethTrace,
    },
    transports::TransportError,
};
use async_trait::async_trait;
use tracing::debug;

use crate::{
    errors::TraceError,
    traits::TraceProvider,
    types::{CallData, CallKind, LogEntry, TraceId, TraceNode},
};

/// Tracer timeout passed to the node
const TRACER_TIMEOUT: &str = "30s";

/// Trace provider backed by an archive node's debug namespace
#[derive(Debug, Clone)]
pub struct GethTraceProvider<P = DynProvider> {
    provider: P,
}

impl GethTraceProvider {
    /// Connects to an HTTP or WebSocket endpoint
    ///
    /// # Arguments
    /// * `rpc_url` - `http(s)://` or `ws(s)://` URL of a node with the debug API enabled
    pub async fn connect(rpc_url: &str) -> Result<Self, TraceError> {
        let provider = if rpc_url.starts_with("http") {
            let url = rpc_url
                .parse()
                .map_err(|_| TraceError::InvalidUrl(rpc_url.to_string()))?;
            ProviderBuilder::new().connect_http(url).erased()
        } else {
            ProviderBuilder::new()
                .connect_ws(WsConnect::new(rpc_url))
                .await
                .map_err(|err| TraceError::Rpc(format!("failed to connect to {rpc_url}: {err}")))?
                .erased()
        };
        Ok(Self { provider })
    }
}

impl<P: Provider> GethTraceProvider<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

fn tracing_options() -> GethDebugTracingOptions {
    GethDebugTracingOptions {
        tracer: Some(GethDebugTracerType::BuiltInTracer(GethDebugBuiltInTracerType::CallTracer)),
        tracer_config: GethDebugTracerConfig(serde_json::json!({"onlyTopCall": false, "withLog": true})),
        timeout: Some(TRACER_TIMEOUT.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl<P: Provider> TraceProvider for GethTraceProvider<P> {
    async fn fetch_trace(&self, id: TraceId) -> Result<Option<TraceNode>, TraceError> {
        debug!(target: "trace_annotator::provider", %id, "Requesting call trace");
        let trace = match self.provider.debug_trace_transaction(id.hash(), tracing_options()).await {
            Ok(trace) => trace,
            Err(err) if is_unknown_transaction(&err) => return Ok(None),
            Err(err) => return Err(TraceError::Rpc(err.to_string())),
        };
        match trace {
            GethTrace::CallTracer(frame) => convert_frame(frame).map(Some),
            GethTrace::JS(serde_json::Value::Null) => Ok(None),
            other => Err(TraceError::UnsupportedFormat(format!("{other:?}"))),
        }
    }
}

/// Whether the node answered that it does not know the transaction
///
/// Geth reports an unknown hash as a JSON-RPC error (code `-32000`, message
/// `transaction <hash> not found`) rather than a null result. Only the error
/// payload sent by the node is inspected; transport failures never count as a
/// missing transaction.
fn is_unknown_transaction(err: &TransportError) -> bool {
    err.as_error_resp()
        .is_some_and(|payload| payload.message.contains("not found"))
}

/// Converts a call tracer frame into a trace tree
pub fn convert_frame(frame: CallFrame) -> Result<TraceNode, TraceError> {
    let kind = match frame.typ.to_ascii_uppercase().as_str() {
        "CALL" | "CALLCODE" | "SELFDESTRUCT" => CallKind::Call,
        "DELEGATECALL" => CallKind::DelegateCall,
        "STATICCALL" => CallKind::StaticCall,
        "CREATE" => CallKind::Create,
        "CREATE2" => CallKind::Create2,
        other => return Err(TraceError::MalformedNode(format!("unknown call type {other:?}"))),
    };

    // On failure the tracer reports the revert payload as the output
    let (output, error) = match frame.error {
        Some(_) => (None, Some(frame.output.unwrap_or_default())),
        None => (frame.output, None),
    };
    let call = CallData {
        kind,
        from: Some(frame.from),
        to: frame.to,
        input: Some(frame.input),
        output,
        value: frame.value,
        error,
    };

    let mut logs = frame.logs.into_iter().peekable();
    let mut children = Vec::new();
    for (index, sub) in frame.calls.into_iter().enumerate() {
        while let Some(log) = logs.next_if(|log| log.position.is_some_and(|p| p as usize <= index)) {
            children.push(convert_log(log));
        }
        children.push(convert_frame(sub)?);
    }
    children.extend(logs.map(convert_log));

    Ok(TraceNode::call(call, children))
}

fn convert_log(log: CallLogFrame) -> TraceNode {
    TraceNode::log(LogEntry {
        address: log.address,
        topics: log.topics.unwrap_or_default(),
        data: log.data.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeData, NodeKind};

    fn frame(raw: serde_json::Value) -> CallFrame {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_unknown_transaction_detection() {
        let payload = serde_json::from_value(serde_json::json!({
            "code": -32000,
            "message": "transaction 0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060 not found"
        }))
        .unwrap();
        assert!(is_unknown_transaction(&TransportError::ErrorResp(payload)));

        let payload = serde_json::from_value(serde_json::json!({
            "code": -32601,
            "message": "the method debug_traceTransaction does not exist/is not available"
        }))
        .unwrap();
        assert!(!is_unknown_transaction(&TransportError::ErrorResp(payload)));

        // Wording alone is not enough without a node error payload
        let transport = alloy::transports::TransportErrorKind::custom_str("404 not found");
        assert!(!is_unknown_transaction(&transport));
    }

    #[test]
    fn test_convert_nested_frame_with_logs() {
        let root = frame(serde_json::json!({
            "type": "CALL",
            "from": "0x00000000000000000000000000000000000000aa",
            "to": "0x00000000000000000000000000000000000000bb",
            "gas": "0x100000",
            "gasUsed": "0x5000",
            "input": "0xa9059cbb",
            "output": "0x01",
            "value": "0x0",
            "calls": [
                {"type": "STATICCALL", "from": "0x00000000000000000000000000000000000000bb",
                 "to": "0x00000000000000000000000000000000000000cc", "gas": "0x1", "gasUsed": "0x1",
                 "input": "0x70a08231"},
                {"type": "DELEGATECALL", "from": "0x00000000000000000000000000000000000000bb",
                 "to": "0x00000000000000000000000000000000000000dd", "gas": "0x1", "gasUsed": "0x1",
                 "input": "0x"}
            ],
            "logs": [
                {"address": "0x00000000000000000000000000000000000000bb",
                 "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
                 "data": "0x", "position": "0x1"}
            ]
        }));

        let node = convert_frame(root).unwrap();
        let kinds = node.children.iter().map(TraceNode::kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![NodeKind::StaticCall, NodeKind::Log, NodeKind::DelegateCall]);
        match &node.data {
            NodeData::Call(call) => {
                assert_eq!(call.output.as_ref().map(|b| b.to_vec()), Some(vec![0x01]));
                assert_eq!(call.error, None);
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_reverted_frame_moves_output_to_error() {
        let reverted = frame(serde_json::json!({
            "type": "CALL",
            "from": "0x00000000000000000000000000000000000000aa",
            "to": "0x00000000000000000000000000000000000000bb",
            "gas": "0x1",
            "gasUsed": "0x1",
            "input": "0x",
            "output": "0x08c379a0",
            "error": "execution reverted"
        }));
        match convert_frame(reverted).unwrap().data {
            NodeData::Call(call) => {
                assert_eq!(call.output, None);
                assert_eq!(call.error.map(|b| b.to_vec()), Some(vec![0x08, 0xc3, 0x79, 0xa0]));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_call_type_is_malformed() {
        let odd = frame(serde_json::json!({
            "type": "TELEPORT",
            "from": "0x00000000000000000000000000000000000000aa",
            "gas": "0x1",
            "gasUsed": "0x1",
            "input": "0x"
        }));
        assert!(matches!(convert_frame(odd), Err(TraceError::MalformedNode(_))));
    }
}
