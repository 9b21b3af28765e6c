//! Trace decoder
//!
//! A pure function from `(registry, profiles, raw tree)` to an annotated tree.
//! It never fails: anything it cannot decode leaves the matching annotation
//! absent and the raw payload untouched. Decoding the same inputs twice yields
//! identical output.

use crate::{
    abi::{format::format_result, InterfaceRegistry},
    types::{
        address_key, AnnotatedNode, Annotations, CallData, ContractProfiles, LogEntry, NodeData,
        TraceNode,
    },
    utils::{error_utils::decode_revert_reason, units::format_native_value},
};

/// Annotates a trace tree
///
/// Walks the tree pre-order, left to right, and preserves its shape one to one.
///
/// # Arguments
/// * `registry` - Signatures to decode calls, results and logs against
/// * `profiles` - Known contract names keyed by lower-cased address
/// * `node` - Root of the raw trace
pub fn decode(registry: &InterfaceRegistry, profiles: &ContractProfiles, node: &TraceNode) -> AnnotatedNode {
    let annotations = match &node.data {
        NodeData::Call(call) => annotate_call(registry, profiles, call),
        // Slot, before and after words are sufficient on their own
        NodeData::Storage(_) => Annotations::default(),
        NodeData::Log(log) => annotate_log(registry, log),
    };

    AnnotatedNode {
        data: node.data.clone(),
        annotations,
        children: node
            .children
            .iter()
            .map(|child| decode(registry, profiles, child))
            .collect(),
    }
}

fn annotate_call(registry: &InterfaceRegistry, profiles: &ContractProfiles, call: &CallData) -> Annotations {
    let mut annotations = Annotations::default();

    if let (Some(selector), Some(input)) = (call.selector(), call.input.as_ref()) {
        if let Ok(decoded) = registry.decode_call(selector, input) {
            annotations.pretty_name = Some(decoded.pretty());
            if let Some(output) = call.output.as_ref() {
                annotations.pretty_result = registry
                    .decode_result(&decoded.signature, output)
                    .ok()
                    .and_then(|values| format_result(&values));
            }
        }
    }

    annotations.pretty_address_label = call
        .to
        .as_ref()
        .and_then(|to| profiles.get(&address_key(to)))
        .and_then(|profile| profile.name.clone());

    annotations.pretty_value = call.value.and_then(format_native_value);

    annotations.pretty_error = call
        .error
        .as_ref()
        .and_then(|payload| decode_revert_reason(payload));

    annotations
}

fn annotate_log(registry: &InterfaceRegistry, log: &LogEntry) -> Annotations {
    Annotations {
        pretty_name: registry
            .decode_log(&log.topics, &log.data)
            .ok()
            .map(|decoded| decoded.pretty()),
        ..Default::default()
    }
}
