//! Unknown extractor
//!
//! Walks a raw trace and collects what the current knowledge cannot explain:
//! selectors the registry does not decode and addresses without a profile.
//! Both collectors return each value once, in first-seen pre-order.

use std::collections::HashSet;

use crate::{
    abi::InterfaceRegistry,
    types::{address_key, Address, ContractProfiles, NodeData, Selector, TraceNode},
};

/// Collects selectors of calls whose input the registry cannot decode
///
/// Children are visited whether or not their parent decoded. Creations and
/// inputs shorter than a selector contribute nothing.
pub fn unknown_selectors(registry: &InterfaceRegistry, root: &TraceNode) -> Vec<Selector> {
    let mut seen = HashSet::new();
    let mut unknown = Vec::new();
    walk(root, &mut |node| {
        let NodeData::Call(call) = &node.data else { return };
        let (Some(selector), Some(input)) = (call.selector(), call.input.as_ref()) else { return };
        if registry.decode_call(selector, input).is_err() && seen.insert(selector) {
            unknown.push(selector);
        }
    });
    unknown
}

/// Collects caller and callee addresses that have no contract profile
///
/// Only call nodes with both endpoints present contribute.
pub fn unknown_addresses(profiles: &ContractProfiles, root: &TraceNode) -> Vec<Address> {
    let mut seen = HashSet::new();
    let mut unknown = Vec::new();
    walk(root, &mut |node| {
        let NodeData::Call(call) = &node.data else { return };
        let (Some(from), Some(to)) = (call.from, call.to) else { return };
        for address in [from, to] {
            let key = address_key(&address);
            if !profiles.contains_key(&key) && seen.insert(key) {
                unknown.push(address);
            }
        }
    });
    unknown
}

fn walk(node: &TraceNode, visit: &mut impl FnMut(&TraceNode)) {
    visit(node);
    for child in &node.children {
        walk(child, visit);
    }
}
