//! Integration tests for decoding and unknown extraction
//!
//! Exercises the pure half of the engine through the public API only:
//! registry, decoder and extractors, with no collaborators involved.

mod common;

use alloy::{
    primitives::{address, hex, Address, Selector, U256},
    sol,
    sol_types::{SolCall, SolEvent},
};
use common::call;
use trace_annotator::{
    decode,
    types::{CallData, CallKind, ContractProfiles, LogEntry, NodeData},
    unknowns::{unknown_addresses, unknown_selectors},
    InterfaceRegistry, RegistryBuilder, TraceNode,
};

sol! {
    function transfer(address to, uint256 value) returns (bool);
    function getReserves() returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    function mystery(uint256 a);
    event Transfer(address indexed from, address indexed to, uint256 value);
}

const ALICE: Address = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
const TOKEN: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
const PAIR: Address = address!("B4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc");

#[test]
fn test_transfer_selector_round_trip() {
    assert_eq!(transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);

    let registry = InterfaceRegistry::seeded();
    let input = transferCall { to: ALICE, value: U256::from(1_000_000) }.abi_encode();
    let root = call(ALICE, TOKEN, input, vec![]);

    let annotated = decode(&registry, &ContractProfiles::new(), &root);
    assert_eq!(
        annotated.annotations.pretty_name,
        Some(format!("transfer(to={},value=1000000)", ALICE.to_checksum(None)))
    );
    assert!(unknown_selectors(&registry, &root).is_empty());
}

#[test]
fn test_exactly_one_undecodable_child_is_reported() {
    let registry = InterfaceRegistry::seeded();
    let transfer = transferCall { to: ALICE, value: U256::from(1) }.abi_encode();
    let mystery = mysteryCall { a: U256::from(42) }.abi_encode();
    let root = call(
        ALICE,
        TOKEN,
        transfer.clone(),
        vec![call(TOKEN, PAIR, transfer, vec![]), call(TOKEN, PAIR, mystery.clone(), vec![])],
    );

    let unknown = unknown_selectors(&registry, &root);
    assert_eq!(unknown, vec![Selector::from_slice(&mystery[..4])]);
}

#[test]
fn test_decoding_is_idempotent() {
    let registry = InterfaceRegistry::build(["mystery(uint256)"]);
    let root = call(
        ALICE,
        TOKEN,
        mysteryCall { a: U256::from(3) }.abi_encode(),
        vec![call(TOKEN, PAIR, vec![0xff], vec![])],
    );
    let profiles = ContractProfiles::new();
    let first = decode(&registry, &profiles, &root);
    let second = decode(&registry, &profiles, &root);
    assert_eq!(first, second);
    assert_eq!(first.annotations.pretty_name.as_deref(), Some("mystery(3)"));
}

#[test]
fn test_undecodable_call_keeps_raw_input() {
    let registry = InterfaceRegistry::seeded();
    let input = mysteryCall { a: U256::from(9) }.abi_encode();
    let root = call(ALICE, TOKEN, input.clone(), vec![]);

    let annotated = decode(&registry, &ContractProfiles::new(), &root);
    assert_eq!(annotated.annotations.pretty_name, None);
    assert_eq!(annotated.data, root.data);
    let NodeData::Call(call) = &annotated.data else { panic!("expected call") };
    assert_eq!(call.input.as_ref().map(|b| b.to_vec()), Some(input));
}

#[test]
fn test_string_revert_is_decoded() {
    let registry = InterfaceRegistry::seeded();
    let reason = hex::decode(
        "08c379a0\
         0000000000000000000000000000000000000000000000000000000000000020\
         0000000000000000000000000000000000000000000000000000000000000014\
         696e73756666696369656e742062616c616e6365000000000000000000000000",
    )
    .unwrap();
    let panic_payload = hex::decode(
        "4e487b71\
         0000000000000000000000000000000000000000000000000000000000000011",
    )
    .unwrap();

    let reverted = TraceNode::call(CallData::new(CallKind::Call, ALICE, TOKEN).with_error(reason), vec![]);
    let panicked = TraceNode::call(CallData::new(CallKind::Call, ALICE, TOKEN).with_error(panic_payload.clone()), vec![]);

    let profiles = ContractProfiles::new();
    assert_eq!(
        decode(&registry, &profiles, &reverted).annotations.pretty_error.as_deref(),
        Some("insufficient balance")
    );
    let annotated = decode(&registry, &profiles, &panicked);
    assert_eq!(annotated.annotations.pretty_error, None);
    let NodeData::Call(call) = &annotated.data else { panic!("expected call") };
    assert_eq!(call.error.as_ref().map(|b| b.to_vec()), Some(panic_payload));
}

#[test]
fn test_multiple_return_values_are_parenthesised() {
    let registry = InterfaceRegistry::seeded();
    let output = [
        U256::from(100).to_be_bytes::<32>(),
        U256::from(200).to_be_bytes::<32>(),
        U256::from(1_700_000_000u64).to_be_bytes::<32>(),
    ]
    .concat();
    let root = TraceNode::call(
        CallData::new(CallKind::StaticCall, ALICE, PAIR)
            .with_input(getReservesCall {}.abi_encode())
            .with_output(output),
        vec![],
    );

    let annotated = decode(&registry, &ContractProfiles::new(), &root);
    assert_eq!(annotated.annotations.pretty_name.as_deref(), Some("getReserves()"));
    assert_eq!(
        annotated.annotations.pretty_result.as_deref(),
        Some("(reserve0=100,reserve1=200,blockTimestampLast=1700000000)")
    );
}

#[test]
fn test_log_decoding_and_raw_fallback() {
    let registry = InterfaceRegistry::seeded();
    let event = Transfer { from: ALICE, to: PAIR, value: U256::from(7) }.encode_log_data();
    let known = TraceNode::log(LogEntry {
        address: Some(TOKEN),
        topics: event.topics().to_vec(),
        data: event.data.clone(),
    });
    let unknown = TraceNode::log(LogEntry {
        address: Some(TOKEN),
        topics: vec![alloy::primitives::B256::repeat_byte(0x11)],
        data: Default::default(),
    });
    let root = call(ALICE, TOKEN, vec![], vec![known, unknown]);

    let annotated = decode(&registry, &ContractProfiles::new(), &root);
    assert_eq!(
        annotated.children[0].annotations.pretty_name,
        Some(format!(
            "Transfer(from={},to={},value=7)",
            ALICE.to_checksum(None),
            PAIR.to_checksum(None)
        ))
    );
    assert!(annotated.children[1].annotations.is_empty());
}

#[test]
fn test_learned_abi_names_arguments() {
    let abi = serde_json::from_str(
        r#"[{"type":"function","name":"mystery","inputs":[{"name":"amount","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}]"#,
    )
    .unwrap();
    let registry = RegistryBuilder::new().with_abi(&abi).build();
    let root = call(ALICE, TOKEN, mysteryCall { a: U256::from(5) }.abi_encode(), vec![]);
    let annotated = decode(&registry, &ContractProfiles::new(), &root);
    assert_eq!(annotated.annotations.pretty_name.as_deref(), Some("mystery(amount=5)"));
}

#[test]
fn test_unknown_addresses_skip_known_profiles() {
    let root = call(ALICE, TOKEN, vec![], vec![call(TOKEN, PAIR, vec![], vec![])]);
    let mut profiles = ContractProfiles::new();
    profiles.insert(format!("{TOKEN:#x}"), Default::default());
    assert_eq!(unknown_addresses(&profiles, &root), vec![ALICE, PAIR]);
}
