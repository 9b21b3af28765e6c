//! Rendering of decoded ABI values
//!
//! Produces the compact `name(arg=value,...)` form used for annotated nodes.

use alloy::{dyn_abi::DynSolValue, primitives::hex};

/// Renders a single value
///
/// Addresses are EIP-55 checksummed, integers decimal, strings quoted and
/// byte strings `0x` hex. Arrays use `[..]`, tuples `(..)`.
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(address) => address.to_checksum(None),
        DynSolValue::Function(function) => function.to_string(),
        DynSolValue::Bool(flag) => flag.to_string(),
        DynSolValue::Int(int, _) => int.to_string(),
        DynSolValue::Uint(uint, _) => uint.to_string(),
        DynSolValue::FixedBytes(word, size) => hex::encode_prefixed(&word[..*size]),
        DynSolValue::Bytes(bytes) => hex::encode_prefixed(bytes),
        DynSolValue::String(text) => format!("{text:?}"),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            format!("[{}]", join_values(values))
        }
        DynSolValue::Tuple(values) => format!("({})", join_values(values)),
        #[allow(unreachable_patterns)]
        other => format!("{other:?}"),
    }
}

fn join_values(values: &[DynSolValue]) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(",")
}

/// Renders `name(a=1,b=2)`; unnamed arguments render as bare values
pub fn format_call(name: &str, args: &[(String, DynSolValue)]) -> String {
    format!("{name}({})", format_args_list(args))
}

/// Renders return values; a single value is bare, several are parenthesised
///
/// Returns `None` for an empty list.
pub fn format_result(values: &[(String, DynSolValue)]) -> Option<String> {
    match values {
        [] => None,
        [single] => Some(format_named(single)),
        many => Some(format!("({})", format_args_list(many))),
    }
}

fn format_args_list(args: &[(String, DynSolValue)]) -> String {
    args.iter().map(format_named).collect::<Vec<_>>().join(",")
}

fn format_named((name, value): &(String, DynSolValue)) -> String {
    if name.is_empty() {
        format_value(value)
    } else {
        format!("{name}={}", format_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    #[test]
    fn test_format_call() {
        let to = address!("d8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        let args = vec![
            ("to".to_string(), DynSolValue::Address(to)),
            ("value".to_string(), DynSolValue::Uint(U256::from(1000), 256)),
        ];
        assert_eq!(
            format_call("transfer", &args),
            "transfer(to=0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045,value=1000)"
        );

        // Signatures learned from a directory carry no parameter names
        let unnamed = vec![
            (String::new(), DynSolValue::Bool(true)),
            (String::new(), DynSolValue::String("hi".into())),
        ];
        assert_eq!(format_call("f", &unnamed), "f(true,\"hi\")");
    }

    #[test]
    fn test_format_nested_values() {
        let value = DynSolValue::Tuple(vec![
            DynSolValue::Array(vec![
                DynSolValue::Uint(U256::from(1), 8),
                DynSolValue::Uint(U256::from(2), 8),
            ]),
            DynSolValue::Bytes(vec![0xde, 0xad]),
        ]);
        assert_eq!(format_value(&value), "([1,2],0xdead)");
    }

    #[test]
    fn test_format_result() {
        assert_eq!(format_result(&[]), None);
        let single = [(String::new(), DynSolValue::Bool(true))];
        assert_eq!(format_result(&single).as_deref(), Some("true"));
        let pair = [
            ("amountA".to_string(), DynSolValue::Uint(U256::from(1), 256)),
            ("amountB".to_string(), DynSolValue::Uint(U256::from(2), 256)),
        ];
        assert_eq!(format_result(&pair).as_deref(), Some("(amountA=1,amountB=2)"));
    }
}
