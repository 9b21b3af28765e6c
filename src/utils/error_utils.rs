//! Revert payload decoding
//!
//! Only the standard `Error(string)` revert (selector `0x08c379a0`) is turned
//! into text. Panics and custom errors stay raw so a renderer shows the exact
//! payload instead of a guess.

use alloy::dyn_abi::{DynSolType, DynSolValue};

/// Selector of `Error(string)`
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Decode the reason string of a standard revert
///
/// # Arguments
/// * `payload` - Raw revert data of a failed call
///
/// # Returns
/// * `Some(String)` - Reason passed to `revert("...")` / `require(.., "...")`
/// * `None` - Any other payload, including a truncated `Error(string)`
///
/// # Example
/// ```
/// use trace_annotator::utils::error_utils::decode_revert_reason;
/// use alloy::primitives::hex;
///
/// let payload = hex::decode(
///     "08c379a0\
///      0000000000000000000000000000000000000000000000000000000000000020\
///      0000000000000000000000000000000000000000000000000000000000000014\
///      696e73756666696369656e742062616c616e6365000000000000000000000000"
/// ).unwrap();
/// assert_eq!(decode_revert_reason(&payload), Some("insufficient balance".to_string()));
/// ```
pub fn decode_revert_reason(payload: &[u8]) -> Option<String> {
    let body = payload.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
    match DynSolType::String.abi_decode(body) {
        Ok(DynSolValue::String(reason)) => Some(reason),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::hex::decode;

    #[test]
    fn test_decode_error_string() {
        // "insufficient balance" encoded as Error(string)
        let error_bytes = decode(
            "08c379a0\
             0000000000000000000000000000000000000000000000000000000000000020\
             0000000000000000000000000000000000000000000000000000000000000014\
             696e73756666696369656e742062616c616e6365000000000000000000000000",
        )
        .unwrap();
        assert_eq!(
            decode_revert_reason(&error_bytes),
            Some("insufficient balance".to_string())
        );

        // Selector without a body
        let truncated = decode("08c379a0").unwrap();
        assert_eq!(decode_revert_reason(&truncated), None);
    }

    #[test]
    fn test_other_payloads_stay_raw() {
        assert_eq!(decode_revert_reason(&[]), None);
        assert_eq!(decode_revert_reason(&[0x08, 0xc3, 0x79]), None);

        // Panic(uint256) with code 0x11
        let mut panic = vec![0x4e, 0x48, 0x7b, 0x71];
        panic.extend_from_slice(&[0u8; 31]);
        panic.push(0x11);
        assert_eq!(decode_revert_reason(&panic), None);

        // Custom error selector
        assert_eq!(decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]), None);
    }
}
