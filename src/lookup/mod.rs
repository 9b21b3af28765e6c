//! HTTP lookup services
//!
//! - [`four_byte`]: selector to text signature directory
//! - [`etherscan`]: verified source (contract name and ABI) by address
//!
//! Both clients share a `reqwest::Client` built with the configured timeout.

pub mod etherscan;
pub mod four_byte;

pub use etherscan::EtherscanClient;
pub use four_byte::FourByteClient;

use std::time::Duration;

use crate::errors::LookupError;

/// Builds the HTTP client used by lookup services
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, LookupError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("trace-annotator/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
