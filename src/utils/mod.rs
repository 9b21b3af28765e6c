//! Helper functions shared by the decoder
//!
//! # Modules
//!
//! - [`error_utils`]: `Error(string)` revert reason decoding
//! - [`units`]: Native value formatting in base units

/// Revert payload decoding
pub mod error_utils;

/// Native value formatting
pub mod units;
