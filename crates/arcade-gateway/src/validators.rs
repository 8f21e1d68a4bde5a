//! Custom validators for wallet sign-in input

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex pattern for Ethereum address validation (0x + 40 hex chars)
pub static ETH_ADDRESS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("Invalid ETH address regex"));

/// EIP-4361 nonce: at least 8 alphanumeric characters
pub static SIWE_NONCE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]{8,}$").expect("Invalid SIWE nonce regex"));
