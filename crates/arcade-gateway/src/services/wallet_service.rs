//! Wallet Authentication Service
//!
//! Verifies Sign-In-With-Ethereum messages signed with EIP-191 `personal_sign`.
//!
//! # Checks
//!
//! - The message parses and re-serializes byte-for-byte
//! - Version is `1` and the domain matches the configured SIWE domain
//! - Chain ID is in the allow list (when one is configured)
//! - Expiration Time / Not Before bounds hold
//! - The nonce equals the one issued to this browser (constant-time compare)
//! - The recovered signer equals the address in the message
//!
//! Callers get a typed `WalletError` back; the HTTP layer collapses every
//! variant into the same 401 so clients cannot tell which check failed.

use alloy::primitives::{keccak256, PrimitiveSignature, B256, U256};
use alloy::signers::k256::ecdsa::VerifyingKey;
use chrono::{DateTime, Utc};
use shared::SiweConfig;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::siwe::{SiweError, SiweMessage, SIWE_VERSION};
use crate::validators::ETH_ADDRESS_REGEX;

/// Signature length: r (32) || s (32) || v (1)
const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during wallet operations
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid SIWE message: {0}")]
    InvalidMessage(#[from] SiweError),

    #[error("Unsupported SIWE version: {0}")]
    UnsupportedVersion(String),

    #[error("Domain mismatch: expected {expected}, got {actual}")]
    DomainMismatch { expected: String, actual: String },

    #[error("Unsupported chain ID: {0}")]
    UnsupportedChain(u64),

    #[error("Message expired")]
    MessageExpired,

    #[error("Message not yet valid")]
    MessageNotYetValid,

    #[error("Nonce mismatch")]
    NonceMismatch,

    #[error("Invalid signature format: {0}")]
    InvalidSignature(String),

    #[error("Signature verification failed: signer does not match expected address")]
    SignerMismatch,

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),
}

/// Service for wallet authentication operations
///
/// Created once at startup and shared across handlers via app state.
#[derive(Debug, Clone)]
pub struct WalletService {
    /// Domain that must appear in the SIWE header
    domain: String,
    /// Accepted chain IDs; empty accepts any chain
    chain_ids: Vec<u64>,
}

impl WalletService {
    pub fn new(domain: impl Into<String>, chain_ids: Vec<u64>) -> Self {
        Self {
            domain: domain.into(),
            chain_ids,
        }
    }

    pub fn from_config(config: &SiweConfig) -> Self {
        Self::new(config.domain.clone(), config.chain_ids.clone())
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Verify a signed SIWE message against the nonce issued to the caller
    ///
    /// # Returns
    /// The lowercased signer address
    pub fn verify_siwe(
        &self,
        message: &str,
        signature: &str,
        expected_nonce: &str,
    ) -> Result<String, WalletError> {
        self.verify_siwe_at(message, signature, expected_nonce, Utc::now())
    }

    /// [`verify_siwe`](Self::verify_siwe) with an explicit clock
    pub fn verify_siwe_at(
        &self,
        message: &str,
        signature: &str,
        expected_nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<String, WalletError> {
        let siwe = SiweMessage::parse(message)?;

        if siwe.version != SIWE_VERSION {
            return Err(WalletError::UnsupportedVersion(siwe.version));
        }

        if siwe.domain != self.domain {
            return Err(WalletError::DomainMismatch {
                expected: self.domain.clone(),
                actual: siwe.domain,
            });
        }

        if !self.chain_ids.is_empty() && !self.chain_ids.contains(&siwe.chain_id) {
            return Err(WalletError::UnsupportedChain(siwe.chain_id));
        }

        if siwe.is_expired(now) {
            return Err(WalletError::MessageExpired);
        }
        if siwe.is_not_yet_valid(now) {
            return Err(WalletError::MessageNotYetValid);
        }

        let nonce_matches: bool = siwe
            .nonce
            .as_bytes()
            .ct_eq(expected_nonce.as_bytes())
            .into();
        if !nonce_matches {
            return Err(WalletError::NonceMismatch);
        }

        self.verify_signature(message, signature, &siwe.address)
    }

    /// Verify an EIP-191 signature and recover the signer address
    ///
    /// # Arguments
    /// * `message` - The exact text that was signed
    /// * `signature` - 65 bytes in hex (0x prefix optional)
    /// * `expected_address` - The address we expect to have signed the message
    ///
    /// # Returns
    /// The recovered signer address, lowercased
    pub fn verify_signature(
        &self,
        message: &str,
        signature: &str,
        expected_address: &str,
    ) -> Result<String, WalletError> {
        validate_address(expected_address)?;

        let sig_hex = signature.strip_prefix("0x").unwrap_or(signature);
        let sig_bytes = hex::decode(sig_hex)
            .map_err(|e| WalletError::InvalidSignature(format!("Invalid hex: {}", e)))?;

        if sig_bytes.len() != SIGNATURE_LENGTH {
            return Err(WalletError::InvalidSignature(format!(
                "Expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                sig_bytes.len()
            )));
        }

        let r = U256::from_be_slice(&sig_bytes[0..32]);
        let s = U256::from_be_slice(&sig_bytes[32..64]);
        let v = sig_bytes[64];

        // Wallets emit either 27/28 or a bare 0/1 parity
        let y_parity = match v {
            0 | 27 => false,
            1 | 28 => true,
            _ => {
                return Err(WalletError::InvalidSignature(format!(
                    "Invalid recovery id: {}",
                    v
                )))
            }
        };

        let recovered_key = PrimitiveSignature::new(r, s, y_parity)
            .recover_from_prehash(&eip191_hash(message))
            .map_err(|e| WalletError::InvalidSignature(format!("Recovery failed: {}", e)))?;

        let recovered_address = pubkey_to_address(&recovered_key);

        if !recovered_address.eq_ignore_ascii_case(expected_address) {
            return Err(WalletError::SignerMismatch);
        }

        Ok(recovered_address)
    }
}

/// Validate Ethereum address format
fn validate_address(address: &str) -> Result<(), WalletError> {
    if !ETH_ADDRESS_REGEX.is_match(address) {
        return Err(WalletError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

/// Create EIP-191 prefixed message hash
///
/// Format: "\x19Ethereum Signed Message:\n" + message.length + message
pub fn eip191_hash(message: &str) -> B256 {
    let prefixed = format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message);
    keccak256(prefixed.as_bytes())
}

/// Convert a public key to a lowercase Ethereum address
fn pubkey_to_address(pubkey: &VerifyingKey) -> String {
    // Uncompressed point is 0x04 || X || Y; the address hashes X || Y
    let encoded = pubkey.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::k256::ecdsa::SigningKey;
    use chrono::{Duration, TimeZone};

    // Hardhat account #0
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const DOMAIN: &str = "arcade.grepcoin.io";
    const NONCE: &str = "5e0f3a9c1b7d4e2f8a6c0b9d3e1f7a2c";

    fn create_service() -> WalletService {
        WalletService::new(DOMAIN, vec![])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn message() -> SiweMessage {
        SiweMessage::new(DOMAIN, TEST_ADDRESS, "https://arcade.grepcoin.io", 8453, NONCE, now())
            .unwrap()
    }

    fn sign(message: &str) -> String {
        let key = SigningKey::from_slice(&hex::decode(TEST_KEY).unwrap()).unwrap();
        let (sig, recid) = key
            .sign_prehash_recoverable(eip191_hash(message).as_slice())
            .unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    // ========================================================================
    // SIWE verification tests
    // ========================================================================

    #[test]
    fn test_verify_siwe_valid_signature() {
        let text = message().to_string();
        let signature = sign(&text);

        let address = create_service()
            .verify_siwe_at(&text, &signature, NONCE, now())
            .unwrap();

        assert_eq!(address, TEST_ADDRESS);
    }

    #[test]
    fn test_verify_siwe_accepts_bare_parity_byte() {
        let text = message().to_string();
        let mut signature = hex::decode(&sign(&text)[2..]).unwrap();
        signature[64] -= 27;

        let result =
            create_service().verify_siwe_at(&text, &hex::encode(signature), NONCE, now());
        assert!(result.is_ok());
    }

    #[test]
    fn test_verify_siwe_nonce_mismatch() {
        let text = message().to_string();
        let signature = sign(&text);

        let result = create_service().verify_siwe_at(
            &text,
            &signature,
            "0000000000000000000000000000000a",
            now(),
        );
        assert!(matches!(result, Err(WalletError::NonceMismatch)));
    }

    #[test]
    fn test_verify_siwe_empty_expected_nonce() {
        let text = message().to_string();
        let signature = sign(&text);

        let result = create_service().verify_siwe_at(&text, &signature, "", now());
        assert!(matches!(result, Err(WalletError::NonceMismatch)));
    }

    #[test]
    fn test_verify_siwe_rejects_unchecksummed_address() {
        let text = message()
            .to_string()
            .replace(
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "0xF39FD6E51AAD88F6F4CE6AB8827279CFFFB92266",
            );
        let signature = sign(&text);

        let result = create_service().verify_siwe_at(&text, &signature, NONCE, now());
        assert!(matches!(
            result,
            Err(WalletError::InvalidMessage(SiweError::InvalidAddress(_)))
        ));
    }

    #[test]
    fn test_verify_siwe_domain_mismatch() {
        let text = message().to_string();
        let signature = sign(&text);

        let result = WalletService::new("evil.example", vec![])
            .verify_siwe_at(&text, &signature, NONCE, now());
        assert!(matches!(result, Err(WalletError::DomainMismatch { .. })));
    }

    #[test]
    fn test_verify_siwe_chain_allow_list() {
        let text = message().to_string();
        let signature = sign(&text);

        let rejected = WalletService::new(DOMAIN, vec![1, 10])
            .verify_siwe_at(&text, &signature, NONCE, now());
        assert!(matches!(rejected, Err(WalletError::UnsupportedChain(8453))));

        let accepted = WalletService::new(DOMAIN, vec![1, 8453])
            .verify_siwe_at(&text, &signature, NONCE, now());
        assert!(accepted.is_ok());
    }

    #[test]
    fn test_verify_siwe_unsupported_version() {
        let mut siwe = message();
        siwe.version = "2".to_string();
        let text = siwe.to_string();
        let signature = sign(&text);

        let result = create_service().verify_siwe_at(&text, &signature, NONCE, now());
        assert!(matches!(result, Err(WalletError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_verify_siwe_expired_message() {
        let text = message()
            .with_expiration_time(now() + Duration::minutes(5))
            .to_string();
        let signature = sign(&text);
        let service = create_service();

        assert!(service.verify_siwe_at(&text, &signature, NONCE, now()).is_ok());
        assert!(matches!(
            service.verify_siwe_at(&text, &signature, NONCE, now() + Duration::minutes(6)),
            Err(WalletError::MessageExpired)
        ));
    }

    #[test]
    fn test_verify_siwe_not_before() {
        let text = message()
            .with_not_before(now() + Duration::minutes(1))
            .to_string();
        let signature = sign(&text);

        let result = create_service().verify_siwe_at(&text, &signature, NONCE, now());
        assert!(matches!(result, Err(WalletError::MessageNotYetValid)));
    }

    #[test]
    fn test_verify_siwe_tampered_message() {
        let text = message().to_string();
        let signature = sign(&text);
        let tampered = text.replace("Chain ID: 8453", "Chain ID: 1");

        let result = create_service().verify_siwe_at(&tampered, &signature, NONCE, now());
        assert!(matches!(result, Err(WalletError::SignerMismatch)));
    }

    #[test]
    fn test_verify_siwe_claimed_address_differs_from_signer() {
        let siwe = SiweMessage::new(
            DOMAIN,
            "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb4",
            "https://arcade.grepcoin.io",
            8453,
            NONCE,
            now(),
        )
        .unwrap();
        let text = siwe.to_string();
        let signature = sign(&text);

        let result = create_service().verify_siwe_at(&text, &signature, NONCE, now());
        assert!(matches!(result, Err(WalletError::SignerMismatch)));
    }

    #[test]
    fn test_verify_siwe_malformed_message() {
        let result = create_service().verify_siwe_at("hello", &sign("hello"), NONCE, now());
        assert!(matches!(result, Err(WalletError::InvalidMessage(_))));
    }

    // ========================================================================
    // EIP-191 hash tests
    // ========================================================================

    #[test]
    fn test_eip191_hash_deterministic() {
        assert_eq!(eip191_hash("test message"), eip191_hash("test message"));
    }

    #[test]
    fn test_eip191_hash_different_messages() {
        assert_ne!(eip191_hash("message 1"), eip191_hash("message 2"));
    }

    // ========================================================================
    // Signature format tests
    // ========================================================================

    #[test]
    fn test_verify_signature_invalid_hex() {
        let result = create_service().verify_signature("test message", "not-hex", TEST_ADDRESS);
        assert!(matches!(result, Err(WalletError::InvalidSignature(_))));
    }

    #[test]
    fn test_verify_signature_wrong_length() {
        let result = create_service().verify_signature("test message", "0x1234", TEST_ADDRESS);
        assert!(matches!(result, Err(WalletError::InvalidSignature(_))));
    }

    #[test]
    fn test_verify_signature_bad_recovery_id() {
        let mut signature = hex::decode(&sign("test message")[2..]).unwrap();
        signature[64] = 5;

        let result = create_service().verify_signature(
            "test message",
            &hex::encode(signature),
            TEST_ADDRESS,
        );
        assert!(matches!(result, Err(WalletError::InvalidSignature(_))));
    }

    #[test]
    fn test_verify_signature_invalid_expected_address() {
        let result = create_service().verify_signature("m", &sign("m"), "0x1234");
        assert!(matches!(result, Err(WalletError::InvalidAddress(_))));
    }

    #[test]
    fn test_verify_signature_checksum_address_accepted() {
        let result = create_service().verify_signature(
            "test message",
            &sign("test message"),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        );
        assert_eq!(result.unwrap(), TEST_ADDRESS);
    }
}
