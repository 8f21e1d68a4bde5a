//! Sign-In-With-Ethereum (EIP-4361) message building and parsing
//!
//! The text a wallet signs and the text the server verifies must be
//! byte-identical, so the builder and the parser share one template and the
//! parser only accepts text that re-serializes to exactly itself.
//!
//! # Format
//!
//! ```text
//! {domain} wants you to sign in with your Ethereum account:
//! {address}
//!
//! {statement}
//!
//! URI: {uri}
//! Version: 1
//! Chain ID: {chain_id}
//! Nonce: {nonce}
//! Issued At: {issued_at}
//! [Expiration Time: {expiration_time}]
//! [Not Before: {not_before}]
//! [Request ID: {request_id}]
//! ```

use std::fmt;
use std::iter::Peekable;
use std::str::Split;

use alloy::primitives::Address;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::validators::{ETH_ADDRESS_REGEX, SIWE_NONCE_REGEX};

/// Statement shown to the player in their wallet
pub const SIWE_STATEMENT: &str = "Sign in to GrepCoin Arcade";

/// EIP-4361 message version
pub const SIWE_VERSION: &str = "1";

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// Errors that can occur while building or parsing a SIWE message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiweError {
    #[error("SIWE message is empty")]
    EmptyMessage,

    #[error("Invalid SIWE header")]
    InvalidHeader,

    #[error("Missing SIWE field: {0}")]
    MissingField(&'static str),

    #[error("Invalid SIWE address: {0}")]
    InvalidAddress(String),

    #[error("Invalid SIWE field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unexpected line in SIWE message: {0:?}")]
    UnexpectedLine(String),

    #[error("SIWE message is not in canonical form")]
    NonCanonical,
}

/// A structured SIWE message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweMessage {
    pub domain: String,
    /// Address exactly as it appears in the message text
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    /// RFC 3339 timestamps, kept verbatim so the text round-trips
    pub issued_at: String,
    pub expiration_time: Option<String>,
    pub not_before: Option<String>,
    pub request_id: Option<String>,
}

impl SiweMessage {
    /// Build the GrepCoin sign-in message for `address`
    ///
    /// The address is normalized to its EIP-55 checksum form and `issued_at`
    /// is rendered with millisecond precision, matching what browser wallets
    /// libraries produce.
    pub fn new(
        domain: impl Into<String>,
        address: &str,
        uri: impl Into<String>,
        chain_id: u64,
        nonce: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, SiweError> {
        let nonce = nonce.into();
        if !SIWE_NONCE_REGEX.is_match(&nonce) {
            return Err(SiweError::InvalidField {
                field: "Nonce",
                reason: "must be at least 8 alphanumeric characters".to_string(),
            });
        }

        Ok(Self {
            domain: domain.into(),
            address: checksum_address(address)?,
            statement: Some(SIWE_STATEMENT.to_string()),
            uri: uri.into(),
            version: SIWE_VERSION.to_string(),
            chain_id,
            nonce,
            issued_at: format_timestamp(issued_at),
            expiration_time: None,
            not_before: None,
            request_id: None,
        })
    }

    pub fn with_expiration_time(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_time = Some(format_timestamp(at));
        self
    }

    pub fn with_not_before(mut self, at: DateTime<Utc>) -> Self {
        self.not_before = Some(format_timestamp(at));
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Parse a SIWE message from its plaintext form
    ///
    /// # Errors
    ///
    /// Returns a `SiweError` for any deviation from the template, including
    /// extra whitespace, `\r\n` line endings and trailing newlines.
    pub fn parse(message: &str) -> Result<Self, SiweError> {
        if message.is_empty() {
            return Err(SiweError::EmptyMessage);
        }

        let mut lines = message.split('\n').peekable();

        let domain = lines
            .next()
            .and_then(|header| header.strip_suffix(HEADER_SUFFIX))
            .filter(|domain| !domain.is_empty() && !domain.contains(char::is_whitespace))
            .ok_or(SiweError::InvalidHeader)?
            .to_string();

        // EIP-4361 requires the EIP-55 mixed-case form
        let address = lines.next().ok_or(SiweError::MissingField("address"))?;
        if checksum_address(address)? != address {
            return Err(SiweError::InvalidAddress(format!(
                "{} is not EIP-55 checksummed",
                address
            )));
        }
        let address = address.to_string();

        expect_blank(&mut lines)?;

        // An empty line here means the optional statement was omitted
        let statement = match lines.next() {
            Some("") => None,
            Some(statement) => {
                expect_blank(&mut lines)?;
                Some(statement.to_string())
            }
            None => return Err(SiweError::MissingField("URI")),
        };

        let uri = required_field(&mut lines, "URI")?.to_string();
        let version = required_field(&mut lines, "Version")?.to_string();
        let chain_id = required_field(&mut lines, "Chain ID")?
            .parse::<u64>()
            .map_err(|e| SiweError::InvalidField {
                field: "Chain ID",
                reason: e.to_string(),
            })?;

        let nonce = required_field(&mut lines, "Nonce")?;
        if !SIWE_NONCE_REGEX.is_match(nonce) {
            return Err(SiweError::InvalidField {
                field: "Nonce",
                reason: "must be at least 8 alphanumeric characters".to_string(),
            });
        }
        let nonce = nonce.to_string();

        let issued_at = timestamp_field(required_field(&mut lines, "Issued At")?, "Issued At")?;
        let expiration_time = optional_field(&mut lines, "Expiration Time")
            .map(|value| timestamp_field(value, "Expiration Time"))
            .transpose()?;
        let not_before = optional_field(&mut lines, "Not Before")
            .map(|value| timestamp_field(value, "Not Before"))
            .transpose()?;
        let request_id = optional_field(&mut lines, "Request ID").map(str::to_string);

        if let Some(extra) = lines.next() {
            return Err(SiweError::UnexpectedLine(extra.to_string()));
        }

        let parsed = Self {
            domain,
            address,
            statement,
            uri,
            version,
            chain_id,
            nonce,
            issued_at,
            expiration_time,
            not_before,
            request_id,
        };

        if parsed.to_string() != message {
            return Err(SiweError::NonCanonical);
        }

        Ok(parsed)
    }

    /// Whether the message carries an expiration time that has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|exp| exp <= now)
    }

    /// Whether the message carries a not-before time still in the future
    pub fn is_not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        self.not_before
            .as_deref()
            .and_then(parse_timestamp)
            .is_some_and(|nbf| nbf > now)
    }
}

impl fmt::Display for SiweMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\n{}\n\n", self.domain, HEADER_SUFFIX, self.address)?;
        if let Some(statement) = &self.statement {
            write!(f, "{}\n", statement)?;
        }
        write!(
            f,
            "\nURI: {}\nVersion: {}\nChain ID: {}\nNonce: {}\nIssued At: {}",
            self.uri, self.version, self.chain_id, self.nonce, self.issued_at
        )?;
        if let Some(expiration_time) = &self.expiration_time {
            write!(f, "\nExpiration Time: {}", expiration_time)?;
        }
        if let Some(not_before) = &self.not_before {
            write!(f, "\nNot Before: {}", not_before)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, "\nRequest ID: {}", request_id)?;
        }
        Ok(())
    }
}

type Lines<'a> = Peekable<Split<'a, char>>;

fn expect_blank(lines: &mut Lines<'_>) -> Result<(), SiweError> {
    match lines.next() {
        Some("") => Ok(()),
        Some(other) => Err(SiweError::UnexpectedLine(other.to_string())),
        None => Err(SiweError::MissingField("URI")),
    }
}

fn required_field<'a>(lines: &mut Lines<'a>, name: &'static str) -> Result<&'a str, SiweError> {
    lines
        .next()
        .and_then(|line| strip_field(line, name))
        .ok_or(SiweError::MissingField(name))
}

fn optional_field<'a>(lines: &mut Lines<'a>, name: &'static str) -> Option<&'a str> {
    let value = lines.peek().and_then(|line| strip_field(line, name))?;
    lines.next();
    Some(value)
}

fn strip_field<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    line.strip_prefix(name)?.strip_prefix(": ")
}

fn timestamp_field(value: &str, field: &'static str) -> Result<String, SiweError> {
    DateTime::parse_from_rfc3339(value).map_err(|e| SiweError::InvalidField {
        field,
        reason: e.to_string(),
    })?;
    Ok(value.to_string())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn checksum_address(address: &str) -> Result<String, SiweError> {
    if !ETH_ADDRESS_REGEX.is_match(address) {
        return Err(SiweError::InvalidAddress(address.to_string()));
    }
    address
        .parse::<Address>()
        .map(|parsed| parsed.to_checksum(None))
        .map_err(|e| SiweError::InvalidAddress(e.to_string()))
}
