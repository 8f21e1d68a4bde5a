//! Wallet sign-in DTOs

use serde::{Deserialize, Serialize};
use shared::models::User;
use utoipa::ToSchema;
use validator::Validate;

use crate::validators::{ETH_ADDRESS_REGEX, SIWE_NONCE_REGEX};

/// Fresh SIWE nonce
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"nonce": "8f1c2b9e4d7a60b35c21e0f94a7d3b6c"}))]
pub struct NonceResponse {
    pub nonce: String,
}

/// Inputs for building the canonical SIWE message
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    "chainId": 8453,
    "nonce": "8f1c2b9e4d7a60b35c21e0f94a7d3b6c"
}))]
pub struct MessageRequest {
    #[validate(regex(path = *ETH_ADDRESS_REGEX, message = "must be 0x followed by 40 hex characters"))]
    pub address: String,

    pub chain_id: u64,

    #[validate(regex(path = *SIWE_NONCE_REGEX, message = "must be at least 8 alphanumeric characters"))]
    pub nonce: String,
}

/// Message text the wallet should sign, byte for byte
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Signed SIWE message submitted for verification
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyRequest {
    /// Exact SIWE message text that was signed
    #[validate(length(min = 1, max = 4096))]
    pub message: String,

    /// 65-byte signature, hex encoded
    #[validate(length(min = 1, max = 200))]
    pub signature: String,
}

/// Public profile of the signed-in player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[schema(example = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")]
    pub wallet_address: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            wallet_address: user.wallet_address,
            username: user.username,
            avatar: user.avatar_url,
        }
    }
}

/// Successful sign-in
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub user: SessionUser,
}

/// Current session; `user` is null when signed out
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}

impl SessionResponse {
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}
