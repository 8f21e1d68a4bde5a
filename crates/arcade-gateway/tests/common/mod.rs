//! Common test utilities for integration tests
//!
//! Provides a test configuration, an in-memory `UserStore`, a fixed secp256k1
//! wallet for signing SIWE messages, and cookie helpers.

#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use alloy::signers::k256::ecdsa::SigningKey;
use anyhow::Result;
use arcade_gateway::repositories::UserStore;
use arcade_gateway::services::wallet_service::eip191_hash;
use arcade_gateway::AppState;
use async_trait::async_trait;
use chrono::Utc;
use shared::config::{
    Config, DatabaseConfig, Environment, RateLimitConfig, ServerConfig, SessionConfig, SiweConfig,
};
use shared::models::User;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// Test configuration constants
pub const TEST_SECRET: &str = "k7Q2v9XzLp4Rm8Nw1Bc6Hy3Td5Fj0Gs/AeUoKi+";
pub const TEST_DOMAIN: &str = "arcade.grepcoin.io";
pub const TEST_URI: &str = "https://arcade.grepcoin.io";
pub const TEST_CHAIN_ID: u64 = 8453;

/// Hardhat account #0
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// Configuration with generous rate limits and no database
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: Environment::Development,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            trusted_proxies: vec!["127.0.0.1".to_string()],
        },
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "grepcoin_test".to_string(),
            user: "postgres".to_string(),
            password: "unused".to_string(),
            max_connections: 1,
            ssl_mode: "disable".to_string(),
        },
        session: SessionConfig {
            secret: TEST_SECRET.to_string(),
            clock_skew_secs: 60,
            cookie_secure: false,
        },
        siwe: SiweConfig {
            domain: TEST_DOMAIN.to_string(),
            uri: TEST_URI.to_string(),
            chain_ids: vec![],
        },
        rate_limit: RateLimitConfig {
            per_ip_per_minute: 1000,
            global_per_minute: 10_000,
        },
    }
}

/// App state backed by a fresh in-memory store
pub fn test_state(config: &Config) -> (AppState, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::default());
    let state = AppState::from_config(config, store.clone());
    (state, store)
}

/// `UserStore` kept in a HashMap
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn insert(&self, user: User) {
        self.users
            .lock()
            .unwrap()
            .insert(user.wallet_address.clone(), user);
    }

    pub fn get(&self, wallet_address: &str) -> Option<User> {
        self.users.lock().unwrap().get(wallet_address).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn upsert_wallet_user(&self, wallet_address: &str) -> Result<User> {
        let address = wallet_address.to_lowercase();
        let now = Utc::now();
        let mut users = self.users.lock().unwrap();

        let user = users.entry(address.clone()).or_insert_with(|| User {
            id: uuid::Uuid::new_v4().to_string(),
            wallet_address: address,
            username: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        });
        user.last_login_at = Some(now);
        user.updated_at = now;

        Ok(user.clone())
    }

    async fn find_by_wallet(&self, wallet_address: &str) -> Result<Option<User>> {
        Ok(self.get(&wallet_address.to_lowercase()))
    }

    async fn check_health(&self) -> Result<()> {
        Ok(())
    }
}

/// Build a stored user for `wallet_address`
pub fn sample_user(wallet_address: &str) -> User {
    let now = Utc::now();
    User {
        id: uuid::Uuid::new_v4().to_string(),
        wallet_address: wallet_address.to_string(),
        username: Some("pixelqueen".to_string()),
        avatar_url: Some("https://cdn.grepcoin.io/avatars/pixelqueen.png".to_string()),
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}

/// `personal_sign` `message` with the test wallet, returning `0x` hex
pub fn sign_message(message: &str) -> String {
    sign_message_with(TEST_PRIVATE_KEY, message)
}

pub fn sign_message_with(private_key_hex: &str, message: &str) -> String {
    let key_bytes = hex::decode(private_key_hex).expect("valid hex key");
    let key = SigningKey::from_slice(&key_bytes).expect("valid secp256k1 key");
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(eip191_hash(message).as_slice())
        .expect("signing succeeds");

    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

/// Find a `Set-Cookie` by name on a response
pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.into_owned())
}
