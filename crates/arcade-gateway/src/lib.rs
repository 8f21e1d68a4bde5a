//! GrepCoin Arcade gateway library
//!
//! Wallet sign-in (SIWE + stateless session cookies) over actix-web. The
//! binary in `main.rs` wires this up; integration tests use it directly.

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod validators;

pub use state::AppState;
