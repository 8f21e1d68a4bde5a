//! Shared application state
//!
//! Everything a handler needs is built once from [`Config`] and registered as
//! actix `web::Data`. Storage is behind the [`UserStore`] trait object.

use actix_web::web;
use shared::{Config, SiweConfig};
use std::sync::Arc;

use crate::cookies::CookiePolicy;
use crate::middleware::TrustedProxies;
use crate::repositories::UserStore;
use crate::services::{AuthRateLimiter, SessionTokenCodec, WalletService};

#[derive(Clone)]
pub struct AppState {
    pub codec: web::Data<SessionTokenCodec>,
    pub wallet: web::Data<WalletService>,
    pub store: web::Data<dyn UserStore>,
    pub limiter: web::Data<AuthRateLimiter>,
    pub proxies: web::Data<TrustedProxies>,
    pub cookies: web::Data<CookiePolicy>,
    pub siwe: web::Data<SiweConfig>,
}

impl AppState {
    pub fn from_config(config: &Config, store: Arc<dyn UserStore>) -> Self {
        Self {
            codec: web::Data::new(SessionTokenCodec::new(
                &config.session.secret,
                config.session.clock_skew_secs,
            )),
            wallet: web::Data::new(WalletService::from_config(&config.siwe)),
            store: web::Data::from(store),
            limiter: web::Data::new(AuthRateLimiter::from_config(&config.rate_limit)),
            proxies: web::Data::new(TrustedProxies::parse(&config.server.trusted_proxies)),
            cookies: web::Data::new(CookiePolicy::new(config.session.cookie_secure)),
            siwe: web::Data::new(config.siwe.clone()),
        }
    }

    /// Register state and routes on an app or scope
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.codec.clone())
            .app_data(self.wallet.clone())
            .app_data(self.store.clone())
            .app_data(self.limiter.clone())
            .app_data(self.proxies.clone())
            .app_data(self.cookies.clone())
            .app_data(self.siwe.clone());

        crate::routes::configure(cfg);
    }
}
