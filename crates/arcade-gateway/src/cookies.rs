//! Sign-in cookies
//!
//! Both cookies are http-only, same-site strict and scoped to `/`. `Secure` is
//! set in production only so the flow works over plain http locally.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};

use crate::services::{NONCE_TTL_SECS, SESSION_MAX_AGE_SECS};

/// Cookie holding the pending SIWE nonce
pub const NONCE_COOKIE: &str = "siwe-nonce";

/// Cookie holding the session token
pub const SESSION_COOKIE: &str = "session";

/// Cookie attributes shared by every sign-in cookie
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn nonce(&self, nonce: String) -> Cookie<'static> {
        self.build(NONCE_COOKIE, nonce, NONCE_TTL_SECS)
    }

    pub fn session(&self, token: String) -> Cookie<'static> {
        self.build(SESSION_COOKIE, token, SESSION_MAX_AGE_SECS)
    }

    pub fn clear_nonce(&self) -> Cookie<'static> {
        self.removal(NONCE_COOKIE)
    }

    pub fn clear_session(&self) -> Cookie<'static> {
        self.removal(SESSION_COOKIE)
    }

    fn build(&self, name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build(name, value)
            .path("/")
            .secure(self.secure)
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(CookieDuration::seconds(max_age_secs))
            .finish()
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), 0);
        cookie.make_removal();
        cookie
    }
}
