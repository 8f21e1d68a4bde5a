//! Wallet sign-in handlers
//!
//! Flow: `GET /auth/nonce` sets the nonce cookie, the client signs the SIWE
//! message (optionally built by `POST /auth/message`), `POST /auth/verify`
//! checks it and sets the session cookie.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use shared::SiweConfig;

use super::helpers::{check_rate_limit, handle_db_error, validate_request, verification_failed};
use crate::cookies::{CookiePolicy, NONCE_COOKIE};
use crate::middleware::{AuthenticatedWallet, TrustedProxies};
use crate::models::{
    ErrorResponse, LogoutResponse, MessageRequest, MessageResponse, NonceResponse,
    SessionResponse, VerifyRequest, VerifyResponse,
};
use crate::repositories::UserStore;
use crate::services::{
    generate_nonce, AuthRateLimiter, SessionTokenCodec, SiweMessage, WalletService,
};

/// Issue a sign-in nonce
///
/// Replaces any pending nonce cookie, so one sign-in attempt is in flight per browser.
#[utoipa::path(
    get,
    path = "/api/v1/auth/nonce",
    tag = "Auth",
    responses(
        (status = 200, description = "Nonce issued and stored in the siwe-nonce cookie", body = NonceResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse)
    )
)]
pub async fn get_nonce(
    req: HttpRequest,
    limiter: web::Data<AuthRateLimiter>,
    proxies: web::Data<TrustedProxies>,
    cookies: web::Data<CookiePolicy>,
) -> impl Responder {
    if let Err(resp) = check_rate_limit(&req, &limiter, &proxies) {
        return resp;
    }

    let nonce = generate_nonce();

    HttpResponse::Ok()
        .cookie(cookies.nonce(nonce.clone()))
        .json(NonceResponse { nonce })
}

/// Build the SIWE message for a wallet
///
/// Returns the exact text the wallet should sign for this deployment's
/// domain and URI.
#[utoipa::path(
    post,
    path = "/api/v1/auth/message",
    tag = "Auth",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Message to sign", body = MessageResponse),
        (status = 400, description = "Invalid address, nonce or chain", body = ErrorResponse)
    )
)]
pub async fn build_message(
    siwe: web::Data<SiweConfig>,
    body: web::Json<MessageRequest>,
) -> impl Responder {
    if let Err(resp) = validate_request(&*body) {
        return resp;
    }

    if !siwe.chain_ids.is_empty() && !siwe.chain_ids.contains(&body.chain_id) {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "unsupported_chain",
            format!("Chain ID {} is not supported", body.chain_id),
        ));
    }

    match SiweMessage::new(
        siwe.domain.clone(),
        &body.address,
        siwe.uri.clone(),
        body.chain_id,
        body.nonce.clone(),
        Utc::now(),
    ) {
        Ok(message) => HttpResponse::Ok().json(MessageResponse {
            message: message.to_string(),
        }),
        Err(e) => HttpResponse::BadRequest()
            .json(ErrorResponse::new("validation_error", e.to_string())),
    }
}

/// Verify a signed SIWE message and start a session
///
/// Every verification failure returns the same 401 body; the reason is only logged.
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set", body = VerifyResponse),
        (status = 400, description = "Missing message or signature", body = ErrorResponse),
        (status = 401, description = "Verification failed", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse)
    )
)]
#[allow(clippy::too_many_arguments)]
pub async fn verify(
    req: HttpRequest,
    body: web::Json<VerifyRequest>,
    wallet: web::Data<WalletService>,
    codec: web::Data<SessionTokenCodec>,
    store: web::Data<dyn UserStore>,
    limiter: web::Data<AuthRateLimiter>,
    proxies: web::Data<TrustedProxies>,
    cookies: web::Data<CookiePolicy>,
) -> impl Responder {
    if let Err(resp) = check_rate_limit(&req, &limiter, &proxies) {
        return resp;
    }

    if let Err(resp) = validate_request(&*body) {
        return resp;
    }

    let Some(nonce_cookie) = req.cookie(NONCE_COOKIE) else {
        tracing::warn!("Sign-in rejected: nonce cookie missing or expired");
        return verification_failed();
    };

    let address = match wallet.verify_siwe(&body.message, &body.signature, nonce_cookie.value())
    {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in rejected");
            return verification_failed();
        }
    };

    let user = match handle_db_error(
        store.upsert_wallet_user(&address).await,
        "upsert wallet user",
    ) {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    tracing::info!(address = %address, user_id = %user.id, "Wallet signed in");

    HttpResponse::Ok()
        .cookie(cookies.session(codec.encode(&address)))
        .cookie(cookies.clear_nonce())
        .json(VerifyResponse { user: user.into() })
}

/// Sign out
///
/// Sessions are stateless, so this only removes the cookies from the browser.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Cookies cleared", body = LogoutResponse)
    )
)]
pub async fn logout(cookies: web::Data<CookiePolicy>) -> impl Responder {
    HttpResponse::Ok()
        .cookie(cookies.clear_session())
        .cookie(cookies.clear_nonce())
        .json(LogoutResponse { success: true })
}

/// Current session
///
/// A missing, expired or forged session reads as signed out.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user, or null when signed out", body = SessionResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_session(
    wallet: Option<AuthenticatedWallet>,
    store: web::Data<dyn UserStore>,
) -> impl Responder {
    let Some(wallet) = wallet else {
        return HttpResponse::Ok().json(SessionResponse::signed_out());
    };

    match handle_db_error(store.find_by_wallet(&wallet.address).await, "load session user") {
        Ok(user) => HttpResponse::Ok().json(SessionResponse {
            user: user.map(Into::into),
        }),
        Err(resp) => resp,
    }
}
