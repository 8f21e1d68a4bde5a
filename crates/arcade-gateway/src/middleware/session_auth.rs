//! Session cookie extractor
//!
//! Protected handlers take [`AuthenticatedWallet`] as an argument. The
//! `session` cookie is decoded inline on every request; there is no session
//! store. Handlers that treat signed-out callers differently take
//! `Option<AuthenticatedWallet>` instead.

use actix_web::{
    dev::Payload, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError,
};
use std::future::{ready, Ready};
use thiserror::Error;
use tracing::{debug, error};

use crate::cookies::SESSION_COOKIE;
use crate::models::ErrorResponse;
use crate::services::SessionTokenCodec;

/// Wallet identity proven by a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedWallet {
    /// Lowercased wallet address
    pub address: String,
    pub issued_at_ms: i64,
}

/// Missing, expired or forged session
///
/// Always rendered as the same 401 body.
#[derive(Debug, Error)]
#[error("Authentication required")]
pub struct SessionRequired;

impl ResponseError for SessionRequired {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(ErrorResponse::new(
            "unauthorized",
            "Authentication required",
        ))
    }
}

impl FromRequest for AuthenticatedWallet {
    type Error = SessionRequired;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedWallet, SessionRequired> {
    let Some(codec) = req.app_data::<web::Data<SessionTokenCodec>>() else {
        error!("SessionTokenCodec missing from app data");
        return Err(SessionRequired);
    };

    let cookie = req.cookie(SESSION_COOKIE).ok_or(SessionRequired)?;

    let claims = codec.decode(cookie.value()).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        SessionRequired
    })?;

    Ok(AuthenticatedWallet {
        address: claims.address,
        issued_at_ms: claims.issued_at_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::{test, App};

    const SECRET: &str = "k7Q2v9XzLp4Rm8Nw1Bc6Hy3Td5Fj0Gs/AeUoKi+";
    const ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    async fn whoami(wallet: AuthenticatedWallet) -> HttpResponse {
        HttpResponse::Ok().body(wallet.address)
    }

    async fn maybe(wallet: Option<AuthenticatedWallet>) -> HttpResponse {
        HttpResponse::Ok().body(wallet.map(|w| w.address).unwrap_or_default())
    }

    fn codec() -> SessionTokenCodec {
        SessionTokenCodec::new(SECRET, 60)
    }

    #[actix_web::test]
    async fn test_valid_session_cookie() {
        let codec = codec();
        let token = codec.encode(ADDRESS);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(codec))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(Cookie::new(SESSION_COOKIE, token))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, ADDRESS.as_bytes());
    }

    #[actix_web::test]
    async fn test_missing_cookie_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(codec()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "unauthorized");
    }

    #[actix_web::test]
    async fn test_forged_cookie_is_unauthorized() {
        let forged = SessionTokenCodec::new("some-other-secret-entirely-123456", 60).encode(ADDRESS);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(codec()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(Cookie::new(SESSION_COOKIE, forged))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_optional_extractor_yields_none() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(codec()))
                .route("/maybe", web::get().to(maybe)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/maybe")
            .cookie(Cookie::new(SESSION_COOKIE, "garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(test::read_body(resp).await.is_empty());
    }
}
