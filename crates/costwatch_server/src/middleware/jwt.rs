//! JWT authentication middleware.
//!
//! Verifies the bearer token, deserializes its claims, and attaches the
//! resulting [`Session`] as a request extension. Core logic downstream never
//! sees raw tokens.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use jsonwebtoken::{decode, DecodingKey, Validation};

use costwatch_core::context::{Session, SessionClaims};

#[derive(Clone)]
pub struct JwtConfig {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtConfig {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }
}

pub async fn jwt_auth(
    Extension(config): Extension<JwtConfig>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("missing bearer token");
    };

    let claims = match decode::<SessionClaims>(token, &config.decoding_key, &config.validation) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "JWT rejected");
            return unauthorized("invalid token");
        }
    };

    let session = match Session::from_claims(&claims) {
        Ok(session) => session,
        Err(e) => return unauthorized(&e.to_string()),
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
