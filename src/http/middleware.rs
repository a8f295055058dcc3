//! Authentication middleware and JWT verification

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
}

/// JWT claims from Supabase auth token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

/// Verify an HS256 token against `secret` and return its claims if unexpired at `now`
pub fn verify_jwt(token: &str, secret: &str, now: i64) -> Result<JwtClaims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::InvalidToken);
    };

    let header: JwtHeader = decode_segment(header_b64)?;
    if header.alg != "HS256" {
        return Err(AuthError::InvalidToken);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims: JwtClaims = decode_segment(payload_b64)?;
    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            AuthError::MissingHeader | AuthError::InvalidToken | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// The verified caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Middleware to require authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)?;

    let claims = verify_jwt(token, &state.config.jwt_secret, Utc::now().timestamp())?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
    });

    Ok(next.run(request).await)
}

/// Sign claims as an HS256 token
#[cfg(test)]
pub fn sign_test_token(user_id: Uuid, exp: i64, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = JwtClaims {
        sub: user_id,
        exp,
        email: None,
        role: Some("authenticated".to_string()),
    };
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", header, payload).as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}.{}", header, payload, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "super-secret-jwt-token";
    const NOW: i64 = 1_790_000_000;

    #[test]
    fn accepts_valid_token() {
        let user = Uuid::new_v4();
        let token = sign_test_token(user, NOW + 60, SECRET);
        let claims = verify_jwt(&token, SECRET, NOW).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role.as_deref(), Some("authenticated"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign_test_token(Uuid::new_v4(), NOW + 60, "other");
        assert!(matches!(verify_jwt(&token, SECRET, NOW), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign_test_token(Uuid::new_v4(), NOW - 1, SECRET);
        assert!(matches!(verify_jwt(&token, SECRET, NOW), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn rejects_tampered_payload() {
        let token = sign_test_token(Uuid::new_v4(), NOW + 60, SECRET);
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({"sub": Uuid::new_v4(), "exp": NOW + 60})).unwrap(),
        );
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_claims;
        assert!(verify_jwt(&parts.join("."), SECRET, NOW).is_err());
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(matches!(verify_jwt(token, SECRET, NOW), Err(AuthError::InvalidToken)));
        }
    }
}
