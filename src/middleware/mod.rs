use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::JwtKeys;

const IDEMPOTENCY_HEADER: &str = "idempotency-key";
const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Caller identity taken from a verified `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

impl AuthUser {
    pub fn from_headers(headers: &HeaderMap, keys: &JwtKeys) -> Result<Self, ApiError> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("authorization header missing"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("invalid authorization header format"))?;

        let claims = keys
            .verify(token)
            .map_err(|_| ApiError::Unauthorized("invalid token"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
        })
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_headers(&parts.headers, state.auth.keys())
    }
}

/// Optional `Idempotency-Key` header, forwarded to settlement unexamined.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for IdempotencyKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_HEADER) else {
            return Ok(IdempotencyKey(None));
        };

        let key = value
            .to_str()
            .map_err(|_| ApiError::BadRequest("Idempotency-Key must be visible ASCII".to_string()))?
            .trim();
        if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(ApiError::BadRequest(format!(
                "Idempotency-Key must be at most {MAX_IDEMPOTENCY_KEY_LEN} characters"
            )));
        }

        Ok(IdempotencyKey((!key.is_empty()).then(|| key.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<IdempotencyKey, ApiError> {
        let mut builder = Request::builder().uri("/api/v1/bookings");
        if let Some(value) = header {
            builder = builder.header("Idempotency-Key", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        IdempotencyKey::from_request_parts(&mut parts, &()).await
    }

    fn keys() -> JwtKeys {
        JwtKeys::new(&crate::config::JwtConfig {
            secret: "test-secret".to_string(),
            expires_in_minutes: 15,
        })
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn bearer_token_yields_the_caller() {
        let keys = keys();
        let token = keys.issue(7, "alice@example.com", chrono::Utc::now()).unwrap();

        let user = AuthUser::from_headers(&bearer(&format!("Bearer {token}")), &keys).unwrap();
        assert_eq!(user.user_id, 7);
    }

    #[test]
    fn missing_or_malformed_credentials_are_unauthorized() {
        let keys = keys();
        let token = keys.issue(7, "alice@example.com", chrono::Utc::now()).unwrap();

        for headers in [
            HeaderMap::new(),
            bearer(&format!("Basic {token}")),
            bearer("Bearer not-a-jwt"),
        ] {
            assert!(matches!(
                AuthUser::from_headers(&headers, &keys),
                Err(ApiError::Unauthorized(_))
            ));
        }
    }

    #[tokio::test]
    async fn missing_or_blank_header_means_no_key() {
        assert_eq!(extract(None).await.unwrap().0, None);
        assert_eq!(extract(Some("   ")).await.unwrap().0, None);
    }

    #[tokio::test]
    async fn header_value_is_forwarded() {
        let key = extract(Some("order-42")).await.unwrap();
        assert_eq!(key.0.as_deref(), Some("order-42"));
    }

    #[tokio::test]
    async fn oversized_key_is_rejected() {
        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        assert!(matches!(extract(Some(&long)).await, Err(ApiError::BadRequest(_))));
    }
}
