//! Login and bearer-token verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::JwtConfig;
use crate::database::Database;
use crate::error::ApiError;
use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: Duration::minutes(config.expires_in_minutes),
        }
    }

    pub fn issue(&self, user_id: i64, email: &str, now: DateTime<Utc>) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(db: Database, keys: JwtKeys) -> Self {
        Self { db, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let user = User::find_by_email(email, &self.db)
            .await?
            .filter(|user| user.verify_password(password))
            .ok_or_else(|| {
                warn!("login rejected");
                ApiError::Unauthorized("Invalid credentials")
            })?;

        let token = self
            .keys
            .issue(user.id, &user.email, Utc::now())
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;

        info!(user_id = user.id, "login successful");
        Ok(LoginResponse {
            token,
            user: UserInfo {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.to_string(),
            expires_in_minutes: 15,
        })
    }

    #[test]
    fn issued_token_verifies() {
        let keys = keys("test-secret");
        let token = keys.issue(42, "alice@example.com", Utc::now()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = keys("one").issue(1, "a@example.com", Utc::now()).unwrap();
        assert!(keys("two").verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = keys("test-secret");
        let token = keys
            .issue(1, "a@example.com", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
