use crate::config::AuthConfig;
use crate::database::Database;
use crate::errors::{Result, StrokeGuardError};
use crate::metrics;
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// Token id, used for revocation
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| StrokeGuardError::Unauthorized("malformed subject".to_string()))
    }
}

pub struct AuthService {
    db: Arc<Database>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    /// Revoked token ids mapped to their expiry (unix seconds)
    revoked: DashMap<String, usize>,
}

impl AuthService {
    pub fn new(db: Arc<Database>, config: &AuthConfig) -> Self {
        AuthService {
            db,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::minutes(config.token_ttl_minutes),
            revoked: DashMap::new(),
        }
    }

    /// Create a doctor account
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        request.validate()?;

        let password_hash = hash_password(&request.password)?;
        let user = self
            .db
            .create_user(&request.username, &password_hash)
            .await?
            .ok_or_else(|| StrokeGuardError::UsernameTaken(request.username.clone()))?;

        info!("Registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse> {
        request.validate()?;

        let user = match self.db.find_user_by_username(&request.username).await? {
            Some(user) if verify_password(&request.password, &user.password_hash)? => user,
            _ => {
                metrics::AUTH_ATTEMPTS.with_label_values(&["failure"]).inc();
                warn!("Failed login for {}", request.username);
                return Err(StrokeGuardError::InvalidCredentials);
            }
        };

        metrics::AUTH_ATTEMPTS.with_label_values(&["success"]).inc();
        info!("User {} logged in", user.username);
        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<TokenResponse> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.token_ttl;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_at,
            username: user.username.clone(),
        })
    }

    /// Decode a bearer token, rejecting bad signatures, expired and revoked tokens
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        if self.revoked.contains_key(&claims.jti) {
            return Err(StrokeGuardError::Unauthorized("token revoked".to_string()));
        }

        Ok(claims)
    }

    /// Revoke a token until it would have expired anyway
    pub fn logout(&self, claims: &Claims) {
        let now = Utc::now().timestamp() as usize;
        self.revoked.retain(|_, exp| *exp > now);
        self.revoked.insert(claims.jti.clone(), claims.exp);
        info!("User {} logged out", claims.username);
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("same-password").unwrap(),
            hash_password("same-password").unwrap()
        );
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_claims_user_id() {
        let claims = Claims {
            sub: "42".to_string(),
            username: "doc1".to_string(),
            jti: "id".to_string(),
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.user_id().unwrap(), 42);
    }
}
