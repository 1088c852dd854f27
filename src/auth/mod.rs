pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
pub use password::{Password, PasswordError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Authorization token required")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Wrong token type")]
    WrongTokenType,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User account is inactive")]
    InactiveUser,

    #[error("Refresh tokens are disabled")]
    RefreshDisabled,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("{0}")]
    PasswordHash(String),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub typ: TokenType,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, email: &str, role: &str, typ: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            email: email.to_string(),
            role: role.to_string(),
            typ,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signing keys and lifetimes for access and refresh tokens
pub struct JwtKeys {
    algorithm: Algorithm,
    access: KeyPair,
    refresh: Option<KeyPair>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(security: &SecurityConfig) -> Self {
        let refresh = match (&security.jwt_refresh_secret, security.jwt_refresh_enabled) {
            (Some(secret), true) => Some(KeyPair::from_secret(secret)),
            _ => None,
        };
        Self {
            algorithm: security.jwt_algorithm,
            access: KeyPair::from_secret(&security.jwt_secret),
            refresh,
            access_ttl: Duration::minutes(security.jwt_access_expiry_minutes),
            refresh_ttl: Duration::hours(security.jwt_refresh_expiry_hours),
        }
    }

    pub fn refresh_enabled(&self) -> bool {
        self.refresh.is_some()
    }

    pub fn issue_access(&self, sub: Uuid, email: &str, role: &str) -> Result<String, AuthError> {
        let claims = Claims::new(sub, email, role, TokenType::Access, self.access_ttl);
        self.sign(&claims, &self.access)
    }

    /// `None` when refresh tokens are disabled.
    pub fn issue_refresh(&self, sub: Uuid, email: &str, role: &str) -> Result<Option<String>, AuthError> {
        match &self.refresh {
            Some(keys) => {
                let claims = Claims::new(sub, email, role, TokenType::Refresh, self.refresh_ttl);
                self.sign(&claims, keys).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Sign arbitrary access claims, e.g. with a custom expiry.
    pub fn encode_access(&self, claims: &Claims) -> Result<String, AuthError> {
        self.sign(claims, &self.access)
    }

    fn sign(&self, claims: &Claims, keys: &KeyPair) -> Result<String, AuthError> {
        encode(&Header::new(self.algorithm), claims, &keys.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, &self.access, TokenType::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self.refresh.as_ref().ok_or(AuthError::RefreshDisabled)?;
        self.verify(token, keys, TokenType::Refresh)
    }

    fn verify(&self, token: &str, keys: &KeyPair, expected: TokenType) -> Result<Claims, AuthError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;
        if data.claims.typ != expected {
            return Err(AuthError::WrongTokenType);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn keys(refresh: bool) -> JwtKeys {
        let mut security = AppConfig::development().security;
        security.jwt_secret = "access-secret".to_string();
        security.jwt_refresh_enabled = refresh;
        security.jwt_refresh_secret = refresh.then(|| "refresh-secret".to_string());
        JwtKeys::from_config(&security)
    }

    #[test]
    fn access_token_round_trip() {
        let keys = keys(false);
        let id = Uuid::now_v7();
        let token = keys.issue_access(id, "ada@example.com", "admin").unwrap();
        let claims = keys.verify_access(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.typ, TokenType::Access);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys(true);
        let token = keys.issue_refresh(Uuid::now_v7(), "a@b.c", "user").unwrap().unwrap();
        assert!(keys.verify_access(&token).is_err());
        assert!(keys.verify_refresh(&token).is_ok());
    }

    #[test]
    fn refresh_disabled_issues_nothing() {
        let keys = keys(false);
        assert_eq!(keys.issue_refresh(Uuid::now_v7(), "a@b.c", "user").unwrap(), None);
        assert_eq!(keys.verify_refresh("x"), Err(AuthError::RefreshDisabled));
    }

    #[test]
    fn expired_tokens_are_reported() {
        let keys = keys(false);
        let claims = Claims::new(Uuid::now_v7(), "a@b.c", "user", TokenType::Access, Duration::hours(-2));
        let token = keys.encode_access(&claims).unwrap();
        assert_eq!(keys.verify_access(&token), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(keys(false).verify_access("not.a.jwt"), Err(AuthError::InvalidToken(_))));
    }
}
