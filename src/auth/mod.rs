//! User authentication: credential providers (static Basic credentials or an
//! LDAP directory), JWT issuing/validation and `Authorization` header parsing.

pub mod basic;
pub mod ldap;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AuthConfig, AuthProviderKind};

pub use basic::BasicAuthenticationProvider;
pub use ldap::{Ldap3Client, LdapAuthenticationProvider, LdapClient};

pub const TOKEN_ISSUER: &str = "ercole";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("The authorization header is missing")]
    MissingHeader,
    #[error("The authorization header value doesn't begin with Basic or Bearer")]
    UnsupportedScheme,
    #[error("A : is missing in the auth header")]
    MissingColon,
    #[error("The basic credentials are not valid base64: {0}")]
    MalformedBasic(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("The token is expired")]
    Expired,
    #[error("Tokens issued in the future are invalid")]
    IssuedInFuture,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Authentication backend error: {0}")]
    Backend(String),
    #[error("Cannot sign token: {0}")]
    Token(String),
}

/// The identity returned by a provider once credentials are verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub username: String,
}

/// JWT claims. `sub`, `aud` and `jti` all carry the username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub jti: String,
    pub iss: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, validity_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity: i64::try_from(validity_secs).ok().and_then(Duration::try_seconds).unwrap_or(Duration::MAX),
        }
    }

    /// Fails when `now` plus the validity does not fit in a timestamp.
    pub fn issue(&self, username: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let exp = now
            .checked_add_signed(self.validity)
            .ok_or_else(|| AuthError::Token(format!("token validity of {}s is out of range", self.validity.num_seconds())))?;
        let claims = Claims {
            sub: username.to_string(),
            aud: username.to_string(),
            jti: username.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Checks signature and issuer, then the time window against `now`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        // Time checks are done below against the caller's clock.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidToken("invalid signature".into()),
            ErrorKind::InvalidIssuer => AuthError::InvalidToken("invalid issuer".into()),
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        let claims = data.claims;
        let now = now.timestamp();
        if claims.exp < now {
            return Err(AuthError::Expired);
        }
        if claims.iat > now {
            return Err(AuthError::IssuedInFuture);
        }
        Ok(claims)
    }
}

#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Verifies the backend is reachable and correctly configured.
    async fn init(&self) -> Result<(), AuthError>;

    /// Returns `Ok(None)` when the credentials are wrong and `Err` only when
    /// the backend itself failed.
    async fn user_info_if_credentials_are_correct(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserInfo>, AuthError>;

    fn tokens(&self) -> &TokenIssuer;

    fn token(&self, username: &str) -> Result<String, AuthError> {
        self.tokens().issue(username, Utc::now())
    }

    fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens().validate(token, Utc::now())
    }
}

/// Builds the provider selected by `auth.provider`.
pub fn build_provider(cfg: &AuthConfig) -> anyhow::Result<Arc<dyn AuthenticationProvider>> {
    let tokens = TokenIssuer::new(&cfg.jwt_secret, cfg.token_validity_timeout);
    match cfg.provider {
        AuthProviderKind::Basic => {
            Ok(Arc::new(BasicAuthenticationProvider::new(cfg.username.clone(), cfg.password.clone(), tokens)))
        }
        AuthProviderKind::Ldap => {
            let ldap = cfg
                .ldap
                .clone()
                .ok_or_else(|| anyhow::anyhow!("auth.ldap section is required when auth.provider = \"ldap\""))?;
            let client = Ldap3Client::new(&ldap);
            Ok(Arc::new(LdapAuthenticationProvider::new(ldap, client, tokens)))
        }
    }
}

/// Credentials carried by an `Authorization` header.
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
}

pub fn parse_authorization(header: Option<&str>) -> Result<Credentials, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    if let Some(encoded) = header.strip_prefix("Basic ") {
        let decoded = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::MalformedBasic(e.to_string()))?;
        let decoded = String::from_utf8(decoded).map_err(|e| AuthError::MalformedBasic(e.to_string()))?;
        let (username, password) = decoded.split_once(':').ok_or(AuthError::MissingColon)?;
        Ok(Credentials::Basic { username: username.to_string(), password: password.to_string() })
    } else if let Some(token) = header.strip_prefix("Bearer ") {
        Ok(Credentials::Bearer(token.trim().to_string()))
    } else {
        Err(AuthError::UnsupportedScheme)
    }
}

/// Byte comparison whose running time does not depend on where the inputs differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
