//! # JWT Token Management
//!
//! JSON Web Token generation and validation. Validation is stateless: the
//! signature, issuer, audience and expiry are checked without a store lookup.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};
use super::user::User;

/// Token type reported to clients
pub const TOKEN_TYPE: &str = "bearer";

/// Longest accepted access token lifetime (one year)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

/// JWT claims for access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// User's email
    pub email: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing
    pub secret: String,

    /// Access token lifetime
    pub access_token_ttl: Duration,

    /// Issuer identifier
    pub issuer: String,

    /// Audience identifier
    pub audience: String,
}

impl JwtConfig {
    /// Config with the service's issuer and audience
    ///
    /// The lifetime is clamped to `1..=MAX_TOKEN_TTL_MINUTES`.
    pub fn new(secret: impl Into<String>, ttl_minutes: i64) -> Self {
        let minutes = ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES);
        Self {
            secret: secret.into(),
            access_token_ttl: Duration::minutes(minutes),
            ..Self::default()
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "CHANGE_THIS_SECRET_IN_PRODUCTION".to_string(),
            access_token_ttl: Duration::minutes(15),
            issuer: "ledgerdesk".to_string(),
            audience: "ledgerdesk".to_string(),
        }
    }
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    /// Create a new JWT manager with the given configuration
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate an access token for a user
    ///
    /// Only the user ID and email go into the token.
    pub fn generate_access_token(&self, user: &User) -> AuthResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.config.access_token_ttl)
            .ok_or(AuthError::TokenGenerationFailed)?;

        let claims = JwtClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    /// Validate an access token and extract claims
    pub fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Lifetime of a newly issued token, in seconds
    pub fn expires_in(&self) -> i64 {
        self.config.access_token_ttl.num_seconds()
    }
}

/// Token response returned to client after login
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub email: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn new(email: String, access_token: String, expires_in: i64) -> Self {
        Self {
            email,
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in,
        }
    }
}
