/// JWT Token Validation
///
/// Parses and verifies a token string against the server secret and an
/// explicit clock. Validation never touches the network or the database.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::fmt;
use thiserror::Error;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token issuer is not accepted")]
    InvalidIssuer,
    #[error("token has expired")]
    Expired,
    #[error("expected {expected} token")]
    WrongKind { expected: TokenKind },
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "MALFORMED_TOKEN",
            TokenError::InvalidSignature => "INVALID_SIGNATURE",
            TokenError::InvalidIssuer => "INVALID_ISSUER",
            TokenError::Expired => "TOKEN_EXPIRED",
            TokenError::WrongKind { .. } => "WRONG_TOKEN_KIND",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => TokenError::InvalidSignature,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `validate_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token of either kind against the current clock
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate a token of either kind as of the Unix timestamp `now`
    ///
    /// Structure is parsed first, then the signature is checked, then expiry.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Validate a token that must be an access token
    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_kind_at(token, TokenKind::Access, Utc::now().timestamp())
    }

    /// Validate a token that must be a refresh token
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_kind_at(token, TokenKind::Refresh, Utc::now().timestamp())
    }

    pub fn validate_kind_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<Claims, TokenError> {
        let claims = self.validate_at(token, now)?;
        if claims.kind != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(claims)
    }
}
