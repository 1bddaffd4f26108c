/// JWT Token Issuance
///
/// Signs an access/refresh pair for a user with the server-held HS256 secret.
/// The issuer keeps no state between calls beyond its configuration.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::fmt;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::user::User;

/// A freshly issued access/refresh pair
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    header: Header,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    issuer: String,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            issuer: config.issuer.clone(),
        }
    }

    /// Access token lifetime in seconds
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Issue a pair for `user` using the current clock
    ///
    /// # Errors
    /// Returns `AppError::Signing` if either token cannot be signed; no
    /// partial pair is ever returned.
    pub fn issue(&self, user: &User) -> Result<TokenPair, AppError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Issue a pair for `user` as of the Unix timestamp `now`
    pub fn issue_at(&self, user: &User, now: i64) -> Result<TokenPair, AppError> {
        let access = Claims::for_user(
            user,
            TokenKind::Access,
            now,
            self.access_token_expiry,
            &self.issuer,
        );
        let refresh = Claims::for_user(
            user,
            TokenKind::Refresh,
            now,
            self.refresh_token_expiry,
            &self.issuer,
        );

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!(kind = %claims.kind, error = %e, "Token signing failed");
            AppError::Signing(e.to_string())
        })
    }
}
