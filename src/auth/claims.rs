/// JWT Claims structure
///
/// Payload embedded in both access and refresh tokens: a snapshot of the
/// user's identity and profile at issuance, plus the standard timing claims.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::{Role, User};

/// Which of the two token kinds a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the user's public identifier)
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    pub kind: TokenKind,
}

impl Claims {
    /// Build claims for `user` issued at `issued_at` and valid for `lifetime_seconds`.
    pub fn for_user(
        user: &User,
        kind: TokenKind,
        issued_at: i64,
        lifetime_seconds: i64,
        issuer: &str,
    ) -> Self {
        Self {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at + lifetime_seconds,
            iss: issuer.to_string(),
            kind,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// A token is live strictly before its `exp` second.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}
