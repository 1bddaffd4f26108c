/// Password Hashing and Verification
///
/// Salted one-way bcrypt digests. Neither the plaintext nor the digest is
/// ever logged or returned in an error.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// bcrypt only reads the first 72 bytes of its input, so longer passwords
/// are refused instead of silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Reason reported when a password does not match its digest
pub const PASSWORD_INCORRECT: &str = "password is incorrect";

/// Outcome of checking a password against a stored digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub matched: bool,
    pub reason: Option<&'static str>,
}

impl Verification {
    fn matched() -> Self {
        Self {
            matched: true,
            reason: None,
        }
    }

    fn mismatch() -> Self {
        Self {
            matched: false,
            reason: Some(PASSWORD_INCORRECT),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    /// Hasher with bcrypt's default cost
    pub fn new() -> Self {
        Self { cost: DEFAULT_COST }
    }

    /// Hasher with an explicit cost, clamped to bcrypt's accepted range.
    ///
    /// Production code uses [`CredentialHasher::new`]; a lower cost keeps test
    /// suites fast.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    /// Hash a plaintext password
    ///
    /// # Errors
    /// Returns a validation error for input over [`MAX_PASSWORD_BYTES`], or an
    /// internal error if bcrypt cannot produce a digest. Callers must abort.
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_BYTES).into());
        }

        hash(plaintext, self.cost).map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            AppError::Internal("password hashing failed".to_string())
        })
    }

    /// Check `plaintext` against `digest`.
    ///
    /// A digest bcrypt cannot parse is treated as a mismatch, as is input
    /// longer than any password `hash` accepts.
    pub fn verify(&self, digest: &str, plaintext: &str) -> Verification {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Verification::mismatch();
        }

        match verify(plaintext, digest) {
            Ok(true) => Verification::matched(),
            Ok(false) => Verification::mismatch(),
            Err(e) => {
                tracing::error!(error = %e, "Stored password digest is unreadable");
                Verification::mismatch()
            }
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}
