/// Authentication module
///
/// Credential hashing, token issuance and validation, and session-token
/// bookkeeping after login.

mod claims;
mod issuer;
mod password;
mod refresher;
mod validator;

pub use claims::Claims;
pub use claims::TokenKind;
pub use issuer::TokenIssuer;
pub use issuer::TokenPair;
pub use password::CredentialHasher;
pub use password::Verification;
pub use password::MAX_PASSWORD_BYTES;
pub use password::PASSWORD_INCORRECT;
pub use refresher::TokenRefresher;
pub use validator::TokenError;
pub use validator::TokenValidator;
