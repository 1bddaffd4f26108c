/// Persistence collaborator
///
/// The auth core only sees users through the `UserStore` capability, which
/// is injected at startup. Every call made by the core goes through
/// `TimeoutStore` so a stalled backend surfaces as `StorageError::Timeout`.

mod memory;
mod postgres;
mod timeout;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::user::User;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;
pub use timeout::TimeoutStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError>;

    async fn find_user_by_phone(&self, phone: &str) -> Result<User, StorageError>;

    async fn find_user_by_id(&self, user_id: &str) -> Result<User, StorageError>;

    async fn count_by_email(&self, email: &str) -> Result<i64, StorageError>;

    async fn count_by_phone(&self, phone: &str) -> Result<i64, StorageError>;

    /// Insert a new user. Uniqueness of email and phone is enforced here and
    /// reported as `StorageError::UniqueConstraintViolation`.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Overwrite the session-state fields of `user_id`.
    ///
    /// `updated_at` only moves when the stored pair actually changes, so
    /// replaying the same pair leaves the record untouched.
    async fn update_user_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn list_users(&self) -> Result<Vec<User>, StorageError>;
}
