use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::UserStore;
use crate::error::{StorageError, UniqueField};
use crate::user::User;

/// Process-local `UserStore` used by the test suites and local runs.
///
/// Enforces the same uniqueness rules as the SQL schema and counts every
/// call so tests can assert whether storage was touched at all.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    calls: AtomicUsize,
    stale_counts: bool,
    fail_token_updates: bool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `count_by_*` always report zero, as if a concurrent signup
    /// landed between the count and the insert.
    pub fn with_stale_counts(mut self) -> Self {
        self.stale_counts = true;
        self
    }

    /// Make `update_user_tokens` fail with a connection error.
    pub fn with_failing_token_updates(mut self) -> Self {
        self.fail_token_updates = true;
        self
    }

    /// Number of `UserStore` calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of a stored user without counting as a store call
    pub fn snapshot(&self, user_id: &str) -> Option<User> {
        self.lock().iter().find(|u| u.user_id == user_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn find_by<P>(&self, predicate: P) -> Result<User, StorageError>
    where
        P: Fn(&User) -> bool,
    {
        self.record_call();
        self.lock()
            .iter()
            .find(|u| predicate(u))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn count_where<P>(&self, predicate: P) -> Result<i64, StorageError>
    where
        P: Fn(&User) -> bool,
    {
        self.record_call();
        if self.stale_counts {
            return Ok(0);
        }
        Ok(self.lock().iter().filter(|u| predicate(u)).count() as i64)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
        self.find_by(|u| u.email == email)
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<User, StorageError> {
        self.find_by(|u| u.phone == phone)
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<User, StorageError> {
        self.find_by(|u| u.user_id == user_id)
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, StorageError> {
        self.count_where(|u| u.email == email)
    }

    async fn count_by_phone(&self, phone: &str) -> Result<i64, StorageError> {
        self.count_where(|u| u.phone == phone)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        self.record_call();
        let mut users = self.lock();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StorageError::UniqueConstraintViolation(UniqueField::Email));
        }
        if users.iter().any(|u| u.phone == user.phone) {
            return Err(StorageError::UniqueConstraintViolation(UniqueField::Phone));
        }
        if users.iter().any(|u| u.user_id == user.user_id) {
            return Err(StorageError::QueryExecution(
                "duplicate user_id".to_string(),
            ));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update_user_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.record_call();
        if self.fail_token_updates {
            return Err(StorageError::ConnectionPool(
                "connection reset by peer".to_string(),
            ));
        }

        let mut users = self.lock();
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or(StorageError::NotFound)?;

        let changed = user.token.as_deref() != Some(access_token)
            || user.refresh_token.as_deref() != Some(refresh_token);
        if changed {
            user.token = Some(access_token.to_string());
            user.refresh_token = Some(refresh_token.to_string());
            user.updated_at = updated_at;
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.record_call();
        Ok(self.lock().clone())
    }
}
