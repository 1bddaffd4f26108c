use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::UserStore;
use crate::error::StorageError;
use crate::user::User;

/// Bounds every call on the wrapped store by a fixed budget.
///
/// An elapsed budget drops the in-flight call and yields
/// `StorageError::Timeout`. Nothing is retried here.
#[derive(Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn UserStore>,
    budget: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn UserStore>, budget: Duration) -> Self {
        Self { inner, budget }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StorageError>
    where
        T: Send,
        F: Future<Output = Result<T, StorageError>> + Send,
    {
        match tokio::time::timeout(self.budget, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = operation,
                    budget_ms = self.budget.as_millis() as u64,
                    "Storage call exceeded its time budget"
                );
                Err(StorageError::Timeout(self.budget))
            }
        }
    }
}

#[async_trait]
impl UserStore for TimeoutStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
        self.bounded("find_user_by_email", self.inner.find_user_by_email(email))
            .await
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<User, StorageError> {
        self.bounded("find_user_by_phone", self.inner.find_user_by_phone(phone))
            .await
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<User, StorageError> {
        self.bounded("find_user_by_id", self.inner.find_user_by_id(user_id))
            .await
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, StorageError> {
        self.bounded("count_by_email", self.inner.count_by_email(email))
            .await
    }

    async fn count_by_phone(&self, phone: &str) -> Result<i64, StorageError> {
        self.bounded("count_by_phone", self.inner.count_by_phone(phone))
            .await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        self.bounded("insert_user", self.inner.insert_user(user)).await
    }

    async fn update_user_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.bounded(
            "update_user_tokens",
            self.inner
                .update_user_tokens(user_id, access_token, refresh_token, updated_at),
        )
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        self.bounded("list_users", self.inner.list_users()).await
    }
}
