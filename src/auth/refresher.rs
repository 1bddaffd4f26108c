/// Session Token Bookkeeping
///
/// Records the most recently issued pair on the user record. The write is an
/// idempotent update-in-place keyed by the user's public identifier.

use chrono::Utc;
use std::sync::Arc;

use crate::error::AppError;
use crate::persistence::UserStore;

#[derive(Clone)]
pub struct TokenRefresher {
    store: Arc<dyn UserStore>,
}

impl TokenRefresher {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Persist `access_token`/`refresh_token` as the current session of `user_id`
    ///
    /// # Errors
    /// Returns the storage failure. Tokens already handed to the client stay
    /// cryptographically valid either way; the caller decides whether the
    /// stale bookkeeping is fatal for its flow.
    pub async fn refresh(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), AppError> {
        self.store
            .update_user_tokens(user_id, access_token, refresh_token, Utc::now())
            .await
            .map_err(|e| {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Session tokens were issued but could not be recorded"
                );
                AppError::from(e)
            })?;

        tracing::debug!(user_id = %user_id, "Session tokens recorded");
        Ok(())
    }
}
