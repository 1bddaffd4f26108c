use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::UserStore;
use crate::error::{StorageError, UniqueField};
use crate::user::{Role, User};

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "user_id, first_name, last_name, email, phone, password_hash, \
     user_type, token, refresh_token, created_at, updated_at";

/// Postgres-backed `UserStore` over a shared connection pool
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_user_where(&self, column: &'static str, value: &str) -> Result<User, StorageError> {
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::NotFound)?
            .try_into()
    }

    async fn count_where(&self, column: &'static str, value: &str) -> Result<i64, StorageError> {
        let query = format!("SELECT COUNT(*) FROM users WHERE {} = $1", column);
        let count = sqlx::query_scalar::<_, i64>(&query)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    password_hash: String,
    user_type: String,
    token: Option<String>,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StorageError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .user_type
            .parse::<Role>()
            .map_err(|e| StorageError::QueryExecution(format!("users.user_type: {}", e)))?;

        Ok(User {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role,
            token: row.token,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Column behind a violated `users` unique constraint, if it is one clients
/// may collide on.
fn unique_field(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint? {
        "users_email_key" => Some(UniqueField::Email),
        "users_phone_key" => Some(UniqueField::Phone),
        _ => None,
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                match unique_field(db_err.constraint()) {
                    Some(field) => StorageError::UniqueConstraintViolation(field),
                    None => StorageError::QueryExecution(err.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StorageError::ConnectionPool(err.to_string()),
            _ => StorageError::QueryExecution(err.to_string()),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError> {
        self.fetch_user_where("email", email).await
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<User, StorageError> {
        self.fetch_user_where("phone", phone).await
    }

    async fn find_user_by_id(&self, user_id: &str) -> Result<User, StorageError> {
        self.fetch_user_where("user_id", user_id).await
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, StorageError> {
        self.count_where("email", email).await
    }

    async fn count_by_phone(&self, phone: &str) -> Result<i64, StorageError> {
        self.count_where("phone", phone).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, first_name, last_name, email, phone, password_hash,
                               user_type, token, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.token)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_user_tokens(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET token = $2,
                refresh_token = $3,
                updated_at = CASE
                    WHEN token IS DISTINCT FROM $2 OR refresh_token IS DISTINCT FROM $3 THEN $4
                    ELSE updated_at
                END
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        let query = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}
