/// User Routes
///
/// Signup, login, refresh-token rotation and user lookups.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Claims, TokenPair};
use crate::error::{AppError, AuthError, StorageError, UniqueField, ValidationError};
use crate::startup::AppState;
use crate::user::{Role, User, UserResponse};
use crate::validators::{is_valid_email, is_valid_name, is_valid_phone, validate_password_strength};

/// User signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub user_type: Role,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Session tokens handed out by login and refresh
#[derive(Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    fn new(message: &str, pair: TokenPair, expires_in: i64) -> Self {
        Self {
            message: message.to_string(),
            token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Serialize)]
pub struct SingleUserResponse {
    pub user: UserResponse,
}

/// POST /users/signup
///
/// Creates a user. No tokens are issued until the first login.
///
/// # Errors
/// - 400: Validation errors
/// - 409: Email or phone number already registered
/// - 503: Storage did not answer within its budget
pub async fn signup(
    form: web::Json<SignupRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let first_name = is_valid_name("first_name", &form.first_name)?;
    let last_name = is_valid_name("last_name", &form.last_name)?;
    let email = is_valid_email(&form.email)?;
    let phone = is_valid_phone(&form.phone)?;
    validate_password_strength(&form.password)?;

    if state.store.count_by_email(&email).await? > 0 {
        return Err(AppError::Conflict(UniqueField::Email));
    }
    if state.store.count_by_phone(&phone).await? > 0 {
        return Err(AppError::Conflict(UniqueField::Phone));
    }

    let hasher = state.hasher;
    let password = form.password;
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let now = Utc::now();
    let user = User {
        user_id: Uuid::new_v4().to_string(),
        first_name,
        last_name,
        email,
        phone,
        password_hash,
        role: form.user_type,
        token: None,
        refresh_token: None,
        created_at: now,
        updated_at: now,
    };

    // A concurrent signup that slipped past the counts is caught by the
    // store's unique constraint and comes back as a Conflict.
    state.store.insert_user(&user).await?;

    tracing::info!(user_id = %user.user_id, role = %user.role, "User created");

    Ok(HttpResponse::Created().json(SignupResponse {
        message: "user created successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

/// POST /users/login
///
/// Verifies the password, issues a fresh token pair and records it on the
/// user. The pair is returned even if recording it fails.
///
/// # Errors
/// - 400: Validation error
/// - 401: Unknown email (`INVALID_CREDENTIALS`) or wrong password (`PASSWORD_INCORRECT`)
/// - 503: Storage did not answer within its budget
pub async fn login(
    form: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let email = is_valid_email(&form.email)?;
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()).into());
    }

    let user = match state.store.find_user_by_email(&email).await {
        Ok(user) => user,
        Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials.into()),
        Err(e) => return Err(e.into()),
    };

    let hasher = state.hasher;
    let digest = user.password_hash.clone();
    let password = form.password;
    let verification = web::block(move || hasher.verify(&digest, &password)).await?;
    if !verification.matched {
        tracing::info!(user_id = %user.user_id, "Login rejected: password mismatch");
        return Err(AuthError::PasswordIncorrect.into());
    }

    let pair = state.issuer.issue(&user)?;

    // Bookkeeping failure leaves a stale "current token" record; the pair
    // itself stays valid, so the login still succeeds.
    if let Err(e) = state
        .refresher
        .refresh(&user.user_id, &pair.access_token, &pair.refresh_token)
        .await
    {
        tracing::warn!(
            user_id = %user.user_id,
            code = e.code(),
            "Login succeeded with unrecorded session tokens"
        );
    }

    tracing::info!(user_id = %user.user_id, "User logged in");

    Ok(HttpResponse::Ok().json(TokenResponse::new(
        "login successful",
        pair,
        state.issuer.access_token_expiry(),
    )))
}

/// POST /users/refresh
///
/// Exchanges the user's current refresh token for a new pair. A refresh token
/// that has since been replaced is rejected.
///
/// # Errors
/// - 401: Invalid, expired, wrong-kind or superseded refresh token
/// - 500/503: The new pair could not be recorded
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let presented = form.into_inner().refresh_token;
    if presented.trim().is_empty() {
        return Err(AuthError::MissingToken.into());
    }

    let claims = state.validator.validate_refresh(&presented)?;

    let user = match state.store.find_user_by_id(claims.user_id()).await {
        Ok(user) => user,
        Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials.into()),
        Err(e) => return Err(e.into()),
    };

    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        tracing::warn!(user_id = %user.user_id, "Superseded refresh token presented");
        return Err(AuthError::RefreshTokenSuperseded.into());
    }

    let pair = state.issuer.issue(&user)?;

    // The old refresh token stays current unless the new pair is recorded,
    // so a failed write is reported instead of returning an unusable pair.
    state
        .refresher
        .refresh(&user.user_id, &pair.access_token, &pair.refresh_token)
        .await?;

    tracing::info!(user_id = %user.user_id, "Session tokens rotated");

    Ok(HttpResponse::Ok().json(TokenResponse::new(
        "token refreshed",
        pair,
        state.issuer.access_token_expiry(),
    )))
}

/// GET /users
///
/// All users. Admin only; the role gate is applied by `JwtMiddleware`.
pub async fn get_users(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = state.store.list_users().await?;

    Ok(HttpResponse::Ok().json(UsersResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// GET /users/{user_id}
///
/// Admins may read any user; everyone else only their own record.
pub async fn get_user(
    path: web::Path<String>,
    claims: web::ReqData<Claims>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    if !claims.role.satisfies(Role::Admin) && claims.user_id() != user_id {
        tracing::warn!(
            caller = %claims.sub,
            target = %user_id,
            "Non-admin attempted to read another user"
        );
        return Err(AppError::Forbidden {
            required: Role::Admin,
        });
    }

    let user = state.store.find_user_by_id(&user_id).await?;

    Ok(HttpResponse::Ok().json(SingleUserResponse {
        user: UserResponse::from(&user),
    }))
}
