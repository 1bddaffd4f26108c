use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialHasher, TokenIssuer, TokenRefresher, TokenValidator};
use crate::configuration::JwtSettings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::persistence::{TimeoutStore, UserStore};
use crate::routes::{api_one, api_two, get_user, get_users, health_check, login, refresh, signup};
use crate::user::Role;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub hasher: CredentialHasher,
    pub issuer: TokenIssuer,
    pub validator: TokenValidator,
    pub refresher: TokenRefresher,
}

impl AppState {
    /// Wires the auth components around `store`. Every storage call made
    /// through this state is bounded by `storage_timeout`.
    pub fn new(store: Arc<dyn UserStore>, jwt: &JwtSettings, storage_timeout: Duration) -> Self {
        let store: Arc<dyn UserStore> = Arc::new(TimeoutStore::new(store, storage_timeout));

        Self {
            refresher: TokenRefresher::new(store.clone()),
            store,
            hasher: CredentialHasher::new(),
            issuer: TokenIssuer::new(jwt),
            validator: TokenValidator::new(jwt),
        }
    }

    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::from(ValidationError::InvalidBody(err.to_string())).into()
}

/// Registers the routing table against `state`.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let validator = state.validator.clone();

    cfg.app_data(state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        // Public routes (no authentication required)
        .route("/health_check", web::get().to(health_check))
        .route("/users/signup", web::post().to(signup))
        .route("/users/login", web::post().to(login))
        .route("/users/refresh", web::post().to(refresh))
        // Protected routes (require a valid access token)
        .service(
            web::resource("/users")
                .wrap(JwtMiddleware::new(validator.clone()).require_role(Role::Admin))
                .route(web::get().to(get_users)),
        )
        .service(
            web::resource("/users/{user_id}")
                .wrap(JwtMiddleware::new(validator.clone()))
                .route(web::get().to(get_user)),
        )
        .service(
            web::resource("/api-1")
                .wrap(JwtMiddleware::new(validator.clone()))
                .route(web::get().to(api_one)),
        )
        .service(
            web::resource("/api-2")
                .wrap(JwtMiddleware::new(validator))
                .route(web::get().to(api_two)),
        );
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .configure(|cfg| configure_routes(cfg, state.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
