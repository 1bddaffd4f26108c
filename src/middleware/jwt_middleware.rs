/// JWT Access Middleware
///
/// Gates a resource on a valid access token from the `Authorization` header
/// and, optionally, on the caller's role. Admitted requests carry their
/// `Claims` in the request extensions for the handler to read.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Claims, TokenValidator};
use crate::error::{AppError, AuthError};
use crate::user::Role;

/// Must wrap every resource that requires authentication.
pub struct JwtMiddleware {
    validator: TokenValidator,
    required_role: Option<Role>,
}

impl JwtMiddleware {
    pub fn new(validator: TokenValidator) -> Self {
        Self {
            validator,
            required_role: None,
        }
    }

    /// Additionally require the caller's role to satisfy `role`
    pub fn require_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    validator: TokenValidator,
    required_role: Option<Role>,
}

impl<S> JwtMiddlewareService<S> {
    fn admit(&self, req: &ServiceRequest) -> Result<Claims, AppError> {
        let token = bearer_token(req).ok_or(AuthError::MissingToken)?;

        let claims = self.validator.validate_access(&token).map_err(|e| {
            tracing::debug!(reason = e.code(), path = %req.path(), "Access token rejected");
            e
        })?;

        if let Some(required) = self.required_role {
            if !claims.role.satisfies(required) {
                tracing::warn!(
                    user_id = %claims.sub,
                    role = %claims.role,
                    required = %required,
                    path = %req.path(),
                    "Insufficient role"
                );
                return Err(AppError::Forbidden { required });
            }
        }

        Ok(claims)
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.admit(&req) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, role = %claims.role, "Access granted");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}

/// Token from `Authorization: Bearer <token>`, if present and non-empty
fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::configuration::JwtSettings;
    use crate::user::User;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse, ResponseError};
    use chrono::Utc;

    fn config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            user_id: "mw-user".to_string(),
            first_name: "Ken".to_string(),
            last_name: "Thompson".to_string(),
            email: "ken@example.com".to_string(),
            phone: "+15550006666".to_string(),
            password_hash: "digest".to_string(),
            role,
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    fn expect_rejection(err: Error, status: StatusCode, code: &str) {
        let app_error = err
            .as_error::<AppError>()
            .expect("middleware should reject with an AppError");
        assert_eq!(app_error.status_code(), status);
        assert_eq!(app_error.code(), code);
    }

    #[actix_web::test]
    async fn test_claims_reach_the_handler() {
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(TokenValidator::new(&config())))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;
        let token = TokenIssuer::new(&config()).issue(&user(Role::User)).unwrap().access_token;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;

        assert_eq!(body, "mw-user");
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthenticated() {
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(TokenValidator::new(&config())))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        for header in [None, Some("Basic abc"), Some("Bearer "), Some("token")] {
            let mut req = test::TestRequest::get().uri("/me");
            if let Some(value) = header {
                req = req.insert_header((AUTHORIZATION, value));
            }
            let err = app.call(req.to_request()).await.err().expect("request must be rejected");
            expect_rejection(err, StatusCode::UNAUTHORIZED, "MISSING_TOKEN");
        }
    }

    #[actix_web::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(JwtMiddleware::new(TokenValidator::new(&config())))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;
        let pair = TokenIssuer::new(&config()).issue(&user(Role::Admin)).unwrap();

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", pair.refresh_token)))
            .to_request();
        let err = app.call(req).await.err().expect("request must be rejected");

        expect_rejection(err, StatusCode::UNAUTHORIZED, "WRONG_TOKEN_KIND");
    }

    #[actix_web::test]
    async fn test_role_gate() {
        let app = test::init_service(
            App::new().service(
                web::resource("/admin")
                    .wrap(JwtMiddleware::new(TokenValidator::new(&config())).require_role(Role::Admin))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;
        let issuer = TokenIssuer::new(&config());

        let user_token = issuer.issue(&user(Role::User)).unwrap().access_token;
        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", user_token)))
            .to_request();
        let err = app.call(req).await.err().expect("user must be rejected");
        expect_rejection(err, StatusCode::FORBIDDEN, "INSUFFICIENT_ROLE");

        let admin_token = issuer.issue(&user(Role::Admin)).unwrap().access_token;
        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", admin_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_token_from_other_secret_is_unauthenticated_not_forbidden() {
        let app = test::init_service(
            App::new().service(
                web::resource("/admin")
                    .wrap(JwtMiddleware::new(TokenValidator::new(&config())).require_role(Role::Admin))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;
        let mut foreign = config();
        foreign.secret = "not-the-server-secret".to_string();
        let token = TokenIssuer::new(&foreign).issue(&user(Role::Admin)).unwrap().access_token;

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let err = app.call(req).await.err().expect("request must be rejected");

        expect_rejection(err, StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE");
    }
}
