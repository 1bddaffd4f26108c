use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::auth::Claims;

#[derive(Serialize)]
pub struct AccessGranted {
    pub message: String,
}

fn granted(resource: &str, claims: &Claims) -> HttpResponse {
    tracing::debug!(user_id = %claims.sub, resource = resource, "Protected resource served");
    HttpResponse::Ok().json(AccessGranted {
        message: format!("Access granted for {}", resource),
    })
}

/// GET /api-1
pub async fn api_one(claims: web::ReqData<Claims>) -> HttpResponse {
    granted("api-1", &claims)
}

/// GET /api-2
pub async fn api_two(claims: web::ReqData<Claims>) -> HttpResponse {
    granted("api-2", &claims)
}
