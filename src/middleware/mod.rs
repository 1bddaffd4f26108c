/// Middleware module
///
/// Access control for protected resources.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
