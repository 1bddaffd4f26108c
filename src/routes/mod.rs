mod api;
mod health_check;
mod users;

pub use api::{api_one, api_two};
pub use health_check::health_check;
pub use users::{get_user, get_users, login, refresh, signup};
pub use users::{LoginRequest, RefreshRequest, SignupRequest, TokenResponse};
