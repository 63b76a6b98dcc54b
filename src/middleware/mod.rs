pub mod auth;

pub use auth::{AuthMiddleware, CurrentUser, NOT_AUTHORIZED, TOKEN_COOKIE};
