pub mod auth;

pub use auth::{CurrentUser, OnboardedUser, SESSION_COOKIE};
