mod endpoints;
pub mod service;

pub use endpoints::IDENTITY_PROVIDER;
pub use service::GoogleOauthService;
