use crate::error::SubtrackError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "SUBTRACK_";
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URI: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Runtime configuration.
///
/// Layered as: built-in defaults, then `config.toml` (optional), then
/// `SUBTRACK_*` environment variables (`SUBTRACK_BASIC__LISTEN_ADDR=...`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub oauth: OauthConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Secret for the private cookie jar. Needs at least 64 bytes, otherwise a
    /// random key is generated at startup and cookies do not survive restarts.
    pub cookie_secret: String,
    pub insecure_cookie: bool,
    pub session_ttl_hours: i64,
    /// Renewal reminder sweep period. `0` disables the sweep.
    pub reminder_interval_secs: u64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://data.db".to_string(),
            loglevel: "info".to_string(),
            cookie_secret: String::new(),
            insecure_cookie: false,
            session_ttl_hours: 24 * 30,
            reminder_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub proxy: Option<Url>,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: "http://localhost:8000/auth/callback".to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URI.to_string(),
            userinfo_url: GOOGLE_USERINFO_URI.to_string(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub currency_code: String,
    pub timezone: String,
    pub upcoming_window_days: i64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            currency_code: "RON".to_string(),
            timezone: "Europe/Bucharest".to_string(),
            upcoming_window_days: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, SubtrackError> {
        let cfg = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(cfg)
    }

    /// Session lifetime, kept between one hour and one year.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.basic.session_ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_overrides_nested_sections() {
        Jail::expect_with(|jail| {
            jail.set_env("SUBTRACK_BASIC__LISTEN_ADDR", "127.0.0.1:9999");
            jail.set_env("SUBTRACK_DEFAULTS__CURRENCY_CODE", "EUR");
            let cfg = Config::load().expect("config loads");
            assert_eq!(cfg.basic.listen_addr, "127.0.0.1:9999");
            assert_eq!(cfg.defaults.currency_code, "EUR");
            assert_eq!(cfg.defaults.timezone, "Europe/Bucharest");
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_layered_under_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [basic]
                loglevel = "debug"
                session_ttl_hours = 2

                [oauth]
                client_id = "from-file"
                "#,
            )?;
            jail.set_env("SUBTRACK_OAUTH__CLIENT_ID", "from-env");
            let cfg = Config::load().expect("config loads");
            assert_eq!(cfg.basic.loglevel, "debug");
            assert_eq!(cfg.session_ttl(), chrono::Duration::hours(2));
            assert_eq!(cfg.oauth.client_id, "from-env");
            Ok(())
        });
    }
    #[test]
    fn session_ttl_is_bounded() {
        let mut cfg = Config::default();
        cfg.basic.session_ttl_hours = i64::MAX;
        assert_eq!(cfg.session_ttl(), chrono::Duration::hours(24 * 365));
        cfg.basic.session_ttl_hours = -3;
        assert_eq!(cfg.session_ttl(), chrono::Duration::hours(1));
    }
}
