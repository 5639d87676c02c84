use super::endpoints::{GoogleOauthEndpoints, claims_from_id_token, claims_from_payload};
use crate::config::OauthConfig;
use crate::db::models::IdentityClaims;
use crate::error::{IsRetryable, SubtrackError};

use backon::{ExponentialBuilder, Retryable};
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, TokenResponse};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Google sign-in: consent URL, code exchange and identity resolution.
#[derive(Clone)]
pub struct GoogleOauthService {
    cfg: OauthConfig,
    client: reqwest::Client,
}

impl GoogleOauthService {
    /// Create a new service with a preconfigured HTTP client.
    pub fn new(cfg: &OauthConfig) -> Result<Self, SubtrackError> {
        let mut builder = reqwest::Client::builder()
            .user_agent("subtrack/1.0")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15));
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        Ok(Self {
            cfg: cfg.clone(),
            client: builder.build()?,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.cfg.client_id.is_empty() && !self.cfg.client_secret.is_empty()
    }

    pub fn authorize_url(
        &self,
        challenge: PkceCodeChallenge,
    ) -> Result<(Url, CsrfToken), SubtrackError> {
        GoogleOauthEndpoints::build_authorize_url(&self.cfg, challenge)
    }

    /// Exchange the callback code and resolve who signed in. Claims come
    /// from the id_token when present, otherwise from the userinfo endpoint.
    pub async fn sign_in(
        &self,
        code: String,
        verifier: String,
    ) -> Result<IdentityClaims, SubtrackError> {
        let token = GoogleOauthEndpoints::exchange_authorization_code(
            &self.cfg,
            AuthorizationCode::new(code),
            PkceCodeVerifier::new(verifier),
            &self.client,
        )
        .await?;

        if let Some(claims) = token
            .extra_fields()
            .id_token
            .as_deref()
            .and_then(claims_from_id_token)
        {
            debug!(subject = %claims.subject, "identity taken from id_token");
            return Ok(claims);
        }

        let access_token = token.access_token().secret().clone();
        let payload = (|| async {
            GoogleOauthEndpoints::fetch_userinfo(&self.cfg, &access_token, &self.client).await
        })
        .retry(default_retry_policy())
        .when(|e: &SubtrackError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("userinfo retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        let claims = claims_from_payload(&payload).ok_or(SubtrackError::MissingIdentity)?;
        info!(subject = %claims.subject, "identity taken from userinfo");
        Ok(claims)
    }
}
