use crate::config::OauthConfig;
use crate::db::models::IdentityClaims;
use crate::error::SubtrackError;

use base64::Engine;
use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, ExtraTokenFields, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, StandardRevocableToken, StandardTokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use url::Url;

pub const IDENTITY_PROVIDER: &str = "google";
const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Stateless Google OAuth endpoints.
pub(super) struct GoogleOauthEndpoints;

impl GoogleOauthEndpoints {
    /// Consent page URL carrying the PKCE challenge, plus the CSRF state to
    /// check on the way back.
    pub(super) fn build_authorize_url(
        cfg: &OauthConfig,
        challenge: PkceCodeChallenge,
    ) -> Result<(Url, CsrfToken), SubtrackError> {
        let client = build_oauth2_client(cfg)?;
        let (url, csrf) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(challenge)
            .url();
        Ok((url, csrf))
    }

    pub(super) async fn exchange_authorization_code(
        cfg: &OauthConfig,
        code: AuthorizationCode,
        verifier: PkceCodeVerifier,
        http_client: &reqwest::Client,
    ) -> Result<GoogleTokenResponse, SubtrackError> {
        let client = build_oauth2_client(cfg)?;
        let token_result: GoogleTokenResponse = client
            .exchange_code(code)
            .set_pkce_verifier(verifier)
            .request_async(http_client)
            .await?;
        info!("authorization code exchanged");
        Ok(token_result)
    }

    pub(super) async fn fetch_userinfo(
        cfg: &OauthConfig,
        access_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<Value, SubtrackError> {
        let resp = http_client
            .get(cfg.userinfo_url.as_str())
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?;
        let body = resp.json::<Value>().await?;
        Ok(body)
    }
}

fn build_oauth2_client(cfg: &OauthConfig) -> Result<GoogleOauth2Client, SubtrackError> {
    let client = OAuth2Client::new(ClientId::new(cfg.client_id.clone()))
        .set_client_secret(ClientSecret::new(cfg.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(cfg.auth_url.clone())?)
        .set_token_uri(TokenUrl::new(cfg.token_url.clone())?)
        .set_redirect_uri(RedirectUrl::new(cfg.redirect_url.clone())?);
    Ok(client)
}

/// Identity claims from an OpenID payload (`sub`, `email`, `name`, `picture`),
/// as found in an id_token or a userinfo response.
pub(super) fn claims_from_payload(payload: &Value) -> Option<IdentityClaims> {
    let subject = payload.get("sub").and_then(Value::as_str)?;
    let email = payload.get("email").and_then(Value::as_str)?;
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(IdentityClaims {
        provider: IDENTITY_PROVIDER.to_string(),
        subject: subject.to_string(),
        email: email.to_string(),
        full_name: text("name"),
        avatar_url: text("picture"),
    })
}

/// Decode the claims segment of an id_token. The signature is not checked:
/// the token comes straight from the token endpoint over TLS.
pub(super) fn claims_from_id_token(id_token: &str) -> Option<IdentityClaims> {
    let payload_b64 = id_token.split('.').nth(1)?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64.trim_end_matches('='))
        .ok()?;
    let payload = serde_json::from_slice::<Value>(&decoded).ok()?;
    claims_from_payload(&payload)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(super) struct GoogleTokenField {
    #[serde(rename = "id_token")]
    pub id_token: Option<String>,
}
impl ExtraTokenFields for GoogleTokenField {}

pub(super) type GoogleTokenResponse = StandardTokenResponse<GoogleTokenField, BasicTokenType>;

pub(super) type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fake_id_token(payload: Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"RS256"}"#),
            engine.encode(payload.to_string())
        )
    }

    #[test]
    fn id_token_claims_are_decoded() {
        let token = fake_id_token(json!({
            "sub": "1234",
            "email": "ana@example.com",
            "name": "Ana Pop",
            "picture": ""
        }));
        let claims = claims_from_id_token(&token).unwrap();
        assert_eq!(claims.provider, "google");
        assert_eq!(claims.subject, "1234");
        assert_eq!(claims.full_name.as_deref(), Some("Ana Pop"));
        assert_eq!(claims.avatar_url, None);
    }

    #[test]
    fn id_token_without_email_is_rejected() {
        let token = fake_id_token(json!({ "sub": "1234" }));
        assert!(claims_from_id_token(&token).is_none());
        assert!(claims_from_id_token("not-a-jwt").is_none());
    }

    #[test]
    fn authorize_url_requests_offline_consent_with_pkce() {
        let cfg = OauthConfig {
            client_id: "client-1".into(),
            ..Default::default()
        };
        let (challenge, _verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, csrf) = GoogleOauthEndpoints::build_authorize_url(&cfg, challenge).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| query.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());

        assert_eq!(get("client_id"), Some("client-1"));
        assert_eq!(get("scope"), Some("openid email profile"));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("prompt"), Some("consent"));
        assert_eq!(get("code_challenge_method"), Some("S256"));
        assert_eq!(get("state"), Some(csrf.secret().as_str()));
        assert_eq!(get("redirect_uri"), Some("http://localhost:8000/auth/callback"));
    }
}
