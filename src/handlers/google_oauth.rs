use crate::db::models::AuthUser;
use crate::middleware::{CurrentUser, SESSION_COOKIE};
use crate::{error::SubtrackError, router::SubtrackState};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::{DateTime, Utc};
use oauth2::{CsrfToken, PkceCodeChallenge};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

const CSRF_COOKIE: &str = "oauth_csrf_token";
const PKCE_COOKIE: &str = "oauth_pkce_verifier";

/// Where the client should go after sign-in.
pub fn next_route(onboarding_completed: bool) -> &'static str {
    if onboarding_completed {
        "dashboard"
    } else {
        "onboarding"
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
    pub display_name: String,
    pub avatar_initial: char,
    pub onboarding_completed: bool,
    pub next_route: &'static str,
}

impl MeResponse {
    fn new(user: AuthUser, onboarding_completed: bool) -> Self {
        Self {
            display_name: user.display_name(),
            avatar_initial: user.avatar_initial(),
            user,
            onboarding_completed,
            next_route: next_route(onboarding_completed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub me: MeResponse,
}

/// GET /auth/google -> redirects to Google's OAuth2 consent page.
pub async fn google_oauth_entry(
    State(state): State<SubtrackState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, SubtrackError> {
    if !state.oauth.is_configured() {
        return Err(SubtrackError::OauthFlowError(
            "Google sign-in is not configured".to_string(),
        ));
    }

    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let pkce_verifier = verifier.secret().to_string();

    let (auth_url, csrf_token) = state.oauth.authorize_url(challenge)?;

    let jar = store_oauth_cookies(jar, &csrf_token, &pkce_verifier, &state);

    info!("Dispatching OAuth redirect");
    Ok((jar, Redirect::temporary(auth_url.as_ref())).into_response())
}

/// GET /auth/callback -> exchanges the code, records the identity and opens a session.
pub async fn google_oauth_callback(
    State(state): State<SubtrackState>,
    Query(query): Query<AuthCallbackQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let (pkce_verifier, csrf_cookie, jar) = match load_oauth_session(jar) {
        Ok(data) => data,
        Err((jar, err)) => return respond_with_error(jar, err),
    };

    if let Some(reason) = query.error.as_deref() {
        return respond_with_error(
            jar,
            SubtrackError::OauthFlowError(format!("sign-in was not completed: {reason}")),
        );
    }

    let Some(state_param) = query.state.as_deref() else {
        return respond_with_error(
            jar,
            SubtrackError::OauthFlowError("missing `state` in callback".to_string()),
        );
    };

    if !bool::from(state_param.as_bytes().ct_eq(csrf_cookie.as_bytes())) {
        return respond_with_error(
            jar,
            SubtrackError::OauthFlowError("CSRF token mismatch".to_string()),
        );
    }

    let Some(code) = query.code else {
        return respond_with_error(
            jar,
            SubtrackError::OauthFlowError("missing `code` in callback".to_string()),
        );
    };

    let claims = match state.oauth.sign_in(code, pkce_verifier).await {
        Ok(claims) => claims,
        Err(err) => {
            warn!("sign-in failed: {err}");
            return respond_with_error(jar, err);
        }
    };

    match open_session(&state, jar, &claims).await {
        Ok(resp) => resp,
        Err((jar, err)) => respond_with_error(jar, err),
    }
}

async fn open_session(
    state: &SubtrackState,
    jar: PrivateCookieJar,
    claims: &crate::db::models::IdentityClaims,
) -> Result<Response, (PrivateCookieJar, SubtrackError)> {
    let now = Utc::now();
    let user = match state.storage.upsert_auth_user(claims, now).await {
        Ok(user) => user,
        Err(e) => return Err((jar, e)),
    };
    let token = CsrfToken::new_random_len(32).secret().to_string();
    let session = match state
        .storage
        .create_session(&user.id, token, now, state.config.session_ttl())
        .await
    {
        Ok(session) => session,
        Err(e) => return Err((jar, e)),
    };
    let onboarding_completed = match state.storage.has_completed_onboarding(&user.id).await {
        Ok(done) => done,
        Err(e) => return Err((jar, e)),
    };

    let jar = jar.add(session_cookie(state, session.token.clone()));
    info!(user_id = %user.id, onboarding_completed, "session opened");
    let body = SignInResponse {
        session_token: session.token,
        expires_at: session.expires_at,
        me: MeResponse::new(user, onboarding_completed),
    };
    Ok((jar, Json(body)).into_response())
}

/// GET /auth/me -> the signed-in identity and where it should land.
pub async fn me(
    State(state): State<SubtrackState>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Json<MeResponse>, SubtrackError> {
    let onboarding_completed = state.storage.has_completed_onboarding(&user.id).await?;
    Ok(Json(MeResponse::new(user, onboarding_completed)))
}

/// POST /auth/logout -> ends the session and forgets the wizard state.
pub async fn logout(
    State(state): State<SubtrackState>,
    CurrentUser { user, token }: CurrentUser,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, SubtrackError> {
    state.storage.delete_session(&token).await?;
    state.onboarding.reset(&user.id).await;
    info!(user_id = %user.id, "signed out");
    let jar = jar.remove(clear_cookie(SESSION_COOKIE));
    Ok((jar, StatusCode::NO_CONTENT))
}

fn store_oauth_cookies(
    jar: PrivateCookieJar,
    csrf: &CsrfToken,
    pkce_verifier: &str,
    state: &SubtrackState,
) -> PrivateCookieJar {
    jar.add(build_cookie(state, CSRF_COOKIE, csrf.secret().to_string(), Duration::minutes(15)))
        .add(build_cookie(state, PKCE_COOKIE, pkce_verifier.to_string(), Duration::minutes(15)))
}

fn load_oauth_session(
    jar: PrivateCookieJar,
) -> Result<(String, String, PrivateCookieJar), (PrivateCookieJar, SubtrackError)> {
    let Some(csrf_cookie) = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned()) else {
        let jar = clear_oauth_cookies(jar);
        return Err((
            jar,
            SubtrackError::OauthFlowError("Missing CSRF token in cookie".to_string()),
        ));
    };

    let Some(pkce_cookie) = jar.get(PKCE_COOKIE).map(|c| c.value().to_owned()) else {
        let jar = clear_oauth_cookies(jar);
        return Err((
            jar,
            SubtrackError::OauthFlowError("Missing PKCE verifier in cookie".to_string()),
        ));
    };

    let jar = clear_oauth_cookies(jar);

    Ok((pkce_cookie, csrf_cookie, jar))
}

fn clear_oauth_cookies(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie(CSRF_COOKIE))
        .remove(clear_cookie(PKCE_COOKIE))
}

fn session_cookie(state: &SubtrackState, token: String) -> Cookie<'static> {
    let hours = state.config.session_ttl().num_hours();
    build_cookie(state, SESSION_COOKIE, token, Duration::hours(hours))
}

fn build_cookie(
    state: &SubtrackState,
    name: &str,
    value: String,
    max_age: Duration,
) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), value))
        .path("/")
        .http_only(true)
        .secure(!state.config.basic.insecure_cookie)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn respond_with_error(jar: PrivateCookieJar, err: SubtrackError) -> Response {
    (jar, err.into_response()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sends_new_users_to_onboarding() {
        assert_eq!(next_route(false), "onboarding");
        assert_eq!(next_route(true), "dashboard");
    }
}
