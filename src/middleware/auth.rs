use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use chrono::Utc;
use headers::Authorization;
use headers::authorization::Bearer;

use crate::db::models::AuthUser;
use crate::error::SubtrackError;
use crate::router::SubtrackState;

pub const SESSION_COOKIE: &str = "subtrack_session";

/// Session token of the inbound request.
/// Accepts either:
/// - Header: `Authorization: Bearer <session_token>`
/// - Private cookie `subtrack_session`
async fn session_token(parts: &mut Parts, state: &SubtrackState) -> Option<String> {
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }
    let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
        .await
        .ok()?;
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// A signed-in caller, resolved from a live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub token: String,
}

impl FromRequestParts<SubtrackState> for CurrentUser {
    type Rejection = SubtrackError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SubtrackState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state)
            .await
            .ok_or(SubtrackError::Unauthorized)?;
        let user = state
            .storage
            .session_user(&token, Utc::now())
            .await?
            .ok_or(SubtrackError::Unauthorized)?;
        Ok(Self { user, token })
    }
}

/// A signed-in caller who has finished onboarding.
#[derive(Debug, Clone)]
pub struct OnboardedUser(pub AuthUser);

impl FromRequestParts<SubtrackState> for OnboardedUser {
    type Rejection = SubtrackError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SubtrackState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;
        if !state.storage.has_completed_onboarding(&user.id).await? {
            return Err(SubtrackError::OnboardingRequired);
        }
        Ok(Self(user))
    }
}
