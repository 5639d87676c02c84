use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SubtrackError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("OAuth2 token request error: {0}")]
    Oauth2Token(String),

    #[error("OAuth2 server error: {error}")]
    Oauth2Server { error: String },

    #[error("OAuth flow error: {0}")]
    OauthFlowError(String),

    #[error("identity provider returned no subject or email")]
    MissingIdentity,

    #[error("not authenticated")]
    Unauthorized,

    #[error("onboarding has not been completed")]
    OnboardingRequired,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("Actor error: {0}")]
    ActorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
}

/// Errors worth another attempt against an upstream (network hiccups, 5xx, 429).
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for SubtrackError {
    fn is_retryable(&self) -> bool {
        match self {
            SubtrackError::Reqwest(e) => {
                if e.is_timeout() || e.is_connect() {
                    return true;
                }
                e.status()
                    .map(|s| s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS)
                    .unwrap_or(false)
            }
            _ => false,
        }
    }
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for SubtrackError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => SubtrackError::Oauth2Server {
                error: err.error().to_string(),
            },
            RequestTokenError::Request(req_e) => {
                SubtrackError::Oauth2Token(format!("request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => {
                SubtrackError::Json(parse_err.into_inner())
            }
            RequestTokenError::Other(s) => SubtrackError::Oauth2Token(s),
        }
    }
}

impl IntoResponse for SubtrackError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            SubtrackError::DatabaseError(_)
            | SubtrackError::ActorError(_)
            | SubtrackError::Io(_)
            | SubtrackError::Config(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "Failed to load or save data. Please try again.".to_string(),
                };
                (status, body)
            }
            SubtrackError::Json(_)
            | SubtrackError::Oauth2Token(_)
            | SubtrackError::Oauth2Server { .. }
            | SubtrackError::MissingIdentity
            | SubtrackError::Unauthorized => {
                let status = StatusCode::UNAUTHORIZED;
                let body = ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Authentication error.".to_string(),
                };
                (status, body)
            }
            SubtrackError::OauthFlowError(reason) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "OAUTH_FLOW".to_string(),
                    message: reason,
                };
                (status, body)
            }
            SubtrackError::OnboardingRequired => {
                let status = StatusCode::FORBIDDEN;
                let body = ApiErrorBody {
                    code: "ONBOARDING_REQUIRED".to_string(),
                    message: "Complete onboarding first.".to_string(),
                };
                (status, body)
            }
            SubtrackError::NotFound(what) => {
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{what} not found."),
                };
                (status, body)
            }
            SubtrackError::Validation(message) => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                let body = ApiErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    message,
                };
                (status, body)
            }
            SubtrackError::Reqwest(_) | SubtrackError::UrlParse(_) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Identity provider is unavailable.".to_string(),
                };
                (status, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422_with_message() {
        let resp = SubtrackError::Validation("amount must be positive".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn storage_failures_are_generic_500() {
        let resp = SubtrackError::DatabaseError(SqlxError::PoolClosed).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(!SubtrackError::Unauthorized.is_retryable());
        assert!(!SubtrackError::Oauth2Server { error: "invalid_grant".into() }.is_retryable());
    }
}
