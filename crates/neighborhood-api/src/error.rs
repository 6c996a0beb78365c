use axum::{Json, http::StatusCode};
use tracing::warn;

use neighborhood_engine::{ChatError, IdentityError};
use neighborhood_types::api::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn identity_error(e: IdentityError) -> ApiError {
    let status = match &e {
        IdentityError::MissingField(_) | IdentityError::InvalidAvatar => StatusCode::BAD_REQUEST,
        IdentityError::AlreadyRegistered => StatusCode::CONFLICT,
        IdentityError::NotFound => StatusCode::NOT_FOUND,
        IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::AvatarTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        IdentityError::Hash(_) => {
            warn!("{}", e);
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        }
    };
    api_error(status, e.to_string())
}

pub fn chat_error(e: ChatError) -> ApiError {
    match e {
        ChatError::EmptyMessage => api_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}
