use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use neighborhood_engine::identity;
use neighborhood_types::api::{LoginRequest, SignupRequest};
use neighborhood_types::models::User;

use crate::error::{ApiError, api_error, identity_error};
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = identity::register(state.identities.as_ref(), &req.username, &req.email, &req.password)
        .map_err(identity_error)?;

    start_session(&state, user.clone()).await;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = identity::authenticate(state.identities.as_ref(), &req.email, &req.password)
        .map_err(identity_error)?;

    start_session(&state, user.clone()).await;
    Ok(Json(user))
}

pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.session.write().await.logout(state.session_store.as_ref());
    state.orchestrator.reset_session();
    StatusCode::NO_CONTENT
}

pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// Log `user` in. Switching from a different user counts as a logout first,
/// so the previous user's conversation is not carried over.
async fn start_session(state: &AppState, user: User) {
    let mut session = state.session.write().await;
    let switching_from = session
        .current()
        .filter(|previous| previous.id != user.id)
        .map(|previous| previous.username.clone());
    if let Some(previous) = switching_from {
        info!("Switching session from {} to {}", previous, user.username);
        session.logout(state.session_store.as_ref());
        state.orchestrator.reset_session();
    }
    session.login(user, state.session_store.as_ref());
}

/// 401 body used when a handler needs a session that isn't there.
pub fn not_logged_in() -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "not logged in")
}
