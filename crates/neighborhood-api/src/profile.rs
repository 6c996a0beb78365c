use axum::{Extension, Json, extract::State};

use neighborhood_engine::identity;
use neighborhood_types::api::UpdateProfileRequest;
use neighborhood_types::models::User;

use crate::auth::not_logged_in;
use crate::error::{ApiError, identity_error};
use crate::state::AppState;

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let mut session = state.session.write().await;
    // The session may have ended between the middleware check and here
    if session.current().map(|current| current.id) != Some(user.id) {
        return Err(not_logged_in());
    }

    let updated = identity::update_profile(
        state.identities.as_ref(),
        &user,
        &req.username,
        req.bio,
        req.avatar_image,
    )
    .map_err(identity_error)?;

    session.update(updated.clone(), state.session_store.as_ref());
    Ok(Json(updated))
}
