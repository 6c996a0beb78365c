use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use neighborhood_types::api::{ActivityResponse, ChannelResponse, SendMessageRequest};
use neighborhood_types::models::{Message, Neighbor, User, online_neighbors};

use crate::auth::not_logged_in;
use crate::error::{ApiError, chat_error};
use crate::state::AppState;

pub async fn get_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.orchestrator.messages())
}

/// Append the user's message and answer right away; the provider round trip
/// and reply delivery continue in the background and reach the client over
/// the gateway.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Held across post so a logout cannot land in between
    let session = state.session.read().await;
    if session.current().map(|current| current.id) != Some(user.id) {
        return Err(not_logged_in());
    }
    let round = state
        .orchestrator
        .post(&user, &req.content)
        .map_err(chat_error)?;
    drop(session);
    let message = round.message().clone();

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let scheduled = orchestrator.respond(round).await;
        debug!("{} replies scheduled", scheduled);
    });

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_activity(State(state): State<AppState>) -> Json<ActivityResponse> {
    Json(ActivityResponse {
        state: state.orchestrator.activity(),
    })
}

pub async fn get_channel(State(state): State<AppState>) -> Json<ChannelResponse> {
    Json(ChannelResponse {
        channel: state.orchestrator.channel().clone(),
    })
}

pub async fn get_neighbors() -> Json<Vec<Neighbor>> {
    Json(online_neighbors())
}
