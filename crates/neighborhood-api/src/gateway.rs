use axum::{
    Extension,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};

use neighborhood_gateway::connection;
use neighborhood_types::models::User;

use crate::state::AppState;

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, dispatcher, user.id, user.username)
    })
}
