use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::require_session;
use crate::state::AppState;
use crate::{auth, gateway, messages, profile};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/channel", get(messages::get_channel))
        .route("/neighbors", get(messages::get_neighbors))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/profile", put(profile::update_profile))
        .route("/messages", get(messages::get_messages).post(messages::send_message))
        .route("/activity", get(messages::get_activity))
        .route("/gateway", get(gateway::ws_upgrade))
        .layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
