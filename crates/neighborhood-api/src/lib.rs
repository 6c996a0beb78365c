//! HTTP surface for the single local client: auth, profile, the message log,
//! and the gateway upgrade.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod messages;
pub mod middleware;
pub mod profile;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
