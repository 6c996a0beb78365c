//! Shared data types for the neighborhood chat: domain models, REST payloads,
//! and the events pushed to the client over the gateway.

pub mod api;
pub mod events;
pub mod models;
