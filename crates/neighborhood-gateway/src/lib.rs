//! Event fan-out and the WebSocket connection loop that pushes conversation
//! events to the client.

pub mod connection;
pub mod dispatcher;
