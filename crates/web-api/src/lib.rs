//! HTTP surface of the trade engine: signal ingress, trade listing, and a
//! WebSocket stream of status transitions.

pub mod handlers;
pub mod server;
pub mod websocket;

pub use server::{ApiServer, AppState};
