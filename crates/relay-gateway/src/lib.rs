//! # relay-gateway
//!
//! WebSocket fan-out gateway: accepts subscribers, keeps the connection
//! registry, and relays every upstream chat event to each of them.

pub mod broadcast;
pub mod connection;
pub mod server;

pub use server::{run, serve};
