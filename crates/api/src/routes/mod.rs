//! HTTP and WebSocket routes

pub mod page;
pub mod stream;
