//! WebSocket front end.
//!
//! - `listener`: binds the port and spawns one task per accepted client
//! - `connection`: per-client loop that turns requests into snapshots

pub mod connection;
pub mod listener;

pub use listener::{bind, serve};
