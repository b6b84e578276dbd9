//! WebSocket Real-Time Streaming
//!
//! Pushes live telemetry to dashboard viewers.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Registry of active viewers and fan-out
//! - **Handler**: WebSocket upgrade and per-connection read/write tasks
//! - **Messages**: Client and server message formats
//!
//! ## Protocol
//!
//! Viewers connect to `/ws`. The server first sends
//! `{"type": "hello", "latest": {...}}` with the current snapshot, then one
//! `{"type": "telemetry", "topic", "payload", "latest"}` per ingested broker
//! message. A `{"type": "ping"}` from the client is answered with
//! `{"type": "pong"}`.
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3001/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'telemetry') render(msg.latest);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHandle, ConnectionHub, ConnectionId, HubConfig, HubError, HubGuard};
pub use messages::{ClientMessage, ServerMessage};
