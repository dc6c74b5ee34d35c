//! WebSocket server: wire protocol, codec, connection handling and the
//! TCP listener.

pub mod codec;
pub mod listener;
pub mod manager;
pub mod protocol;
pub mod sink;

pub use listener::{HEALTH_PATH, Server, WEBSOCKET_PATH};
pub use manager::{ConnectionId, ConnectionManager};
pub use protocol::{ErrorCode, ProtocolError, WireMessage};
pub use sink::{FrameSink, TransportError};
