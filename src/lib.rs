//! Lightning Network peer messages and a minimal peer session.
//!
//! The [`wire`] module decodes and encodes BOLT 1 / BOLT 7 messages without
//! losing a byte. The [`session`] module keeps one connection alive on top
//! of any [`Transport`]: it sends `init`, answers `ping`, reacts to gossip
//! filters and pings the peer periodically.

pub mod config;
pub mod error;
pub mod peer;
pub mod session;
pub mod transport;
pub mod wire;

pub use config::SessionConfig;
pub use error::{AddressError, SessionError, TransportError, WireError, WireResult};
pub use peer::PeerAddress;
pub use session::{Inbound, Outbound, PeerSession, SessionState};
pub use transport::{MemoryTransport, Transport};
pub use wire::{Message, MessageType, MessageView};
