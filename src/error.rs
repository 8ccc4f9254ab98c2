//! Error types for the wire codec, the transport seam and peer sessions.

use std::io;
use thiserror::Error;

/// Errors raised while decoding or building wire messages.
///
/// None of these are fatal to a session: an inbound message that fails to
/// decode is dropped and the receive loop moves on.
#[derive(Debug, Error)]
pub enum WireError {
    /// The buffer ended before the field could be read.
    #[error("truncated input reading {field}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// A length-prefixed payload does not fit in its 2-byte length field.
    #[error("{field}: payload of {len} bytes exceeds the 65535-byte limit")]
    PayloadTooLarge { field: &'static str, len: usize },

    /// A TLV stream violates BOLT 1 encoding rules.
    #[error("malformed TLV stream: {0}")]
    MalformedTlv(&'static str),

    /// Values handed to a builder do not match the schema's layout.
    #[error("{type_name}: expected {expected}, got {got}")]
    SchemaMismatch {
        type_name: &'static str,
        expected: String,
        got: String,
    },
}

/// Errors reported by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection is gone; nothing more can be read or sent.
    #[error("transport closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A per-message fault that does not imply connection loss
    /// (bad MAC, malformed frame).
    #[error("transport error: {0}")]
    Other(String),
}

/// Errors that end a peer session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound message could not be built from the session config.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// Too many inbound messages in a row failed to read or decode.
    #[error("giving up after {count} consecutive receive failures")]
    TooManyFailures { count: u32 },

    /// The session has already been stopped.
    #[error("session is not running")]
    NotRunning,
}

/// Errors parsing a `<node_id>@<host>:<port>` peer address.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("missing '@' separator between node id and host")]
    MissingNodeId,

    #[error("missing ':' separator between host and port")]
    MissingPort,

    #[error("empty host")]
    EmptyHost,

    #[error("invalid port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),

    #[error("node id must be 66 hex characters, got {0}")]
    NodeIdLength(usize),

    #[error("node id is not valid hex: {0}")]
    NodeIdHex(#[from] hex::FromHexError),

    #[error("node id is not a valid compressed public key: {0}")]
    NodeIdKey(#[from] secp256k1::Error),
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;
