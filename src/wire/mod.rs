//! Lightning peer wire protocol primitives.
//!
//! Every message starts with a 2-byte big-endian type id followed by a body
//! whose layout depends on the type. This module provides:
//!
//! - Field elements (`u16`, `u32`, fixed-width and length-prefixed bytes)
//! - A static registry of message layouts with a generic fallback
//! - Lossless decoding and encoding of whole messages
//! - Typed, borrowed views of the registered message types
//! - Builders for the messages a session sends
//!
//! Transport encryption and framing are not handled here: the codec works
//! on complete, already decrypted messages.
//!
//! Protocol reference:
//! https://github.com/lightning/bolts/blob/master/01-messaging.md
pub mod codec;
pub mod element;
pub mod message;
pub mod payload;
pub mod schema;
pub mod tlv;

pub mod constants;

pub use codec::{decode_as, dispatch, encode};
pub use element::{Element, Value};
pub use message::{Message, MessageType, MessageView, ShortChannelId};
pub use schema::MessageSchema;
