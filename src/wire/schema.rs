//! Static registry of message layouts.
//!
//! Each registered message type maps to an ordered list of fields. The
//! 2-byte type id is implicit and always comes first; it is not listed in
//! [`MessageSchema::fields`]. Type ids without an entry resolve to
//! [`GENERIC`], which keeps the whole body as an opaque remainder.

use crate::wire::constants::{
    self, CHANNEL_ANNOUNCEMENT, GOSSIP_TIMESTAMP_FILTER, INIT, PING, PONG, QUERY_SHORT_CHANNEL_IDS,
    REPLY_SHORT_CHANNEL_IDS_END,
};
use crate::wire::element::Element;

/// One named field of a message layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub element: Element,
}

const fn field(name: &'static str, element: Element) -> FieldSpec {
    FieldSpec { name, element }
}

/// Wire layout of one message type.
#[derive(Debug, PartialEq, Eq)]
pub struct MessageSchema {
    /// `None` for the generic fallback, which serves any type id.
    pub type_id: Option<u16>,
    pub type_name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl MessageSchema {
    /// Returns true if the last field swallows all remaining bytes.
    pub fn has_remainder(&self) -> bool {
        matches!(self.fields.last(), Some(f) if f.element == Element::Remainder)
    }

    /// Position of a field by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn is_generic(&self) -> bool {
        self.type_id.is_none()
    }
}

/// Fallback layout for unregistered type ids: the body is kept verbatim.
pub static GENERIC: MessageSchema = MessageSchema {
    type_id: None,
    type_name: constants::UNKNOWN_NAME,
    fields: &[field("payload", Element::Remainder)],
};

// https://github.com/lightning/bolts/blob/master/01-messaging.md#the-init-message
static INIT_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(INIT),
    type_name: "init",
    fields: &[
        field("global_features", Element::VarBytes),
        field("local_features", Element::VarBytes),
        field("tlv_stream", Element::Remainder),
    ],
};

// https://github.com/lightning/bolts/blob/master/01-messaging.md#the-ping-and-pong-messages
static PING_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(PING),
    type_name: "ping",
    fields: &[
        field("num_pong_bytes", Element::U16),
        field("ignored", Element::VarBytes),
    ],
};

static PONG_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(PONG),
    type_name: "pong",
    fields: &[field("ignored", Element::VarBytes)],
};

// https://github.com/lightning/bolts/blob/master/07-routing-gossip.md#the-channel_announcement-message
static CHANNEL_ANNOUNCEMENT_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(CHANNEL_ANNOUNCEMENT),
    type_name: "channel_announcement",
    fields: &[
        field("node_signature_1", Element::Fixed(64)),
        field("node_signature_2", Element::Fixed(64)),
        field("bitcoin_signature_1", Element::Fixed(64)),
        field("bitcoin_signature_2", Element::Fixed(64)),
        field("features", Element::VarBytes),
        field("chain_hash", Element::Fixed(32)),
        field("short_channel_id", Element::Fixed(8)),
        field("node_id_1", Element::Fixed(33)),
        field("node_id_2", Element::Fixed(33)),
        field("bitcoin_key_1", Element::Fixed(33)),
        field("bitcoin_key_2", Element::Fixed(33)),
    ],
};

// https://github.com/lightning/bolts/blob/master/07-routing-gossip.md#query-messages
static QUERY_SHORT_CHANNEL_IDS_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(QUERY_SHORT_CHANNEL_IDS),
    type_name: "query_short_channel_ids",
    fields: &[
        field("chain_hash", Element::Fixed(32)),
        field("encoded_short_ids", Element::VarBytes),
    ],
};

static REPLY_SHORT_CHANNEL_IDS_END_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(REPLY_SHORT_CHANNEL_IDS_END),
    type_name: "reply_short_channel_ids_end",
    fields: &[
        field("chain_hash", Element::Fixed(32)),
        field("full_information", Element::Fixed(1)),
    ],
};

// https://github.com/lightning/bolts/blob/master/07-routing-gossip.md#initial-sync
static GOSSIP_TIMESTAMP_FILTER_SCHEMA: MessageSchema = MessageSchema {
    type_id: Some(GOSSIP_TIMESTAMP_FILTER),
    type_name: "gossip_timestamp_filter",
    fields: &[
        field("chain_hash", Element::Fixed(32)),
        field("first_timestamp", Element::U32),
        field("timestamp_range", Element::U32),
    ],
};

/// Every registered layout.
pub static REGISTRY: &[&MessageSchema] = &[
    &INIT_SCHEMA,
    &PING_SCHEMA,
    &PONG_SCHEMA,
    &CHANNEL_ANNOUNCEMENT_SCHEMA,
    &QUERY_SHORT_CHANNEL_IDS_SCHEMA,
    &REPLY_SHORT_CHANNEL_IDS_END_SCHEMA,
    &GOSSIP_TIMESTAMP_FILTER_SCHEMA,
];

/// Resolves a type id to its layout, falling back to [`GENERIC`].
pub fn lookup(type_id: u16) -> &'static MessageSchema {
    match type_id {
        INIT => &INIT_SCHEMA,
        PING => &PING_SCHEMA,
        PONG => &PONG_SCHEMA,
        CHANNEL_ANNOUNCEMENT => &CHANNEL_ANNOUNCEMENT_SCHEMA,
        QUERY_SHORT_CHANNEL_IDS => &QUERY_SHORT_CHANNEL_IDS_SCHEMA,
        REPLY_SHORT_CHANNEL_IDS_END => &REPLY_SHORT_CHANNEL_IDS_END_SCHEMA,
        GOSSIP_TIMESTAMP_FILTER => &GOSSIP_TIMESTAMP_FILTER_SCHEMA,
        _ => &GENERIC,
    }
}
