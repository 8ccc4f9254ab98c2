use crate::error::WireResult;
use crate::wire::constants::{
    DEFAULT_LOCAL_FEATURES, ENCODING_UNCOMPRESSED, GOSSIP_TIMESTAMP_FILTER, INIT, PING, PONG,
    QUERY_SHORT_CHANNEL_IDS, REPLY_SHORT_CHANNEL_IDS_END,
};
use crate::wire::element::Value;
use crate::wire::message::{Message, Ping, ShortChannelId};
use crate::wire::schema;

/// Builds an `init` message.
///
/// The layout is:
///
/// ```text
/// u16    gflen
/// [gflen] global_features
/// u16    flen
/// [flen] features
/// ...    init_tlvs
/// ```
///
/// `tlv_stream` must already be a serialized TLV stream; it is appended as-is.
///
/// Reference:
/// https://github.com/lightning/bolts/blob/master/01-messaging.md#the-init-message
///
/// # Errors
///
/// Fails if either feature vector is longer than 65535 bytes.
pub fn build_init(
    global_features: &[u8],
    local_features: &[u8],
    tlv_stream: &[u8],
) -> WireResult<Message> {
    Message::new(
        INIT,
        vec![
            Value::Bytes(global_features.to_vec()),
            Value::Bytes(local_features.to_vec()),
            Value::Bytes(tlv_stream.to_vec()),
        ],
    )
}

/// The fixed `init` sent when a session starts: no global features and a
/// single local feature byte `0b1010_1010`.
///
/// ```
/// use ln_network::wire::payload;
///
/// assert_eq!(payload::default_init().encode(), [0x00, 0x10, 0x00, 0x00, 0x00, 0x01, 0xaa]);
/// ```
pub fn default_init() -> Message {
    Message::from_parts(
        INIT,
        schema::lookup(INIT),
        vec![
            Value::Bytes(vec![]),
            Value::Bytes(vec![DEFAULT_LOCAL_FEATURES]),
            Value::Bytes(vec![]),
        ],
        Vec::new(),
    )
}

/// Builds a `ping` asking for a `pong` of `num_pong_bytes` bytes and
/// carrying `padding` as its own ignored payload.
///
/// ```
/// use ln_network::wire::payload;
///
/// let ping = payload::build_ping(10, &[0xaa]).unwrap();
/// assert_eq!(ping.encode(), b"\x00\x12\x00\n\x00\x01\xaa");
/// ```
///
/// # Errors
///
/// Fails if `padding` is longer than 65535 bytes.
pub fn build_ping(num_pong_bytes: u16, padding: &[u8]) -> WireResult<Message> {
    Message::new(
        PING,
        vec![Value::U16(num_pong_bytes), Value::Bytes(padding.to_vec())],
    )
}

/// Builds a `pong` whose ignored payload is `len` zero bytes.
pub fn build_pong(len: u16) -> Message {
    Message::from_parts(
        PONG,
        schema::lookup(PONG),
        vec![Value::Bytes(vec![0u8; len as usize])],
        Vec::new(),
    )
}

/// Builds the `pong` answering `ping`.
///
/// The payload length always equals the ping's `num_pong_bytes`. The
/// content is zero filler: none of the ping's own bytes are echoed back.
pub fn build_pong_for(ping: &Ping<'_>) -> Message {
    build_pong(ping.num_pong_bytes)
}

/// Builds a `query_short_channel_ids` for `ids` using the uncompressed
/// encoding (`0x00` followed by 8 bytes per id).
///
/// An empty `ids` still produces a valid query carrying only the encoding
/// byte.
///
/// # Errors
///
/// Fails if the encoded ids do not fit the 2-byte length prefix (more than
/// 8191 ids).
pub fn build_query_short_channel_ids(
    chain_hash: &[u8; 32],
    ids: &[ShortChannelId],
) -> WireResult<Message> {
    let mut encoded = Vec::with_capacity(1 + 8 * ids.len());
    encoded.push(ENCODING_UNCOMPRESSED);
    for id in ids {
        encoded.extend_from_slice(&id.to_be_bytes());
    }

    Message::new(
        QUERY_SHORT_CHANNEL_IDS,
        vec![Value::Bytes(chain_hash.to_vec()), Value::Bytes(encoded)],
    )
}

pub fn build_reply_short_channel_ids_end(chain_hash: &[u8; 32], full_information: bool) -> Message {
    Message::from_parts(
        REPLY_SHORT_CHANNEL_IDS_END,
        schema::lookup(REPLY_SHORT_CHANNEL_IDS_END),
        vec![
            Value::Bytes(chain_hash.to_vec()),
            Value::Bytes(vec![full_information as u8]),
        ],
        Vec::new(),
    )
}

/// Builds a `gossip_timestamp_filter` asking the peer to relay gossip with
/// timestamps in `first_timestamp..first_timestamp + timestamp_range`.
pub fn build_gossip_timestamp_filter(
    chain_hash: &[u8; 32],
    first_timestamp: u32,
    timestamp_range: u32,
) -> Message {
    Message::from_parts(
        GOSSIP_TIMESTAMP_FILTER,
        schema::lookup(GOSSIP_TIMESTAMP_FILTER),
        vec![
            Value::Bytes(chain_hash.to_vec()),
            Value::U32(first_timestamp),
            Value::U32(timestamp_range),
        ],
        Vec::new(),
    )
}
