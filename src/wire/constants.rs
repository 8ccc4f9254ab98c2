/// Message type ids that have a registered field schema.
///
/// The type id is the first two bytes of every Lightning peer message,
/// encoded as a big-endian `u16`. Ids below 32768 are "odd to be ok": a
/// receiver may ignore unknown odd types but must fail the connection on
/// unknown even ones. That policy belongs to the layer above this crate;
/// the codec itself decodes every id.
///
/// Reference:
/// https://github.com/lightning/bolts/blob/master/01-messaging.md#lightning-message-format
pub const INIT: u16 = 16;
pub const PING: u16 = 18;
pub const PONG: u16 = 19;
pub const CHANNEL_ANNOUNCEMENT: u16 = 256;
pub const QUERY_SHORT_CHANNEL_IDS: u16 = 261;
pub const REPLY_SHORT_CHANNEL_IDS_END: u16 = 262;
pub const GOSSIP_TIMESTAMP_FILTER: u16 = 265;

/// Name reported for type ids absent from [`MESSAGE_NAMES`].
pub const UNKNOWN_NAME: &str = "unknown";

/// Every message type defined by BOLT 1, 2 and 7, by id.
///
/// Only a handful of these have a field schema (see
/// [`schema`](crate::wire::schema)); the rest decode through the generic
/// schema but still carry their protocol name.
///
/// Reference:
/// https://github.com/lightning/bolts/blob/master/02-peer-protocol.md
/// https://github.com/lightning/bolts/blob/master/07-routing-gossip.md
pub const MESSAGE_NAMES: &[(u16, &str)] = &[
    (1, "warning"),
    (2, "stfu"),
    // Connection & keepalive
    (16, "init"),
    (17, "error"),
    (18, "ping"),
    (19, "pong"),
    // Channel establishment
    (32, "open_channel"),
    (33, "accept_channel"),
    (34, "funding_created"),
    (35, "funding_signed"),
    (36, "channel_ready"),
    (38, "shutdown"),
    (39, "closing_signed"),
    (40, "closing_complete"),
    (41, "closing_sig"),
    (64, "open_channel2"),
    (65, "accept_channel2"),
    // Interactive transaction construction
    (66, "tx_add_input"),
    (67, "tx_add_output"),
    (68, "tx_remove_input"),
    (69, "tx_remove_output"),
    (70, "tx_complete"),
    (71, "tx_signatures"),
    (72, "tx_init_rbf"),
    (73, "tx_ack_rbf"),
    (74, "tx_abort"),
    // Channel updates & HTLCs
    (128, "update_add_htlc"),
    (130, "update_fulfill_htlc"),
    (131, "update_fail_htlc"),
    (132, "commitment_signed"),
    (133, "revoke_and_ack"),
    (134, "update_fee"),
    (135, "update_fail_malformed_htlc"),
    (136, "channel_reestablish"),
    // Gossip
    (256, "channel_announcement"),
    (257, "node_announcement"),
    (258, "channel_update"),
    (259, "announcement_signatures"),
    (261, "query_short_channel_ids"),
    (262, "reply_short_channel_ids_end"),
    (263, "query_channel_range"),
    (264, "reply_channel_range"),
    (265, "gossip_timestamp_filter"),
];

/// Returns the protocol name for a type id, or [`UNKNOWN_NAME`].
pub fn message_name(type_id: u16) -> &'static str {
    MESSAGE_NAMES
        .iter()
        .find(|(id, _)| *id == type_id)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_NAME)
}

/// TLV record types carried in the `init` message's extension stream.
///
/// - `1` networks: the chain hashes the node is interested in
/// - `3` remote_addr: the address the sender sees us connecting from
///
/// https://github.com/lightning/bolts/blob/master/01-messaging.md#the-init-message
pub const INIT_TLV_NAMES: &[(u64, &str)] = &[(1, "networks"), (3, "remote_addr")];

/// Local feature bits sent in our `init`: `0b1010_1010`.
///
/// Together with the empty global features this yields the fixed 7-byte
/// init message `00 10 00 00 00 01 aa` sent at session start.
pub const DEFAULT_LOCAL_FEATURES: u8 = 0b1010_1010;

/// A `ping` whose `num_pong_bytes` is at or above this value must not be
/// answered (BOLT 1).
pub const PONG_SUPPRESS_THRESHOLD: u16 = 65532;

/// `encoded_short_ids` encoding byte for an uncompressed array of
/// 8-byte short channel ids (BOLT 7).
pub const ENCODING_UNCOMPRESSED: u8 = 0x00;

/// Genesis block hash of Bitcoin mainnet, as used in the `chain_hash` field.
///
/// Lightning uses the block hash in internal (little-endian) byte order, so
/// this is the reverse of the block explorer form
/// `000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f`.
pub const CHAIN_HASH_MAINNET: [u8; 32] = [
    0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7, 0x4f,
    0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Genesis block hash of Bitcoin regtest (internal byte order).
pub const CHAIN_HASH_REGTEST: [u8; 32] = [
    0x06, 0x22, 0x6e, 0x46, 0x11, 0x1a, 0x0b, 0x59, 0xca, 0xaf, 0x12, 0x60, 0x43, 0xeb, 0x5b, 0xbf,
    0x28, 0xc3, 0x4f, 0x3a, 0x5e, 0x33, 0x2a, 0x1f, 0xc7, 0xb2, 0xb7, 0x3c, 0xf1, 0x88, 0x91, 0x0f,
];
