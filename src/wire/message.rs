use std::fmt::{self, Debug, Display, Formatter};

use crate::error::{WireError, WireResult};
use crate::wire::codec;
use crate::wire::constants::{
    self, CHANNEL_ANNOUNCEMENT, ENCODING_UNCOMPRESSED, GOSSIP_TIMESTAMP_FILTER, INIT, PING, PONG,
    QUERY_SHORT_CHANNEL_IDS, REPLY_SHORT_CHANNEL_IDS_END,
};
use crate::wire::element::{Element, Value};
use crate::wire::schema::{self, MessageSchema};
use crate::wire::tlv::TlvStream;

/// A Lightning peer message.
///
/// A message is an instance of a [`MessageSchema`]: its type id, one value
/// per schema field (in schema order) and any trailing bytes the schema did
/// not describe. Trailing bytes are kept so that re-encoding a decoded
/// message reproduces the input exactly, which matters for extensions such
/// as TLV streams appended by newer peers.
///
/// Messages are immutable. Build them by decoding bytes
/// (`Message::try_from(&bytes[..])`), with [`Message::new`], or with one of
/// the builders in [`payload`](crate::wire::payload). Use [`Message::view`]
/// for typed access to the fields of the registered message types.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    type_id: u16,
    schema: &'static MessageSchema,
    values: Vec<Value>,
    trailing: Vec<u8>,
}

impl Message {
    /// Builds a message of type `type_id` from field values given in
    /// schema order.
    ///
    /// Fails if the number of values or the shape of any value does not
    /// match the schema registered for `type_id`. Ids without a schema take
    /// a single [`Value::Bytes`] holding the opaque body.
    pub fn new(type_id: u16, values: Vec<Value>) -> WireResult<Self> {
        let schema = schema::lookup(type_id);

        if values.len() != schema.fields.len() {
            return Err(WireError::SchemaMismatch {
                type_name: schema.type_name,
                expected: format!("{} fields", schema.fields.len()),
                got: format!("{} fields", values.len()),
            });
        }

        for (spec, value) in schema.fields.iter().zip(&values) {
            if !spec.element.accepts(value) {
                if let (Element::VarBytes, Value::Bytes(b)) = (spec.element, value) {
                    return Err(WireError::PayloadTooLarge {
                        field: spec.name,
                        len: b.len(),
                    });
                }
                return Err(WireError::SchemaMismatch {
                    type_name: schema.type_name,
                    expected: format!("{} as {}", spec.name, spec.element),
                    got: format!("{value:?}"),
                });
            }
        }

        Ok(Self::from_parts(type_id, schema, values, Vec::new()))
    }

    /// Assembles a message without validation. Callers guarantee that
    /// `values` fits `schema`.
    pub(crate) fn from_parts(
        type_id: u16,
        schema: &'static MessageSchema,
        values: Vec<Value>,
        trailing: Vec<u8>,
    ) -> Self {
        Self {
            type_id,
            schema,
            values,
            trailing,
        }
    }

    pub fn type_id(&self) -> u16 {
        self.type_id
    }

    /// Protocol name of the message type, `"unknown"` if the id is not
    /// part of BOLT 1, 2 or 7.
    pub fn type_name(&self) -> &'static str {
        if self.schema.is_generic() {
            constants::message_name(self.type_id)
        } else {
            self.schema.type_name
        }
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from(self.type_id)
    }

    pub fn schema(&self) -> &'static MessageSchema {
        self.schema
    }

    /// Field values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Field names paired with their values, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.schema.fields.iter().map(|f| f.name).zip(self.values.iter())
    }

    /// Looks up a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Bytes that followed the last schema field when the schema has no
    /// remainder field of its own.
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }

    /// Length of the message on the wire, type id included.
    pub fn encoded_len(&self) -> usize {
        2 + self
            .schema
            .fields
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| spec.element.encoded_len(value))
            .sum::<usize>()
            + self.trailing.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Typed access to the fields of registered message types.
    ///
    /// # Example
    ///
    /// ```
    /// use ln_network::wire::{Message, MessageView};
    ///
    /// let msg = Message::try_from(&[0x00, 0x12, 0x00, 0x0a, 0x00, 0x01, 0xaa][..]).unwrap();
    /// let MessageView::Ping(ping) = msg.view() else {
    ///     panic!("expected ping");
    /// };
    /// assert_eq!(ping.num_pong_bytes, 10);
    /// assert_eq!(ping.ignored, &[0xaa]);
    /// ```
    pub fn view(&self) -> MessageView<'_> {
        let view = match self.message_type() {
            MessageType::Init => self.init_view().map(MessageView::Init),
            MessageType::Ping => self.ping_view().map(MessageView::Ping),
            MessageType::Pong => self.pong_view().map(MessageView::Pong),
            MessageType::ChannelAnnouncement => self
                .channel_announcement_view()
                .map(MessageView::ChannelAnnouncement),
            MessageType::QueryShortChannelIds => self
                .query_short_channel_ids_view()
                .map(MessageView::QueryShortChannelIds),
            MessageType::ReplyShortChannelIdsEnd => self
                .reply_short_channel_ids_end_view()
                .map(MessageView::ReplyShortChannelIdsEnd),
            MessageType::GossipTimestampFilter => self
                .gossip_timestamp_filter_view()
                .map(MessageView::GossipTimestampFilter),
            MessageType::Other(_) => None,
        };

        view.unwrap_or(MessageView::Other)
    }

    fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.get(name)?.as_bytes()
    }

    fn array<const N: usize>(&self, name: &str) -> Option<&[u8; N]> {
        self.bytes(name)?.try_into().ok()
    }

    fn u16(&self, name: &str) -> Option<u16> {
        self.get(name)?.as_u16()
    }

    fn u32(&self, name: &str) -> Option<u32> {
        self.get(name)?.as_u32()
    }

    fn init_view(&self) -> Option<Init<'_>> {
        Some(Init {
            global_features: self.bytes("global_features")?,
            local_features: self.bytes("local_features")?,
            tlv_stream: self.bytes("tlv_stream")?,
        })
    }

    fn ping_view(&self) -> Option<Ping<'_>> {
        Some(Ping {
            num_pong_bytes: self.u16("num_pong_bytes")?,
            ignored: self.bytes("ignored")?,
        })
    }

    fn pong_view(&self) -> Option<Pong<'_>> {
        Some(Pong {
            ignored: self.bytes("ignored")?,
        })
    }

    fn channel_announcement_view(&self) -> Option<ChannelAnnouncement<'_>> {
        let scid: &[u8; 8] = self.array("short_channel_id")?;
        Some(ChannelAnnouncement {
            node_signatures: [
                self.array("node_signature_1")?,
                self.array("node_signature_2")?,
            ],
            bitcoin_signatures: [
                self.array("bitcoin_signature_1")?,
                self.array("bitcoin_signature_2")?,
            ],
            features: self.bytes("features")?,
            chain_hash: self.array("chain_hash")?,
            short_channel_id: ShortChannelId::from(*scid),
            node_ids: [self.array("node_id_1")?, self.array("node_id_2")?],
            bitcoin_keys: [self.array("bitcoin_key_1")?, self.array("bitcoin_key_2")?],
        })
    }

    fn query_short_channel_ids_view(&self) -> Option<QueryShortChannelIds<'_>> {
        Some(QueryShortChannelIds {
            chain_hash: self.array("chain_hash")?,
            encoded_short_ids: self.bytes("encoded_short_ids")?,
        })
    }

    fn reply_short_channel_ids_end_view(&self) -> Option<ReplyShortChannelIdsEnd<'_>> {
        let [full]: &[u8; 1] = self.array("full_information")?;
        Some(ReplyShortChannelIdsEnd {
            chain_hash: self.array("chain_hash")?,
            full_information: *full != 0,
        })
    }

    fn gossip_timestamp_filter_view(&self) -> Option<GossipTimestampFilter<'_>> {
        Some(GossipTimestampFilter {
            chain_hash: self.array("chain_hash")?,
            first_timestamp: self.u32("first_timestamp")?,
            timestamp_range: self.u32("timestamp_range")?,
        })
    }
}

impl TryFrom<&[u8]> for Message {
    type Error = WireError;

    fn try_from(bytes: &[u8]) -> WireResult<Self> {
        codec::dispatch(bytes)
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Message");
        s.field("type", &format_args!("{}({})", self.type_name(), self.type_id));
        for (name, value) in self.fields() {
            match value {
                Value::Bytes(b) => s.field(name, &format_args!("0x{}", hex::encode(b))),
                Value::U16(v) => s.field(name, v),
                Value::U32(v) => s.field(name, v),
            };
        }
        if !self.trailing.is_empty() {
            s.field("trailing", &format_args!("0x{}", hex::encode(&self.trailing)));
        }
        s.finish()
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) len={}",
            self.type_name(),
            self.type_id,
            self.encoded_len()
        )
    }
}

/// Message types with a registered schema.
///
/// Every other id maps to [`MessageType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Init,
    Ping,
    Pong,
    ChannelAnnouncement,
    QueryShortChannelIds,
    ReplyShortChannelIdsEnd,
    GossipTimestampFilter,
    Other(u16),
}

impl From<u16> for MessageType {
    fn from(id: u16) -> Self {
        match id {
            INIT => MessageType::Init,
            PING => MessageType::Ping,
            PONG => MessageType::Pong,
            CHANNEL_ANNOUNCEMENT => MessageType::ChannelAnnouncement,
            QUERY_SHORT_CHANNEL_IDS => MessageType::QueryShortChannelIds,
            REPLY_SHORT_CHANNEL_IDS_END => MessageType::ReplyShortChannelIdsEnd,
            GOSSIP_TIMESTAMP_FILTER => MessageType::GossipTimestampFilter,
            other => MessageType::Other(other),
        }
    }
}

impl MessageType {
    pub fn as_u16(self) -> u16 {
        match self {
            MessageType::Init => INIT,
            MessageType::Ping => PING,
            MessageType::Pong => PONG,
            MessageType::ChannelAnnouncement => CHANNEL_ANNOUNCEMENT,
            MessageType::QueryShortChannelIds => QUERY_SHORT_CHANNEL_IDS,
            MessageType::ReplyShortChannelIdsEnd => REPLY_SHORT_CHANNEL_IDS_END,
            MessageType::GossipTimestampFilter => GOSSIP_TIMESTAMP_FILTER,
            MessageType::Other(id) => id,
        }
    }

    pub fn name(self) -> &'static str {
        constants::message_name(self.as_u16())
    }
}

/// Borrowed, typed view of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageView<'a> {
    Init(Init<'a>),
    Ping(Ping<'a>),
    Pong(Pong<'a>),
    ChannelAnnouncement(ChannelAnnouncement<'a>),
    QueryShortChannelIds(QueryShortChannelIds<'a>),
    ReplyShortChannelIdsEnd(ReplyShortChannelIdsEnd<'a>),
    GossipTimestampFilter(GossipTimestampFilter<'a>),
    /// No schema for this type id; the body is in [`Message::values`].
    Other,
}

/// `init` (16): feature negotiation, sent first on every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Init<'a> {
    pub global_features: &'a [u8],
    pub local_features: &'a [u8],
    /// Raw TLV extension stream following the feature fields.
    pub tlv_stream: &'a [u8],
}

impl<'a> Init<'a> {
    /// Parses the extension stream into TLV records.
    pub fn tlvs(&self) -> WireResult<TlvStream<'a>> {
        TlvStream::parse(self.tlv_stream)
    }
}

/// `ping` (18).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping<'a> {
    /// Length of the `ignored` payload the sender wants in the `pong`.
    pub num_pong_bytes: u16,
    pub ignored: &'a [u8],
}

/// `pong` (19).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pong<'a> {
    pub ignored: &'a [u8],
}

/// `channel_announcement` (256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAnnouncement<'a> {
    pub node_signatures: [&'a [u8; 64]; 2],
    pub bitcoin_signatures: [&'a [u8; 64]; 2],
    pub features: &'a [u8],
    pub chain_hash: &'a [u8; 32],
    pub short_channel_id: ShortChannelId,
    pub node_ids: [&'a [u8; 33]; 2],
    pub bitcoin_keys: [&'a [u8; 33]; 2],
}

/// `query_short_channel_ids` (261).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShortChannelIds<'a> {
    pub chain_hash: &'a [u8; 32],
    /// One encoding byte followed by the encoded ids.
    pub encoded_short_ids: &'a [u8],
}

impl QueryShortChannelIds<'_> {
    /// Decodes the id list when it uses the uncompressed encoding.
    ///
    /// Returns `None` for other encodings (zlib is deprecated in BOLT 7 and
    /// not supported here) or when the payload is not a whole number of ids.
    pub fn short_ids(&self) -> Option<Vec<ShortChannelId>> {
        let (&encoding, ids) = self.encoded_short_ids.split_first()?;
        if encoding != ENCODING_UNCOMPRESSED || ids.len() % 8 != 0 {
            return None;
        }

        ids.chunks_exact(8)
            .map(|chunk| <[u8; 8]>::try_from(chunk).ok().map(ShortChannelId::from))
            .collect()
    }
}

/// `reply_short_channel_ids_end` (262).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyShortChannelIdsEnd<'a> {
    pub chain_hash: &'a [u8; 32],
    pub full_information: bool,
}

/// `gossip_timestamp_filter` (265).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GossipTimestampFilter<'a> {
    pub chain_hash: &'a [u8; 32],
    pub first_timestamp: u32,
    pub timestamp_range: u32,
}

/// Location of a funding output: block height, transaction index and
/// output index packed into 8 bytes (3 + 3 + 2).
///
/// Displayed in the conventional `<block>x<tx>x<output>` form.
///
/// https://github.com/lightning/bolts/blob/master/07-routing-gossip.md#definition-of-short_channel_id
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortChannelId(u64);

impl ShortChannelId {
    pub const fn new(block_height: u32, tx_index: u32, output_index: u16) -> Self {
        Self(
            ((block_height as u64 & 0xff_ffff) << 40)
                | ((tx_index as u64 & 0xff_ffff) << 16)
                | output_index as u64,
        )
    }

    pub const fn block_height(self) -> u32 {
        (self.0 >> 40) as u32
    }

    pub const fn tx_index(self) -> u32 {
        ((self.0 >> 16) & 0xff_ffff) as u32
    }

    pub const fn output_index(self) -> u16 {
        self.0 as u16
    }

    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<[u8; 8]> for ShortChannelId {
    fn from(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl Display for ShortChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}",
            self.block_height(),
            self.tx_index(),
            self.output_index()
        )
    }
}

impl Debug for ShortChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ShortChannelId({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::constants::CHAIN_HASH_REGTEST;

    fn decode_hex(s: &str) -> Message {
        Message::try_from(&hex::decode(s).unwrap()[..]).unwrap()
    }

    #[test]
    fn gossip_timestamp_filter_view() {
        let msg = decode_hex(
            "010906226e46111a0b59caaf126043eb5bbf28c34f3a5e332a1fc7b2b73cf188910f67c6d3e3ffffffff",
        );
        assert_eq!(msg.type_name(), "gossip_timestamp_filter");

        let MessageView::GossipTimestampFilter(filter) = msg.view() else {
            panic!("expected MessageView::GossipTimestampFilter");
        };
        assert_eq!(filter.chain_hash, &CHAIN_HASH_REGTEST);
        assert_eq!(filter.first_timestamp, 1741083619);
        assert_eq!(filter.timestamp_range, 0xFFFF_FFFF);
    }

    #[test]
    fn init_view_exposes_features_and_tlvs() {
        let msg = decode_hex(
            "001000021100000708a0880a8a59a1012006226e46111a0b59caaf126043eb5bbf28c34f3a5e332a1fc7b2b73cf188910f",
        );
        assert_eq!(msg.encoded_len(), 49);

        let MessageView::Init(init) = msg.view() else {
            panic!("expected MessageView::Init");
        };
        assert_eq!(init.global_features, &[0x11, 0x00]);
        assert_eq!(init.local_features.len(), 7);

        let tlvs = init.tlvs().unwrap();
        let networks = tlvs.get(1).unwrap();
        assert_eq!(networks.value, &CHAIN_HASH_REGTEST[..]);
    }

    #[test]
    fn unregistered_known_id_keeps_protocol_name() {
        // error (17) has no schema but is a BOLT 1 message.
        let msg = decode_hex("00110000000000000000000000000000000000000000000000000000000000000000000474657374");
        assert_eq!(msg.type_name(), "error");
        assert_eq!(msg.message_type(), MessageType::Other(17));
        assert_eq!(msg.view(), MessageView::Other);
    }

    #[test]
    fn get_by_field_name() {
        let msg = decode_hex("0012000a0001aa");
        assert_eq!(msg.get("num_pong_bytes"), Some(&Value::U16(10)));
        assert_eq!(msg.get("ignored"), Some(&Value::Bytes(vec![0xaa])));
        assert_eq!(msg.get("nonexistent"), None);
    }

    #[test]
    fn new_rejects_wrong_arity() {
        let err = Message::new(PING, vec![Value::U16(1)]).unwrap_err();
        assert!(matches!(err, WireError::SchemaMismatch { type_name: "ping", .. }));
    }

    #[test]
    fn new_rejects_wrong_fixed_width() {
        let err = Message::new(
            GOSSIP_TIMESTAMP_FILTER,
            vec![Value::Bytes(vec![0; 31]), Value::U32(0), Value::U32(0)],
        )
        .unwrap_err();
        assert!(matches!(err, WireError::SchemaMismatch { .. }));
    }

    #[test]
    fn new_rejects_oversized_var_bytes() {
        let err = Message::new(PONG, vec![Value::Bytes(vec![0; 70_000])]).unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadTooLarge {
                field: "ignored",
                len: 70_000
            }
        ));
    }

    #[test]
    fn short_channel_id_layout() {
        let scid = ShortChannelId::new(539268, 845, 1);
        assert_eq!(scid.to_string(), "539268x845x1");
        assert_eq!(ShortChannelId::from(scid.to_be_bytes()), scid);
    }

    #[test]
    fn message_type_round_trips_ids() {
        for id in [16u16, 18, 19, 256, 261, 262, 265, 17, 0x00ff] {
            assert_eq!(MessageType::from(id).as_u16(), id);
        }
        assert_eq!(MessageType::GossipTimestampFilter.name(), "gossip_timestamp_filter");
    }

    #[test]
    fn display_is_compact() {
        let msg = decode_hex("0012000a0001aa");
        assert_eq!(msg.to_string(), "ping(18) len=7");
    }
}
