use byteorder::{BigEndian, ByteOrder};

use crate::error::{WireError, WireResult};
use crate::wire::message::Message;
use crate::wire::schema::{self, MessageSchema};

/// Reads the 2-byte big-endian type id at the front of a message.
pub fn peek_type_id(bytes: &[u8]) -> WireResult<u16> {
    if bytes.len() < 2 {
        return Err(WireError::Truncated {
            field: "type",
            needed: 2,
            available: bytes.len(),
        });
    }
    Ok(BigEndian::read_u16(&bytes[..2]))
}

/// Decodes a complete message, choosing its layout from the type id.
///
/// This is the single decode entry point used by sessions. Type ids with no
/// registered schema never fail: their body is kept as an opaque remainder.
/// Decoding only fails when the type id itself is cut short or a declared
/// field runs past the end of the buffer.
///
/// # Example
///
/// ```
/// use ln_network::wire::codec;
///
/// // init with empty global features and local features 0xaa
/// let bytes = [0x00, 0x10, 0x00, 0x00, 0x00, 0x01, 0xaa];
///
/// let msg = codec::dispatch(&bytes).unwrap();
/// assert_eq!(msg.type_name(), "init");
/// assert_eq!(codec::encode(&msg), bytes);
/// ```
pub fn dispatch(bytes: &[u8]) -> WireResult<Message> {
    let type_id = peek_type_id(bytes)?;
    decode_as(schema::lookup(type_id), bytes)
}

/// Decodes `bytes` against an explicit layout.
///
/// Fields are read in schema order from the shrinking tail of the buffer.
/// Whatever is left once every declared field has been read is kept as the
/// message's trailing bytes, so nothing is ever dropped.
///
/// # Errors
///
/// A registered schema only decodes its own type id; any other id fails
/// with [`WireError::SchemaMismatch`]. [`GENERIC`](schema::GENERIC) accepts
/// every id.
pub fn decode_as(schema: &'static MessageSchema, bytes: &[u8]) -> WireResult<Message> {
    let type_id = peek_type_id(bytes)?;
    if let Some(expected) = schema.type_id {
        if expected != type_id {
            return Err(WireError::SchemaMismatch {
                type_name: schema.type_name,
                expected: format!("type id {expected}"),
                got: format!("type id {type_id}"),
            });
        }
    }

    let mut rest = &bytes[2..];

    let mut values = Vec::with_capacity(schema.fields.len());
    for spec in schema.fields {
        let (value, tail) = spec.element.decode(spec.name, rest)?;
        values.push(value);
        rest = tail;
    }

    Ok(Message::from_parts(type_id, schema, values, rest.to_vec()))
}

/// Serializes a message: type id, every field in schema order, then the
/// trailing bytes verbatim.
///
/// Length prefixes are always computed from the payload being written.
pub fn encode(message: &Message) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.encoded_len());

    let mut type_id = [0u8; 2];
    BigEndian::write_u16(&mut type_id, message.type_id());
    out.extend_from_slice(&type_id);

    for (spec, value) in message.schema().fields.iter().zip(message.values()) {
        spec.element.encode(value, &mut out);
    }

    out.extend_from_slice(message.trailing());
    out
}
