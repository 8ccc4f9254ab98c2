//! Primitive field codecs.
//!
//! Every field of a Lightning message is one of a small closed set of
//! [`Element`] kinds. Decoding consumes a prefix of the input and hands back
//! the rest; encoding is infallible for values that passed
//! [`Element::accepts`].

use byteorder::{BigEndian, ByteOrder};

use crate::error::{WireError, WireResult};

/// Wire layout of a single message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    /// 2-byte big-endian unsigned integer.
    U16,
    /// 4-byte big-endian unsigned integer.
    U32,
    /// Fixed-width blob of the given byte length (flags, short channel ids,
    /// hashes, public keys, signatures).
    Fixed(usize),
    /// 2-byte big-endian length prefix followed by that many bytes.
    VarBytes,
    /// Every remaining byte of the message. Only valid as the last field.
    Remainder,
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U16(u16),
    U32(u32),
    /// Payload of a `Fixed`, `VarBytes` or `Remainder` field. For `VarBytes`
    /// this excludes the length prefix, which is always derived from the
    /// payload on encode.
    Bytes(Vec<u8>),
}

impl Value {
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl Element {
    /// Decodes one value from the front of `buf`, returning it together
    /// with the unconsumed tail.
    ///
    /// `field` only labels the error.
    ///
    /// # Example
    ///
    /// ```
    /// use ln_network::wire::element::{Element, Value};
    ///
    /// let (value, rest) = Element::VarBytes.decode("payload", &[0x00, 0x01, 0xaa, 0xbb]).unwrap();
    /// assert_eq!(value, Value::Bytes(vec![0xaa]));
    /// assert_eq!(rest, &[0xbb]);
    /// ```
    pub fn decode<'a>(self, field: &'static str, buf: &'a [u8]) -> WireResult<(Value, &'a [u8])> {
        match self {
            Element::U16 => {
                let (bytes, rest) = take(buf, 2, field)?;
                Ok((Value::U16(BigEndian::read_u16(bytes)), rest))
            }
            Element::U32 => {
                let (bytes, rest) = take(buf, 4, field)?;
                Ok((Value::U32(BigEndian::read_u32(bytes)), rest))
            }
            Element::Fixed(width) => {
                let (bytes, rest) = take(buf, width, field)?;
                Ok((Value::Bytes(bytes.to_vec()), rest))
            }
            Element::VarBytes => {
                let (len, rest) = take(buf, 2, field)?;
                let len = BigEndian::read_u16(len) as usize;
                let (bytes, rest) = take(rest, len, field)?;
                Ok((Value::Bytes(bytes.to_vec()), rest))
            }
            Element::Remainder => Ok((Value::Bytes(buf.to_vec()), &buf[buf.len()..])),
        }
    }

    /// Appends the wire form of `value` to `out`.
    ///
    /// `value` must satisfy [`Element::accepts`]; messages enforce this when
    /// they are built, so the mismatched arms below are unreachable in
    /// practice and simply write the value in its own natural form.
    pub fn encode(self, value: &Value, out: &mut Vec<u8>) {
        match (self, value) {
            (Element::VarBytes, Value::Bytes(bytes)) => {
                write_u16(out, bytes.len() as u16);
                out.extend_from_slice(bytes);
            }
            (_, Value::Bytes(bytes)) => out.extend_from_slice(bytes),
            (_, Value::U16(v)) => write_u16(out, *v),
            (_, Value::U32(v)) => {
                let mut buf = [0u8; 4];
                BigEndian::write_u32(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
        }
    }

    /// Checks that `value` can be encoded by this element without losing
    /// information.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Element::U16, Value::U16(_)) => true,
            (Element::U32, Value::U32(_)) => true,
            (Element::Fixed(width), Value::Bytes(b)) => b.len() == width,
            (Element::VarBytes, Value::Bytes(b)) => b.len() <= u16::MAX as usize,
            (Element::Remainder, Value::Bytes(_)) => true,
            _ => false,
        }
    }

    /// Number of bytes `value` occupies on the wire.
    pub fn encoded_len(self, value: &Value) -> usize {
        match (self, value) {
            (Element::VarBytes, Value::Bytes(b)) => 2 + b.len(),
            (_, Value::Bytes(b)) => b.len(),
            (_, Value::U16(_)) => 2,
            (_, Value::U32(_)) => 4,
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::U16 => write!(f, "u16"),
            Element::U32 => write!(f, "u32"),
            Element::Fixed(width) => write!(f, "bytes[{width}]"),
            Element::VarBytes => write!(f, "u16-prefixed bytes"),
            Element::Remainder => write!(f, "remainder"),
        }
    }
}

fn take<'a>(buf: &'a [u8], n: usize, field: &'static str) -> WireResult<(&'a [u8], &'a [u8])> {
    if buf.len() < n {
        return Err(WireError::Truncated {
            field,
            needed: n,
            available: buf.len(),
        });
    }
    Ok(buf.split_at(n))
}

fn write_u16(out: &mut Vec<u8>, v: u16) {
    let mut buf = [0u8; 2];
    BigEndian::write_u16(&mut buf, v);
    out.extend_from_slice(&buf);
}
