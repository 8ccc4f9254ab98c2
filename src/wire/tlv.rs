//! Read-only view of BOLT 1 TLV streams.
//!
//! Messages keep their TLV extensions as raw bytes so that re-encoding is
//! exact. This module parses those bytes on demand:
//!
//! ```text
//! bigsize type
//! bigsize length
//! [length] value
//! ```
//!
//! repeated until the end of the buffer, with strictly increasing types.
//!
//! https://github.com/lightning/bolts/blob/master/01-messaging.md#type-length-value-format

use crate::error::{WireError, WireResult};
use crate::wire::constants::INIT_TLV_NAMES;

/// A single TLV record borrowed from the underlying buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord<'a> {
    pub tlv_type: u64,
    pub value: &'a [u8],
}

impl TlvRecord<'_> {
    /// Name of the record when it is one of the `init` TLVs.
    pub fn init_name(&self) -> Option<&'static str> {
        INIT_TLV_NAMES
            .iter()
            .find(|(t, _)| *t == self.tlv_type)
            .map(|(_, name)| *name)
    }
}

/// Parsed TLV stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvStream<'a> {
    records: Vec<TlvRecord<'a>>,
}

impl<'a> TlvStream<'a> {
    /// Parses every record in `bytes`.
    ///
    /// # Example
    ///
    /// ```
    /// use ln_network::wire::tlv::TlvStream;
    ///
    /// let stream = TlvStream::parse(&[0x01, 0x02, 0xca, 0xfe]).unwrap();
    /// assert_eq!(stream.get(1).unwrap().value, &[0xca, 0xfe]);
    /// ```
    ///
    /// # Errors
    ///
    /// Truncated records, non-minimal BigSize encodings and types that are
    /// not strictly increasing are rejected.
    pub fn parse(bytes: &'a [u8]) -> WireResult<Self> {
        let mut records = Vec::new();
        let mut rest = bytes;
        let mut last_type: Option<u64> = None;

        while !rest.is_empty() {
            let (tlv_type, tail) = read_bigsize(rest, "tlv type")?;
            let (len, tail) = read_bigsize(tail, "tlv length")?;

            if last_type.is_some_and(|t| tlv_type <= t) {
                return Err(WireError::MalformedTlv("types not strictly increasing"));
            }

            let len = usize::try_from(len).map_err(|_| WireError::MalformedTlv("length overflow"))?;
            if tail.len() < len {
                return Err(WireError::Truncated {
                    field: "tlv value",
                    needed: len,
                    available: tail.len(),
                });
            }

            let (value, tail) = tail.split_at(len);
            records.push(TlvRecord { tlv_type, value });
            last_type = Some(tlv_type);
            rest = tail;
        }

        Ok(Self { records })
    }

    pub fn get(&self, tlv_type: u64) -> Option<&TlvRecord<'a>> {
        self.records.iter().find(|r| r.tlv_type == tlv_type)
    }

    pub fn records(&self) -> &[TlvRecord<'a>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a BigSize integer: the big-endian counterpart of Bitcoin's
/// CompactSize.
///
/// ```text
/// < 0xfd      1 byte
/// 0xfd + u16  3 bytes
/// 0xfe + u32  5 bytes
/// 0xff + u64  9 bytes
/// ```
///
/// Each form must be minimal, i.e. the value must not fit a shorter form.
pub fn read_bigsize<'a>(p: &'a [u8], field: &'static str) -> WireResult<(u64, &'a [u8])> {
    let (&first, rest) = p.split_first().ok_or(WireError::Truncated {
        field,
        needed: 1,
        available: 0,
    })?;

    let (width, min) = match first {
        0xfd => (2, 0xfd),
        0xfe => (4, 0x1_0000),
        0xff => (8, 0x1_0000_0000),
        n => return Ok((n as u64, rest)),
    };

    if rest.len() < width {
        return Err(WireError::Truncated {
            field,
            needed: width,
            available: rest.len(),
        });
    }

    let (bytes, rest) = rest.split_at(width);
    let value = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);

    if value < min {
        return Err(WireError::MalformedTlv("non-minimal bigsize"));
    }

    Ok((value, rest))
}

/// Appends `value` as a minimal BigSize.
pub fn write_bigsize(value: u64, out: &mut Vec<u8>) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend(&(value as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend(&(value as u32).to_be_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend(&value.to_be_bytes());
        }
    }
}
