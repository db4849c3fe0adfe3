//! # Field Codec
//!
//! The canonical binary encoding that Graphene nodes hash and sign. Every
//! byte produced here ends up inside `SHA256(chain_id || tx)`, so a single
//! divergence from the node's `fc::raw` packing yields a transaction whose
//! signatures the node cannot verify. There is no "close enough" in this file.
//!
//! ## Primitives
//!
//! | Type            | Wire form                                          |
//! |-----------------|----------------------------------------------------|
//! | `u8`..`u64`     | fixed-width little-endian                          |
//! | `i8`..`i64`     | fixed-width little-endian two's complement         |
//! | `bool`          | one byte, `0x00` or `0x01`                         |
//! | varint          | 7 data bits per byte, high bit = continuation      |
//! | `String`        | varint byte length + UTF-8 bytes                   |
//! | `Vec<T>`        | varint count + elements (arrays, sets and maps)    |
//! | `Option<T>`     | presence byte + `T` if present                     |
//! | static variant  | varint tag + payload for that tag                  |
//!
//! Sets and maps share the array wire shape. Uniqueness and ordering are a
//! *semantic* invariant owned by the type that holds them (see
//! [`crate::types::Authority`]), not something the codec enforces.
//!
//! ## Failure
//!
//! Decoding never guesses and never pads. A truncated buffer or a malformed
//! length prefix fails with a [`CodecError`] that names the offset and the
//! width that was expected there.

mod varint;

pub use varint::{decode_varint, encode_varint, varint_len};

use thiserror::Error;

use crate::config::DEFAULT_ADDRESS_PREFIX;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while decoding canonical bytes.
///
/// Always local and never worth retrying: the same bytes will fail the same
/// way every time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The buffer ended before a field of `expected` bytes could be read.
    #[error("truncated input at offset {offset}: expected {expected} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        expected: usize,
        remaining: usize,
    },

    /// A varint ran past 64 bits (or ten bytes).
    #[error("varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    /// A length or count prefix claims more data than the buffer holds.
    #[error("length prefix {length} at offset {offset} exceeds the {remaining} remaining bytes")]
    LengthOutOfBounds {
        offset: usize,
        length: u64,
        remaining: usize,
    },

    /// A string field did not contain valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// A boolean byte other than 0 or 1.
    #[error("invalid bool byte {value:#04x} at offset {offset}")]
    InvalidBool { offset: usize, value: u8 },

    /// A static-variant or operation tag that the type does not know.
    #[error("unknown {type_name} tag {tag} at offset {offset}")]
    UnknownTag {
        offset: usize,
        tag: u64,
        type_name: &'static str,
    },

    /// The bytes decoded but do not form a valid value (bad curve point,
    /// out-of-range instance, ...).
    #[error("invalid {type_name} at offset {offset}: {reason}")]
    InvalidValue {
        offset: usize,
        type_name: &'static str,
        reason: String,
    },

    /// `from_bytes` finished decoding but bytes were left over.
    #[error("{remaining} trailing bytes after offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// A cursor over canonical bytes.
///
/// Tracks the absolute offset so every error can point at the exact byte
/// that broke decoding. Also carries the address prefix that decoded public
/// keys should be tagged with, since the wire form of a key is prefix-free.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    prefix: &'a str,
}

impl<'a> Reader<'a> {
    /// Creates a reader that tags decoded keys with the default prefix.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_prefix(buf, DEFAULT_ADDRESS_PREFIX)
    }

    /// Creates a reader for a chain with a non-default address prefix.
    pub fn with_prefix(buf: &'a [u8], prefix: &'a str) -> Self {
        Self {
            buf,
            pos: 0,
            prefix,
        }
    }

    /// Current absolute offset.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unconsumed tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Address prefix for decoded public keys.
    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                expected: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Consumes exactly `N` bytes into an array.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Reads one protocol varint.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let (value, used) = decode_varint(self.rest(), self.pos)?;
        self.pos += used;
        Ok(value)
    }

    /// Reads a varint length prefix and checks it against the bytes left.
    ///
    /// Every element of every collection in this protocol encodes to at
    /// least one byte, so a count larger than the remaining buffer is
    /// malformed no matter what follows.
    pub fn read_length(&mut self) -> Result<usize, CodecError> {
        let offset = self.pos;
        let length = self.read_varint()?;
        if length > self.remaining() as u64 {
            return Err(CodecError::LengthOutOfBounds {
                offset,
                length,
                remaining: self.remaining(),
            });
        }
        Ok(length as usize)
    }

    /// Fails with [`CodecError::TrailingBytes`] if anything is left.
    pub fn finish(&self) -> Result<(), CodecError> {
        if self.remaining() != 0 {
            return Err(CodecError::TrailingBytes {
                offset: self.pos,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Builds an [`CodecError::InvalidValue`] anchored at `offset`.
    pub fn invalid(offset: usize, type_name: &'static str, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidValue {
            offset,
            type_name,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Canonical serialization.
pub trait Encode {
    /// Appends the canonical bytes of `self` to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Convenience wrapper returning a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

/// Canonical deserialization.
pub trait Decode: Sized {
    /// Reads one value from the cursor.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError>;

    /// Decodes one value and hands back the unconsumed remainder.
    fn decode_prefix(bytes: &[u8]) -> Result<(Self, &[u8]), CodecError> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode(&mut reader)?;
        Ok((value, reader.rest()))
    }

    /// Decodes a buffer that must contain exactly one value.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Fixed-width integers
// ---------------------------------------------------------------------------

macro_rules! impl_fixed_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }

            impl Decode for $ty {
                fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
                    Ok(<$ty>::from_le_bytes(reader.take_array()?))
                }
            }
        )*
    };
}

impl_fixed_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Encode for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }
}

impl Decode for bool {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let offset = reader.offset();
        match u8::decode(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidBool { offset, value }),
        }
    }
}

// ---------------------------------------------------------------------------
// Strings, arrays, options
// ---------------------------------------------------------------------------

impl Encode for String {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_varint(self.len() as u64, out);
        out.extend_from_slice(self.as_bytes());
    }
}

impl Decode for String {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let len = reader.read_length()?;
        let offset = reader.offset();
        let raw = reader.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8 { offset })
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_varint(self.len() as u64, out);
        for item in self {
            item.encode(out);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_length()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Some(value) => {
                out.push(1);
                value.encode(out);
            }
            None => out.push(0),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        if bool::decode(reader)? {
            Ok(Some(T::decode(reader)?))
        } else {
            Ok(None)
        }
    }
}

// Map entries are encoded back to back, key then value.
impl<K: Encode, V: Encode> Encode for (K, V) {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
        self.1.encode(out);
    }
}

impl<K: Decode, V: Decode> Decode for (K, V) {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok((K::decode(reader)?, V::decode(reader)?))
    }
}

// ---------------------------------------------------------------------------
// Raw byte strings
// ---------------------------------------------------------------------------

/// A length-prefixed raw byte string (`fc::raw` `vector<char>`).
///
/// JSON form is lowercase hex, which is how the node prints memo messages,
/// custom operation payloads and HTLC preimages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Bytes {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl Encode for Bytes {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_varint(self.0.len() as u64, out);
        out.extend_from_slice(&self.0);
    }
}

impl Decode for Bytes {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let len = reader.read_length()?;
        Ok(Self(reader.take(len)?.to_vec()))
    }
}

impl serde::Serialize for Bytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> serde::Deserialize<'de> for Bytes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Bytes).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(0x1234u16.to_bytes(), vec![0x34, 0x12]);
        assert_eq!(0xDCF4AB85u32.to_bytes(), vec![0x85, 0xab, 0xf4, 0xdc]);
        assert_eq!((-1i64).to_bytes(), vec![0xff; 8]);
        assert_eq!(100_000i64.to_bytes(), hex::decode("a086010000000000").unwrap());
    }

    #[test]
    fn integer_roundtrip_and_truncation() {
        assert_eq!(u64::from_bytes(&u64::MAX.to_bytes()).unwrap(), u64::MAX);
        assert_eq!(i16::from_bytes(&(-2i16).to_bytes()).unwrap(), -2);

        let err = u32::from_bytes(&[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEof {
                offset: 0,
                expected: 4,
                remaining: 3
            }
        );
    }

    #[test]
    fn bool_rejects_other_bytes() {
        assert!(bool::from_bytes(&[1]).unwrap());
        assert!(!bool::from_bytes(&[0]).unwrap());
        assert_eq!(
            bool::from_bytes(&[2]).unwrap_err(),
            CodecError::InvalidBool {
                offset: 0,
                value: 2
            }
        );
    }

    #[test]
    fn string_is_length_prefixed_utf8() {
        let s = "héllo".to_string();
        let bytes = s.to_bytes();
        assert_eq!(bytes[0] as usize, s.len());
        assert_eq!(String::from_bytes(&bytes).unwrap(), s);
    }

    #[test]
    fn string_with_invalid_utf8_fails() {
        let err = String::from_bytes(&[2, 0xff, 0xfe]).unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { offset: 1 });
    }

    #[test]
    fn length_prefix_beyond_buffer_is_rejected() {
        // Claims 5 bytes, supplies 2.
        let err = String::from_bytes(&[5, b'a', b'b']).unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthOutOfBounds {
                offset: 0,
                length: 5,
                remaining: 2
            }
        );
    }

    #[test]
    fn option_presence_byte() {
        assert_eq!(None::<u16>.to_bytes(), vec![0]);
        assert_eq!(Some(7u16).to_bytes(), vec![1, 7, 0]);
        assert_eq!(Option::<u16>::from_bytes(&[1, 7, 0]).unwrap(), Some(7));
    }

    #[test]
    fn vec_and_map_shape() {
        let v: Vec<u16> = vec![1, 2];
        assert_eq!(v.to_bytes(), vec![2, 1, 0, 2, 0]);

        let m: Vec<(u8, u16)> = vec![(9, 1)];
        assert_eq!(m.to_bytes(), vec![1, 9, 1, 0]);
        assert_eq!(Vec::<(u8, u16)>::from_bytes(&[1, 9, 1, 0]).unwrap(), m);
    }

    #[test]
    fn decode_prefix_returns_remainder() {
        let (value, rest) = u16::decode_prefix(&[1, 0, 0xaa, 0xbb]).unwrap();
        assert_eq!(value, 1);
        assert_eq!(rest, &[0xaa, 0xbb]);
    }

    #[test]
    fn from_bytes_rejects_trailing_data() {
        let err = u8::from_bytes(&[1, 2]).unwrap_err();
        assert_eq!(
            err,
            CodecError::TrailingBytes {
                offset: 1,
                remaining: 1
            }
        );
    }

    #[test]
    fn bytes_hex_json() {
        let b = Bytes(vec![0xde, 0xad]);
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"dead\"");
        let back: Bytes = serde_json::from_str("\"dead\"").unwrap();
        assert_eq!(back, b);
        assert_eq!(b.to_bytes(), vec![2, 0xde, 0xad]);
    }
}
