//! Unsigned LEB128 varints, as packed by `fc::raw` for `unsigned_int`.
//!
//! Seven data bits per byte, least significant group first, high bit set on
//! every byte except the last. Lengths, counts, object instances and
//! static-variant tags all travel in this form.

use super::CodecError;

/// Longest valid encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Appends the varint encoding of `value`.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Number of bytes `encode_varint` would emit for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Decodes a varint from the start of `buf`.
///
/// `base` is the absolute offset of `buf[0]`, used only for error reporting.
/// Returns the value and the number of bytes consumed.
pub fn decode_varint(buf: &[u8], base: usize) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(CodecError::VarintOverflow { offset: base });
        }
        let chunk = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        // The tenth byte may only carry the single remaining bit.
        if shift == 63 && chunk > 1 {
            return Err(CodecError::VarintOverflow { offset: base });
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CodecError::UnexpectedEof {
        offset: base + buf.len(),
        expected: 1,
        remaining: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enc(v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(v, &mut out);
        out
    }

    #[test]
    fn known_encodings() {
        assert_eq!(enc(0), vec![0x00]);
        assert_eq!(enc(1), vec![0x01]);
        assert_eq!(enc(127), vec![0x7f]);
        assert_eq!(enc(128), vec![0x80, 0x01]);
        assert_eq!(enc(300), vec![0xac, 0x02]);
        assert_eq!(enc(16_384), vec![0x80, 0x80, 0x01]);
        assert_eq!(enc(u64::MAX).len(), 10);
    }

    #[test]
    fn truncated_varint_reports_offset() {
        let err = decode_varint(&[0x80, 0x80], 7).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEof {
                offset: 9,
                expected: 1,
                remaining: 0
            }
        );
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let eleven = [0xffu8; 11];
        assert_eq!(
            decode_varint(&eleven, 0).unwrap_err(),
            CodecError::VarintOverflow { offset: 0 }
        );

        // Ten bytes whose last group overflows 64 bits.
        let mut too_big = vec![0xffu8; 9];
        too_big.push(0x02);
        assert_eq!(
            decode_varint(&too_big, 0).unwrap_err(),
            CodecError::VarintOverflow { offset: 0 }
        );
    }

    proptest! {
        #[test]
        fn varint_roundtrip(v in any::<u64>()) {
            let bytes = enc(v);
            prop_assert_eq!(bytes.len(), varint_len(v));
            let (back, used) = decode_varint(&bytes, 0).unwrap();
            prop_assert_eq!(back, v);
            prop_assert_eq!(used, bytes.len());
        }

        #[test]
        fn varint_ignores_trailing_bytes(v in any::<u64>(), tail in proptest::collection::vec(any::<u8>(), 0..4)) {
            let mut bytes = enc(v);
            let len = bytes.len();
            bytes.extend_from_slice(&tail);
            let (back, used) = decode_varint(&bytes, 0).unwrap();
            prop_assert_eq!(back, v);
            prop_assert_eq!(used, len);
        }
    }
}
