//! Big-endian base-128 integers.
//!
//! Digits are written most significant first. Every byte except the last has
//! its high bit set; the final (least significant) digit has it clear.

/// Append the encoding of `value` to `buf`.
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    let start = buf.len();
    loop {
        buf.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    buf[start..].reverse();
    if let Some(last) = buf.last_mut() {
        *last &= 0x7F;
    }
}

/// Encode `value` into a fresh buffer.
pub fn varint_bytes(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    encode_varint(value, &mut buf);
    buf
}

/// Decode a varint from the start of `raw`.
///
/// Returns the value and the number of bytes consumed. Fails if `raw` ends
/// before a byte with a clear high bit, or if the value overflows `u64`.
pub fn decode_varint(raw: &[u8]) -> anyhow::Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in raw.iter().enumerate() {
        value = value
            .checked_mul(128)
            .and_then(|v| v.checked_add((byte & 0x7F) as u64))
            .ok_or_else(|| anyhow::anyhow!("varint overflows 64 bits"))?;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    anyhow::bail!("varint truncated after {} bytes", raw.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encodings() {
        assert_eq!(varint_bytes(0), [0x00]);
        assert_eq!(varint_bytes(0x23), [0x23]);
        assert_eq!(varint_bytes(127), [0x7F]);
        assert_eq!(varint_bytes(128), [0x81, 0x00]);
        assert_eq!(varint_bytes(0x0F * 128 + 0x04), [0x8F, 0x04]);
    }

    #[test]
    fn round_trip_reports_length() {
        for n in [0u64, 1, 127, 128, 0x23, 0x0F * 128 + 0x04, u32::MAX as u64, u64::MAX] {
            let bytes = varint_bytes(n);
            assert_eq!(decode_varint(&bytes).unwrap(), (n, bytes.len()), "value {n}");
        }
    }

    #[test]
    fn decode_stops_at_terminator() {
        assert_eq!(decode_varint(&[0x23, 0xFF, 0xFF]).unwrap(), (0x23, 1));
        assert_eq!(decode_varint(&[0x8F, 0x04, 0x99]).unwrap(), (0x0F * 128 + 0x04, 2));
    }

    #[test]
    fn encode_appends() {
        let mut buf = vec![0xAA];
        encode_varint(300, &mut buf);
        assert_eq!(buf, [0xAA, 0x82, 0x2C]);
    }

    #[test]
    fn truncated_input_is_an_error() {
        assert!(decode_varint(&[]).is_err());
        assert!(decode_varint(&[0x81, 0x80]).is_err());
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(decode_varint(&[0xFF; 11]).is_err());
    }
}
