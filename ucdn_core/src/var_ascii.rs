//! Self-delimiting ASCII strings: the high bit of the last byte marks the end.
//!
//! The empty string is written as a lone `0x80`.

/// Append the encoding of `s` to `buf`.
///
/// Every byte must be ASCII. A string made of a single NUL would encode
/// identically to the empty string, so it is rejected too.
pub fn encode_var_ascii(s: &[u8], buf: &mut Vec<u8>) -> anyhow::Result<()> {
    if let Some(pos) = s.iter().position(|b| !b.is_ascii()) {
        anyhow::bail!("byte {:#04x} at position {} is not ASCII", s[pos], pos);
    }
    if s == b"\0" {
        anyhow::bail!("a lone NUL is indistinguishable from the empty string");
    }
    match s.split_last() {
        Some((last, init)) => {
            buf.extend_from_slice(init);
            buf.push(last | 0x80);
        }
        None => buf.push(0x80),
    }
    Ok(())
}

/// Encode `s` into a fresh buffer.
pub fn var_ascii_bytes(s: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(s.len().max(1));
    encode_var_ascii(s, &mut buf)?;
    Ok(buf)
}

/// Decode a string from the start of `raw`.
///
/// Returns the string and the number of bytes consumed.
pub fn decode_var_ascii(raw: &[u8]) -> anyhow::Result<(String, usize)> {
    let end = raw
        .iter()
        .position(|b| b & 0x80 != 0)
        .ok_or_else(|| anyhow::anyhow!("var-ascii string truncated after {} bytes", raw.len()))?;

    let mut bytes = raw[..=end].to_vec();
    bytes[end] &= 0x7F;
    if bytes == [0x00] {
        return Ok((String::new(), 1));
    }
    let s = String::from_utf8(bytes)?;
    Ok((s, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encodings() {
        assert_eq!(var_ascii_bytes(b"A").unwrap(), [0xC1]);
        assert_eq!(var_ascii_bytes(b"").unwrap(), [0x80]);
        assert_eq!(var_ascii_bytes(b"1.0").unwrap(), [b'1', b'.', b'0' | 0x80]);
    }

    #[test]
    fn round_trip() {
        for s in ["", "A", "5.2", "START OF HEADING", "LATIN SMALL LETTER A", "A\0"] {
            let bytes = var_ascii_bytes(s.as_bytes()).unwrap();
            assert_eq!(decode_var_ascii(&bytes).unwrap(), (s.to_string(), bytes.len()));
        }
    }

    #[test]
    fn decode_consumes_one_string() {
        let mut buf = Vec::new();
        encode_var_ascii(b"1.1", &mut buf).unwrap();
        encode_var_ascii(b"", &mut buf).unwrap();
        encode_var_ascii(b"15.0", &mut buf).unwrap();

        let (first, n) = decode_var_ascii(&buf).unwrap();
        assert_eq!((first.as_str(), n), ("1.1", 3));
        let (second, m) = decode_var_ascii(&buf[n..]).unwrap();
        assert_eq!((second.as_str(), m), ("", 1));
        let (third, _) = decode_var_ascii(&buf[n + m..]).unwrap();
        assert_eq!(third, "15.0");
    }

    #[test]
    fn non_ascii_is_rejected() {
        assert!(var_ascii_bytes("café".as_bytes()).is_err());
        assert!(var_ascii_bytes(b"\0").is_err());
    }

    #[test]
    fn missing_terminator_is_an_error() {
        assert!(decode_var_ascii(b"").is_err());
        assert!(decode_var_ascii(b"ABC").is_err());
    }
}
