//! UTF-16LE string handling for client-supplied protocol fields.
//!
//! The PAA cookie, client machine name, and target server name all travel
//! as sequences of 16-bit little-endian code units with a trailing NUL.
//! Decoding is lossy: malformed surrogate pairs become U+FFFD.

/// Decode a UTF-16LE byte sequence, stripping one trailing NUL code unit
/// if present. A trailing odd byte is ignored.
pub fn decode_utf16le(data: &[u8]) -> String {
    let mut units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    if units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16_lossy(&units)
}

/// Encode a string as UTF-16LE, appending a trailing NUL code unit.
pub fn encode_utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_removes_trailing_nul() {
        for s in ["", "client-1", "127.0.0.1", "ünïcödé", "日本語ホスト"] {
            assert_eq!(decode_utf16le(&encode_utf16le(s)), s);
        }
    }

    #[test]
    fn encode_appends_nul() {
        let bytes = encode_utf16le("ab");
        assert_eq!(bytes, vec![b'a', 0, b'b', 0, 0, 0]);
    }

    #[test]
    fn decode_without_nul_terminator() {
        assert_eq!(decode_utf16le(&[b'h', 0, b'i', 0]), "hi");
    }

    #[test]
    fn decode_empty() {
        assert_eq!(decode_utf16le(&[]), "");
        assert_eq!(decode_utf16le(&[0, 0]), "");
    }

    #[test]
    fn lone_surrogate_becomes_replacement_char() {
        // 0xD800 is an unpaired high surrogate
        let decoded = decode_utf16le(&[0x00, 0xD8, b'x', 0x00]);
        assert_eq!(decoded, "\u{FFFD}x");
    }

    #[test]
    fn trailing_odd_byte_is_ignored() {
        assert_eq!(decode_utf16le(&[b'a', 0, 0xFF]), "a");
    }

    #[test]
    fn non_bmp_roundtrip() {
        // surrogate pairs survive encode/decode
        assert_eq!(decode_utf16le(&encode_utf16le("🦀")), "🦀");
    }
}
