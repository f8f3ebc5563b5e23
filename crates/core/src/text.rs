//! Fixed-length text buffers
//!
//! The producer writes ANSI (ISO-8859-1) strings into fixed buffers. A NUL
//! terminator is usual but not guaranteed: a name that fills the buffer has
//! none, in which case the whole buffer is the text.

/// Text decoded from a fixed buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedText {
    pub text: String,
    /// False when no NUL was found and the full buffer was used
    pub terminated: bool,
}

/// Decode a fixed-length ISO-8859-1 buffer, cutting at the first NUL
pub fn decode_fixed(buf: &[u8]) -> FixedText {
    let (bytes, terminated) = match buf.iter().position(|&b| b == 0) {
        Some(nul) => (&buf[..nul], true),
        None => (buf, false),
    };
    // ISO-8859-1 maps every byte to the code point of the same value
    let text = bytes.iter().map(|&b| char::from(b)).collect();
    FixedText { text, terminated }
}

/// Encode into a fixed buffer of `len` bytes, the inverse of [`decode_fixed`].
///
/// Characters outside ISO-8859-1 become `?`. Text that does not fit is
/// truncated; text that fills the buffer exactly is left unterminated.
pub fn encode_fixed(text: &str, len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .take(len)
        .collect();
    out.resize(len, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuts_at_first_nul() {
        let decoded = decode_fixed(b"CPU\0junk\0\0");
        assert_eq!(decoded.text, "CPU");
        assert!(decoded.terminated);
    }

    #[test]
    fn test_unterminated_uses_full_length() {
        let decoded = decode_fixed(b"ABCDEFGH");
        assert_eq!(decoded.text, "ABCDEFGH");
        assert!(!decoded.terminated);
    }

    #[test]
    fn test_latin1_bytes() {
        // "°C" as the producer writes it
        let decoded = decode_fixed(&[0xB0, b'C', 0, 0]);
        assert_eq!(decoded.text, "°C");
    }

    #[test]
    fn test_encode_pads_and_truncates() {
        assert_eq!(encode_fixed("RPM", 6), b"RPM\0\0\0".to_vec());
        assert_eq!(encode_fixed("ABCDEFG", 4), b"ABCD".to_vec());
        assert_eq!(encode_fixed("°C", 3), vec![0xB0, b'C', 0]);
        assert_eq!(encode_fixed("€", 2), vec![b'?', 0]);
    }
}
