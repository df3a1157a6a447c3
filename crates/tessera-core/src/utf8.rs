//! UTF-8 decoding for native keyboard input.
//!
//! Native systems hand over key text as raw bytes. The decoder here never
//! fails: anything malformed turns into U+FFFD.

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Number of bytes in the sequence announced by `lead`.
///
/// Invalid lead bytes count as a single byte so callers always make progress.
#[inline]
pub const fn encoded_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    }
}

#[inline]
fn continuation(buf: &[u8], index: usize) -> Option<u32> {
    match buf.get(index) {
        Some(&byte) if byte & 0xC0 == 0x80 => Some(u32::from(byte & 0x3F)),
        _ => None,
    }
}

/// Decodes the code point at the start of `buf`.
///
/// Returns U+FFFD for an empty buffer, an invalid lead byte, a truncated or
/// overlong sequence, a surrogate, or anything above U+10FFFF. Never reads
/// past `buf.len()`.
pub fn decode_utf8(buf: &[u8]) -> char {
    decode(buf).unwrap_or(REPLACEMENT)
}

fn decode(buf: &[u8]) -> Option<char> {
    let lead = *buf.first()?;

    let code = match lead {
        0x00..=0x7F => u32::from(lead),
        0xC2..=0xDF => {
            let b1 = continuation(buf, 1)?;
            (u32::from(lead & 0x1F) << 6) | b1
        }
        0xE0..=0xEF => {
            let b1 = continuation(buf, 1)?;
            let b2 = continuation(buf, 2)?;
            let code = (u32::from(lead & 0x0F) << 12) | (b1 << 6) | b2;
            if code < 0x800 {
                return None;
            }
            code
        }
        0xF0..=0xF4 => {
            let b1 = continuation(buf, 1)?;
            let b2 = continuation(buf, 2)?;
            let b3 = continuation(buf, 3)?;
            let code = (u32::from(lead & 0x07) << 18) | (b1 << 12) | (b2 << 6) | b3;
            if code < 0x10000 {
                return None;
            }
            code
        }
        // Continuation bytes, overlong two-byte leads (C0, C1) and F5..FF.
        _ => return None,
    };

    // Rejects surrogates and values above U+10FFFF.
    char::from_u32(code)
}

/// Iterates over the code points in `text`, substituting U+FFFD for bad sequences.
///
/// A bad sequence consumes its lead byte plus the continuation bytes that
/// follow it, up to the length the lead byte announced.
pub fn decode_all(text: &[u8]) -> impl Iterator<Item = char> + '_ {
    let mut offset = 0;
    std::iter::from_fn(move || {
        let rest = text.get(offset..).filter(|rest| !rest.is_empty())?;
        let (decoded, len) = match decode(rest) {
            Some(c) => (c, c.len_utf8()),
            None => {
                let expected = encoded_len(rest[0]);
                let tail = rest[1..]
                    .iter()
                    .take(expected - 1)
                    .take_while(|&&byte| byte & 0xC0 == 0x80)
                    .count();
                (REPLACEMENT, 1 + tail)
            }
        };
        offset += len;
        Some(decoded)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid() {
        for c in ['A', '\0', '\u{7F}', 'é', '\u{7FF}', '€', '\u{FFFF}', '😀', '\u{10FFFF}'] {
            let mut buf = [0u8; 4];
            let encoded = c.encode_utf8(&mut buf);
            assert_eq!(decode_utf8(encoded.as_bytes()), c, "decoding {:?}", c);
        }
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        assert_eq!(decode_utf8("éa".as_bytes()), 'é');
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode_utf8(&[]), REPLACEMENT);
    }

    #[test]
    fn test_decode_invalid_lead() {
        for lead in [0x80u8, 0xBF, 0xC0, 0xC1, 0xF5, 0xFF] {
            assert_eq!(decode_utf8(&[lead, 0x80, 0x80, 0x80]), REPLACEMENT);
        }
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(decode_utf8(&[0xC3]), REPLACEMENT);
        assert_eq!(decode_utf8(&[0xE2, 0x82]), REPLACEMENT);
        assert_eq!(decode_utf8(&[0xF0, 0x9F, 0x98]), REPLACEMENT);
    }

    #[test]
    fn test_decode_bad_continuation() {
        assert_eq!(decode_utf8(&[0xC3, 0x41]), REPLACEMENT);
        assert_eq!(decode_utf8(&[0xE2, 0x82, 0xC0]), REPLACEMENT);
    }

    #[test]
    fn test_decode_overlong() {
        // U+002F encoded in three and four bytes.
        assert_eq!(decode_utf8(&[0xE0, 0x80, 0xAF]), REPLACEMENT);
        assert_eq!(decode_utf8(&[0xF0, 0x80, 0x80, 0xAF]), REPLACEMENT);
    }

    #[test]
    fn test_decode_surrogate_and_out_of_range() {
        assert_eq!(decode_utf8(&[0xED, 0xA0, 0x80]), REPLACEMENT);
        assert_eq!(decode_utf8(&[0xF4, 0x90, 0x80, 0x80]), REPLACEMENT);
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(encoded_len(b'a'), 1);
        assert_eq!(encoded_len(0xC3), 2);
        assert_eq!(encoded_len(0xE2), 3);
        assert_eq!(encoded_len(0xF0), 4);
        assert_eq!(encoded_len(0x80), 1);
    }

    #[test]
    fn test_decode_all() {
        let decoded: String = decode_all("a€😀".as_bytes()).collect();
        assert_eq!(decoded, "a€😀");

        let decoded: Vec<char> = decode_all(&[b'a', 0xFF, b'b', 0xE2, 0x82]).collect();
        assert_eq!(decoded, vec!['a', REPLACEMENT, 'b', REPLACEMENT]);

        let decoded: String = decode_all(&[0xE2, b'x']).collect();
        assert_eq!(decoded, "\u{FFFD}x");
    }
}
