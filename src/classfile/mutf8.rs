//! Modified UTF-8, the string encoding of `CONSTANT_Utf8` entries.
//!
//! The class-file format stores strings in a variant of UTF-8 that differs from the standard
//! encoding in two ways:
//!
//! - U+0000 is written as the two-byte sequence `0xC0 0x80`, so a raw `0x00` byte never occurs
//! - Characters outside the Basic Multilingual Plane are written as a UTF-16 surrogate pair,
//!   each half encoded as a three-byte sequence, instead of a single four-byte sequence
//!
//! For the overwhelmingly common case of names without NUL and supplementary characters both
//! encodings are byte-identical, and [`decode`] / [`encode`] borrow instead of allocating.
//!
//! # Reference
//! - JVMS §4.4.7 `CONSTANT_Utf8_info`

use std::borrow::Cow;

use crate::Result;

/// Decode a modified UTF-8 payload.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for raw NUL bytes, four-byte sequences, truncated or
/// overlong sequences other than `0xC0 0x80`, and unpaired surrogates.
///
/// # Examples
///
/// ```rust
/// use classremap::classfile::mutf8;
///
/// assert_eq!(mutf8::decode(b"renderTick")?, "renderTick");
/// assert_eq!(mutf8::decode(&[b'a', 0xC0, 0x80, b'b'])?, "a\0b");
/// assert!(mutf8::decode(&[b'a', 0x00]).is_err());
/// # Ok::<(), classremap::Error>(())
/// ```
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
        // Pure ASCII without NUL is valid UTF-8 as well
        return match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(_) => Err(malformed_error!("Invalid ASCII payload")),
        };
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(u16::from(b0));
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                let unit = (u16::from(b0 & 0x1F) << 6) | u16::from(b1);
                if unit != 0 && unit < 0x80 {
                    return Err(malformed_error!("Overlong two-byte sequence at {}", i));
                }
                units.push(unit);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                let unit =
                    (u16::from(b0 & 0x0F) << 12) | (u16::from(b1) << 6) | u16::from(b2);
                if unit < 0x800 {
                    return Err(malformed_error!("Overlong three-byte sequence at {}", i));
                }
                units.push(unit);
                i += 3;
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 lead byte 0x{:02X} at {}",
                    b0,
                    i
                ))
            }
        }
    }

    match String::from_utf16(&units) {
        Ok(s) => Ok(Cow::Owned(s)),
        Err(_) => Err(malformed_error!("Unpaired surrogate in modified UTF-8")),
    }
}

/// Payload bits of the continuation byte at `index`.
fn continuation(bytes: &[u8], index: usize) -> Result<u8> {
    match bytes.get(index) {
        Some(b) if b & 0xC0 == 0x80 => Ok(b & 0x3F),
        Some(b) => Err(malformed_error!(
            "Invalid continuation byte 0x{:02X} at {}",
            b,
            index
        )),
        None => Err(malformed_error!("Truncated modified UTF-8 sequence")),
    }
}

/// Encode a string as modified UTF-8.
///
/// # Examples
///
/// ```rust
/// use classremap::classfile::mutf8;
///
/// assert_eq!(&*mutf8::encode("velocity"), b"velocity");
/// assert_eq!(&*mutf8::encode("\0"), &[0xC0, 0x80]);
/// assert_eq!(mutf8::encode("\u{1F600}").len(), 6);
/// ```
#[must_use]
pub fn encode(s: &str) -> Cow<'_, [u8]> {
    if !s.chars().any(|c| c == '\0' || u32::from(c) > 0xFFFF) {
        return Cow::Borrowed(s.as_bytes());
    }

    let mut out = Vec::with_capacity(s.len() + 8);
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn ascii_borrows() {
        assert!(matches!(decode(b"java/lang/Object").unwrap(), Cow::Borrowed(_)));
        assert!(matches!(encode("java/lang/Object"), Cow::Borrowed(_)));
    }

    #[test]
    fn bmp_characters() {
        // 'é' (2 bytes) and '€' (3 bytes) are encoded identically in both variants
        let text = "caf\u{e9}\u{20ac}";
        assert_eq!(encode(text).as_ref(), text.as_bytes());
        assert_eq!(decode(text.as_bytes()).unwrap(), text);
    }

    #[test]
    fn supplementary_character() {
        #[rustfmt::skip]
        let expected = [
            0xED, 0xA0, 0xBD, // high surrogate D83D
            0xED, 0xB8, 0x80, // low surrogate DE00
        ];
        assert_eq!(encode("\u{1F600}").as_ref(), &expected);
        assert_eq!(decode(&expected).unwrap(), "\u{1F600}");
    }

    #[test]
    fn nul_character() {
        let encoded = encode("a\0b");
        assert_eq!(encoded.as_ref(), &[b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode(&encoded).unwrap(), "a\0b");
    }

    #[test]
    fn rejects_standard_four_byte_form() {
        let standard = "\u{1F600}".as_bytes();
        assert!(matches!(decode(standard), Err(Error::Malformed { .. })));
    }

    #[test]
    fn rejects_raw_nul_and_truncation() {
        assert!(decode(&[0x00]).is_err());
        assert!(decode(&[0xC3]).is_err());
        assert!(decode(&[0xE2, 0x82]).is_err());
        assert!(decode(&[0xC3, 0x41]).is_err());
    }

    #[test]
    fn rejects_overlong_and_lone_surrogate() {
        assert!(decode(&[0xC1, 0x81]).is_err());
        assert!(decode(&[0xE0, 0x81, 0x81]).is_err());
        assert!(decode(&[0xED, 0xA0, 0xBD]).is_err());
    }

    #[test]
    fn empty_payload() {
        assert_eq!(decode(&[]).unwrap(), "");
        assert!(encode("").is_empty());
    }
}
