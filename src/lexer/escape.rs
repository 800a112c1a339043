//! Escape-sequence decoding for string and bytes literals.
//!
//! Shared by both literal kinds: a bytes literal decodes to raw bytes, a
//! string literal decodes to bytes and then validates the result as UTF-8.
//! Raw-prefixed literals (`r'...'`) skip this module entirely — their body
//! is taken verbatim.

use crate::status::Status;

/// Decode the body of a non-raw string/bytes literal into bytes.
///
/// `is_bytes` controls whether `\u`/`\U` unicode escapes are permitted
/// (they are rejected for `b`-prefixed literals per spec §4.A).
pub fn decode_escapes(body: &str, is_bytes: bool) -> Result<Vec<u8>, Status> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let escape = chars
            .next()
            .ok_or_else(|| Status::invalid_argument("Unexpected end of literal after '\\'"))?;

        match escape {
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            '\\' => out.push(b'\\'),
            '\'' => out.push(b'\''),
            '"' => out.push(b'"'),
            '0' => out.push(0),
            '`' => out.push(b'`'),
            '?' => out.push(b'?'),
            'f' => out.push(0x0C),
            'v' => out.push(0x0B),
            'x' | 'X' => {
                let hex = take_hex_digits(&mut chars, 2)?;
                out.push(u8::from_str_radix(&hex, 16).map_err(|_| {
                    Status::invalid_argument("Illegal escape sequence: invalid hex escape")
                })?);
            }
            'u' => {
                if is_bytes {
                    return Err(Status::invalid_argument(
                        "Illegal escape sequence: Unicode escape sequence",
                    ));
                }
                let hex = take_hex_digits(&mut chars, 4)?;
                push_unicode_scalar(&mut out, &hex)?;
            }
            'U' => {
                if is_bytes {
                    return Err(Status::invalid_argument(
                        "Illegal escape sequence: Unicode escape sequence",
                    ));
                }
                let hex = take_hex_digits(&mut chars, 8)?;
                push_unicode_scalar(&mut out, &hex)?;
            }
            other => {
                return Err(Status::invalid_argument(format!(
                    "Illegal escape sequence: \\{other}"
                )));
            }
        }
    }

    Ok(out)
}

fn take_hex_digits(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    count: usize,
) -> Result<String, Status> {
    let mut hex = String::with_capacity(count);
    for _ in 0..count {
        match chars.next() {
            Some(c) if c.is_ascii_hexdigit() => hex.push(c),
            _ => {
                return Err(Status::invalid_argument(
                    "Illegal escape sequence: expected hex digit",
                ));
            }
        }
    }
    Ok(hex)
}

fn push_unicode_scalar(out: &mut Vec<u8>, hex: &str) -> Result<(), Status> {
    let code = u32::from_str_radix(hex, 16)
        .map_err(|_| Status::invalid_argument("Illegal escape sequence: invalid unicode escape"))?;
    let ch = char::from_u32(code).ok_or_else(|| {
        Status::invalid_argument("Illegal escape sequence: invalid unicode code point")
    })?;
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    Ok(())
}

/// Validate that `bytes` is well-formed UTF-8 and return the `String`.
/// Used when finishing a STRING literal (BYTES literals skip this).
pub fn require_utf8(bytes: Vec<u8>) -> Result<String, Status> {
    String::from_utf8(bytes)
        .map_err(|_| Status::invalid_argument("Structurally invalid UTF8 string"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_standard_escapes() {
        let decoded = decode_escapes(r"a\nb\tc", false).unwrap();
        assert_eq!(decoded, b"a\nb\tc");
    }

    #[test]
    fn decodes_hex_escape() {
        let decoded = decode_escapes(r"\x41", false).unwrap();
        assert_eq!(decoded, b"A");
    }

    #[test]
    fn decodes_unicode_escape() {
        let decoded = decode_escapes("\\u00e9", false).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "\u{e9}");
    }

    #[test]
    fn rejects_unknown_escape() {
        let err = decode_escapes(r"\c", false).unwrap_err();
        assert!(err.message.contains("Illegal escape sequence"));
        assert!(err.message.contains(r"\c"));
    }

    #[test]
    fn rejects_unicode_escape_in_bytes_literal() {
        let err = decode_escapes("\\u00e9", true).unwrap_err();
        assert!(err.message.contains("Unicode escape sequence"));
    }
}
