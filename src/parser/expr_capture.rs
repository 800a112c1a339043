//! Balanced-paren verbatim expression capture.
//!
//! `AS (...)`, `DEFAULT (...)`, and `CHECK (...)` bodies are captured as
//! exact source text — whitespace, newlines, and embedded quoting preserved
//! — rather than re-rendered from a parsed expression tree (spec §4.B, §9
//! "Captured expression text"). The scan is the sole authority for where an
//! expression ends: it tracks paren depth and an inside-string state keyed
//! by delimiter shape, exactly like the lexer, so that a `')'` inside a
//! quoted substring is never mistaken for the terminator. It also runs the
//! lexer's escape decoder over any string/bytes literal it passes through,
//! so a malformed escape inside a captured expression is still a lexical
//! error (spec §8 scenario 5) even though the expression is never tokenized.

use crate::lexer::escape;
use crate::status::Status;

/// Captures the body of a parenthesized expression.
///
/// `source[open_paren_offset]` must be the opening `(`. Returns the exact
/// text between the outermost `(` and `)` (exclusive of both) and the byte
/// offset immediately after the closing `)`.
pub fn capture_parenthesized(
    source: &str,
    open_paren_offset: usize,
) -> Result<(String, usize), Status> {
    debug_assert_eq!(source.as_bytes().get(open_paren_offset), Some(&b'('));

    let mut depth = 1usize;
    let mut last_word = String::new();
    let body_start = open_paren_offset + 1; // '(' is one ASCII byte.
    let mut pos = body_start;

    loop {
        let Some(c) = source[pos..].chars().next() else {
            return Err(Status::invalid_argument(
                "Unexpected end of statement inside parenthesized expression",
            ));
        };

        match c {
            '\'' | '"' => {
                let prefix = last_word.to_ascii_lowercase();
                let prefix_is_bytes = matches!(prefix.as_str(), "b" | "rb" | "br");
                let prefix_is_raw = matches!(prefix.as_str(), "r" | "rb" | "br");
                last_word.clear();
                let consumed = scan_string_literal(&source[pos..], c)?;
                if !prefix_is_raw {
                    escape::decode_escapes(&consumed.body, prefix_is_bytes)?;
                }
                pos += consumed.byte_len;
            }
            '(' => {
                depth += 1;
                last_word.clear();
                pos += c.len_utf8();
            }
            ')' => {
                depth -= 1;
                last_word.clear();
                if depth == 0 {
                    let body = &source[body_start..pos];
                    let end_offset = pos + c.len_utf8();
                    return Ok((body.to_string(), end_offset));
                }
                pos += c.len_utf8();
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                last_word.push(c);
                pos += c.len_utf8();
            }
            _ => {
                last_word.clear();
                pos += c.len_utf8();
            }
        }
    }
}

pub(super) struct ScannedLiteral {
    body: String,
    /// Total byte length of the literal including delimiters, starting
    /// from the opening quote.
    pub(super) byte_len: usize,
}

/// Scans a string/bytes literal starting at `text[0]` (the opening quote),
/// used only to find where it ends and to extract its body for escape
/// validation. Raw-ness is decided by the caller from the preceding word;
/// this function only needs to know the delimiter shape.
pub(super) fn scan_string_literal(text: &str, quote: char) -> Result<ScannedLiteral, Status> {
    let q = quote.len_utf8();
    let triple = text[q..].starts_with(quote) && text[q + q..].starts_with(quote);
    let delim_len = if triple { q * 3 } else { q };
    let delim = if triple {
        format!("{quote}{quote}{quote}")
    } else {
        quote.to_string()
    };

    let mut pos = delim_len;
    let body_start = pos;

    loop {
        if text[pos..].starts_with(&delim) {
            let body = text[body_start..pos].to_string();
            return Ok(ScannedLiteral {
                body,
                byte_len: pos + delim_len,
            });
        }

        let Some(c) = text[pos..].chars().next() else {
            return Err(Status::invalid_argument(if triple {
                "Encountered an unclosed triple quoted string"
            } else {
                "Unterminated string literal"
            }));
        };

        if c == '\\' {
            pos += c.len_utf8();
            let escaped = text[pos..].chars().next().ok_or_else(|| {
                Status::invalid_argument("Unexpected end of literal after '\\'")
            })?;
            pos += escaped.len_utf8();
        } else {
            pos += c.len_utf8();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_simple_arithmetic_expression() {
        let source = "(K + 1) STORED";
        let (text, end) = capture_parenthesized(source, 0).unwrap();
        assert_eq!(text, "K + 1");
        assert_eq!(&source[end..], " STORED");
    }

    #[test]
    fn preserves_whitespace_and_newlines() {
        let source = "(\n  K +\n  1\n)";
        let (text, _) = capture_parenthesized(source, 0).unwrap();
        assert_eq!(text, "\n  K +\n  1\n");
    }

    #[test]
    fn paren_inside_quoted_string_does_not_terminate() {
        let source = "(B > ')')";
        let (text, _) = capture_parenthesized(source, 0).unwrap();
        assert_eq!(text, "B > ')'");
    }

    #[test]
    fn illegal_escape_inside_expression_is_an_error() {
        let source = r"(B > '\c')";
        let err = capture_parenthesized(source, 0).unwrap_err();
        assert!(err.message.contains(r"\c"));
    }

    #[test]
    fn nested_parens_are_balanced() {
        let source = "(f(a, g(b)))";
        let (text, _) = capture_parenthesized(source, 0).unwrap();
        assert_eq!(text, "f(a, g(b))");
    }
}
