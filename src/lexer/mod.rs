//! Lexical analysis for the DDL dialect.
//!
//! Converts raw DDL source text into a stream of [`Token`]s. Handles the
//! dialect's four string/bytes delimiter shapes (`'`, `"`, `'''`, `"""`),
//! `r`/`b`/`rb`/`br` literal prefixes, escape decoding, hex/decimal integers,
//! quoted and unquoted identifiers, and smart-quote rejection.

mod escape;
mod token;

pub use token::{IntegerLiteral, Keyword, Token, TokenKind};

use std::str::FromStr;

use crate::status::Status;

/// Smart quotes that must be rejected outright — copy-pasting from a word
/// processor is a common source of otherwise-baffling syntax errors.
const SMART_DOUBLE_QUOTES: [char; 2] = ['\u{201C}', '\u{201D}'];
const SMART_SINGLE_QUOTES: [char; 2] = ['\u{2018}', '\u{2019}'];

#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source, returning the full token stream
    /// (terminated by a single [`TokenKind::Eof`]) or the first lexical error.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, Status> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// Reposition the lexer to resume tokenizing at a byte offset reached by
    /// some other scan over the same source (the balanced-paren expression
    /// capture in [`crate::parser::expr_capture`]). Recomputes line/column
    /// by walking from the start, since jumps are rare and correctness of
    /// diagnostics matters more than the cost of a rescan.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
        let mut line = 1;
        let mut column = 1;
        for c in self.source[..offset].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        self.line = line;
        self.column = column;
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset_chars: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset_chars)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_here(&self, message: impl Into<String>) -> Status {
        Status::invalid_argument(format!(
            "Syntax error on line {}, column {}: {}",
            self.line,
            self.column,
            message.into()
        ))
    }

    fn skip_trivia(&mut self) -> Result<(), Status> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('#') => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek_char() {
                            None => return Err(self.error_here("Unterminated block comment")),
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token, Status> {
        self.skip_trivia()?;

        let start_line = self.line;
        let start_col = self.column;
        let start_offset = self.pos;

        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line: start_line,
                column: start_col,
                start_offset,
                end_offset: start_offset,
            });
        };

        if SMART_DOUBLE_QUOTES.contains(&c) || SMART_SINGLE_QUOTES.contains(&c) {
            return Err(self.error_here(format!("Illegal character: smart quote '{c}'")));
        }

        if !c.is_ascii() {
            return Err(self.error_here(format!("Illegal character: non-ASCII byte '{c}'")));
        }

        let kind = if c == '`' {
            self.scan_quoted_identifier()?
        } else if c.is_ascii_alphabetic() || c == '_' {
            self.scan_word()?
        } else if c.is_ascii_digit() {
            self.scan_number()?
        } else if c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) {
            self.scan_number()?
        } else if c == '\'' || c == '"' {
            self.scan_string_or_bytes("", c)?
        } else {
            self.scan_punct()?
        };

        Ok(Token {
            kind,
            line: start_line,
            column: start_col,
            start_offset,
            end_offset: self.pos,
        })
    }

    fn scan_punct(&mut self) -> Result<TokenKind, Status> {
        let c = self.advance().unwrap();
        let two: Option<&'static str> = match (c, self.peek_char()) {
            ('<', Some('=')) => Some("<="),
            ('>', Some('=')) => Some(">="),
            ('!', Some('=')) => Some("!="),
            _ => None,
        };
        if let Some(p) = two {
            self.advance();
            return Ok(TokenKind::Punct(p));
        }
        let single: &'static str = match c {
            '(' => "(",
            ')' => ")",
            ',' => ",",
            '.' => ".",
            ';' => ";",
            '<' => "<",
            '>' => ">",
            '=' => "=",
            '+' => "+",
            '-' => "-",
            '*' => "*",
            _ => return Err(self.error_here(format!("Illegal character: '{c}'"))),
        };
        Ok(TokenKind::Punct(single))
    }

    fn scan_quoted_identifier(&mut self) -> Result<TokenKind, Status> {
        self.advance(); // opening backtick
        let mut name = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error_here("Unterminated quoted identifier")),
                Some('`') => break,
                Some(c) => name.push(c),
            }
        }
        if name.is_empty() {
            return Err(self.error_here("Quoted identifiers cannot be empty"));
        }
        Ok(TokenKind::Identifier(name))
    }

    /// Scans an unquoted word: either a reserved keyword, a literal prefix
    /// (`r`, `b`, `rb`, `br`) immediately followed by a quote, or a plain
    /// identifier.
    fn scan_word(&mut self) -> Result<TokenKind, Status> {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let word = &self.source[start..self.pos];

        if let Some(quote) = self.peek_char()
            && (quote == '\'' || quote == '"')
            && is_literal_prefix(word)
        {
            return self.scan_string_or_bytes(word, quote);
        }

        if let Ok(keyword) = Keyword::from_str(word) {
            return Ok(TokenKind::Keyword(keyword));
        }

        Ok(TokenKind::Identifier(word.to_string()))
    }

    fn scan_number(&mut self) -> Result<TokenKind, Status> {
        let start = self.pos;

        if self.peek_char() == Some('0')
            && matches!(self.peek_at(1), Some('x') | Some('X'))
        {
            self.advance();
            self.advance();
            let hex_start = self.pos;
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            if self.pos == hex_start {
                return Err(self.error_here("Expecting hex digits after '0x'"));
            }
            let raw = self.source[start..self.pos].to_string();
            let value = i128::from_str_radix(&self.source[hex_start..self.pos], 16)
                .map_err(|_| self.error_here("Invalid hex integer literal"))?;
            return Ok(TokenKind::Integer(IntegerLiteral { value, raw }));
        }

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        let mut is_float = false;
        if self.peek_char() == Some('.') {
            is_float = true;
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance();
            }
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let raw = self.source[start..self.pos].to_string();
        if is_float {
            Ok(TokenKind::Float(raw))
        } else {
            let value: i128 = raw
                .parse()
                .map_err(|_| self.error_here("Invalid integer literal"))?;
            Ok(TokenKind::Integer(IntegerLiteral { value, raw }))
        }
    }

    /// Scans a string or bytes literal, `prefix` being the already-consumed
    /// `r`/`b`/`rb`/`br` prefix text (empty for an unprefixed literal) and
    /// `quote_char` the `'` or `"` that opens it. Handles both single- and
    /// triple-quoted delimiter shapes.
    fn scan_string_or_bytes(
        &mut self,
        prefix: &str,
        quote_char: char,
    ) -> Result<TokenKind, Status> {
        let prefix_lower = prefix.to_ascii_lowercase();
        let is_raw = prefix_lower.contains('r');
        let is_bytes = prefix_lower.contains('b');

        let triple = self.peek_at(1) == Some(quote_char) && self.peek_at(2) == Some(quote_char);
        for _ in 0..(if triple { 3 } else { 1 }) {
            self.advance();
        }

        let body_start = self.pos;
        loop {
            if triple {
                if self.peek_char() == Some(quote_char)
                    && self.peek_at(1) == Some(quote_char)
                    && self.peek_at(2) == Some(quote_char)
                {
                    break;
                }
                if self.peek_char().is_none() {
                    return Err(
                        self.error_here("Encountered an unclosed triple quoted string")
                    );
                }
                if self.peek_char() == Some('\\') {
                    self.advance();
                    if self.peek_char().is_some() {
                        self.advance();
                    }
                    continue;
                }
                self.advance();
            } else {
                match self.peek_char() {
                    None | Some('\n') => {
                        return Err(self.error_here("Unterminated string literal"));
                    }
                    Some(c) if c == quote_char => break,
                    Some('\\') => {
                        self.advance();
                        if self.peek_char().is_some() {
                            self.advance();
                        }
                    }
                    Some(_) => {
                        self.advance();
                    }
                }
            }
        }

        let body = &self.source[body_start..self.pos];
        for _ in 0..(if triple { 3 } else { 1 }) {
            self.advance();
        }

        if is_raw {
            if is_bytes {
                return Ok(TokenKind::BytesLiteral(body.as_bytes().to_vec()));
            }
            return Ok(TokenKind::StringLiteral(body.to_string()));
        }

        let decoded = escape::decode_escapes(body, is_bytes)?;
        if is_bytes {
            Ok(TokenKind::BytesLiteral(decoded))
        } else {
            Ok(TokenKind::StringLiteral(escape::require_utf8(decoded)?))
        }
    }
}

fn is_literal_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "b" | "rb" | "br"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_create_table_header() {
        let ks = kinds("CREATE TABLE Users (");
        assert_eq!(
            ks,
            vec![
                TokenKind::Keyword(Keyword::Create),
                TokenKind::Keyword(Keyword::Table),
                TokenKind::Identifier("Users".to_string()),
                TokenKind::Punct("("),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive_identifiers_case_preserved() {
        let ks = kinds("create TABLE Users");
        assert_eq!(ks[0], TokenKind::Keyword(Keyword::Create));
        assert_eq!(ks[2], TokenKind::Identifier("Users".to_string()));
    }

    #[test]
    fn backtick_identifier_allows_reserved_word() {
        let ks = kinds("`SELECT`");
        assert_eq!(ks[0], TokenKind::Identifier("SELECT".to_string()));
    }

    #[test]
    fn hex_integer_literal() {
        let ks = kinds("0x42");
        match &ks[0] {
            TokenKind::Integer(i) => assert_eq!(i.value, 66),
            other => panic!("expected integer, got {other:?}"),
        }
    }

    #[test]
    fn all_string_delimiter_shapes_decode_equally() {
        for (src, expected) in [
            ("'ab'", "ab"),
            ("\"ab\"", "ab"),
            ("'''ab'''", "ab"),
            ("\"\"\"ab\"\"\"", "ab"),
        ] {
            let ks = kinds(src);
            assert_eq!(ks[0], TokenKind::StringLiteral(expected.to_string()));
        }
    }

    #[test]
    fn raw_prefix_preserves_backslashes() {
        let ks = kinds(r"r'a\nb'");
        assert_eq!(ks[0], TokenKind::StringLiteral(r"a\nb".to_string()));
    }

    #[test]
    fn bytes_prefix_any_order_and_case() {
        for src in ["b'ab'", "B'ab'", "rb'ab'", "br'ab'", "Rb'ab'", "bR'ab'"] {
            let ks = kinds(src);
            assert!(matches!(ks[0], TokenKind::BytesLiteral(_)), "{src}");
        }
    }

    #[test]
    fn unterminated_triple_quote_errors() {
        let err = Lexer::tokenize("'''abc").unwrap_err();
        assert!(err.message.contains("unclosed triple quoted string"));
    }

    #[test]
    fn smart_quotes_rejected() {
        let err = Lexer::tokenize("\u{201C}abc\u{201D}").unwrap_err();
        assert!(err.message.contains("smart quote"));
    }

    #[test]
    fn invalid_utf8_bytes_literal_does_not_require_utf8() {
        // \xFF is not valid UTF-8 on its own but is legal inside BYTES.
        let ks = kinds(r"b'\xFF'");
        assert_eq!(ks[0], TokenKind::BytesLiteral(vec![0xFF]));
    }

    #[test]
    fn invalid_utf8_string_literal_errors() {
        let err = Lexer::tokenize(r"'\xFF'").unwrap_err();
        assert!(err.message.contains("Structurally invalid UTF8 string"));
    }

    #[test]
    fn illegal_escape_sequence_reported() {
        let err = Lexer::tokenize(r"'\c'").unwrap_err();
        assert!(err.message.contains(r"\c"));
    }

    #[test]
    fn triple_quoted_string_allows_embedded_newline() {
        let ks = kinds("'''line one\nline two'''");
        assert_eq!(
            ks[0],
            TokenKind::StringLiteral("line one\nline two".to_string())
        );
    }
}
