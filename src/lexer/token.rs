//! Token kinds produced by the lexer.

use std::fmt;

use strum_macros::EnumString;

/// Reserved keywords recognized by the dialect. Matching is case-insensitive
/// at the lexer level (see [`crate::lexer::Lexer`]); the original casing of
/// an unquoted identifier is preserved separately for user-chosen names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Keyword {
    Create,
    Database,
    Table,
    Index,
    Unique,
    #[strum(serialize = "NULL_FILTERED")]
    NullFiltered,
    Alter,
    Drop,
    Analyze,
    Primary,
    Key,
    Interleave,
    In,
    Parent,
    On,
    Delete,
    Cascade,
    No,
    Action,
    Row,
    Deletion,
    Policy,
    #[strum(serialize = "OLDER_THAN")]
    OlderThan,
    Interval,
    Day,
    Not,
    Null,
    Options,
    As,
    Stored,
    Default,
    Add,
    Column,
    Constraint,
    Foreign,
    References,
    Check,
    Set,
    Storing,
    True,
    False,
    Bool,
    Int64,
    Float64,
    String,
    Bytes,
    Date,
    Timestamp,
    Numeric,
    Json,
    Array,
    Asc,
    Desc,
    Max,
    Replace,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render as the canonical uppercase spelling used in error messages.
        let s = match self {
            Keyword::Create => "CREATE",
            Keyword::Database => "DATABASE",
            Keyword::Table => "TABLE",
            Keyword::Index => "INDEX",
            Keyword::Unique => "UNIQUE",
            Keyword::NullFiltered => "NULL_FILTERED",
            Keyword::Alter => "ALTER",
            Keyword::Drop => "DROP",
            Keyword::Analyze => "ANALYZE",
            Keyword::Primary => "PRIMARY",
            Keyword::Key => "KEY",
            Keyword::Interleave => "INTERLEAVE",
            Keyword::In => "IN",
            Keyword::Parent => "PARENT",
            Keyword::On => "ON",
            Keyword::Delete => "DELETE",
            Keyword::Cascade => "CASCADE",
            Keyword::No => "NO",
            Keyword::Action => "ACTION",
            Keyword::Row => "ROW",
            Keyword::Deletion => "DELETION",
            Keyword::Policy => "POLICY",
            Keyword::OlderThan => "OLDER_THAN",
            Keyword::Interval => "INTERVAL",
            Keyword::Day => "DAY",
            Keyword::Not => "NOT",
            Keyword::Null => "NULL",
            Keyword::Options => "OPTIONS",
            Keyword::As => "AS",
            Keyword::Stored => "STORED",
            Keyword::Default => "DEFAULT",
            Keyword::Add => "ADD",
            Keyword::Column => "COLUMN",
            Keyword::Constraint => "CONSTRAINT",
            Keyword::Foreign => "FOREIGN",
            Keyword::References => "REFERENCES",
            Keyword::Check => "CHECK",
            Keyword::Set => "SET",
            Keyword::Storing => "STORING",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Bool => "BOOL",
            Keyword::Int64 => "INT64",
            Keyword::Float64 => "FLOAT64",
            Keyword::String => "STRING",
            Keyword::Bytes => "BYTES",
            Keyword::Date => "DATE",
            Keyword::Timestamp => "TIMESTAMP",
            Keyword::Numeric => "NUMERIC",
            Keyword::Json => "JSON",
            Keyword::Array => "ARRAY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Max => "MAX",
            Keyword::Replace => "REPLACE",
        };
        f.write_str(s)
    }
}

/// A decoded numeric literal. Decimal and hex forms are both accepted;
/// the parsed value is what downstream consumers operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerLiteral {
    pub value: i128,
    /// Verbatim source text, preserved for expression re-rendering
    /// (leading zeros, `0x` casing, etc.) per spec §4.A.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Unquoted or backtick-quoted identifier. Case is preserved.
    Identifier(String),
    Keyword(Keyword),
    Integer(IntegerLiteral),
    /// `.`-containing or exponent-containing numeric literal; kept as text
    /// since the core never evaluates floats, only re-renders them.
    Float(String),
    /// Decoded string literal (escapes resolved unless the literal was
    /// raw-prefixed, in which case the text is the verbatim body).
    StringLiteral(String),
    BytesLiteral(Vec<u8>),
    /// Single- or multi-character punctuation: `(`, `)`, `,`, `.`, `;`, `<`, `>`.
    Punct(&'static str),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(s) => write!(f, "{s}"),
            TokenKind::Keyword(k) => write!(f, "{k}"),
            TokenKind::Integer(i) => write!(f, "{}", i.raw),
            TokenKind::Float(s) => write!(f, "{s}"),
            TokenKind::StringLiteral(s) => write!(f, "{s:?}"),
            TokenKind::BytesLiteral(b) => write!(f, "{b:?}"),
            TokenKind::Punct(p) => write!(f, "{p}"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

/// A token together with its source position, used for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}
