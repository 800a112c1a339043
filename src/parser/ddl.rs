//! Recursive-descent parser for the DDL dialect.
//!
//! Built directly against [`Lexer`] rather than a pre-tokenized buffer: the
//! lexer is pulled one token at a time, and whenever the grammar reaches a
//! parenthesized expression body (`AS (...)`, `DEFAULT (...)`, `CHECK (...)`)
//! the parser hands the raw source and the `(` token's offset to
//! [`expr_capture::capture_parenthesized`], then seeks the lexer past the
//! matching `)` to resume normal tokenizing. This is what lets an expression
//! contain characters the statement grammar itself never lexes (arbitrary
//! operators, for instance) without the lexer ever trying to tokenize them.

use crate::config::FeatureGates;
use crate::lexer::{IntegerLiteral, Keyword, Lexer, Token, TokenKind};
use crate::status::Status;

use super::ast::*;
use super::expr_capture::{capture_parenthesized, scan_string_literal};

/// Parses a single DDL statement under the given feature gates.
pub fn parse(source: &str, gates: FeatureGates) -> Result<Statement, Status> {
    let mut parser = Parser::new(source, gates)?;
    let stmt = parser.parse_statement()?;
    parser.expect_eof()?;
    Ok(stmt)
}

/// Extracts the database name from a `CREATE DATABASE` statement without
/// building a full change description. Used by the create-database handler
/// (spec §6, "Parse-only helper").
pub fn parse_create_database_name(source: &str) -> Result<String, Status> {
    let mut parser = Parser::new(source, FeatureGates::default())?;
    parser.expect_keyword(Keyword::Create)?;
    parser.expect_keyword(Keyword::Database)?;
    let name = parser.parse_name()?;
    Ok(name)
}

/// Splits a file containing multiple `;`-separated DDL statements into the
/// individual statement texts, so each can be fed to [`parse`] on its own
/// (mirrors `UpdateDatabaseDdl`'s `statements[]` request shape, spec §6).
///
/// Splitting happens at top-level `;` characters only — one still inside an
/// unclosed paren (for instance inside a `CHECK(...)` body that will later
/// be captured verbatim by [`capture_parenthesized`]) never ends a
/// statement. Empty statements (consecutive `;`, trailing whitespace) are
/// dropped.
///
/// This does its own string/comment/paren-aware scan rather than handing the
/// whole source to [`Lexer::tokenize`]: a captured expression body may
/// contain operators the statement grammar's own lexer never tokenizes (`/`,
/// `%`, …), and `parse` only ever lexes the grammar *around* those bodies,
/// never their interior. Tokenizing the full source up front would reject
/// exactly the inputs the capture mechanism exists to allow.
pub fn split_statements(source: &str) -> Result<Vec<String>, Status> {
    let mut statements = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut pos = 0usize;

    while pos < source.len() {
        let c = source[pos..].chars().next().expect("pos < source.len()");
        match c {
            '-' if source[pos..].starts_with("--") => {
                pos += skip_line_comment(&source[pos..]);
            }
            '#' => {
                pos += skip_line_comment(&source[pos..]);
            }
            '/' if source[pos..].starts_with("/*") => {
                pos += skip_block_comment(&source[pos..])?;
            }
            '`' => {
                pos += skip_quoted_identifier(&source[pos..])?;
            }
            '\'' | '"' => {
                let literal = scan_string_literal(&source[pos..], c)?;
                pos += literal.byte_len;
            }
            '(' => {
                depth += 1;
                pos += c.len_utf8();
            }
            ')' => {
                depth -= 1;
                pos += c.len_utf8();
            }
            ';' if depth == 0 => {
                let text = source[start..pos].trim();
                if !text.is_empty() {
                    statements.push(text.to_string());
                }
                pos += c.len_utf8();
                start = pos;
            }
            _ => pos += c.len_utf8(),
        }
    }

    let text = source[start..].trim();
    if !text.is_empty() {
        statements.push(text.to_string());
    }

    Ok(statements)
}

/// Returns the byte length of a `--` or `#` comment, up to but excluding the
/// terminating newline (or end of input).
fn skip_line_comment(text: &str) -> usize {
    text.find('\n').unwrap_or(text.len())
}

/// Returns the byte length of a `/* ... */` block comment, including both
/// delimiters.
fn skip_block_comment(text: &str) -> Result<usize, Status> {
    match text[2..].find("*/") {
        Some(offset) => Ok(offset + 4),
        None => Err(Status::invalid_argument("Unterminated block comment")),
    }
}

/// Returns the byte length of a backtick-quoted identifier, including both
/// backticks. Mirrors [`Lexer::scan_quoted_identifier`]'s tolerance for any
/// byte other than the closing backtick.
fn skip_quoted_identifier(text: &str) -> Result<usize, Status> {
    match text[1..].find('`') {
        Some(offset) => Ok(offset + 2),
        None => Err(Status::invalid_argument("Unterminated quoted identifier")),
    }
}

struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    gates: FeatureGates,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, gates: FeatureGates) -> Result<Self, Status> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self {
            source,
            lexer,
            current,
            gates,
        })
    }

    fn bump(&mut self) -> Result<Token, Status> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn syntax_error(&self, expected: &str) -> Status {
        Status::invalid_argument(format!(
            "Syntax error on line {}, column {}: Expecting '{}' but found '{}'",
            self.current.line,
            self.current.column,
            expected,
            display_token(&self.current)
        ))
    }

    fn expect_eof(&mut self) -> Result<(), Status> {
        if self.current.kind == TokenKind::Punct(";") {
            self.bump()?;
        }
        if self.current.kind != TokenKind::Eof {
            return Err(self.syntax_error("EOF"));
        }
        Ok(())
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token, Status> {
        if self.current.kind == TokenKind::Keyword(kw) {
            self.bump()
        } else {
            Err(self.syntax_error(&kw.to_string()))
        }
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.current.kind == TokenKind::Keyword(kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> Result<bool, Status> {
        if self.at_keyword(kw) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_punct(&mut self, p: &'static str) -> Result<Token, Status> {
        if self.current.kind == TokenKind::Punct(p) {
            self.bump()
        } else {
            Err(self.syntax_error(p))
        }
    }

    fn at_punct(&self, p: &'static str) -> bool {
        self.current.kind == TokenKind::Punct(p)
    }

    fn eat_punct(&mut self, p: &'static str) -> Result<bool, Status> {
        if self.at_punct(p) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// A plain name: an unquoted or backtick-quoted identifier. Does not
    /// accept `COLUMN` as a stand-in — only [`Self::parse_column_name`] does.
    fn parse_name(&mut self) -> Result<String, Status> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.bump()?;
                Ok(name)
            }
            _ => Err(self.syntax_error("<identifier>")),
        }
    }

    /// A column name. `COLUMN` is a contextual keyword here (spec §4.B):
    /// the unquoted keyword token doubles as the literal identifier text
    /// "COLUMN" when it appears in a name position, exactly as a
    /// backtick-quoted `` `COLUMN` `` would.
    fn parse_column_name(&mut self) -> Result<String, Status> {
        if self.at_keyword(Keyword::Column) {
            self.bump()?;
            return Ok("COLUMN".to_string());
        }
        self.parse_name()
    }

    fn parse_integer(&mut self) -> Result<i128, Status> {
        match self.current.kind.clone() {
            TokenKind::Integer(IntegerLiteral { value, .. }) => {
                self.bump()?;
                Ok(value)
            }
            _ => Err(self.syntax_error("<integer>")),
        }
    }

    // ---- top-level dispatch -------------------------------------------------

    fn parse_statement(&mut self) -> Result<Statement, Status> {
        if self.at_keyword(Keyword::Create) {
            self.bump()?;
            if self.at_keyword(Keyword::Database) {
                self.bump()?;
                let name = self.parse_name()?;
                return Ok(Statement::CreateDatabase { name });
            }
            if self.at_keyword(Keyword::Table) {
                self.bump()?;
                return self.parse_create_table();
            }
            return self.parse_create_index();
        }

        if self.eat_keyword(Keyword::Alter)? {
            self.expect_keyword(Keyword::Table)?;
            let table = self.parse_name()?;
            let action = self.parse_alter_table_action()?;
            return Ok(Statement::AlterTable { table, action });
        }

        if self.eat_keyword(Keyword::Drop)? {
            if self.eat_keyword(Keyword::Table)? {
                let name = self.parse_name()?;
                return Ok(Statement::DropTable { name });
            }
            self.expect_keyword(Keyword::Index)?;
            let name = self.parse_name()?;
            return Ok(Statement::DropIndex { name });
        }

        if self.eat_keyword(Keyword::Analyze)? {
            return Ok(Statement::Analyze);
        }

        Err(self.syntax_error("CREATE"))
    }

    // ---- CREATE TABLE --------------------------------------------------------

    fn parse_create_table(&mut self) -> Result<Statement, Status> {
        let name = self.parse_name()?;
        self.expect_punct("(")?;

        let mut columns = Vec::new();
        let mut constraints = Vec::new();

        while !self.at_punct(")") {
            if self.at_keyword(Keyword::Constraint)
                || self.at_keyword(Keyword::Foreign)
                || self.at_keyword(Keyword::Check)
            {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }

            if !self.eat_punct(",")? {
                break;
            }
        }
        self.expect_punct(")")?;

        self.expect_keyword(Keyword::Primary)?;
        self.expect_keyword(Keyword::Key)?;
        self.expect_punct("(")?;
        let key_parts = self.parse_key_part_list()?;
        self.expect_punct(")")?;
        constraints.push(Constraint::PrimaryKey { key_parts });

        // The two trailing clauses are each independently optional, so a
        // comma introducing one must not be consumed unless that clause is
        // actually present (spec §4.B): `PRIMARY KEY (...)` may be followed
        // by INTERLEAVE alone, ROW DELETION POLICY alone, both, or neither.
        if self.at_punct(",") && self.peek_is_keyword_after_comma(Keyword::Interleave)? {
            self.expect_punct(",")?;
            self.expect_keyword(Keyword::Interleave)?;
            self.expect_keyword(Keyword::In)?;
            self.expect_keyword(Keyword::Parent)?;
            let parent = self.parse_name()?;
            let on_delete = self.parse_optional_on_delete()?;
            constraints.push(Constraint::Interleave {
                parent,
                interleave_type: InterleaveType::InParent,
                on_delete,
            });
        }

        let mut row_deletion_policy = None;
        if self.at_punct(",") && self.peek_is_keyword_after_comma(Keyword::Row)? {
            self.expect_punct(",")?;
            row_deletion_policy = Some(self.parse_row_deletion_policy_clause()?);
        }

        Ok(Statement::CreateTable {
            name,
            columns,
            constraints,
            row_deletion_policy,
        })
    }

    /// Looks past a `,` token (without consuming anything) to check whether
    /// the following token is the given keyword.
    fn peek_is_keyword_after_comma(&mut self, keyword: Keyword) -> Result<bool, Status> {
        let saved_lexer = self.lexer.clone();
        let saved_current = self.current.clone();

        self.expect_punct(",")?;
        let matches = self.at_keyword(keyword);

        self.lexer = saved_lexer;
        self.current = saved_current;
        Ok(matches)
    }

    fn parse_optional_on_delete(&mut self) -> Result<OnDelete, Status> {
        if self.eat_keyword(Keyword::On)? {
            self.expect_keyword(Keyword::Delete)?;
            if self.eat_keyword(Keyword::Cascade)? {
                return Ok(OnDelete::Cascade);
            }
            self.expect_keyword(Keyword::No)?;
            self.expect_keyword(Keyword::Action)?;
            return Ok(OnDelete::NoAction);
        }
        Ok(OnDelete::NoAction)
    }

    fn parse_row_deletion_policy_clause(&mut self) -> Result<RowDeletionPolicy, Status> {
        self.expect_keyword(Keyword::Row)?;
        self.expect_keyword(Keyword::Deletion)?;
        self.expect_keyword(Keyword::Policy)?;
        self.expect_punct("(")?;
        let policy = self.parse_row_deletion_predicate()?;
        self.expect_punct(")")?;
        Ok(policy)
    }

    fn parse_row_deletion_predicate(&mut self) -> Result<RowDeletionPolicy, Status> {
        if !self.at_keyword(Keyword::OlderThan) {
            // The predicate name lexes as a plain identifier (e.g.
            // YOUNGER_THAN); OLDER_THAN is the only accepted name.
            if matches!(self.current.kind, TokenKind::Identifier(_)) {
                self.bump()?;
            }
            return Err(Status::invalid_argument("Only OLDER_THAN is supported."));
        }
        self.bump()?;
        self.expect_punct("(")?;
        let column = self.parse_column_name()?;
        self.expect_punct(",")?;
        self.expect_keyword(Keyword::Interval)?;
        let older_than_days = self.parse_integer()?;
        self.expect_keyword(Keyword::Day)?;
        self.expect_punct(")")?;
        Ok(RowDeletionPolicy {
            column,
            older_than_days,
        })
    }

    fn parse_key_part_list(&mut self) -> Result<Vec<KeyPart>, Status> {
        let mut parts = Vec::new();
        while !self.at_punct(")") {
            let column = self.parse_column_name()?;
            let order = if self.eat_keyword(Keyword::Desc)? {
                SortOrder::Desc
            } else {
                self.eat_keyword(Keyword::Asc)?;
                SortOrder::Asc
            };
            parts.push(KeyPart { column, order });
            if !self.eat_punct(",")? {
                break;
            }
        }
        Ok(parts)
    }

    // ---- column definitions ---------------------------------------------

    fn parse_column_def(&mut self) -> Result<ColumnDef, Status> {
        let name = self.parse_column_name()?;
        let (column_type, length) = self.parse_column_type()?;

        let mut nullable = true;
        if self.eat_keyword(Keyword::Not)? {
            self.expect_keyword(Keyword::Null)?;
            nullable = false;
        }

        let (expression, is_stored_generated, has_default) =
            self.parse_optional_generated_or_default(&name)?;

        let options = if self.eat_keyword(Keyword::Options)? {
            self.expect_punct("(")?;
            let entries = self.parse_option_list()?;
            self.expect_punct(")")?;
            column_options_from_entries(entries)?
        } else {
            ColumnOptions::default()
        };

        Ok(ColumnDef {
            name,
            column_type,
            length,
            nullable,
            options,
            expression,
            is_stored_generated,
            has_default,
        })
    }

    fn parse_column_type(&mut self) -> Result<(ColumnType, Option<Length>), Status> {
        if self.eat_keyword(Keyword::Array)? {
            self.expect_punct("<")?;
            let scalar = self.parse_scalar_type()?;
            self.expect_punct(">")?;
            return Ok((ColumnType::Array(scalar), None));
        }

        let scalar = self.parse_scalar_type()?;

        if self.at_punct("(") {
            self.bump()?;
            if !scalar.allows_length() {
                return Err(Status::invalid_argument(format!(
                    "Type {scalar} does not support a length parameter."
                )));
            }
            let length = if self.eat_keyword(Keyword::Max)? {
                Length::Max
            } else {
                Length::Value(self.parse_integer()?)
            };
            self.expect_punct(")")?;
            return Ok((ColumnType::Scalar(scalar), Some(length)));
        }

        if scalar == ScalarType::String || scalar == ScalarType::Bytes {
            return Err(Status::invalid_argument(format!(
                "{scalar} columns must specify a length, e.g. {scalar}(MAX)."
            )));
        }

        Ok((ColumnType::Scalar(scalar), None))
    }

    fn parse_scalar_type(&mut self) -> Result<ScalarType, Status> {
        let kw = match self.current.kind {
            TokenKind::Keyword(k) => k,
            _ => return Err(self.syntax_error("<type>")),
        };
        let scalar = match kw {
            Keyword::Bool => ScalarType::Bool,
            Keyword::Int64 => ScalarType::Int64,
            Keyword::Float64 => ScalarType::Float64,
            Keyword::String => ScalarType::String,
            Keyword::Bytes => ScalarType::Bytes,
            Keyword::Date => ScalarType::Date,
            Keyword::Timestamp => ScalarType::Timestamp,
            Keyword::Numeric => ScalarType::Numeric,
            Keyword::Json => ScalarType::Json,
            _ => return Err(self.syntax_error("<type>")),
        };
        self.bump()?;
        Ok(scalar)
    }

    /// `AS (...) STORED`, `DEFAULT (...)`, or neither. Feature gates and the
    /// "missing STORED" rule are enforced here (spec §4.B).
    fn parse_optional_generated_or_default(
        &mut self,
        column_name: &str,
    ) -> Result<(Option<String>, bool, bool), Status> {
        if self.eat_keyword(Keyword::As)? {
            let expr = self.capture_expr()?;
            let stored = self.eat_keyword(Keyword::Stored)?;
            if !stored {
                return Err(Status::unimplemented(format!(
                    "Generated column `{column_name}` without the STORED attribute is not supported."
                )));
            }
            if !self.gates.enable_stored_generated_columns {
                return Err(Status::unimplemented("Generated columns are not enabled."));
            }
            return Ok((Some(expr), true, false));
        }

        if self.eat_keyword(Keyword::Default)? {
            let expr = self.capture_expr()?;
            if !self.gates.enable_column_default_values {
                return Err(Status::unimplemented(
                    "Column DEFAULT values are not enabled.",
                ));
            }
            return Ok((Some(expr), false, true));
        }

        Ok((None, false, false))
    }

    /// Consumes a `(` and captures everything up to and including its
    /// matching `)` as verbatim text, then resumes tokenizing after it.
    fn capture_expr(&mut self) -> Result<String, Status> {
        let open = self.expect_punct("(")?;
        let (body, end_offset) = capture_parenthesized(self.source, open.start_offset)?;
        self.lexer.seek(end_offset);
        self.current = self.lexer.next_token()?;
        Ok(body)
    }

    fn parse_option_list(&mut self) -> Result<Vec<OptionEntry>, Status> {
        let mut entries = Vec::new();
        loop {
            if self.at_punct(")") {
                break;
            }
            let key = self.parse_name()?;
            self.expect_punct("=")?;
            let value = self.parse_option_value()?;
            entries.push(OptionEntry { key, value });

            if self.eat_punct(",")? {
                if self.at_punct(")") {
                    return Err(Status::invalid_argument(
                        "Trailing comma is not allowed in an OPTIONS list.",
                    ));
                }
                continue;
            }
            break;
        }
        Ok(entries)
    }

    fn parse_option_value(&mut self) -> Result<OptionValue, Status> {
        if self.eat_keyword(Keyword::True)? {
            return Ok(OptionValue::Bool(true));
        }
        if self.eat_keyword(Keyword::False)? {
            return Ok(OptionValue::Bool(false));
        }
        if self.eat_keyword(Keyword::Null)? {
            return Ok(OptionValue::Null);
        }
        match self.current.kind.clone() {
            TokenKind::StringLiteral(s) => {
                self.bump()?;
                Ok(OptionValue::Str(s))
            }
            _ => Err(self.syntax_error("<option value>")),
        }
    }

    // ---- table-level constraints -----------------------------------------

    fn parse_table_constraint(&mut self) -> Result<Constraint, Status> {
        let constraint_name = if self.eat_keyword(Keyword::Constraint)? {
            Some(self.parse_name()?)
        } else {
            None
        };

        if self.eat_keyword(Keyword::Foreign)? {
            self.expect_keyword(Keyword::Key)?;
            self.expect_punct("(")?;
            let referencing_columns = self.parse_column_name_list()?;
            self.expect_punct(")")?;
            self.expect_keyword(Keyword::References)?;
            let referenced_table = self.parse_name()?;
            self.expect_punct("(")?;
            let referenced_columns = self.parse_column_name_list()?;
            self.expect_punct(")")?;
            return Ok(Constraint::ForeignKey {
                constraint_name,
                referencing_columns,
                referenced_table,
                referenced_columns,
            });
        }

        if self.at_keyword(Keyword::Check) {
            return self.parse_check_constraint(constraint_name);
        }

        Err(self.syntax_error("FOREIGN"))
    }

    fn parse_check_constraint(
        &mut self,
        constraint_name: Option<String>,
    ) -> Result<Constraint, Status> {
        self.expect_keyword(Keyword::Check)?;
        let sql_text = self.capture_expr()?;
        if !self.gates.enable_check_constraint {
            return Err(Status::unimplemented("Check Constraint is not implemented."));
        }
        Ok(Constraint::Check {
            constraint_name,
            sql_text,
        })
    }

    fn parse_column_name_list(&mut self) -> Result<Vec<String>, Status> {
        let mut names = Vec::new();
        loop {
            names.push(self.parse_column_name()?);
            if !self.eat_punct(",")? {
                break;
            }
        }
        Ok(names)
    }

    // ---- CREATE INDEX -----------------------------------------------------

    fn parse_create_index(&mut self) -> Result<Statement, Status> {
        let unique = self.eat_keyword(Keyword::Unique)?;
        let null_filtered = self.eat_keyword(Keyword::NullFiltered)?;
        self.expect_keyword(Keyword::Index)?;
        let name = self.parse_name()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_name()?;
        self.expect_punct("(")?;
        let key_parts = self.parse_key_part_list()?;
        self.expect_punct(")")?;

        let mut stored_columns = Vec::new();
        let mut interleave_parent = None;

        loop {
            if self.eat_keyword(Keyword::Storing)? {
                self.expect_punct("(")?;
                stored_columns = self.parse_column_name_list()?;
                self.expect_punct(")")?;
                continue;
            }
            if self.eat_keyword(Keyword::Interleave)? {
                self.expect_keyword(Keyword::In)?;
                interleave_parent = Some(self.parse_name()?);
                continue;
            }
            break;
        }

        Ok(Statement::CreateIndex {
            name,
            table,
            null_filtered,
            unique,
            key_parts,
            stored_columns,
            interleave_parent,
        })
    }

    // ---- ALTER TABLE --------------------------------------------------------

    fn parse_alter_table_action(&mut self) -> Result<AlterTableAction, Status> {
        if self.eat_keyword(Keyword::Add)? {
            if self.eat_keyword(Keyword::Column)? {
                let col = self.parse_column_def()?;
                return Ok(AlterTableAction::AddColumn(col));
            }

            if self.at_keyword(Keyword::Row) {
                let policy = self.parse_row_deletion_policy_clause()?;
                return Ok(AlterTableAction::AddRowDeletionPolicy(policy));
            }

            let constraint = self.parse_table_constraint()?;
            return Ok(AlterTableAction::AddConstraint(constraint));
        }

        if self.eat_keyword(Keyword::Drop)? {
            if self.eat_keyword(Keyword::Column)? {
                let name = self.parse_column_name()?;
                return Ok(AlterTableAction::DropColumn { name });
            }
            if self.eat_keyword(Keyword::Constraint)? {
                let name = self.parse_name()?;
                return Ok(AlterTableAction::DropConstraint { name });
            }
            if self.at_keyword(Keyword::Row) {
                self.expect_keyword(Keyword::Row)?;
                self.expect_keyword(Keyword::Deletion)?;
                self.expect_keyword(Keyword::Policy)?;
                if self.at_punct("(") {
                    return Err(self.syntax_error("EOF"));
                }
                return Ok(AlterTableAction::DropRowDeletionPolicy);
            }
            return Err(self.syntax_error("COLUMN"));
        }

        if self.eat_keyword(Keyword::Replace)? {
            let policy = self.parse_row_deletion_policy_clause()?;
            return Ok(AlterTableAction::ReplaceRowDeletionPolicy(policy));
        }

        if self.eat_keyword(Keyword::Set)? {
            self.expect_keyword(Keyword::On)?;
            self.expect_keyword(Keyword::Delete)?;
            let on_delete = if self.eat_keyword(Keyword::Cascade)? {
                OnDelete::Cascade
            } else {
                self.expect_keyword(Keyword::No)?;
                self.expect_keyword(Keyword::Action)?;
                OnDelete::NoAction
            };
            return Ok(AlterTableAction::AlterInterleaveOnDelete { on_delete });
        }

        if self.eat_keyword(Keyword::Alter)? {
            self.expect_keyword(Keyword::Column)?;
            let column = self.parse_column_name()?;

            if self.eat_keyword(Keyword::Set)? {
                if self.eat_keyword(Keyword::Options)? {
                    self.expect_punct("(")?;
                    let options = self.parse_option_list()?;
                    self.expect_punct(")")?;
                    return Ok(AlterTableAction::SetColumnOptions { column, options });
                }
                self.expect_keyword(Keyword::Default)?;
                if !self.at_punct("(") {
                    return Err(self.syntax_error("("));
                }
                let expression = self.capture_expr()?;
                if !self.gates.enable_column_default_values {
                    return Err(Status::unimplemented(
                        "Column DEFAULT values are not enabled.",
                    ));
                }
                return Ok(AlterTableAction::SetColumnDefault { column, expression });
            }

            if self.eat_keyword(Keyword::Drop)? {
                self.expect_keyword(Keyword::Default)?;
                if self.at_punct("(") {
                    return Err(self.syntax_error("EOF"));
                }
                return Ok(AlterTableAction::DropColumnDefault { column });
            }

            let (column_type, length) = self.parse_column_type()?;
            let mut nullable = true;
            if self.eat_keyword(Keyword::Not)? {
                self.expect_keyword(Keyword::Null)?;
                nullable = false;
            }
            let (expression, is_stored_generated, has_default) =
                self.parse_optional_generated_or_default(&column)?;
            return Ok(AlterTableAction::AlterColumn(ColumnDef {
                name: column,
                column_type,
                length,
                nullable,
                options: ColumnOptions::default(),
                expression,
                is_stored_generated,
                has_default,
            }));
        }

        Err(self.syntax_error("ADD"))
    }
}

fn column_options_from_entries(entries: Vec<OptionEntry>) -> Result<ColumnOptions, Status> {
    let mut options = ColumnOptions::default();
    for entry in entries {
        match entry.key.to_ascii_lowercase().as_str() {
            "allow_commit_timestamp" => {
                options.allow_commit_timestamp = Some(match entry.value {
                    OptionValue::Bool(b) => Some(b),
                    OptionValue::Null => None,
                    OptionValue::Str(_) => {
                        return Err(Status::invalid_argument(
                            "allow_commit_timestamp must be a bool or NULL.",
                        ));
                    }
                });
            }
            other => {
                return Err(Status::invalid_argument(format!(
                    "Unrecognized option: {other}"
                )));
            }
        }
    }
    Ok(options)
}

fn display_token(tok: &Token) -> String {
    match &tok.kind {
        TokenKind::Eof => "EOF".to_string(),
        TokenKind::Identifier(s) => s.clone(),
        TokenKind::Keyword(k) => k.to_string(),
        TokenKind::Punct(p) => p.to_string(),
        TokenKind::Integer(i) => i.raw.clone(),
        TokenKind::Float(s) => s.clone(),
        TokenKind::StringLiteral(s) => s.clone(),
        TokenKind::BytesLiteral(_) => "<bytes literal>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates() -> FeatureGates {
        FeatureGates::default()
    }

    #[test]
    fn parses_minimal_create_table() {
        let stmt = parse(
            "CREATE TABLE Users (UserId INT64 NOT NULL, Name STRING(MAX)) PRIMARY KEY (UserId)",
            gates(),
        )
        .unwrap();
        match stmt {
            Statement::CreateTable {
                name,
                columns,
                constraints,
                row_deletion_policy,
            } => {
                assert_eq!(name, "Users");
                assert_eq!(columns.len(), 2);
                assert!(!columns[0].nullable);
                assert!(columns[1].nullable);
                assert!(row_deletion_policy.is_none());
                assert!(matches!(
                    constraints.last(),
                    Some(Constraint::PrimaryKey { key_parts }) if key_parts.len() == 1
                ));
            }
            other => panic!("expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn hex_length_is_decoded() {
        let stmt = parse(
            "CREATE TABLE Sizes (HexLength STRING(0x42)) PRIMARY KEY ()",
            gates(),
        )
        .unwrap();
        match stmt {
            Statement::CreateTable { columns, .. } => {
                assert_eq!(columns[0].length, Some(Length::Value(66)));
            }
            other => panic!("expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn missing_primary_key_is_reported() {
        let err = parse("CREATE TABLE T (K INT64)", gates()).unwrap_err();
        assert!(err.message.contains("Expecting 'PRIMARY' but found 'EOF'"));
    }

    #[test]
    fn generated_column_requires_stored() {
        let err = parse(
            "CREATE TABLE T (K INT64 NOT NULL, G INT64 AS (K + 1)) PRIMARY KEY (K)",
            gates(),
        )
        .unwrap_err();
        assert!(err
            .message
            .contains("without the STORED attribute is not supported"));
    }

    #[test]
    fn disabled_generated_columns_are_unimplemented() {
        let mut g = gates();
        g.enable_stored_generated_columns = false;
        let err = parse(
            "CREATE TABLE T (K INT64 NOT NULL, G INT64 AS (K + 1) STORED) PRIMARY KEY(K)",
            g,
        )
        .unwrap_err();
        assert_eq!(err.message, "Generated columns are not enabled.");
        assert_eq!(err.kind, crate::status::ErrorKind::Unimplemented);
    }

    #[test]
    fn row_deletion_policy_rejects_younger_than() {
        let err = parse(
            "CREATE TABLE T (K INT64, CreatedAt TIMESTAMP) PRIMARY KEY (K), ROW DELETION POLICY (YOUNGER_THAN(CreatedAt, INTERVAL 7 DAY))",
            gates(),
        )
        .unwrap_err();
        assert_eq!(err.message, "Only OLDER_THAN is supported.");
    }

    #[test]
    fn row_deletion_policy_without_interleave_is_accepted() {
        let stmt = parse(
            "CREATE TABLE T (K INT64, CreatedAt TIMESTAMP) PRIMARY KEY (K), ROW DELETION POLICY (OLDER_THAN(CreatedAt, INTERVAL 7 DAY))",
            gates(),
        )
        .unwrap();
        match stmt {
            Statement::CreateTable {
                row_deletion_policy,
                constraints,
                ..
            } => {
                assert!(row_deletion_policy.is_some());
                assert!(!constraints
                    .iter()
                    .any(|c| matches!(c, Constraint::Interleave { .. })));
            }
            other => panic!("expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn interleave_without_row_deletion_policy_is_accepted() {
        let stmt = parse(
            "CREATE TABLE Albums (SingerId INT64 NOT NULL, AlbumId INT64 NOT NULL) PRIMARY KEY (SingerId, AlbumId), INTERLEAVE IN PARENT Singers",
            gates(),
        )
        .unwrap();
        match stmt {
            Statement::CreateTable {
                row_deletion_policy,
                ..
            } => assert!(row_deletion_policy.is_none()),
            other => panic!("expected CreateTable, got {other:?}"),
        }
    }

    #[test]
    fn illegal_escape_inside_check_expression_is_reported() {
        let err = parse(r"ALTER TABLE T ADD CHECK(B > '\c')", gates()).unwrap_err();
        assert!(err.message.contains(r"Illegal escape sequence: \c"));
    }

    #[test]
    fn contextual_column_keyword_as_name() {
        let stmt = parse(
            "ALTER TABLE T ADD COLUMN COLUMN STRING(MAX)",
            gates(),
        )
        .unwrap();
        match stmt {
            Statement::AlterTable {
                action: AlterTableAction::AddColumn(col),
                ..
            } => assert_eq!(col.name, "COLUMN"),
            other => panic!("expected AddColumn, got {other:?}"),
        }
    }

    #[test]
    fn backtick_quoted_column_keyword_rejected_as_introducer() {
        let err = parse("ALTER TABLE T ADD `COLUMN` Notes STRING(MAX)", gates()).unwrap_err();
        assert!(err.message.contains("Expecting"));
    }

    #[test]
    fn create_index_with_storing_and_interleave() {
        let stmt = parse(
            "CREATE UNIQUE INDEX IdxName ON T (A, B DESC) STORING (C) INTERLEAVE IN Parent",
            gates(),
        )
        .unwrap();
        match stmt {
            Statement::CreateIndex {
                unique,
                null_filtered,
                key_parts,
                stored_columns,
                interleave_parent,
                ..
            } => {
                assert!(unique);
                assert!(!null_filtered);
                assert_eq!(key_parts[1].order, SortOrder::Desc);
                assert_eq!(stored_columns, vec!["C".to_string()]);
                assert_eq!(interleave_parent, Some("Parent".to_string()));
            }
            other => panic!("expected CreateIndex, got {other:?}"),
        }
    }

    #[test]
    fn drop_row_deletion_policy_rejects_parenthesized_body() {
        let err = parse("ALTER TABLE T DROP ROW DELETION POLICY (X)", gates()).unwrap_err();
        assert!(err.message.contains("Expecting 'EOF' but found '('"));
    }

    #[test]
    fn expression_with_embedded_paren_in_string_round_trips() {
        let stmt = parse(r"ALTER TABLE T ADD CHECK(B > ')')", gates()).unwrap();
        match stmt {
            Statement::AlterTable {
                action: AlterTableAction::AddConstraint(Constraint::Check { sql_text, .. }),
                ..
            } => assert_eq!(sql_text, "B > ')'"),
            other => panic!("expected AddConstraint/Check, got {other:?}"),
        }
    }

    #[test]
    fn parse_create_database_name_extracts_name() {
        let name = parse_create_database_name("CREATE DATABASE `my-db`").unwrap();
        assert_eq!(name, "my-db");
    }

    #[test]
    fn split_statements_respects_semicolons_inside_expressions() {
        let source = "CREATE TABLE T (K INT64 NOT NULL) PRIMARY KEY (K);\n\
                       ALTER TABLE T ADD CHECK (K > 0);\n";
        let stmts = split_statements(source).unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TABLE T"));
        assert!(stmts[1].starts_with("ALTER TABLE T"));
    }

    #[test]
    fn split_statements_allows_operators_the_grammar_never_lexes() {
        let source = "ALTER TABLE T ADD CHECK (x / 2 > 0);\n\
                       ALTER TABLE T ADD CHECK (x % 2 = 0);\n";
        let stmts = split_statements(source).unwrap();
        assert_eq!(stmts.len(), 2);
        for stmt_text in &stmts {
            parse(stmt_text, gates()).unwrap();
        }
    }

    #[test]
    fn split_statements_drops_empty_segments() {
        let stmts = split_statements("CREATE DATABASE D;;  ;").unwrap();
        assert_eq!(stmts, vec!["CREATE DATABASE D".to_string()]);
    }

    #[test]
    fn split_statements_allows_final_statement_without_trailing_semicolon() {
        let stmts = split_statements("DROP TABLE T").unwrap();
        assert_eq!(stmts, vec!["DROP TABLE T".to_string()]);
    }
}
