//! Canonical DDL printer: renders a parsed [`Statement`] back to source text.
//!
//! Spec §6 places the printer outside the core ("a companion surface"), but
//! the round-trip testable property in spec §8 — `parse(print(schema))`
//! reproduces the same schema — needs *something* to print with, so a small
//! renderer lives here rather than nowhere. It is deliberately minimal: one
//! canonical spelling per construct (uppercase keywords, `ASC` always
//! explicit, one space after commas), not an attempt to preserve the
//! original formatting of whatever text was parsed.

use std::fmt::Write as _;

use crate::parser::ast::*;

/// Renders a single schema-change statement back to DDL text.
pub fn print_statement(stmt: &Statement) -> String {
    let mut out = String::new();
    match stmt {
        Statement::CreateDatabase { name } => {
            write!(out, "CREATE DATABASE {}", quote_if_needed(name)).unwrap();
        }
        Statement::CreateTable {
            name,
            columns,
            constraints,
            row_deletion_policy,
        } => print_create_table(&mut out, name, columns, constraints, row_deletion_policy.as_ref()),
        Statement::CreateIndex {
            name,
            table,
            null_filtered,
            unique,
            key_parts,
            stored_columns,
            interleave_parent,
        } => print_create_index(
            &mut out,
            name,
            table,
            *null_filtered,
            *unique,
            key_parts,
            stored_columns,
            interleave_parent.as_deref(),
        ),
        Statement::AlterTable { table, action } => {
            write!(out, "ALTER TABLE {} ", quote_if_needed(table)).unwrap();
            print_alter_action(&mut out, action);
        }
        Statement::DropTable { name } => {
            write!(out, "DROP TABLE {}", quote_if_needed(name)).unwrap();
        }
        Statement::DropIndex { name } => {
            write!(out, "DROP INDEX {}", quote_if_needed(name)).unwrap();
        }
        Statement::Analyze => out.push_str("ANALYZE"),
    }
    out
}

fn print_create_table(
    out: &mut String,
    name: &str,
    columns: &[ColumnDef],
    constraints: &[Constraint],
    row_deletion_policy: Option<&RowDeletionPolicy>,
) {
    write!(out, "CREATE TABLE {} (", quote_if_needed(name)).unwrap();
    let mut primary_key: Option<&[KeyPart]> = None;
    let mut interleave: Option<&Constraint> = None;
    let mut rest = Vec::new();

    for c in constraints {
        match c {
            Constraint::PrimaryKey { key_parts } => primary_key = Some(key_parts),
            Constraint::Interleave { .. } => interleave = Some(c),
            other => rest.push(other),
        }
    }

    let mut parts: Vec<String> = columns.iter().map(print_column_def).collect();
    parts.extend(rest.iter().map(|c| print_table_constraint(c)));
    out.push_str(&parts.join(", "));
    out.push_str(") PRIMARY KEY (");
    if let Some(kps) = primary_key {
        out.push_str(&print_key_parts(kps));
    }
    out.push(')');

    if let Some(Constraint::Interleave {
        parent,
        on_delete,
        ..
    }) = interleave
    {
        write!(out, ", INTERLEAVE IN PARENT {}", quote_if_needed(parent)).unwrap();
        if *on_delete == OnDelete::Cascade {
            out.push_str(" ON DELETE CASCADE");
        }
    }

    if let Some(policy) = row_deletion_policy {
        write!(
            out,
            ", ROW DELETION POLICY (OLDER_THAN({}, INTERVAL {} DAY))",
            quote_if_needed(&policy.column),
            policy.older_than_days
        )
        .unwrap();
    }
}

fn print_create_index(
    out: &mut String,
    name: &str,
    table: &str,
    null_filtered: bool,
    unique: bool,
    key_parts: &[KeyPart],
    stored_columns: &[String],
    interleave_parent: Option<&str>,
) {
    out.push_str("CREATE ");
    if unique {
        out.push_str("UNIQUE ");
    }
    if null_filtered {
        out.push_str("NULL_FILTERED ");
    }
    write!(
        out,
        "INDEX {} ON {} ({})",
        quote_if_needed(name),
        quote_if_needed(table),
        print_key_parts(key_parts)
    )
    .unwrap();
    if !stored_columns.is_empty() {
        let cols: Vec<String> = stored_columns.iter().map(|c| quote_if_needed(c)).collect();
        write!(out, " STORING ({})", cols.join(", ")).unwrap();
    }
    if let Some(parent) = interleave_parent {
        write!(out, " INTERLEAVE IN {}", quote_if_needed(parent)).unwrap();
    }
}

fn print_alter_action(out: &mut String, action: &AlterTableAction) {
    match action {
        AlterTableAction::AddColumn(def) => {
            write!(out, "ADD COLUMN {}", print_column_def(def)).unwrap();
        }
        AlterTableAction::DropColumn { name } => {
            write!(out, "DROP COLUMN {}", quote_if_needed(name)).unwrap();
        }
        AlterTableAction::AlterColumn(def) => {
            write!(out, "ALTER COLUMN {}", print_column_def(def)).unwrap();
        }
        AlterTableAction::SetColumnOptions { column, options } => {
            write!(
                out,
                "ALTER COLUMN {} SET OPTIONS ({})",
                quote_if_needed(column),
                print_option_list(options)
            )
            .unwrap();
        }
        AlterTableAction::SetColumnDefault { column, expression } => {
            write!(
                out,
                "ALTER COLUMN {} SET DEFAULT ({expression})",
                quote_if_needed(column)
            )
            .unwrap();
        }
        AlterTableAction::DropColumnDefault { column } => {
            write!(out, "ALTER COLUMN {} DROP DEFAULT", quote_if_needed(column)).unwrap();
        }
        AlterTableAction::AddConstraint(c) => {
            write!(out, "ADD {}", print_table_constraint(c)).unwrap();
        }
        AlterTableAction::DropConstraint { name } => {
            write!(out, "DROP CONSTRAINT {}", quote_if_needed(name)).unwrap();
        }
        AlterTableAction::AlterInterleaveOnDelete { on_delete } => {
            out.push_str("SET ON DELETE ");
            out.push_str(match on_delete {
                OnDelete::Cascade => "CASCADE",
                OnDelete::NoAction => "NO ACTION",
            });
        }
        AlterTableAction::AddRowDeletionPolicy(p) => {
            write!(
                out,
                "ADD ROW DELETION POLICY (OLDER_THAN({}, INTERVAL {} DAY))",
                quote_if_needed(&p.column),
                p.older_than_days
            )
            .unwrap();
        }
        AlterTableAction::ReplaceRowDeletionPolicy(p) => {
            write!(
                out,
                "REPLACE ROW DELETION POLICY (OLDER_THAN({}, INTERVAL {} DAY))",
                quote_if_needed(&p.column),
                p.older_than_days
            )
            .unwrap();
        }
        AlterTableAction::DropRowDeletionPolicy => {
            out.push_str("DROP ROW DELETION POLICY");
        }
    }
}

fn print_column_def(def: &ColumnDef) -> String {
    let mut s = format!("{} {}", quote_if_needed(&def.name), print_column_type(def));
    if !def.nullable {
        s.push_str(" NOT NULL");
    }
    if let Some(expr) = &def.expression {
        if def.is_stored_generated {
            write!(s, " AS ({expr}) STORED").unwrap();
        } else if def.has_default {
            write!(s, " DEFAULT ({expr})").unwrap();
        }
    }
    if !def.options.is_empty() {
        write!(s, " OPTIONS ({})", print_column_options(&def.options)).unwrap();
    }
    s
}

fn print_column_type(def: &ColumnDef) -> String {
    match &def.column_type {
        ColumnType::Array(scalar) => format!("ARRAY<{scalar}>"),
        ColumnType::Scalar(scalar) => match def.length {
            Some(Length::Max) => format!("{scalar}(MAX)"),
            Some(Length::Value(n)) => format!("{scalar}({n})"),
            None => scalar.to_string(),
        },
    }
}

fn print_column_options(options: &ColumnOptions) -> String {
    match options.allow_commit_timestamp {
        Some(Some(b)) => format!("allow_commit_timestamp = {b}"),
        Some(None) => "allow_commit_timestamp = NULL".to_string(),
        None => String::new(),
    }
}

fn print_option_list(options: &[OptionEntry]) -> String {
    options
        .iter()
        .map(|o| {
            let v = match &o.value {
                OptionValue::Bool(b) => b.to_string(),
                OptionValue::Null => "NULL".to_string(),
                OptionValue::Str(s) => format!("{s:?}"),
            };
            format!("{} = {v}", o.key)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_table_constraint(c: &Constraint) -> String {
    match c {
        Constraint::PrimaryKey { key_parts } => {
            format!("PRIMARY KEY ({})", print_key_parts(key_parts))
        }
        Constraint::Interleave { .. } => String::new(), // printed inline by the caller.
        Constraint::ForeignKey {
            constraint_name,
            referencing_columns,
            referenced_table,
            referenced_columns,
        } => {
            let mut s = String::new();
            if let Some(n) = constraint_name {
                write!(s, "CONSTRAINT {} ", quote_if_needed(n)).unwrap();
            }
            write!(
                s,
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                print_name_list(referencing_columns),
                quote_if_needed(referenced_table),
                print_name_list(referenced_columns),
            )
            .unwrap();
            s
        }
        Constraint::Check {
            constraint_name,
            sql_text,
        } => {
            let mut s = String::new();
            if let Some(n) = constraint_name {
                write!(s, "CONSTRAINT {} ", quote_if_needed(n)).unwrap();
            }
            write!(s, "CHECK ({sql_text})").unwrap();
            s
        }
    }
}

fn print_key_parts(parts: &[KeyPart]) -> String {
    parts
        .iter()
        .map(|kp| match kp.order {
            SortOrder::Asc => quote_if_needed(&kp.column),
            SortOrder::Desc => format!("{} DESC", quote_if_needed(&kp.column)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_name_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_if_needed(n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backtick-quotes a name only when it would not otherwise lex as a plain
/// identifier (spec §4.A); keeps the common case free of noise.
fn quote_if_needed(name: &str) -> String {
    let is_plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_plain {
        name.to_string()
    } else {
        format!("`{name}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureGates;
    use crate::parser::parse;

    fn gates() -> FeatureGates {
        FeatureGates::default()
    }

    fn round_trips(source: &str) {
        let stmt = parse(source, gates()).unwrap();
        let printed = print_statement(&stmt);
        let reparsed = parse(&printed, gates()).unwrap_or_else(|e| {
            panic!("printed text failed to re-parse: {printed:?}: {e}")
        });
        assert_eq!(stmt, reparsed, "round-trip mismatch for {source:?}");
    }

    #[test]
    fn create_table_round_trips() {
        round_trips("CREATE TABLE Users (UserId INT64 NOT NULL, Name STRING(MAX)) PRIMARY KEY (UserId)");
    }

    #[test]
    fn create_table_with_interleave_and_row_deletion_policy_round_trips() {
        round_trips(
            "CREATE TABLE T (K INT64 NOT NULL, CreatedAt TIMESTAMP) PRIMARY KEY (K), \
             INTERLEAVE IN PARENT Parent ON DELETE CASCADE, \
             ROW DELETION POLICY (OLDER_THAN(CreatedAt, INTERVAL 7 DAY))",
        );
    }

    #[test]
    fn create_index_round_trips() {
        round_trips("CREATE UNIQUE INDEX IdxName ON T (A, B DESC) STORING (C) INTERLEAVE IN Parent");
    }

    #[test]
    fn foreign_key_constraint_round_trips() {
        round_trips(
            "ALTER TABLE Child ADD CONSTRAINT FkName FOREIGN KEY (ParentId) REFERENCES Parent (Id)",
        );
    }

    #[test]
    fn check_constraint_round_trips() {
        round_trips("ALTER TABLE T ADD CHECK (B > 0)");
    }

    #[test]
    fn generated_column_round_trips() {
        round_trips("CREATE TABLE T (K INT64 NOT NULL, G INT64 AS (K + 1) STORED) PRIMARY KEY(K)");
    }

    #[test]
    fn quotes_names_that_are_not_plain_identifiers() {
        let stmt = parse("CREATE DATABASE `my-db`", gates()).unwrap();
        let printed = print_statement(&stmt);
        assert_eq!(printed, "CREATE DATABASE `my-db`");
    }

    #[test]
    fn drop_statements_round_trip() {
        round_trips("DROP TABLE T");
        round_trips("DROP INDEX Idx");
        round_trips("ANALYZE");
    }
}
