//! Schema-change description produced by the DDL parser.
//!
//! Shaped to match the external admin schema field-for-field (spec §6):
//! variant names and field names here are the contract, not an internal
//! convenience layer, so they are not renamed or restructured even where a
//! more "natural" Rust shape would differ.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    CreateDatabase {
        name: String,
    },
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
        constraints: Vec<Constraint>,
        row_deletion_policy: Option<RowDeletionPolicy>,
    },
    CreateIndex {
        name: String,
        table: String,
        null_filtered: bool,
        unique: bool,
        key_parts: Vec<KeyPart>,
        stored_columns: Vec<String>,
        interleave_parent: Option<String>,
    },
    AlterTable {
        table: String,
        action: AlterTableAction,
    },
    DropTable {
        name: String,
    },
    DropIndex {
        name: String,
    },
    Analyze,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterTableAction {
    AddColumn(ColumnDef),
    DropColumn {
        name: String,
    },
    AlterColumn(ColumnDef),
    SetColumnOptions {
        column: String,
        options: Vec<OptionEntry>,
    },
    SetColumnDefault {
        column: String,
        expression: String,
    },
    DropColumnDefault {
        column: String,
    },
    AddConstraint(Constraint),
    DropConstraint {
        name: String,
    },
    AlterInterleaveOnDelete {
        on_delete: OnDelete,
    },
    AddRowDeletionPolicy(RowDeletionPolicy),
    ReplaceRowDeletionPolicy(RowDeletionPolicy),
    DropRowDeletionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Int64,
    String,
    Bytes,
    Bool,
    Float64,
    Timestamp,
    Date,
    Numeric,
    Json,
}

impl ScalarType {
    /// STRING and BYTES carry a length; every other scalar does not.
    pub fn allows_length(&self) -> bool {
        matches!(self, ScalarType::String | ScalarType::Bytes)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarType::Int64 => "INT64",
            ScalarType::String => "STRING",
            ScalarType::Bytes => "BYTES",
            ScalarType::Bool => "BOOL",
            ScalarType::Float64 => "FLOAT64",
            ScalarType::Timestamp => "TIMESTAMP",
            ScalarType::Date => "DATE",
            ScalarType::Numeric => "NUMERIC",
            ScalarType::Json => "JSON",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Scalar(s) => write!(f, "{s}"),
            ColumnType::Array(s) => write!(f, "ARRAY<{s}>"),
        }
    }
}

/// STRING/BYTES length: either a concrete positive integer or the `MAX` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Length {
    Max,
    Value(i128),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnOptions {
    pub allow_commit_timestamp: Option<Option<bool>>,
}

impl ColumnOptions {
    pub fn is_empty(&self) -> bool {
        self.allow_commit_timestamp.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub key: String,
    pub value: OptionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    Bool(bool),
    Null,
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    pub length: Option<Length>,
    pub nullable: bool,
    pub options: ColumnOptions,
    /// Verbatim text between the outer parens of `AS (...)` / `DEFAULT (...)`.
    pub expression: Option<String>,
    pub is_stored_generated: bool,
    pub has_default: bool,
}

impl ColumnDef {
    pub fn is_generated_or_default(&self) -> bool {
        self.expression.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPart {
    pub column: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterleaveType {
    InParent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDelete {
    NoAction,
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    PrimaryKey {
        key_parts: Vec<KeyPart>,
    },
    Interleave {
        parent: String,
        interleave_type: InterleaveType,
        on_delete: OnDelete,
    },
    ForeignKey {
        constraint_name: Option<String>,
        referencing_columns: Vec<String>,
        referenced_table: String,
        referenced_columns: Vec<String>,
    },
    Check {
        constraint_name: Option<String>,
        sql_text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowDeletionPolicy {
    pub column: String,
    pub older_than_days: i128,
}
