//! Schema node types: Table, Column, Index, ForeignKey, CheckConstraint,
//! RowDeletionPolicy (spec §4.C). Plain data plus back-reference handles —
//! no node ever holds another node directly.

use crate::parser::ast::{ColumnOptions, ColumnType, Length, OnDelete, SortOrder};

use super::arena::Handle;

pub type TableHandle = Handle<Table>;
pub type ColumnHandle = Handle<Column>;
pub type IndexHandle = Handle<Index>;
pub type ForeignKeyHandle = Handle<ForeignKey>;
pub type CheckConstraintHandle = Handle<CheckConstraint>;
pub type RowDeletionPolicyHandle = Handle<RowDeletionPolicy>;

/// Kind string + globalness flag, as every node must expose per spec §4.C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaNameInfo {
    pub kind: &'static str,
    pub is_global: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexKeyPart {
    pub column: ColumnHandle,
    pub order: SortOrder,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<ColumnHandle>,
    pub primary_key: Vec<IndexKeyPart>,
    pub interleave_parent: Option<TableHandle>,
    pub interleave_on_delete: OnDelete,
    pub foreign_keys: Vec<ForeignKeyHandle>,
    pub check_constraints: Vec<CheckConstraintHandle>,
    pub row_deletion_policy: Option<RowDeletionPolicyHandle>,
    /// Indexes this table owns: user-created indexes plus any managed
    /// backing indexes materialized for a foreign key, and (for a backing
    /// table) none — a backing table owns no indexes of its own.
    pub indexes: Vec<IndexHandle>,
    /// True for the synthetic backing table an [`Index`] owns. Backing
    /// tables are never user-addressable and never appear in name lookups.
    pub is_index_backing_table: bool,
}

impl Table {
    pub fn display_name(&self) -> String {
        self.name.clone()
    }

    pub fn schema_name_info(&self) -> SchemaNameInfo {
        SchemaNameInfo {
            kind: "Table",
            is_global: true,
        }
    }

    pub fn find_column(&self, name: &str, columns: &super::arena::Arena<Column>) -> Option<ColumnHandle> {
        self.columns
            .iter()
            .copied()
            .find(|h| columns.get(*h).name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub table: TableHandle,
    pub name: String,
    pub column_type: ColumnType,
    pub length: Option<Length>,
    pub nullable: bool,
    pub options: ColumnOptions,
    /// Verbatim `AS (...)` / `DEFAULT (...)` body, if any.
    pub expression: Option<String>,
    pub is_stored_generated: bool,
    pub has_default: bool,
}

impl Column {
    pub fn display_name(&self) -> String {
        self.name.clone()
    }

    pub fn schema_name_info(&self) -> SchemaNameInfo {
        SchemaNameInfo {
            kind: "Column",
            is_global: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Index {
    pub name: String,
    /// The user table this index is defined over.
    pub indexed_table: TableHandle,
    /// The synthetic table this index owns to hold its physical storage.
    pub backing_table: TableHandle,
    pub unique: bool,
    pub null_filtered: bool,
    pub key_parts: Vec<IndexKeyPart>,
    pub stored_columns: Vec<ColumnHandle>,
    pub interleave_parent: Option<TableHandle>,
    /// Created by the graph editor to back a foreign key, rather than
    /// directly by the user (spec §4.D, "Managed index policy").
    pub is_managed: bool,
}

impl Index {
    pub fn display_name(&self) -> String {
        self.name.clone()
    }

    pub fn schema_name_info(&self) -> SchemaNameInfo {
        SchemaNameInfo {
            kind: "Index",
            is_global: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    /// User-supplied if given; otherwise engine-assigned once on creation
    /// and stable across clones (spec §4.C).
    pub name: String,
    pub name_is_generated: bool,
    pub referencing_table: TableHandle,
    pub referencing_columns: Vec<ColumnHandle>,
    pub referenced_table: TableHandle,
    pub referenced_columns: Vec<ColumnHandle>,
    /// Managed backing index on the referencing side, present only when no
    /// existing index already covers the referencing columns.
    pub referencing_index: Option<IndexHandle>,
    /// Managed backing index on the referenced side, present only when the
    /// referenced table's primary key does not already cover the columns.
    pub referenced_index: Option<IndexHandle>,
}

impl ForeignKey {
    pub fn display_name(&self) -> String {
        self.name.clone()
    }

    pub fn schema_name_info(&self) -> SchemaNameInfo {
        SchemaNameInfo {
            kind: "ForeignKey",
            is_global: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckConstraint {
    pub name: Option<String>,
    pub name_is_generated: bool,
    pub table: TableHandle,
    pub sql_text: String,
}

impl CheckConstraint {
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    pub fn schema_name_info(&self) -> SchemaNameInfo {
        SchemaNameInfo {
            kind: "CheckConstraint",
            is_global: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowDeletionPolicy {
    pub table: TableHandle,
    pub column: ColumnHandle,
    pub older_than_days: i128,
}

impl RowDeletionPolicy {
    pub fn display_name(&self) -> String {
        "RowDeletionPolicy".to_string()
    }

    pub fn schema_name_info(&self) -> SchemaNameInfo {
        SchemaNameInfo {
            kind: "RowDeletionPolicy",
            is_global: false,
        }
    }
}
