//! The schema graph: node arenas, the graph editor, and the validator.
//!
//! Mirrors the shape of a compiler's symbol table — name maps alongside the
//! arenas they index into, the same structure a migration tool's table/index
//! registry uses — generalized here to the handle-addressed node graph
//! (spec §9).

pub mod arena;
pub mod editor;
pub mod nodes;
pub mod validator;

use std::collections::HashMap;

use arena::Arena;
use nodes::{
    CheckConstraint, Column, ForeignKey, Index, RowDeletionPolicy, Table, TableHandle,
};

/// A committed or candidate schema: every table, column, index, foreign
/// key, check constraint, and row-deletion policy that currently exists.
///
/// Schemas are immutable once committed (spec §3, "Lifecycle"); the editor
/// always produces a fresh [`Schema`] rather than mutating a live one.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: Arena<Table>,
    pub columns: Arena<Column>,
    pub indexes: Arena<Index>,
    pub foreign_keys: Arena<ForeignKey>,
    pub check_constraints: Arena<CheckConstraint>,
    pub row_deletion_policies: Arena<RowDeletionPolicy>,

    /// User-addressable table names. Excludes index backing tables.
    pub table_names: HashMap<String, TableHandle>,
    pub index_names: HashMap<String, nodes::IndexHandle>,
}

impl Schema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn find_table(&self, name: &str) -> Option<TableHandle> {
        self.table_names
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, h)| *h)
    }

    pub fn find_index(&self, name: &str) -> Option<nodes::IndexHandle> {
        self.index_names
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, h)| *h)
    }
}
