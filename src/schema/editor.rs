//! The schema graph editor: transcribe → rewrite → apply (spec §4.D).
//!
//! Clone the accumulated state, then fold one change through it, the same
//! discipline a single-pass migration replay uses — generalized here to a
//! full graph clone instead of one table map, because schema nodes carry
//! back-edges that a shallow field copy would leave pointing at the old
//! arena.
//!
//! Handles are bare arena indices (see [`super::arena`]), so a node cloned
//! into a fresh arena in the same relative order keeps working only as long
//! as nothing is ever dropped. Once a statement can remove a table or
//! column, indices drift, so every change to the committed schema goes
//! through a full rebuild: every live node is cloned into a brand new set of
//! arenas (`transcribe`), an old-handle → new-handle map is built alongside,
//! and every back-edge is rewritten through that map (`rewrite`) before the
//! requested change is folded in (`apply`).

use std::collections::HashMap;

use crate::parser::ast::{
    AlterTableAction, Constraint, InterleaveType, RowDeletionPolicy as RowDeletionPolicyDef,
    Statement,
};
use crate::status::Status;

use super::arena::Handle;
use super::nodes::{
    CheckConstraint, Column, ForeignKey, Index, IndexKeyPart, RowDeletionPolicy, Table,
};
use super::Schema;

/// Applies a single schema-change description to `schema`, returning the
/// resulting candidate. The caller (see [`crate::schema::validator::validate`]
/// via [`apply_one`]) is responsible for validating the candidate before
/// treating it as committed.
struct Editor<'a> {
    old: &'a Schema,
    new: Schema,
    table_map: HashMap<Handle<Table>, Handle<Table>>,
    column_map: HashMap<Handle<Column>, Handle<Column>>,
    index_map: HashMap<Handle<Index>, Handle<Index>>,
    fk_map: HashMap<Handle<ForeignKey>, Handle<ForeignKey>>,
    check_map: HashMap<Handle<CheckConstraint>, Handle<CheckConstraint>>,
    rdp_map: HashMap<Handle<RowDeletionPolicy>, Handle<RowDeletionPolicy>>,
    fk_name_counter: usize,
}

impl<'a> Editor<'a> {
    /// Phase 1 — transcribe: shallow-clone every live node into fresh
    /// arenas, recording the old→new handle for each.
    fn transcribe(old: &'a Schema) -> Self {
        let mut new = Schema::empty();
        let mut table_map = HashMap::new();
        let mut column_map = HashMap::new();
        let mut index_map = HashMap::new();
        let mut fk_map = HashMap::new();
        let mut check_map = HashMap::new();
        let mut rdp_map = HashMap::new();

        for (h, t) in old.tables.iter() {
            table_map.insert(h, new.tables.insert(t.clone()));
        }
        for (h, c) in old.columns.iter() {
            column_map.insert(h, new.columns.insert(c.clone()));
        }
        for (h, i) in old.indexes.iter() {
            index_map.insert(h, new.indexes.insert(i.clone()));
        }
        for (h, f) in old.foreign_keys.iter() {
            fk_map.insert(h, new.foreign_keys.insert(f.clone()));
        }
        for (h, c) in old.check_constraints.iter() {
            check_map.insert(h, new.check_constraints.insert(c.clone()));
        }
        for (h, r) in old.row_deletion_policies.iter() {
            rdp_map.insert(h, new.row_deletion_policies.insert(r.clone()));
        }

        let mut editor = Editor {
            old,
            new,
            table_map,
            column_map,
            index_map,
            fk_map,
            check_map,
            rdp_map,
            fk_name_counter: 0,
        };
        editor.rewrite();
        editor.carry_name_maps();
        editor
    }

    /// Phase 2 — rewrite: every cloned node still points at handles from
    /// `old`; look each one up in the maps built during transcribe and
    /// replace it with the corresponding handle in `new`. A lookup miss
    /// means the original graph itself was inconsistent — every live node
    /// was transcribed, so every back-edge must resolve.
    fn rewrite(&mut self) {
        for h in self.new.tables.handles() {
            let (columns, interleave_parent, foreign_keys, checks, rdp, indexes) = {
                let t = self.new.tables.get(h);
                (
                    t.columns.clone(),
                    t.interleave_parent,
                    t.foreign_keys.clone(),
                    t.check_constraints.clone(),
                    t.row_deletion_policy,
                    t.indexes.clone(),
                )
            };
            let new_columns = columns.iter().map(|c| self.map_column(*c)).collect();
            let new_parent = interleave_parent.map(|p| self.map_table(p));
            let new_fks = foreign_keys.iter().map(|f| self.map_fk(*f)).collect();
            let new_checks = checks.iter().map(|c| self.map_check(*c)).collect();
            let new_rdp = rdp.map(|r| self.map_rdp(r));
            let new_indexes = indexes.iter().map(|i| self.map_index(*i)).collect();

            let t = self.new.tables.get_mut(h);
            t.columns = new_columns;
            t.interleave_parent = new_parent;
            t.foreign_keys = new_fks;
            t.check_constraints = new_checks;
            t.row_deletion_policy = new_rdp;
            t.indexes = new_indexes;
        }

        for h in self.new.columns.handles() {
            let table = self.new.columns.get(h).table;
            self.new.columns.get_mut(h).table = self.map_table(table);
        }

        for h in self.new.indexes.handles() {
            let (indexed, backing, parent, key_parts, stored) = {
                let i = self.new.indexes.get(h);
                (
                    i.indexed_table,
                    i.backing_table,
                    i.interleave_parent,
                    i.key_parts.clone(),
                    i.stored_columns.clone(),
                )
            };
            let new_key_parts = key_parts
                .into_iter()
                .map(|kp| IndexKeyPart {
                    column: self.map_column(kp.column),
                    order: kp.order,
                })
                .collect();
            let new_stored = stored.iter().map(|c| self.map_column(*c)).collect();
            let i = self.new.indexes.get_mut(h);
            i.indexed_table = self.map_table(indexed);
            i.backing_table = self.map_table(backing);
            i.interleave_parent = parent.map(|p| self.map_table(p));
            i.key_parts = new_key_parts;
            i.stored_columns = new_stored;
        }

        for h in self.new.foreign_keys.handles() {
            let fk = self.new.foreign_keys.get(h).clone();
            let rewritten = ForeignKey {
                name: fk.name,
                name_is_generated: fk.name_is_generated,
                referencing_table: self.map_table(fk.referencing_table),
                referencing_columns: fk
                    .referencing_columns
                    .iter()
                    .map(|c| self.map_column(*c))
                    .collect(),
                referenced_table: self.map_table(fk.referenced_table),
                referenced_columns: fk
                    .referenced_columns
                    .iter()
                    .map(|c| self.map_column(*c))
                    .collect(),
                referencing_index: fk.referencing_index.map(|i| self.map_index(i)),
                referenced_index: fk.referenced_index.map(|i| self.map_index(i)),
            };
            *self.new.foreign_keys.get_mut(h) = rewritten;
        }

        for h in self.new.check_constraints.handles() {
            let table = self.new.check_constraints.get(h).table;
            self.new.check_constraints.get_mut(h).table = self.map_table(table);
        }

        for h in self.new.row_deletion_policies.handles() {
            let (table, column) = {
                let r = self.new.row_deletion_policies.get(h);
                (r.table, r.column)
            };
            let r = self.new.row_deletion_policies.get_mut(h);
            r.table = self.map_table(table);
            r.column = self.map_column(column);
        }
    }

    fn carry_name_maps(&mut self) {
        for (name, h) in &self.old.table_names {
            self.new.table_names.insert(name.clone(), self.map_table(*h));
        }
        for (name, h) in &self.old.index_names {
            self.new.index_names.insert(name.clone(), self.map_index(*h));
        }
    }

    fn map_table(&self, h: Handle<Table>) -> Handle<Table> {
        *self
            .table_map
            .get(&h)
            .expect("every live table was transcribed before rewrite")
    }

    fn map_column(&self, h: Handle<Column>) -> Handle<Column> {
        *self
            .column_map
            .get(&h)
            .expect("every live column was transcribed before rewrite")
    }

    fn map_index(&self, h: Handle<Index>) -> Handle<Index> {
        *self
            .index_map
            .get(&h)
            .expect("every live index was transcribed before rewrite")
    }

    fn map_fk(&self, h: Handle<ForeignKey>) -> Handle<ForeignKey> {
        *self
            .fk_map
            .get(&h)
            .expect("every live foreign key was transcribed before rewrite")
    }

    fn map_check(&self, h: Handle<CheckConstraint>) -> Handle<CheckConstraint> {
        *self
            .check_map
            .get(&h)
            .expect("every live check constraint was transcribed before rewrite")
    }

    fn map_rdp(&self, h: Handle<RowDeletionPolicy>) -> Handle<RowDeletionPolicy> {
        *self
            .rdp_map
            .get(&h)
            .expect("every live row deletion policy was transcribed before rewrite")
    }

    // ---- phase 3: apply ----------------------------------------------------

    fn apply(&mut self, statement: &Statement) -> Result<(), Status> {
        match statement {
            Statement::CreateDatabase { .. } => Err(Status::invalid_argument(
                "CREATE DATABASE cannot be applied as a schema update.",
            )),
            Statement::CreateTable {
                name,
                columns,
                constraints,
                row_deletion_policy,
            } => self.create_table(name, columns, constraints, row_deletion_policy.as_ref()),
            Statement::CreateIndex {
                name,
                table,
                null_filtered,
                unique,
                key_parts,
                stored_columns,
                interleave_parent,
            } => self.create_index(
                name,
                table,
                *null_filtered,
                *unique,
                key_parts,
                stored_columns,
                interleave_parent.as_deref(),
            ),
            Statement::AlterTable { table, action } => self.alter_table(table, action),
            Statement::DropTable { name } => self.drop_table(name),
            Statement::DropIndex { name } => self.drop_index(name),
            Statement::Analyze => Ok(()),
        }
    }

    fn require_table(&self, name: &str) -> Result<Handle<Table>, Status> {
        self.new
            .find_table(name)
            .ok_or_else(|| Status::invalid_argument(format!("Table not found: {name}")))
    }

    fn find_column(&self, table: Handle<Table>, name: &str) -> Result<Handle<Column>, Status> {
        self.new
            .tables
            .get(table)
            .find_column(name, &self.new.columns)
            .ok_or_else(|| Status::invalid_argument(format!("Column not found: {name}")))
    }

    fn create_table(
        &mut self,
        name: &str,
        columns: &[crate::parser::ast::ColumnDef],
        constraints: &[Constraint],
        row_deletion_policy: &Option<RowDeletionPolicyDef>,
    ) -> Result<(), Status> {
        if self.new.find_table(name).is_some() {
            tracing::warn!(table = name, "CREATE TABLE rejected: name already in schema");
            return Err(Status::invalid_argument(format!(
                "Duplicate name in schema: {name}"
            )));
        }

        let table_handle = self.new.tables.insert(Table {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            interleave_parent: None,
            interleave_on_delete: crate::parser::ast::OnDelete::NoAction,
            foreign_keys: Vec::new(),
            check_constraints: Vec::new(),
            row_deletion_policy: None,
            indexes: Vec::new(),
            is_index_backing_table: false,
        });
        self.new.table_names.insert(name.to_string(), table_handle);

        let mut column_handles = Vec::new();
        for def in columns {
            let h = self.new.columns.insert(column_from_def(table_handle, def));
            column_handles.push(h);
        }
        self.new.tables.get_mut(table_handle).columns = column_handles;

        for constraint in constraints {
            self.add_constraint(table_handle, constraint)?;
        }

        if let Some(policy) = row_deletion_policy {
            self.set_row_deletion_policy(table_handle, policy, true)?;
        }

        Ok(())
    }

    fn add_constraint(
        &mut self,
        table_handle: Handle<Table>,
        constraint: &Constraint,
    ) -> Result<(), Status> {
        match constraint {
            Constraint::PrimaryKey { key_parts } => {
                let mut parts = Vec::new();
                for kp in key_parts {
                    let column = self.find_column(table_handle, &kp.column)?;
                    parts.push(IndexKeyPart {
                        column,
                        order: kp.order,
                    });
                }
                self.new.tables.get_mut(table_handle).primary_key = parts;
                Ok(())
            }
            Constraint::Interleave {
                parent,
                interleave_type: InterleaveType::InParent,
                on_delete,
            } => {
                let parent_handle = self.require_table(parent)?;
                let t = self.new.tables.get_mut(table_handle);
                t.interleave_parent = Some(parent_handle);
                t.interleave_on_delete = *on_delete;
                Ok(())
            }
            Constraint::ForeignKey {
                constraint_name,
                referencing_columns,
                referenced_table,
                referenced_columns,
            } => self.add_foreign_key(
                table_handle,
                constraint_name.as_deref(),
                referencing_columns,
                referenced_table,
                referenced_columns,
            ),
            Constraint::Check {
                constraint_name,
                sql_text,
            } => {
                let name = constraint_name.clone();
                let name_is_generated = name.is_none();
                let handle = self.new.check_constraints.insert(CheckConstraint {
                    name,
                    name_is_generated,
                    table: table_handle,
                    sql_text: sql_text.clone(),
                });
                self.new
                    .tables
                    .get_mut(table_handle)
                    .check_constraints
                    .push(handle);
                Ok(())
            }
        }
    }

    fn add_foreign_key(
        &mut self,
        referencing_table: Handle<Table>,
        constraint_name: Option<&str>,
        referencing_column_names: &[String],
        referenced_table_name: &str,
        referenced_column_names: &[String],
    ) -> Result<(), Status> {
        let referenced_table = self.require_table(referenced_table_name)?;

        let mut referencing_columns = Vec::new();
        for name in referencing_column_names {
            referencing_columns.push(self.find_column(referencing_table, name)?);
        }
        let mut referenced_columns = Vec::new();
        for name in referenced_column_names {
            referenced_columns.push(self.find_column(referenced_table, name)?);
        }

        let (name, name_is_generated) = match constraint_name {
            Some(n) => (n.to_string(), false),
            None => {
                let n = format!(
                    "FK_{}_{}_{}",
                    self.new.tables.get(referencing_table).name,
                    self.new.tables.get(referenced_table).name,
                    self.fk_name_counter
                );
                self.fk_name_counter += 1;
                (n, true)
            }
        };

        let referencing_index = self.managed_index_for(
            referencing_table,
            &referencing_columns,
            /* unique */ false,
        );
        let referenced_index =
            self.managed_index_for(referenced_table, &referenced_columns, /* unique */ true);

        let fk_handle = self.new.foreign_keys.insert(ForeignKey {
            name,
            name_is_generated,
            referencing_table,
            referencing_columns,
            referenced_table,
            referenced_columns,
            referencing_index,
            referenced_index,
        });
        self.new
            .tables
            .get_mut(referencing_table)
            .foreign_keys
            .push(fk_handle);
        Ok(())
    }

    /// Managed backing index policy (spec §4.D): only materialize a new
    /// index when no existing index, or the table's own primary key,
    /// already covers `columns` as a prefix.
    fn managed_index_for(
        &mut self,
        table: Handle<Table>,
        columns: &[Handle<Column>],
        require_unique: bool,
    ) -> Option<Handle<Index>> {
        if columns.is_empty() {
            return None;
        }
        if self.covered_by_primary_key(table, columns, require_unique) {
            return None;
        }
        if self.covered_by_existing_index(table, columns, require_unique) {
            return None;
        }

        let index_name = format!(
            "IDX_{}_{}_{}",
            self.new.tables.get(table).name,
            columns.len(),
            self.new.indexes.len()
        );
        tracing::debug!(
            table = self.new.tables.get(table).name,
            index = index_name,
            "materializing managed backing index for foreign key"
        );
        Some(self.create_index_internal(
            &index_name,
            table,
            false,
            require_unique,
            columns.iter().map(|c| (*c, crate::parser::ast::SortOrder::Asc)).collect(),
            Vec::new(),
            None,
            true,
        ))
    }

    fn covered_by_primary_key(
        &self,
        table: Handle<Table>,
        columns: &[Handle<Column>],
        require_unique: bool,
    ) -> bool {
        let pk = &self.new.tables.get(table).primary_key;
        if require_unique && pk.len() != columns.len() {
            return false;
        }
        if pk.len() < columns.len() {
            return false;
        }
        pk.iter()
            .zip(columns.iter())
            .all(|(kp, c)| kp.column == *c)
    }

    fn covered_by_existing_index(
        &self,
        table: Handle<Table>,
        columns: &[Handle<Column>],
        require_unique: bool,
    ) -> bool {
        self.new
            .tables
            .get(table)
            .indexes
            .iter()
            .any(|ih| {
                let idx = self.new.indexes.get(*ih);
                if require_unique && !idx.unique {
                    return false;
                }
                idx.key_parts.len() >= columns.len()
                    && idx
                        .key_parts
                        .iter()
                        .zip(columns.iter())
                        .all(|(kp, c)| kp.column == *c)
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn create_index_internal(
        &mut self,
        name: &str,
        indexed_table: Handle<Table>,
        null_filtered: bool,
        unique: bool,
        key_parts: Vec<(Handle<Column>, crate::parser::ast::SortOrder)>,
        stored_columns: Vec<Handle<Column>>,
        interleave_parent: Option<Handle<Table>>,
        is_managed: bool,
    ) -> Handle<Index> {
        let backing_table = self.new.tables.insert(Table {
            name: format!("{name}$backing"),
            columns: Vec::new(),
            primary_key: Vec::new(),
            interleave_parent: None,
            interleave_on_delete: crate::parser::ast::OnDelete::NoAction,
            foreign_keys: Vec::new(),
            check_constraints: Vec::new(),
            row_deletion_policy: None,
            indexes: Vec::new(),
            is_index_backing_table: true,
        });

        let index_handle = self.new.indexes.insert(Index {
            name: name.to_string(),
            indexed_table,
            backing_table,
            unique,
            null_filtered,
            key_parts: key_parts
                .into_iter()
                .map(|(column, order)| IndexKeyPart { column, order })
                .collect(),
            stored_columns,
            interleave_parent,
            is_managed,
        });

        self.new.index_names.insert(name.to_string(), index_handle);
        self.new
            .tables
            .get_mut(indexed_table)
            .indexes
            .push(index_handle);
        index_handle
    }

    fn create_index(
        &mut self,
        name: &str,
        table: &str,
        null_filtered: bool,
        unique: bool,
        key_parts: &[crate::parser::ast::KeyPart],
        stored_columns: &[String],
        interleave_parent: Option<&str>,
    ) -> Result<(), Status> {
        if self.new.find_index(name).is_some() {
            return Err(Status::invalid_argument(format!(
                "Duplicate name in schema: {name}"
            )));
        }
        let indexed_table = self.require_table(table)?;
        let mut parts = Vec::new();
        for kp in key_parts {
            let column = self.find_column(indexed_table, &kp.column)?;
            parts.push((column, kp.order));
        }
        let mut stored = Vec::new();
        for name in stored_columns {
            stored.push(self.find_column(indexed_table, name)?);
        }
        let parent = interleave_parent.map(|p| self.require_table(p)).transpose()?;

        self.create_index_internal(
            name,
            indexed_table,
            null_filtered,
            unique,
            parts,
            stored,
            parent,
            false,
        );
        Ok(())
    }

    fn drop_index(&mut self, name: &str) -> Result<(), Status> {
        let handle = self
            .new
            .find_index(name)
            .ok_or_else(|| Status::invalid_argument(format!("Index not found: {name}")))?;
        let idx = self.new.indexes.get(handle);
        if idx.is_managed {
            return Err(Status::invalid_argument(format!(
                "Cannot drop managed index: {name}"
            )));
        }
        let indexed_table = idx.indexed_table;
        self.new.index_names.remove(name);
        self.new
            .tables
            .get_mut(indexed_table)
            .indexes
            .retain(|h| *h != handle);
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<(), Status> {
        let handle = self.require_table(name)?;
        let table = self.new.tables.get(handle).clone();
        for index_handle in &table.indexes {
            let index_name = self.new.indexes.get(*index_handle).name.clone();
            self.new.index_names.remove(&index_name);
        }
        self.new.table_names.remove(name);
        Ok(())
    }

    fn alter_table(&mut self, table: &str, action: &AlterTableAction) -> Result<(), Status> {
        let table_handle = self.require_table(table)?;
        match action {
            AlterTableAction::AddColumn(def) => {
                if self.find_column(table_handle, &def.name).is_ok() {
                    return Err(Status::invalid_argument(format!(
                        "Duplicate column name: {}",
                        def.name
                    )));
                }
                let h = self.new.columns.insert(column_from_def(table_handle, def));
                self.new.tables.get_mut(table_handle).columns.push(h);
                Ok(())
            }
            AlterTableAction::DropColumn { name } => {
                let h = self.find_column(table_handle, name)?;
                self.new
                    .tables
                    .get_mut(table_handle)
                    .columns
                    .retain(|c| *c != h);
                Ok(())
            }
            AlterTableAction::AlterColumn(def) => {
                let h = self.find_column(table_handle, &def.name)?;
                let col = self.new.columns.get_mut(h);
                col.column_type = def.column_type.clone();
                col.length = def.length;
                col.nullable = def.nullable;
                if def.expression.is_some() {
                    col.expression = def.expression.clone();
                    col.is_stored_generated = def.is_stored_generated;
                    col.has_default = def.has_default;
                }
                Ok(())
            }
            AlterTableAction::SetColumnOptions { column, options } => {
                let h = self.find_column(table_handle, column)?;
                let parsed = crate::parser::ast::ColumnOptions {
                    allow_commit_timestamp: options
                        .iter()
                        .find(|o| o.key.eq_ignore_ascii_case("allow_commit_timestamp"))
                        .map(|o| match &o.value {
                            crate::parser::ast::OptionValue::Bool(b) => Some(*b),
                            crate::parser::ast::OptionValue::Null => None,
                            crate::parser::ast::OptionValue::Str(_) => None,
                        }),
                };
                self.new.columns.get_mut(h).options = parsed;
                Ok(())
            }
            AlterTableAction::SetColumnDefault { column, expression } => {
                let h = self.find_column(table_handle, column)?;
                let col = self.new.columns.get_mut(h);
                col.expression = Some(expression.clone());
                col.has_default = true;
                col.is_stored_generated = false;
                Ok(())
            }
            AlterTableAction::DropColumnDefault { column } => {
                let h = self.find_column(table_handle, column)?;
                let col = self.new.columns.get_mut(h);
                col.expression = None;
                col.has_default = false;
                Ok(())
            }
            AlterTableAction::AddConstraint(constraint) => {
                self.add_constraint(table_handle, constraint)
            }
            AlterTableAction::DropConstraint { name } => self.drop_constraint(table_handle, name),
            AlterTableAction::AlterInterleaveOnDelete { on_delete } => {
                self.new.tables.get_mut(table_handle).interleave_on_delete = *on_delete;
                Ok(())
            }
            AlterTableAction::AddRowDeletionPolicy(policy) => {
                self.set_row_deletion_policy(table_handle, policy, true)
            }
            AlterTableAction::ReplaceRowDeletionPolicy(policy) => {
                self.set_row_deletion_policy(table_handle, policy, false)
            }
            AlterTableAction::DropRowDeletionPolicy => {
                if self.new.tables.get(table_handle).row_deletion_policy.is_none() {
                    return Err(Status::failed_precondition(format!(
                        "Table {table} has no row deletion policy to drop."
                    )));
                }
                self.new.tables.get_mut(table_handle).row_deletion_policy = None;
                Ok(())
            }
        }
    }

    fn drop_constraint(
        &mut self,
        table_handle: Handle<Table>,
        name: &str,
    ) -> Result<(), Status> {
        let t = self.new.tables.get(table_handle).clone();
        if let Some(fk_h) = t
            .foreign_keys
            .iter()
            .find(|h| self.new.foreign_keys.get(**h).name.eq_ignore_ascii_case(name))
            .copied()
        {
            self.new
                .tables
                .get_mut(table_handle)
                .foreign_keys
                .retain(|h| *h != fk_h);
            return Ok(());
        }
        if let Some(check_h) = t
            .check_constraints
            .iter()
            .find(|h| {
                self.new
                    .check_constraints
                    .get(**h)
                    .name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .copied()
        {
            self.new
                .tables
                .get_mut(table_handle)
                .check_constraints
                .retain(|h| *h != check_h);
            return Ok(());
        }
        Err(Status::invalid_argument(format!(
            "Constraint not found: {name}"
        )))
    }

    fn set_row_deletion_policy(
        &mut self,
        table_handle: Handle<Table>,
        policy: &RowDeletionPolicyDef,
        must_be_absent: bool,
    ) -> Result<(), Status> {
        if must_be_absent && self.new.tables.get(table_handle).row_deletion_policy.is_some() {
            return Err(Status::failed_precondition(
                "A row deletion policy already exists on this table.",
            ));
        }
        let column = self.find_column(table_handle, &policy.column)?;
        let handle = self.new.row_deletion_policies.insert(RowDeletionPolicy {
            table: table_handle,
            column,
            older_than_days: policy.older_than_days,
        });
        self.new.tables.get_mut(table_handle).row_deletion_policy = Some(handle);
        Ok(())
    }
}

fn column_from_def(table: Handle<Table>, def: &crate::parser::ast::ColumnDef) -> Column {
    Column {
        table,
        name: def.name.clone(),
        column_type: def.column_type.clone(),
        length: def.length,
        nullable: def.nullable,
        options: def.options.clone(),
        expression: def.expression.clone(),
        is_stored_generated: def.is_stored_generated,
        has_default: def.has_default,
    }
}

/// Applies one schema-change statement to `schema`, validates the result,
/// and returns the candidate on success. The current schema is returned
/// unchanged on any failure (spec §2, "on failure the change is rejected
/// ... current schema is unchanged").
pub fn apply_one(schema: &Schema, statement: &Statement) -> Result<Schema, Status> {
    let mut editor = Editor::transcribe(schema);
    editor.apply(statement)?;
    let candidate = editor.new;
    super::validator::validate(&candidate, Some(schema))?;
    Ok(candidate)
}

/// Applies a sequence of statements strictly in order (spec §5, "Ordering"):
/// the candidate after statement *k* is the input to statement *k+1*.
///
/// Returns the schema reached after the last successfully applied
/// statement, the count of statements that committed, and the error (if
/// any) that stopped the sequence short — mirroring `UpdateDatabaseDdl`'s
/// partial-failure contract (spec §6).
pub fn apply_sequence(
    schema: &Schema,
    statements: &[Statement],
) -> (Schema, usize, Option<Status>) {
    let mut current = schema.clone();
    for (i, statement) in statements.iter().enumerate() {
        match apply_one(&current, statement) {
            Ok(next) => current = next,
            Err(err) => return (current, i, Some(err)),
        }
    }
    (current, statements.len(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureGates;

    fn apply_text(schema: &Schema, text: &str) -> Result<Schema, Status> {
        let stmt = crate::parser::parse(text, FeatureGates::default())?;
        apply_one(schema, &stmt)
    }

    #[test]
    fn create_table_then_add_column() {
        let schema = Schema::empty();
        let schema = apply_text(
            &schema,
            "CREATE TABLE Users (UserId INT64 NOT NULL) PRIMARY KEY (UserId)",
        )
        .unwrap();
        let schema = apply_text(&schema, "ALTER TABLE Users ADD COLUMN Name STRING(MAX)").unwrap();

        let table = schema.tables.get(schema.find_table("Users").unwrap());
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn drop_table_removes_it_from_lookup() {
        let schema = Schema::empty();
        let schema = apply_text(
            &schema,
            "CREATE TABLE Users (UserId INT64 NOT NULL) PRIMARY KEY (UserId)",
        )
        .unwrap();
        let schema = apply_text(&schema, "DROP TABLE Users").unwrap();
        assert!(schema.find_table("Users").is_none());
    }

    #[test]
    fn foreign_key_materializes_managed_index_when_uncovered() {
        let schema = Schema::empty();
        let schema = apply_text(
            &schema,
            "CREATE TABLE Parent (Id INT64 NOT NULL) PRIMARY KEY (Id)",
        )
        .unwrap();
        let schema = apply_text(
            &schema,
            "CREATE TABLE Child (Id INT64 NOT NULL, ParentId INT64 NOT NULL) PRIMARY KEY (Id)",
        )
        .unwrap();
        let schema = apply_text(
            &schema,
            "ALTER TABLE Child ADD CONSTRAINT FkChildParent FOREIGN KEY (ParentId) REFERENCES Parent (Id)",
        )
        .unwrap();

        let child = schema.tables.get(schema.find_table("Child").unwrap());
        let fk = schema.foreign_keys.get(child.foreign_keys[0]);
        assert!(fk.referencing_index.is_some());
        // Parent.Id is already the primary key, so no managed index needed there.
        assert!(fk.referenced_index.is_none());
    }

    #[test]
    fn sequence_stops_at_first_failure_and_reports_count() {
        let schema = Schema::empty();
        let statements = vec![
            crate::parser::parse(
                "CREATE TABLE T (K INT64 NOT NULL) PRIMARY KEY (K)",
                FeatureGates::default(),
            )
            .unwrap(),
            crate::parser::parse("DROP TABLE DoesNotExist", FeatureGates::default()).unwrap(),
        ];
        let (schema, applied, err) = apply_sequence(&schema, &statements);
        assert_eq!(applied, 1);
        assert!(err.is_some());
        assert!(schema.find_table("T").is_some());
    }
}
