//! DDL parsing: token stream to schema-change description.

pub mod ast;
mod ddl;
mod expr_capture;

pub use ast::*;
pub use ddl::{parse, parse_create_database_name, split_statements};
