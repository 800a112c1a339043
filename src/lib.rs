//! ddl-emulator-core: the DDL-facing core of an in-process emulator for a
//! managed relational database service.
//!
//! This crate covers the two tightly-coupled subsystems where the real
//! engineering lives (spec §1): a lexer and recursive-descent parser for the
//! service's DDL dialect ([`lexer`], [`parser`]), and a schema graph with a
//! graph editor, validator, and operation tracker ([`schema`],
//! [`operations`]). The query/execution engine, storage layer, gRPC
//! transport, admin resource-URI namespace, authentication, and metrics are
//! external collaborators this crate is consumed by, not parts of it.

pub mod config;
pub mod lexer;
pub mod operations;
pub mod parser;
pub mod printer;
pub mod schema;
pub mod status;

pub use config::{Config, FeatureGates};
pub use operations::{OperationHandle, OperationId, OperationMetadata, OperationResult, OperationTracker};
pub use parser::ast::Statement;
pub use parser::{parse, parse_create_database_name, split_statements};
pub use printer::print_statement;
pub use schema::editor::{apply_one, apply_sequence};
pub use schema::Schema;
pub use status::{ErrorKind, Status};
