//! Integration tests exercising the full parse → apply → validate →
//! operation-tracker pipeline the way an admin `UpdateDatabaseDdl` handler
//! would drive it (spec §6).

use ddl_emulator_core::schema::editor::apply_sequence;
use ddl_emulator_core::{
    print_statement, split_statements, Config, ErrorKind, OperationId, OperationMetadata,
    OperationResult, OperationTracker, Schema, Status,
};

fn run_ddl(schema: &Schema, gates: ddl_emulator_core::FeatureGates, text: &str) -> (Schema, usize, Option<Status>) {
    let statements: Vec<_> = split_statements(text)
        .unwrap()
        .into_iter()
        .map(|s| ddl_emulator_core::parse(&s, gates).unwrap())
        .collect();
    apply_sequence(schema, &statements)
}

#[test]
fn multi_statement_database_stands_up_end_to_end() {
    let gates = Config::default().features;
    let schema = Schema::empty();
    let text = "
        CREATE TABLE Singers (
            SingerId INT64 NOT NULL,
            FirstName STRING(1024),
            LastName STRING(1024)
        ) PRIMARY KEY (SingerId);

        CREATE TABLE Albums (
            SingerId INT64 NOT NULL,
            AlbumId INT64 NOT NULL,
            AlbumTitle STRING(MAX)
        ) PRIMARY KEY (SingerId, AlbumId), INTERLEAVE IN PARENT Singers ON DELETE CASCADE;

        CREATE INDEX AlbumsByTitle ON Albums (AlbumTitle);
    ";

    let (schema, applied, err) = run_ddl(&schema, gates, text);
    assert!(err.is_none());
    assert_eq!(applied, 3);
    assert!(schema.find_table("Singers").is_some());
    assert!(schema.find_table("Albums").is_some());
    assert!(schema.find_index("AlbumsByTitle").is_some());

    let albums = schema.tables.get(schema.find_table("Albums").unwrap());
    assert_eq!(albums.interleave_on_delete, ddl_emulator_core::parser::ast::OnDelete::Cascade);
}

#[test]
fn partial_failure_commits_the_prefix_and_reports_the_rest() {
    let gates = Config::default().features;
    let schema = Schema::empty();
    let text = "
        CREATE TABLE T (K INT64 NOT NULL) PRIMARY KEY (K);
        CREATE TABLE T (K INT64 NOT NULL) PRIMARY KEY (K);
        CREATE TABLE U (K INT64 NOT NULL) PRIMARY KEY (K);
    ";
    let (schema, applied, err) = run_ddl(&schema, gates, text);
    assert_eq!(applied, 1);
    assert!(err.is_some());
    assert_eq!(err.unwrap().kind, ErrorKind::InvalidArgument);
    assert!(schema.find_table("T").is_some());
    assert!(schema.find_table("U").is_none());
}

#[test]
fn update_database_ddl_records_an_operation_for_each_request() {
    let tracker = OperationTracker::new();
    let gates = Config::default().features;
    let schema = Schema::empty();
    let resource = "projects/p/instances/i/databases/d";

    let text = "CREATE TABLE T (K INT64 NOT NULL) PRIMARY KEY (K); DROP TABLE DoesNotExist;";
    let statement_texts = split_statements(text).unwrap();
    let (_final_schema, applied, err) = run_ddl(&schema, gates, text);

    let result = match &err {
        None => OperationResult::Success {
            applied_statements: applied,
        },
        Some(status) => OperationResult::Error(status.clone()),
    };
    let metadata = OperationMetadata::new("UpdateDatabaseDdl", statement_texts);
    let handle = tracker
        .create(resource, OperationId::Auto, metadata, result)
        .unwrap();

    assert!(handle.uri.ends_with("/operations/_auto0"));
    match handle.result {
        OperationResult::Error(status) => assert_eq!(status.kind, ErrorKind::InvalidArgument),
        OperationResult::Success { .. } => panic!("expected the drop of a missing table to fail"),
    }

    let fetched = tracker.get(&handle.uri).unwrap();
    assert_eq!(fetched, handle);

    let listed = tracker.list(resource);
    assert_eq!(listed.len(), 1);
}

#[test]
fn printer_round_trips_a_full_statement_stream() {
    let gates = Config::default().features;
    let text = "CREATE TABLE T (K INT64 NOT NULL, V STRING(MAX)) PRIMARY KEY (K);\n\
                ALTER TABLE T ADD COLUMN Extra BOOL;\n\
                CREATE INDEX ByV ON T (V);";
    for stmt_text in split_statements(text).unwrap() {
        let stmt = ddl_emulator_core::parse(&stmt_text, gates).unwrap();
        let printed = print_statement(&stmt);
        let reparsed = ddl_emulator_core::parse(&printed, gates).unwrap();
        assert_eq!(stmt, reparsed);
    }
}

#[test]
fn foreign_key_with_operation_tracking_and_managed_index() {
    let gates = Config::default().features;
    let schema = Schema::empty();
    let text = "
        CREATE TABLE Parent (Id INT64 NOT NULL) PRIMARY KEY (Id);
        CREATE TABLE Child (Id INT64 NOT NULL, ParentId INT64 NOT NULL) PRIMARY KEY (Id);
        ALTER TABLE Child ADD CONSTRAINT FkChildParent FOREIGN KEY (ParentId) REFERENCES Parent (Id);
    ";
    let (schema, applied, err) = run_ddl(&schema, gates, text);
    assert!(err.is_none());
    assert_eq!(applied, 3);

    let child = schema.tables.get(schema.find_table("Child").unwrap());
    let fk = schema.foreign_keys.get(child.foreign_keys[0]);
    assert!(fk.referencing_index.is_some(), "ParentId is not yet indexed");
}
