//! Operation tracker: a registry of completed long-running administrative
//! operations (spec §4.F).
//!
//! Administrative work in this emulator always finishes synchronously, so
//! every handle this tracker ever hands out is immediately terminal — there
//! is no in-progress state to poll for, only a record of what already
//! happened. The tracker itself is the one piece of process-wide mutable
//! state in the core (spec §5, "Shared state"): a counter plus a
//! URI-keyed map, both behind a single mutex acquired for the duration of
//! one lookup or update and released on every exit path.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::status::Status;

/// Which operation id to register a handle under.
///
/// A plain sentinel string (e.g. `""`) would be ambiguous with a user
/// explicitly choosing an empty id, so auto-generation is its own variant
/// rather than a magic value threaded through [`String`] (spec §9,
/// "Operation identity").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationId {
    /// Generate a fresh `_auto<N>` id.
    Auto,
    /// Use this caller-supplied id, validated against the identifier
    /// grammar before being accepted.
    Explicit(String),
}

/// Metadata carried alongside an operation's terminal result. Kept
/// intentionally small — the resource-URI namespace, authentication, and
/// the rest of the admin surface that would populate a richer record are
/// out of scope for this core (spec §1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMetadata {
    pub operation_type: String,
    pub statements: Vec<String>,
    /// Seconds since the epoch at registration. Every handle is terminal the
    /// moment it is created (spec §3, "Lifecycle"), so this doubles as the
    /// completion time.
    pub create_time_unix_seconds: u64,
    /// Always 100: administrative work finishes synchronously before a
    /// handle is ever registered (spec §1, "Non-goals").
    pub progress_percent: u8,
}

impl OperationMetadata {
    pub fn new(operation_type: impl Into<String>, statements: Vec<String>) -> Self {
        Self {
            operation_type: operation_type.into(),
            statements,
            create_time_unix_seconds: now_unix_seconds(),
            progress_percent: 100,
        }
    }
}

fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The outcome an operation finished with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success { applied_statements: usize },
    Error(Status),
}

/// A registered operation. Always terminal the moment it is created (spec
/// §1, "Non-goals": true asynchronous execution is out of scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub uri: String,
    pub metadata: OperationMetadata,
    pub result: OperationResult,
}

struct TrackerState {
    handles: BTreeMap<String, OperationHandle>,
    auto_counter: u64,
}

/// Shared registry of operation handles, addressed by URI.
///
/// All four operations acquire the tracker's mutex for the duration of a
/// single map lookup or update and do no I/O while holding it (spec §5,
/// "Suspension points").
pub struct OperationTracker {
    state: Mutex<TrackerState>,
}

impl Default for OperationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                handles: BTreeMap::new(),
                auto_counter: 0,
            }),
        }
    }

    /// Registers a new, already-terminal operation under
    /// `<resource_uri>/operations/<operation_id>`.
    pub fn create(
        &self,
        resource_uri: &str,
        id: OperationId,
        metadata: OperationMetadata,
        result: OperationResult,
    ) -> Result<OperationHandle, Status> {
        let mut state = self.state.lock().expect("operation tracker mutex poisoned");

        let operation_id = match id {
            OperationId::Auto => {
                let n = state.auto_counter;
                state.auto_counter += 1;
                format!("_auto{n}")
            }
            OperationId::Explicit(id) => {
                validate_operation_id(&id)?;
                id
            }
        };

        let uri = format!("{resource_uri}/operations/{operation_id}");
        if state.handles.contains_key(&uri) {
            tracing::warn!(%uri, "operation already exists");
            return Err(Status::already_exists(format!(
                "Operation already exists: {uri}"
            )));
        }

        let handle = OperationHandle {
            uri: uri.clone(),
            metadata,
            result,
        };
        state.handles.insert(uri.clone(), handle.clone());
        tracing::debug!(%uri, "operation registered");
        Ok(handle)
    }

    pub fn get(&self, uri: &str) -> Result<OperationHandle, Status> {
        let state = self.state.lock().expect("operation tracker mutex poisoned");
        state
            .handles
            .get(uri)
            .cloned()
            .ok_or_else(|| Status::not_found(format!("Operation not found: {uri}")))
    }

    /// Idempotent: deleting an absent handle still succeeds (spec §4.F).
    pub fn delete(&self, uri: &str) {
        let mut state = self.state.lock().expect("operation tracker mutex poisoned");
        if state.handles.remove(uri).is_some() {
            tracing::debug!(%uri, "operation deleted");
        }
    }

    /// Returns every handle whose URI is `<parent_resource_uri>/operations/...`,
    /// in lexicographic URI order — a [`BTreeMap`] keeps that ordering for
    /// free, so this is a prefix scan rather than a sort (spec §4.F, §8).
    pub fn list(&self, parent_resource_uri: &str) -> Vec<OperationHandle> {
        let prefix = format!("{parent_resource_uri}/operations/");
        let state = self.state.lock().expect("operation tracker mutex poisoned");
        state
            .handles
            .range(prefix.clone()..)
            .take_while(|(uri, _)| uri.starts_with(&prefix))
            .map(|(_, handle)| handle.clone())
            .collect()
    }
}

/// The unquoted-identifier grammar operation ids must match (spec §6); the
/// `_auto` prefix is reserved for system-generated ids and rejected from
/// caller-supplied ones.
fn validate_operation_id(id: &str) -> Result<(), Status> {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return Err(Status::invalid_argument("Operation id must not be empty."));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(Status::invalid_argument(format!(
            "Invalid operation id: {id}"
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Status::invalid_argument(format!(
            "Invalid operation id: {id}"
        )));
    }
    if id.starts_with("_auto") {
        return Err(Status::invalid_argument(
            "The _auto prefix is reserved for system-generated operation ids.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_result() -> OperationResult {
        OperationResult::Success {
            applied_statements: 1,
        }
    }

    #[test]
    fn auto_ids_increase_strictly_within_a_process() {
        let tracker = OperationTracker::new();
        let a = tracker
            .create(
                "projects/p/instances/i/databases/d",
                OperationId::Auto,
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap();
        let b = tracker
            .create(
                "projects/p/instances/i/databases/d",
                OperationId::Auto,
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap();
        assert!(a.uri.ends_with("/operations/_auto0"));
        assert!(b.uri.ends_with("/operations/_auto1"));
    }

    #[test]
    fn duplicate_explicit_id_is_already_exists() {
        let tracker = OperationTracker::new();
        let r = "projects/p/instances/i/databases/d";
        tracker
            .create(
                r,
                OperationId::Explicit("foo".to_string()),
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap();
        let err = tracker
            .create(
                r,
                OperationId::Explicit("foo".to_string()),
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap_err();
        assert_eq!(err.kind, crate::status::ErrorKind::AlreadyExists);
    }

    #[test]
    fn scenario_from_spec_eight_six() {
        let tracker = OperationTracker::new();
        let r = "projects/p/instances/i/databases/d";
        let a = tracker
            .create(r, OperationId::Auto, OperationMetadata::default(), ok_result())
            .unwrap();
        let b = tracker
            .create(r, OperationId::Auto, OperationMetadata::default(), ok_result())
            .unwrap();
        let c = tracker
            .create(
                r,
                OperationId::Explicit("foo".to_string()),
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap();
        let d = tracker.create(
            r,
            OperationId::Explicit("foo".to_string()),
            OperationMetadata::default(),
            ok_result(),
        );

        assert!(a.uri.ends_with("_auto0"));
        assert!(b.uri.ends_with("_auto1"));
        assert!(c.uri.ends_with("foo"));
        assert!(d.is_err());
    }

    #[test]
    fn get_on_absent_uri_is_not_found() {
        let tracker = OperationTracker::new();
        let err = tracker.get("projects/p/instances/i/databases/d/operations/x").unwrap_err();
        assert_eq!(err.kind, crate::status::ErrorKind::NotFound);
    }

    #[test]
    fn delete_is_idempotent() {
        let tracker = OperationTracker::new();
        tracker.delete("projects/p/instances/i/databases/d/operations/x");
        tracker.delete("projects/p/instances/i/databases/d/operations/x");
    }

    #[test]
    fn list_returns_handles_in_lexicographic_uri_order() {
        let tracker = OperationTracker::new();
        let r = "projects/p/instances/i/databases/d";
        for id in ["zeta", "alpha", "mid"] {
            tracker
                .create(
                    r,
                    OperationId::Explicit(id.to_string()),
                    OperationMetadata::default(),
                    ok_result(),
                )
                .unwrap();
        }
        let listed: Vec<String> = tracker.list(r).into_iter().map(|h| h.uri).collect();
        let mut sorted = listed.clone();
        sorted.sort();
        assert_eq!(listed, sorted);
        assert_eq!(listed.len(), 3);
    }

    #[test]
    fn list_is_scoped_to_the_requested_parent() {
        let tracker = OperationTracker::new();
        tracker
            .create(
                "projects/p/instances/i/databases/d1",
                OperationId::Explicit("a".to_string()),
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap();
        tracker
            .create(
                "projects/p/instances/i/databases/d2",
                OperationId::Explicit("a".to_string()),
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap();
        let listed = tracker.list("projects/p/instances/i/databases/d1");
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn reserved_auto_prefix_rejected_for_explicit_ids() {
        let tracker = OperationTracker::new();
        let err = tracker
            .create(
                "projects/p/instances/i/databases/d",
                OperationId::Explicit("_auto5".to_string()),
                OperationMetadata::default(),
                ok_result(),
            )
            .unwrap_err();
        assert_eq!(err.kind, crate::status::ErrorKind::InvalidArgument);
    }
}
