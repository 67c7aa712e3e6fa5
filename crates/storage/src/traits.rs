use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{
    ClassId, ClassRecord, InstanceId, InstanceRecord, NamespaceRecord, NewClass, NewInstance,
    NewValue, ValueRecord,
};

/// The storage trait for automate datastore backends.
///
/// An `AutomateStorage` implementation provides transactional storage for the
/// namespace tree, classes with their fields, instances, and values.
///
/// ## Snapshot Semantics
///
/// All operations a copy depends on take `&mut Self::Snapshot`, a type
/// representing an in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()`: start a transaction, returns a `Snapshot`
/// 2. Call lookup and mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)`: commit and consume the transaction
///    OR `abort_snapshot(snapshot)`: roll back and consume the transaction
///
/// Reads through a snapshot observe that snapshot's own uncommitted writes.
/// If a `Snapshot` is dropped without committing, its writes MUST be
/// discarded.
///
/// ## Isolation
///
/// Backends must provide at least read-committed isolation with atomic
/// commit. A check-then-create sequence inside one snapshot (e.g. "no
/// instance named X exists" followed by `create_instance`) must not be able
/// to commit alongside a concurrent snapshot doing the same thing; the
/// loser gets `AlreadyExists` or `ConcurrentConflict`.
///
/// ## Name Matching
///
/// Fully-qualified names and instance names are matched case-insensitively.
#[async_trait]
pub trait AutomateStorage: Send + Sync + 'static {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot: Send;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    async fn begin_snapshot(&self) -> Result<Self::Snapshot, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    async fn commit_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    async fn abort_snapshot(&self, snapshot: Self::Snapshot) -> Result<(), StorageError>;

    // ── Namespace operations (within snapshot) ────────────────────────────────

    /// Look up a namespace by fully-qualified name.
    async fn find_namespace(
        &self,
        snapshot: &mut Self::Snapshot,
        fqname: &str,
    ) -> Result<Option<NamespaceRecord>, StorageError>;

    /// Return the namespace at `fqname`, creating it and any missing parent
    /// segments first.
    async fn ensure_namespace(
        &self,
        snapshot: &mut Self::Snapshot,
        fqname: &str,
    ) -> Result<NamespaceRecord, StorageError>;

    // ── Class operations (within snapshot) ────────────────────────────────────

    /// Look up a class (fields loaded) by its fully-qualified name
    /// `"<namespace fqname>/<class name>"`.
    async fn find_class(
        &self,
        snapshot: &mut Self::Snapshot,
        fqname: &str,
    ) -> Result<Option<ClassRecord>, StorageError>;

    /// Read a class (fields loaded) by identity.
    ///
    /// Returns `Err(StorageError::ClassNotFound)` if it does not exist.
    async fn get_class(
        &self,
        snapshot: &mut Self::Snapshot,
        class_id: ClassId,
    ) -> Result<ClassRecord, StorageError>;

    /// Create a class together with its fields. Field identities are
    /// assigned by the backend.
    ///
    /// Returns `Err(StorageError::NamespaceNotFound)` if the namespace does
    /// not exist and `Err(StorageError::AlreadyExists)` if the namespace
    /// already holds a class with that name.
    async fn create_class(
        &self,
        snapshot: &mut Self::Snapshot,
        class: NewClass,
    ) -> Result<ClassRecord, StorageError>;

    // ── Instance operations (within snapshot) ─────────────────────────────────

    /// Look up an instance by name within a class.
    async fn find_instance(
        &self,
        snapshot: &mut Self::Snapshot,
        class_id: ClassId,
        name: &str,
    ) -> Result<Option<InstanceRecord>, StorageError>;

    /// Read an instance by identity.
    ///
    /// Returns `Err(StorageError::InstanceNotFound)` if it does not exist.
    async fn get_instance(
        &self,
        snapshot: &mut Self::Snapshot,
        instance_id: InstanceId,
    ) -> Result<InstanceRecord, StorageError>;

    /// Create an instance. Identity, timestamps and authorship are assigned
    /// by the backend.
    ///
    /// Returns `Err(StorageError::ClassNotFound)` if the class does not exist
    /// and `Err(StorageError::AlreadyExists)` if the class already holds an
    /// instance with that name.
    async fn create_instance(
        &self,
        snapshot: &mut Self::Snapshot,
        instance: NewInstance,
    ) -> Result<InstanceRecord, StorageError>;

    /// Permanently remove an instance and all of its values.
    ///
    /// Returns `Err(StorageError::InstanceNotFound)` if it does not exist.
    async fn destroy_instance(
        &self,
        snapshot: &mut Self::Snapshot,
        instance_id: InstanceId,
    ) -> Result<(), StorageError>;

    // ── Value operations (within snapshot) ────────────────────────────────────

    /// Create a value on an instance.
    ///
    /// FK: `value.field_id` must belong to the instance's class, otherwise
    /// `Err(StorageError::FieldNotFound)`.
    async fn create_value(
        &self,
        snapshot: &mut Self::Snapshot,
        instance_id: InstanceId,
        value: NewValue,
    ) -> Result<ValueRecord, StorageError>;

    /// List an instance's values in creation order.
    async fn list_values(
        &self,
        snapshot: &mut Self::Snapshot,
        instance_id: InstanceId,
    ) -> Result<Vec<ValueRecord>, StorageError>;

    // ── Query operations (outside snapshot, committed data only) ──────────────

    /// Look up a committed class by fully-qualified name.
    async fn lookup_class(&self, fqname: &str) -> Result<Option<ClassRecord>, StorageError>;

    /// Look up a committed instance by name within a class.
    async fn lookup_instance(
        &self,
        class_id: ClassId,
        name: &str,
    ) -> Result<Option<InstanceRecord>, StorageError>;

    /// List a committed instance's values in creation order.
    async fn lookup_values(&self, instance_id: InstanceId)
        -> Result<Vec<ValueRecord>, StorageError>;
}
