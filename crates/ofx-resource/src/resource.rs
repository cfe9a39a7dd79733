//! Resource records and identifiers
//!
//! Provides the [`Resource`] trait implemented by every record type that flows
//! through an operation, the [`ResourceId`] identifier, the [`SharedRecord`]
//! handle and payload decoding via [`decode`].

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a stored resource
///
/// Assigned once when the record is created and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wrap an existing identifier
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh random (v4 UUID) identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if identifier is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Uuid> for ResourceId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A typed record held in a [`ResourceStore`](crate::ResourceStore)
///
/// Implementors are plain data records. The serialized form is what patch
/// paths address and what get/list operations emit.
///
/// # Invariants
/// - `id()` is `None` until creation assigns one
/// - `validate()` is pure and returns every violation, not just the first
pub trait Resource: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Entity kind, also used as the actor role name (e.g. `"Client"`)
    const KIND: &'static str;

    /// Current identifier
    fn id(&self) -> Option<&ResourceId>;

    /// Assign identifier
    fn set_id(&mut self, id: ResourceId);

    /// Structural validation messages (empty when valid)
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Shared handle to one record instance
///
/// Cloning the handle does not clone the record: every clone refers to the
/// same instance, so a record bound as an actor *is* the stored record.
pub struct SharedRecord<R>(Arc<RwLock<R>>);

impl<R: Resource> SharedRecord<R> {
    /// Wrap a record
    #[inline]
    #[must_use]
    pub fn new(record: R) -> Self {
        Self(Arc::new(RwLock::new(record)))
    }

    /// Shared read access
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, R> {
        self.0.read()
    }

    /// Exclusive write access
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, R> {
        self.0.write()
    }

    /// Identity comparison (same instance, not equal content)
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of the current identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<ResourceId> {
        self.0.read().id().cloned()
    }

    /// Check if identifier equals `id`
    #[inline]
    #[must_use]
    pub fn has_id(&self, id: &ResourceId) -> bool {
        self.0.read().id() == Some(id)
    }

    /// Clone of the record's current state
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> R {
        self.0.read().clone()
    }
}

impl<R> Clone for SharedRecord<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R: Debug> Debug for SharedRecord<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(record) => f.debug_tuple("SharedRecord").field(&*record).finish(),
            None => f.write_str("SharedRecord(<locked>)"),
        }
    }
}

/// Outcome of decoding a creation payload
///
/// `resource` is `None` only when the payload could not be deserialized, in
/// which case `messages` explains why.
#[derive(Debug, Clone)]
pub struct Decoded<R> {
    resource: Option<R>,
    messages: Vec<String>,
}

impl<R> Decoded<R> {
    /// Decoded resource (if the payload had the right shape)
    #[inline]
    #[must_use]
    pub fn resource(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    /// Validation messages
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Check if no message was produced
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.messages.is_empty() && self.resource.is_some()
    }

    /// Split into resource and messages
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Option<R>, Vec<String>) {
        (self.resource, self.messages)
    }
}

/// Deserialize a payload into a resource plus its validation messages
///
/// Never fails: malformed payloads are reported as a message.
#[must_use]
pub fn decode<R: Resource>(json: &str) -> Decoded<R> {
    match serde_json::from_str::<R>(json) {
        Ok(resource) => {
            let messages = resource.validate();
            Decoded {
                resource: Some(resource),
                messages,
            }
        }
        Err(err) => Decoded {
            resource: None,
            messages: vec![format!("{} payload is malformed: {err}", R::KIND)],
        },
    }
}

/// Serialize a resource
///
/// # Errors
/// Returns error if the record cannot be represented as JSON
pub fn encode<R: Resource>(record: &R) -> Result<String, ResourceError> {
    Ok(serde_json::to_string(record)?)
}

/// Errors from resource (de)serialization
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// JSON conversion failed
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
