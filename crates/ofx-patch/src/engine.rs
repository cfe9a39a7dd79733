//! Sequential patch application
//!
//! Provides [`PatchPlan`], an ordered operation list bound to one target
//! record, and the per-operation apply functions it is built on.
//!
//! # Semantics
//! Each operation is validated against the record's *current* state and
//! applied on its own: it either commits completely or leaves the record as
//! it was. There is no rollback across the list, so when operation `n` fails
//! operations `0..n` stay applied and the remaining ones never run.

use crate::error::PatchError;
use crate::operation::{parse_operations, PatchOp, PatchOperation};
use crate::path::{FieldPath, Segment};
use ofx_resource::{Resource, SharedRecord};
use serde_json::{Map, Value};

/// Identifier field, never patchable
const ID_FIELD: &str = "id";

/// Ordered operations bound to the record they patch
#[derive(Debug, Clone)]
pub struct PatchPlan<R: Resource> {
    target: SharedRecord<R>,
    operations: Vec<PatchOperation>,
}

impl<R: Resource> PatchPlan<R> {
    /// Bind operations to a target
    #[inline]
    #[must_use]
    pub fn new(target: SharedRecord<R>, operations: Vec<PatchOperation>) -> Self {
        Self { target, operations }
    }

    /// Parse an operations payload and bind it to a target
    ///
    /// # Errors
    /// Returns error if the payload cannot be parsed
    pub fn parse(target: SharedRecord<R>, json: &str) -> Result<Self, PatchError> {
        Ok(Self::new(target, parse_operations(json)?))
    }

    /// Target record
    #[inline]
    #[must_use]
    pub fn target(&self) -> &SharedRecord<R> {
        &self.target
    }

    /// Operations in application order
    #[inline]
    #[must_use]
    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// Mutable operation list (extensions may rewrite it before apply)
    #[inline]
    pub fn operations_mut(&mut self) -> &mut Vec<PatchOperation> {
        &mut self.operations
    }

    /// Number of operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if there is nothing to apply
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply every operation in order
    ///
    /// Returns the number of operations applied.
    ///
    /// # Errors
    /// Returns the first failing operation's error; earlier operations stay
    /// applied
    pub fn apply(&self) -> Result<usize, PatchError> {
        for (index, operation) in self.operations.iter().enumerate() {
            if let Err(err) = apply_operation(&self.target, operation) {
                tracing::warn!(
                    kind = R::KIND,
                    index,
                    applied = index,
                    %operation,
                    error = %err,
                    "patch operation failed, remaining operations skipped"
                );
                return Err(err);
            }
        }
        tracing::info!(
            kind = R::KIND,
            id = ?self.target.id(),
            applied = self.operations.len(),
            "patch applied"
        );
        Ok(self.operations.len())
    }
}

/// Apply one operation to a record in place
///
/// The record stays write-locked for the whole operation and is only
/// replaced once the patched document deserializes, keeps its identifier
/// and passes structural validation.
///
/// # Errors
/// Returns error if the operation is malformed, targets a missing or
/// immutable path, or produces a record that does not type-check or validate
pub fn apply_operation<R: Resource>(
    target: &SharedRecord<R>,
    operation: &PatchOperation,
) -> Result<(), PatchError> {
    let mut record = target.write();
    let original_id = record.id().cloned();

    let mut document = serde_json::to_value(&*record)?;
    apply_to_document(&mut document, operation)?;

    let updated: R =
        serde_json::from_value(document).map_err(|e| PatchError::TypeMismatch {
            path: operation.path.clone(),
            message: e.to_string(),
        })?;

    if updated.id() != original_id.as_ref() {
        return Err(PatchError::ImmutablePath(FieldPath::single(ID_FIELD)));
    }

    let messages = updated.validate();
    if !messages.is_empty() {
        return Err(PatchError::Invalid {
            path: operation.path.clone(),
            messages,
        });
    }

    *record = updated;
    Ok(())
}

/// Apply one operation to a JSON document
///
/// Field names match ignoring ASCII case. A root `add`/`replace` with an
/// object value applies each member as its own field operation.
///
/// A filtered segment (`members[value eq "u1"]`) applies the rest of the
/// operation to every matching element; `remove` on it deletes them. A
/// `remove` carrying a value on an array field deletes the elements that
/// contain it. Either form fails with `PathNotFound` when nothing matches.
///
/// # Errors
/// See [`apply_operation`]
pub fn apply_to_document(document: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    operation.check_shape()?;

    if operation.path.is_root() {
        let Some(Value::Object(members)) = operation.value.clone() else {
            return Err(PatchError::InvalidValue {
                path: FieldPath::root(),
                reason: "root value must be an object".to_string(),
            });
        };
        for (name, member) in members {
            let nested = PatchOperation {
                op: operation.op,
                path: FieldPath::single(name),
                value: Some(member),
            };
            apply_to_document(document, &nested)?;
        }
        return Ok(());
    }

    if operation.path.starts_with_field(ID_FIELD) {
        return Err(PatchError::ImmutablePath(operation.path.clone()));
    }

    apply_at(document, operation.path.segments(), operation)
}

fn apply_at(container: &mut Value, segments: &[Segment], operation: &PatchOperation) -> Result<(), PatchError> {
    let not_found = || PatchError::PathNotFound(operation.path.clone());

    let Some((segment, rest)) = segments.split_first() else {
        return apply_leaf(container, operation);
    };
    let Value::Object(object) = container else {
        return Err(not_found());
    };
    let key = find_key(object, segment.name()).ok_or_else(not_found)?;
    let slot = object.get_mut(&key).ok_or_else(not_found)?;

    let Some(filter) = segment.filter() else {
        return apply_at(slot, rest, operation);
    };
    let Value::Array(items) = slot else {
        return Err(PatchError::InvalidValue {
            path: operation.path.clone(),
            reason: format!("'{}' is not multi-valued", segment.name()),
        });
    };

    if rest.is_empty() && operation.op == PatchOp::Remove {
        let before = items.len();
        items.retain(|item| !filter.matches(item));
        return if items.len() == before { Err(not_found()) } else { Ok(()) };
    }

    let mut matched = false;
    for item in items.iter_mut().filter(|item| filter.matches(item)) {
        matched = true;
        if rest.is_empty() {
            merge_element(item, operation);
        } else {
            apply_at(item, rest, operation)?;
        }
    }
    if matched {
        Ok(())
    } else {
        Err(not_found())
    }
}

fn apply_leaf(slot: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    let value = operation.value.clone();
    match (operation.op, slot, value) {
        (PatchOp::Add, Value::Array(items), Some(Value::Array(more))) => items.extend(more),
        (PatchOp::Add, Value::Array(items), Some(single)) => items.push(single),
        (PatchOp::Add | PatchOp::Replace, slot, value) => *slot = value.unwrap_or(Value::Null),
        (PatchOp::Remove, Value::Array(items), Some(selector)) => {
            let before = items.len();
            let selectors = match selector {
                Value::Array(many) => many,
                one => vec![one],
            };
            items.retain(|item| !selectors.iter().any(|s| contains(item, s)));
            if items.len() == before {
                return Err(PatchError::PathNotFound(operation.path.clone()));
            }
        }
        (PatchOp::Remove, Value::Array(items), None) => items.clear(),
        (PatchOp::Remove, _, Some(_)) => {
            return Err(PatchError::UnexpectedValue {
                path: operation.path.clone(),
            })
        }
        (PatchOp::Remove, slot, None) => *slot = Value::Null,
    }
    Ok(())
}

/// `add`/`replace` on a filtered element: merge object members, otherwise overwrite
fn merge_element(item: &mut Value, operation: &PatchOperation) {
    let value = operation.value.clone().unwrap_or(Value::Null);
    match (item, value) {
        (Value::Object(target), Value::Object(members)) => {
            for (name, member) in members {
                let key = find_key(target, &name).unwrap_or(name);
                target.insert(key, member);
            }
        }
        (item, value) => *item = value,
    }
}

/// Check if `item` holds every member of `selector` (or equals it)
fn contains(item: &Value, selector: &Value) -> bool {
    match (item, selector) {
        (Value::Object(object), Value::Object(wanted)) => wanted.iter().all(|(name, expected)| {
            find_key(object, name).and_then(|key| object.get(&key)) == Some(expected)
        }),
        (item, selector) => item == selector,
    }
}

/// Stored key matching `segment` ignoring ASCII case
fn find_key(object: &Map<String, Value>, segment: &str) -> Option<String> {
    if object.contains_key(segment) {
        return Some(segment.to_string());
    }
    object
        .keys()
        .find(|k| k.eq_ignore_ascii_case(segment))
        .cloned()
}
