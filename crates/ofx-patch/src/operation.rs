//! Patch operations and payload parsing
//!
//! Provides [`PatchOperation`] (`{op, path, value}`) and
//! [`parse_operations`] for the two accepted payload shapes: a bare JSON
//! array of operations, or a `PatchOp` envelope carrying them under
//! `Operations`.

use crate::error::PatchError;
use crate::path::FieldPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Patch verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PatchOp {
    /// Set a field, or append to an array field
    Add,

    /// Clear a field, or drop matching elements of an array field
    Remove,

    /// Overwrite a field
    Replace,
}

impl PatchOp {
    /// Lower-case name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        }
    }

    /// Check if the operation must carry a value
    #[inline]
    #[must_use]
    pub fn requires_value(self) -> bool {
        matches!(self, Self::Add | Self::Replace)
    }
}

impl Display for PatchOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatchOp {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "replace" => Ok(Self::Replace),
            _ => Err(PatchError::UnknownOp(s.to_string())),
        }
    }
}

impl TryFrom<String> for PatchOp {
    type Error = PatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatchOp> for String {
    fn from(op: PatchOp) -> Self {
        op.as_str().to_string()
    }
}

/// One `{op, path, value}` instruction
///
/// Shape rules (checked by [`PatchOperation::check_shape`] right before the
/// operation is applied, not at parse time):
/// - `add`/`replace` carry a value
/// - `remove` targets a non-root path; it may carry a value (the elements
///   to drop from an array field) unless the path already filters elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Verb
    #[serde(alias = "Op")]
    pub op: PatchOp,

    /// Target field (root when absent)
    #[serde(default, alias = "Path")]
    pub path: FieldPath,

    /// New payload
    #[serde(default, alias = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    /// `add` operation
    #[inline]
    #[must_use]
    pub fn add(path: FieldPath, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path,
            value: Some(value),
        }
    }

    /// `remove` operation
    #[inline]
    #[must_use]
    pub fn remove(path: FieldPath) -> Self {
        Self {
            op: PatchOp::Remove,
            path,
            value: None,
        }
    }

    /// `remove` operation dropping array elements that contain `value`
    #[inline]
    #[must_use]
    pub fn remove_matching(path: FieldPath, value: Value) -> Self {
        Self {
            op: PatchOp::Remove,
            path,
            value: Some(value),
        }
    }

    /// `replace` operation
    #[inline]
    #[must_use]
    pub fn replace(path: FieldPath, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path,
            value: Some(value),
        }
    }

    /// Verify operation shape
    ///
    /// # Errors
    /// - `PatchError::MissingValue` for `add`/`replace` without value
    /// - `PatchError::MissingPath` for `remove` on the root
    /// - `PatchError::UnexpectedValue` for `remove` with value on a filtered path
    pub fn check_shape(&self) -> Result<(), PatchError> {
        match (self.op.requires_value(), &self.value) {
            (true, None) => Err(PatchError::MissingValue {
                op: self.op,
                path: self.path.clone(),
            }),
            (false, _) if self.path.is_root() => Err(PatchError::MissingPath { op: self.op }),
            (false, Some(_)) if self.path.is_filtered() => Err(PatchError::UnexpectedValue {
                path: self.path.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl Display for PatchOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path)
    }
}

/// Parse an operations payload
///
/// Accepts `[ {op, path, value}, ... ]` or
/// `{ "schemas": [...], "Operations": [ ... ] }` (key matched ignoring
/// case). An empty list parses successfully.
///
/// # Errors
/// Returns `PatchError::Malformed` if the payload has neither shape or an
/// entry cannot be read as an operation
pub fn parse_operations(json: &str) -> Result<Vec<PatchOperation>, PatchError> {
    let payload: Value =
        serde_json::from_str(json).map_err(|e| PatchError::Malformed(e.to_string()))?;

    let list = match payload {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut envelope) => {
            let key = envelope
                .keys()
                .find(|k| k.eq_ignore_ascii_case("operations"))
                .cloned()
                .ok_or_else(|| {
                    PatchError::Malformed("envelope has no Operations member".to_string())
                })?;
            envelope.remove(&key).unwrap_or(Value::Null)
        }
        other => {
            return Err(PatchError::Malformed(format!(
                "expected an operation list or envelope, found {}",
                kind_of(&other)
            )))
        }
    };

    serde_json::from_value(list).map_err(|e| PatchError::Malformed(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn op_parse_ignores_case() {
        assert_eq!("Add".parse::<PatchOp>().unwrap(), PatchOp::Add);
        assert_eq!("REPLACE".parse::<PatchOp>().unwrap(), PatchOp::Replace);
        assert!(matches!(
            "move".parse::<PatchOp>(),
            Err(PatchError::UnknownOp(_))
        ));
    }

    #[test]
    fn parse_bare_list() {
        let ops = parse_operations(
            r#"[ { "op": "add", "path": "Secret", "value": "Updated Client" } ]"#,
        )
        .unwrap();
        assert_eq!(
            ops,
            vec![PatchOperation::add(
                FieldPath::single("Secret"),
                json!("Updated Client")
            )]
        );
    }

    #[test]
    fn parse_envelope() {
        let ops = parse_operations(
            r#"{
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
                "Operations": [
                    { "Op": "Replace", "Path": "displayName", "Value": "ops" },
                    { "op": "remove", "path": "externalId" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].op, PatchOp::Replace);
        assert_eq!(ops[1], PatchOperation::remove(FieldPath::single("externalId")));
    }

    #[test]
    fn parse_filtered_and_prefixed_paths() {
        let ops = parse_operations(
            r#"[
                { "op": "remove", "path": "members[value eq \"u1\"]" },
                { "op": "replace", "path": "urn:ietf:params:scim:schemas:core:2.0:Group:displayName", "value": "x" }
            ]"#,
        )
        .unwrap();
        assert!(ops[0].path.is_filtered());
        assert_eq!(ops[1].path, FieldPath::single("displayName"));
    }

    #[test]
    fn parse_empty_list() {
        assert!(parse_operations("[]").unwrap().is_empty());
    }

    #[test]
    fn parse_missing_path_is_root() {
        let ops = parse_operations(r#"[ { "op": "add", "value": { "displayName": "x" } } ]"#)
            .unwrap();
        assert!(ops[0].path.is_root());
    }

    #[test]
    fn parse_rejects_scalar_payload() {
        assert!(matches!(
            parse_operations("42"),
            Err(PatchError::Malformed(msg)) if msg.contains("number")
        ));
    }

    #[test]
    fn parse_rejects_envelope_without_operations() {
        assert!(matches!(
            parse_operations(r#"{ "schemas": [] }"#),
            Err(PatchError::Malformed(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_op() {
        assert!(matches!(
            parse_operations(r#"[ { "op": "copy", "path": "a" } ]"#),
            Err(PatchError::Malformed(_))
        ));
    }

    #[test]
    fn check_shape_rules() {
        let path = FieldPath::single("displayName");
        assert!(PatchOperation::replace(path.clone(), json!("x")).check_shape().is_ok());
        assert!(PatchOperation::remove(path.clone()).check_shape().is_ok());

        let mut missing = PatchOperation::add(path.clone(), json!(1));
        missing.value = None;
        assert!(matches!(
            missing.check_shape(),
            Err(PatchError::MissingValue { op: PatchOp::Add, .. })
        ));

        assert!(PatchOperation::remove_matching(path, json!({ "value": "u1" }))
            .check_shape()
            .is_ok());

        let filtered: FieldPath = r#"members[value eq "u1"]"#.parse().unwrap();
        assert!(matches!(
            PatchOperation::remove_matching(filtered, json!(1)).check_shape(),
            Err(PatchError::UnexpectedValue { .. })
        ));

        assert!(matches!(
            PatchOperation::remove(FieldPath::root()).check_shape(),
            Err(PatchError::MissingPath { op: PatchOp::Remove })
        ));
    }

    #[test]
    fn operation_serializes_lowercase_op() {
        let op = PatchOperation::remove(FieldPath::single("members"));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "op": "remove", "path": "members" })
        );
    }
}
