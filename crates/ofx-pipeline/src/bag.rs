//! Dotted-path property bags
//!
//! Provides [`PropertyBag`], a nested JSON object addressed by dotted paths
//! such as `Pagination.Page`, and [`Inputs`], its read-only view used for
//! operation inputs.

use crate::error::PipelineError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Nested key/value bag addressed by dotted paths
///
/// `insert("Pagination.Page", 1)` stores `{"Pagination": {"Page": 1}}`.
/// Keys match exactly (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    root: Map<String, Value>,
}

impl PropertyBag {
    /// Create empty bag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the bag (builder style)
    #[must_use]
    pub fn with(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    /// Insert a value at `path`, creating intermediate objects
    ///
    /// Non-object intermediates are replaced. Returns the previous value.
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) -> Option<Value> {
        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().unwrap_or_default();

        let mut object = &mut self.root;
        for segment in segments {
            let slot = object
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            object = slot.as_object_mut()?;
        }

        object.insert(last.to_string(), value.into())
    }

    /// Value at `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.root.get(first)?, |value, segment| {
            value.as_object()?.get(segment)
        })
    }

    /// Remove the value at `path`
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, last) = match path.rsplit_once('.') {
            Some((parent, last)) => (Some(parent), last),
            None => (None, path),
        };
        let object = match parent {
            None => &mut self.root,
            Some(parent) => {
                let mut object = &mut self.root;
                for segment in parent.split('.') {
                    object = object.get_mut(segment)?.as_object_mut()?;
                }
                object
            }
        };
        object.remove(last)
    }

    /// Check if `path` holds a non-null value
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    /// Read the value at `path` as `T`
    ///
    /// # Errors
    /// - `PipelineError::MissingInput` if absent or `null`
    /// - `PipelineError::TypeMismatch` if the value does not convert to `T`
    pub fn required<T: DeserializeOwned>(&self, path: &str) -> Result<T, PipelineError> {
        let value = self
            .get(path)
            .filter(|v| !v.is_null())
            .ok_or_else(|| PipelineError::MissingInput {
                path: path.to_string(),
            })?;
        convert(path, value)
    }

    /// Read the value at `path` as `T`, if present
    ///
    /// # Errors
    /// Returns `PipelineError::TypeMismatch` if present but not convertible
    pub fn optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, PipelineError> {
        match self.get(path) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => convert(path, value).map(Some),
        }
    }

    /// Whole bag as a JSON object
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Check if the bag has no top-level entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

impl From<Map<String, Value>> for PropertyBag {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

fn convert<T: DeserializeOwned>(path: &str, value: &Value) -> Result<T, PipelineError> {
    T::deserialize(value).map_err(|e| PipelineError::TypeMismatch {
        path: path.to_string(),
        expected: std::any::type_name::<T>(),
        message: e.to_string(),
    })
}

/// Read-only operation inputs
///
/// Populated before the context is created; the pipeline and extensions
/// only ever see `&Inputs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs(PropertyBag);

impl Inputs {
    /// Create empty inputs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input (builder style)
    #[must_use]
    pub fn with(self, path: &str, value: impl Into<Value>) -> Self {
        Self(self.0.with(path, value))
    }

    /// Input value at `path`
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    /// Check if `path` holds a non-null value
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    /// Required input as `T`
    ///
    /// # Errors
    /// See [`PropertyBag::required`]
    #[inline]
    pub fn required<T: DeserializeOwned>(&self, path: &str) -> Result<T, PipelineError> {
        self.0.required(path)
    }

    /// Optional input as `T`
    ///
    /// # Errors
    /// See [`PropertyBag::optional`]
    #[inline]
    pub fn optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, PipelineError> {
        self.0.optional(path)
    }

    /// Underlying bag
    #[inline]
    #[must_use]
    pub fn as_bag(&self) -> &PropertyBag {
        &self.0
    }
}

impl From<PropertyBag> for Inputs {
    fn from(bag: PropertyBag) -> Self {
        Self(bag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bag_insert_creates_nested_objects() {
        let bag = PropertyBag::new()
            .with("Pagination.Page", 1)
            .with("Pagination.PerPage", 10);
        assert_eq!(
            bag.to_value(),
            json!({ "Pagination": { "Page": 1, "PerPage": 10 } })
        );
        assert_eq!(bag.get("Pagination.Page"), Some(&json!(1)));
        assert!(bag.get("Pagination.Total").is_none());
        assert!(bag.get("Missing.Page").is_none());
    }

    #[test]
    fn bag_insert_replaces_scalar_intermediate() {
        let mut bag = PropertyBag::new().with("a", 5);
        bag.insert("a.b", true);
        assert_eq!(bag.to_value(), json!({ "a": { "b": true } }));
    }

    #[test]
    fn bag_remove_nested() {
        let mut bag = PropertyBag::new().with("a.b", 1).with("a.c", 2);
        assert_eq!(bag.remove("a.b"), Some(json!(1)));
        assert_eq!(bag.remove("a.b"), None);
        assert_eq!(bag.remove("x.y"), None);
        assert_eq!(bag.to_value(), json!({ "a": { "c": 2 } }));
    }

    #[test]
    fn required_reports_missing_and_null() {
        let bag = PropertyBag::new().with("Id", Value::Null);
        assert!(matches!(
            bag.required::<String>("Id"),
            Err(PipelineError::MissingInput { path }) if path == "Id"
        ));
        assert!(matches!(
            bag.required::<String>("Resource"),
            Err(PipelineError::MissingInput { .. })
        ));
    }

    #[test]
    fn required_reports_type_mismatch() {
        let bag = PropertyBag::new().with("Pagination.Page", "first");
        assert!(matches!(
            bag.required::<usize>("Pagination.Page"),
            Err(PipelineError::TypeMismatch { path, .. }) if path == "Pagination.Page"
        ));
    }

    #[test]
    fn required_converts_value() {
        let bag = PropertyBag::new()
            .with("Id", "67e55044-10b1-426f-9247-bb680e5fe0c8")
            .with("Pagination.Page", 2);
        let id: uuid::Uuid = bag.required("Id").unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(bag.required::<usize>("Pagination.Page").unwrap(), 2);
    }

    #[test]
    fn optional_distinguishes_absent_from_invalid() {
        let bag = PropertyBag::new().with("n", "x");
        assert_eq!(bag.optional::<u32>("m").unwrap(), None);
        assert!(bag.optional::<u32>("n").is_err());
    }

    #[test]
    fn inputs_are_a_read_only_view() {
        let inputs = Inputs::new().with("Resource", "{}");
        assert!(inputs.contains("Resource"));
        assert_eq!(inputs.required::<String>("Resource").unwrap(), "{}");
        assert_eq!(inputs.as_bag().get("Resource"), Some(&json!("{}")));
    }
}
