//! Actor (role) bindings
//!
//! Provides [`Actors`], the per-operation map from role name to the object
//! playing that role. Built-in verbs bind the target resource under its
//! entity kind (`"Client"`, `"Group"`) and patch plans under
//! [`OPERATIONS_ROLE`]; extensions may add, replace or remove any role.

use crate::error::PipelineError;
use indexmap::IndexMap;
use ofx_patch::PatchPlan;
use ofx_resource::{Resource, SharedRecord};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Role under which patch operations are bound
pub const OPERATIONS_ROLE: &str = "Operations";

/// Object bound to a role
#[derive(Debug, Clone)]
pub enum ActorBinding<R: Resource> {
    /// Resource record (stored or about to be)
    Resource(SharedRecord<R>),

    /// Patch operations bound to their target
    Operations(PatchPlan<R>),

    /// Plain JSON value
    Value(Value),

    /// Anything else an extension needs to share
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl<R: Resource> ActorBinding<R> {
    /// Variant name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resource(_) => "resource",
            Self::Operations(_) => "operation list",
            Self::Value(_) => "value",
            Self::Opaque(_) => "opaque value",
        }
    }
}

/// Role name to binding map, in binding order
#[derive(Debug, Clone)]
pub struct Actors<R: Resource> {
    bindings: IndexMap<String, ActorBinding<R>>,
}

impl<R: Resource> Actors<R> {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// Bind `role`, returning the binding it replaced
    pub fn bind(&mut self, role: impl Into<String>, binding: ActorBinding<R>) -> Option<ActorBinding<R>> {
        self.bindings.insert(role.into(), binding)
    }

    /// Bind a resource record to `role`
    pub fn bind_resource(&mut self, role: impl Into<String>, record: SharedRecord<R>) -> Option<ActorBinding<R>> {
        self.bind(role, ActorBinding::Resource(record))
    }

    /// Bind an arbitrary shared value to `role`
    pub fn bind_opaque<T: Any + Send + Sync>(&mut self, role: impl Into<String>, value: T) -> Option<ActorBinding<R>> {
        self.bind(role, ActorBinding::Opaque(Arc::new(value)))
    }

    /// Remove `role`, keeping the order of the others
    pub fn unbind(&mut self, role: &str) -> Option<ActorBinding<R>> {
        self.bindings.shift_remove(role)
    }

    /// Binding for `role`
    #[inline]
    #[must_use]
    pub fn get(&self, role: &str) -> Option<&ActorBinding<R>> {
        self.bindings.get(role)
    }

    /// Mutable binding for `role`
    #[inline]
    pub fn get_mut(&mut self, role: &str) -> Option<&mut ActorBinding<R>> {
        self.bindings.get_mut(role)
    }

    /// Check if `role` is bound
    #[inline]
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.bindings.contains_key(role)
    }

    /// Resource bound to `role`
    #[must_use]
    pub fn resource(&self, role: &str) -> Option<&SharedRecord<R>> {
        match self.get(role)? {
            ActorBinding::Resource(record) => Some(record),
            _ => None,
        }
    }

    /// Resource bound to `role`, required
    ///
    /// # Errors
    /// Returns `PipelineError::MissingActor` if absent or not a resource
    pub fn require_resource(&self, role: &str) -> Result<&SharedRecord<R>, PipelineError> {
        self.resource(role).ok_or_else(|| PipelineError::MissingActor {
            role: role.to_string(),
            expected: "resource",
        })
    }

    /// Patch plan bound to `role`
    #[must_use]
    pub fn operations(&self, role: &str) -> Option<&PatchPlan<R>> {
        match self.get(role)? {
            ActorBinding::Operations(plan) => Some(plan),
            _ => None,
        }
    }

    /// Mutable patch plan bound to `role`
    pub fn operations_mut(&mut self, role: &str) -> Option<&mut PatchPlan<R>> {
        match self.get_mut(role)? {
            ActorBinding::Operations(plan) => Some(plan),
            _ => None,
        }
    }

    /// Patch plan bound to `role`, required
    ///
    /// # Errors
    /// Returns `PipelineError::MissingActor` if absent or not an operation list
    pub fn require_operations(&self, role: &str) -> Result<&PatchPlan<R>, PipelineError> {
        self.operations(role).ok_or_else(|| PipelineError::MissingActor {
            role: role.to_string(),
            expected: "operation list",
        })
    }

    /// JSON value bound to `role`
    #[must_use]
    pub fn value(&self, role: &str) -> Option<&Value> {
        match self.get(role)? {
            ActorBinding::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Opaque value bound to `role`, if it has type `T`
    #[must_use]
    pub fn opaque<T: Any + Send + Sync>(&self, role: &str) -> Option<Arc<T>> {
        match self.get(role)? {
            ActorBinding::Opaque(value) => Arc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Bound role names in binding order
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Number of bound roles
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if nothing is bound
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<R: Resource> Default for Actors<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Extend<(String, ActorBinding<R>)> for Actors<R> {
    fn extend<I: IntoIterator<Item = (String, ActorBinding<R>)>>(&mut self, iter: I) {
        self.bindings.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofx_resource::entities::Group;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Principal(&'static str);

    #[test]
    fn actors_bind_and_replace() {
        let mut actors = Actors::<Group>::new();
        let first = SharedRecord::new(Group::new("a"));
        let second = SharedRecord::new(Group::new("b"));

        assert!(actors.bind_resource("Group", first).is_none());
        let replaced = actors.bind_resource("Group", second.clone());
        assert!(matches!(replaced, Some(ActorBinding::Resource(_))));
        assert!(actors.require_resource("Group").unwrap().ptr_eq(&second));
        assert_eq!(actors.len(), 1);
    }

    #[test]
    fn actors_unbind_keeps_order() {
        let mut actors = Actors::<Group>::new();
        actors.bind("a", ActorBinding::Value(json!(1)));
        actors.bind("b", ActorBinding::Value(json!(2)));
        actors.bind("c", ActorBinding::Value(json!(3)));
        actors.unbind("b");
        assert_eq!(actors.roles().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn actors_require_reports_wrong_variant() {
        let mut actors = Actors::<Group>::new();
        actors.bind("Group", ActorBinding::Value(json!("not a record")));
        assert!(matches!(
            actors.require_resource("Group"),
            Err(PipelineError::MissingActor { role, expected: "resource" }) if role == "Group"
        ));
        assert!(matches!(
            actors.require_operations(OPERATIONS_ROLE),
            Err(PipelineError::MissingActor { .. })
        ));
    }

    #[test]
    fn actors_opaque_downcast() {
        let mut actors = Actors::<Group>::new();
        actors.bind_opaque("Principal", Principal("alice"));
        assert_eq!(
            actors.opaque::<Principal>("Principal").as_deref(),
            Some(&Principal("alice"))
        );
        assert!(actors.opaque::<String>("Principal").is_none());
        assert_eq!(actors.get("Principal").map(ActorBinding::kind), Some("opaque value"));
    }
}
