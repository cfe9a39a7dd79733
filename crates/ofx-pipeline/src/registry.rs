//! Plugin registry and phase dispatcher
//!
//! Provides [`PluginRegistry`], which files every registered plugin under
//! each phase it implements (decided once, at registration) and dispatches
//! a phase to those plugins in registration order.

use crate::context::Context;
use crate::error::PipelineError;
use crate::phase::Phase;
use crate::plugin::{invoke, Plugin};
use ofx_resource::Resource;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Registered plugins, indexed by phase
pub struct PluginRegistry<R: Resource> {
    plugins: Vec<Arc<dyn Plugin<R>>>,
    by_phase: HashMap<Phase, Vec<Arc<dyn Plugin<R>>>>,
}

impl<R: Resource> PluginRegistry<R> {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            by_phase: HashMap::new(),
        }
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: impl Plugin<R> + 'static) -> &mut Self {
        self.register_arc(Arc::new(plugin))
    }

    /// Register a shared plugin
    pub fn register_arc(&mut self, plugin: Arc<dyn Plugin<R>>) -> &mut Self {
        let phases: Vec<Phase> = Phase::ALL
            .into_iter()
            .filter(|phase| plugin.implements(*phase))
            .collect();
        tracing::debug!(plugin = plugin.name(), ?phases, "plugin registered");

        for phase in phases {
            self.by_phase
                .entry(phase)
                .or_default()
                .push(Arc::clone(&plugin));
        }
        self.plugins.push(plugin);
        self
    }

    /// Register a plugin (builder style)
    #[must_use]
    pub fn with(mut self, plugin: impl Plugin<R> + 'static) -> Self {
        self.register(plugin);
        self
    }

    /// Plugins implementing `phase`, in registration order
    #[must_use]
    pub fn plugins_for(&self, phase: Phase) -> &[Arc<dyn Plugin<R>>] {
        self.by_phase.get(&phase).map(Vec::as_slice).unwrap_or_default()
    }

    /// Names of all plugins, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name())
    }

    /// Number of registered plugins
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every plugin implementing `phase`, in registration order
    ///
    /// Stops at the first failure.
    ///
    /// # Errors
    /// Returns the failing plugin's error unchanged
    pub async fn execute(&self, phase: Phase, ctx: &mut Context<R>) -> Result<(), PipelineError> {
        let plugins = self.plugins_for(phase);
        tracing::debug!(%phase, count = plugins.len(), "dispatching phase");

        for plugin in plugins {
            tracing::trace!(plugin = plugin.name(), %phase, "invoking plugin");
            let Some(outcome) = invoke(plugin.as_ref(), phase, ctx).await else {
                continue;
            };
            if let Err(err) = outcome {
                tracing::warn!(plugin = plugin.name(), %phase, error = %err, "plugin failed");
                return Err(err);
            }
        }

        Ok(())
    }
}

impl<R: Resource> Default for PluginRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Debug for PluginRegistry<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Inputs;
    use crate::plugin::PhaseFn;
    use ofx_resource::entities::Group;
    use serde_json::Value;

    fn recorder(name: &'static str, phase: Phase) -> PhaseFn<Group, impl Fn(&mut Context<Group>) -> Result<(), PipelineError>> {
        PhaseFn::new(name, phase, move |ctx: &mut Context<Group>| {
            let mut seen = ctx
                .state()
                .get("Seen")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            seen.push(Value::from(name));
            ctx.state_mut().insert("Seen", seen);
            Ok(())
        })
    }

    fn seen(ctx: &Context<Group>) -> Vec<String> {
        ctx.state()
            .optional::<Vec<String>>("Seen")
            .unwrap()
            .unwrap_or_default()
    }

    #[test]
    fn registry_files_by_phase() {
        let registry = PluginRegistry::new()
            .with(recorder("a", Phase::Bind))
            .with(recorder("b", Phase::AfterAction))
            .with(recorder("c", Phase::Bind));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(registry.plugins_for(Phase::Bind).len(), 2);
        assert!(registry.plugins_for(Phase::HandleInput).is_empty());
    }

    #[tokio::test]
    async fn registry_executes_in_registration_order() {
        let registry = Arc::new(
            PluginRegistry::new()
                .with(recorder("first", Phase::Bind))
                .with(recorder("other-phase", Phase::AfterAction))
                .with(recorder("second", Phase::Bind)),
        );
        let mut ctx = Context::new(Inputs::new(), Arc::clone(&registry));

        registry.execute(Phase::Bind, &mut ctx).await.unwrap();
        assert_eq!(seen(&ctx), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn registry_execute_fails_fast() {
        let registry = Arc::new(
            PluginRegistry::new()
                .with(recorder("before", Phase::ValidateInput))
                .with(PhaseFn::new("reject", Phase::ValidateInput, |_: &mut Context<Group>| {
                    Err(PipelineError::InvalidOperation("rejected".to_string()))
                }))
                .with(recorder("after", Phase::ValidateInput)),
        );
        let mut ctx = Context::new(Inputs::new(), Arc::clone(&registry));

        let err = registry
            .execute(Phase::ValidateInput, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidOperation(msg) if msg == "rejected"));
        assert_eq!(seen(&ctx), vec!["before"]);
    }

    #[tokio::test]
    async fn registry_execute_empty_phase() {
        let registry = Arc::new(PluginRegistry::<Group>::new());
        let mut ctx = Context::new(Inputs::new(), Arc::clone(&registry));
        assert!(registry.execute(Phase::HandleInput, &mut ctx).await.is_ok());
    }

    #[test]
    fn registry_debug_lists_names() {
        let registry = PluginRegistry::new().with(recorder("a", Phase::Bind));
        assert_eq!(format!("{registry:?}"), r#"PluginRegistry { plugins: ["a"] }"#);
    }
}
