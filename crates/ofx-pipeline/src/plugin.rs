//! Extension plugins
//!
//! Each phase has its own trait. A [`Plugin`] advertises which phases it
//! implements through its `as_*` capability methods; the registry asks once,
//! at registration, and files the plugin under every phase it answers for.
//!
//! ```
//! use async_trait::async_trait;
//! use ofx_pipeline::{BeforeAction, Context, Plugin, PluginResult};
//! use ofx_resource::entities::Client;
//!
//! struct ReadOnly;
//!
//! #[async_trait]
//! impl BeforeAction<Client> for ReadOnly {
//!     async fn before_action(&self, ctx: &mut Context<Client>) -> PluginResult {
//!         ctx.skip_default_action();
//!         Ok(())
//!     }
//! }
//!
//! impl Plugin<Client> for ReadOnly {
//!     fn name(&self) -> &str {
//!         "read-only"
//!     }
//!
//!     fn as_before_action(&self) -> Option<&dyn BeforeAction<Client>> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::context::Context;
use crate::error::PipelineError;
use crate::phase::Phase;
use async_trait::async_trait;
use ofx_resource::Resource;
use std::marker::PhantomData;

/// Outcome of one extension call
pub type PluginResult = Result<(), PipelineError>;

/// [`Phase::HandleInput`] capability
#[async_trait]
pub trait HandleInput<R: Resource>: Send + Sync {
    /// Normalize or transform raw inputs
    async fn handle_input(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// [`Phase::ValidateInput`] capability
#[async_trait]
pub trait ValidateInput<R: Resource>: Send + Sync {
    /// Validate inputs and payload
    async fn validate_input(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// [`Phase::DefineActors`] capability
#[async_trait]
pub trait DefineActors<R: Resource>: Send + Sync {
    /// Establish or adjust actor bindings
    async fn define_actors(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// [`Phase::Bind`] capability
#[async_trait]
pub trait Bind<R: Resource>: Send + Sync {
    /// Wire cross-cutting concerns
    async fn bind(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// [`Phase::BeforeAction`] capability
#[async_trait]
pub trait BeforeAction<R: Resource>: Send + Sync {
    /// Runs right before the default action
    async fn before_action(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// [`Phase::AfterAction`] capability
#[async_trait]
pub trait AfterAction<R: Resource>: Send + Sync {
    /// Runs after the default action (or its skip)
    async fn after_action(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// [`Phase::ReleaseUnmanagedResources`] capability
#[async_trait]
pub trait ReleaseUnmanagedResources<R: Resource>: Send + Sync {
    /// Release anything acquired earlier in the operation
    async fn release_unmanaged_resources(&self, ctx: &mut Context<R>) -> PluginResult;
}

/// Registered extension
///
/// Override the `as_*` method of every phase the plugin implements; the
/// defaults answer "not implemented".
pub trait Plugin<R: Resource>: Send + Sync {
    /// Plugin name (for logs)
    fn name(&self) -> &str;

    /// `HandleInput` capability
    fn as_handle_input(&self) -> Option<&dyn HandleInput<R>> {
        None
    }

    /// `ValidateInput` capability
    fn as_validate_input(&self) -> Option<&dyn ValidateInput<R>> {
        None
    }

    /// `DefineActors` capability
    fn as_define_actors(&self) -> Option<&dyn DefineActors<R>> {
        None
    }

    /// `Bind` capability
    fn as_bind(&self) -> Option<&dyn Bind<R>> {
        None
    }

    /// `BeforeAction` capability
    fn as_before_action(&self) -> Option<&dyn BeforeAction<R>> {
        None
    }

    /// `AfterAction` capability
    fn as_after_action(&self) -> Option<&dyn AfterAction<R>> {
        None
    }

    /// `ReleaseUnmanagedResources` capability
    fn as_release_unmanaged_resources(&self) -> Option<&dyn ReleaseUnmanagedResources<R>> {
        None
    }

    /// Check if the plugin implements `phase`
    fn implements(&self, phase: Phase) -> bool {
        match phase {
            Phase::HandleInput => self.as_handle_input().is_some(),
            Phase::ValidateInput => self.as_validate_input().is_some(),
            Phase::DefineActors => self.as_define_actors().is_some(),
            Phase::Bind => self.as_bind().is_some(),
            Phase::BeforeAction => self.as_before_action().is_some(),
            Phase::AfterAction => self.as_after_action().is_some(),
            Phase::ReleaseUnmanagedResources => self.as_release_unmanaged_resources().is_some(),
        }
    }
}

/// Run `plugin` for `phase`
///
/// Returns `None` if the plugin does not implement the phase.
pub(crate) async fn invoke<R: Resource>(
    plugin: &dyn Plugin<R>,
    phase: Phase,
    ctx: &mut Context<R>,
) -> Option<PluginResult> {
    let outcome = match phase {
        Phase::HandleInput => plugin.as_handle_input()?.handle_input(ctx).await,
        Phase::ValidateInput => plugin.as_validate_input()?.validate_input(ctx).await,
        Phase::DefineActors => plugin.as_define_actors()?.define_actors(ctx).await,
        Phase::Bind => plugin.as_bind()?.bind(ctx).await,
        Phase::BeforeAction => plugin.as_before_action()?.before_action(ctx).await,
        Phase::AfterAction => plugin.as_after_action()?.after_action(ctx).await,
        Phase::ReleaseUnmanagedResources => {
            plugin
                .as_release_unmanaged_resources()?
                .release_unmanaged_resources(ctx)
                .await
        }
    };
    Some(outcome)
}

/// Single-phase plugin backed by a closure
///
/// ```
/// use ofx_pipeline::{Context, Phase, PhaseFn, PluginRegistry};
/// use ofx_resource::entities::Group;
///
/// let mut registry = PluginRegistry::<Group>::new();
/// registry.register(PhaseFn::new("audit", Phase::AfterAction, |ctx: &mut Context<Group>| {
///     ctx.state_mut().insert("Audit.Seen", true);
///     Ok(())
/// }));
/// assert_eq!(registry.plugins_for(Phase::AfterAction).len(), 1);
/// ```
pub struct PhaseFn<R, F> {
    name: String,
    phase: Phase,
    f: F,
    _resource: PhantomData<fn() -> R>,
}

impl<R, F> PhaseFn<R, F>
where
    R: Resource,
    F: Fn(&mut Context<R>) -> PluginResult + Send + Sync,
{
    /// Create plugin running `f` at `phase`
    #[must_use]
    pub fn new(name: impl Into<String>, phase: Phase, f: F) -> Self {
        Self {
            name: name.into(),
            phase,
            f,
            _resource: PhantomData,
        }
    }

    /// Phase the closure runs at
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

macro_rules! phase_fn_capability {
    ($phase:ident, $method:ident) => {
        #[async_trait]
        impl<R, F> $phase<R> for PhaseFn<R, F>
        where
            R: Resource,
            F: Fn(&mut Context<R>) -> PluginResult + Send + Sync,
        {
            async fn $method(&self, ctx: &mut Context<R>) -> PluginResult {
                (self.f)(ctx)
            }
        }
    };
}

phase_fn_capability!(HandleInput, handle_input);
phase_fn_capability!(ValidateInput, validate_input);
phase_fn_capability!(DefineActors, define_actors);
phase_fn_capability!(Bind, bind);
phase_fn_capability!(BeforeAction, before_action);
phase_fn_capability!(AfterAction, after_action);
phase_fn_capability!(ReleaseUnmanagedResources, release_unmanaged_resources);

impl<R, F> Plugin<R> for PhaseFn<R, F>
where
    R: Resource,
    F: Fn(&mut Context<R>) -> PluginResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn as_handle_input(&self) -> Option<&dyn HandleInput<R>> {
        (self.phase == Phase::HandleInput).then_some(self as &dyn HandleInput<R>)
    }

    fn as_validate_input(&self) -> Option<&dyn ValidateInput<R>> {
        (self.phase == Phase::ValidateInput).then_some(self as &dyn ValidateInput<R>)
    }

    fn as_define_actors(&self) -> Option<&dyn DefineActors<R>> {
        (self.phase == Phase::DefineActors).then_some(self as &dyn DefineActors<R>)
    }

    fn as_bind(&self) -> Option<&dyn Bind<R>> {
        (self.phase == Phase::Bind).then_some(self as &dyn Bind<R>)
    }

    fn as_before_action(&self) -> Option<&dyn BeforeAction<R>> {
        (self.phase == Phase::BeforeAction).then_some(self as &dyn BeforeAction<R>)
    }

    fn as_after_action(&self) -> Option<&dyn AfterAction<R>> {
        (self.phase == Phase::AfterAction).then_some(self as &dyn AfterAction<R>)
    }

    fn as_release_unmanaged_resources(&self) -> Option<&dyn ReleaseUnmanagedResources<R>> {
        (self.phase == Phase::ReleaseUnmanagedResources)
            .then_some(self as &dyn ReleaseUnmanagedResources<R>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Inputs;
    use crate::registry::PluginRegistry;
    use ofx_resource::entities::Group;
    use std::sync::Arc;

    struct Auditor;

    #[async_trait]
    impl DefineActors<Group> for Auditor {
        async fn define_actors(&self, ctx: &mut Context<Group>) -> PluginResult {
            let bound = ctx.actors().len();
            ctx.state_mut().insert("Audit.Actors", bound);
            Ok(())
        }
    }

    #[async_trait]
    impl AfterAction<Group> for Auditor {
        async fn after_action(&self, ctx: &mut Context<Group>) -> PluginResult {
            ctx.state_mut().insert("Audit.Done", true);
            Ok(())
        }
    }

    impl Plugin<Group> for Auditor {
        fn name(&self) -> &str {
            "auditor"
        }

        fn as_define_actors(&self) -> Option<&dyn DefineActors<Group>> {
            Some(self)
        }

        fn as_after_action(&self) -> Option<&dyn AfterAction<Group>> {
            Some(self)
        }
    }

    fn context() -> Context<Group> {
        Context::new(Inputs::new(), Arc::new(PluginRegistry::new()))
    }

    #[test]
    fn plugin_capabilities() {
        let phases: Vec<_> = Phase::ALL.into_iter().filter(|p| Auditor.implements(*p)).collect();
        assert_eq!(phases, vec![Phase::DefineActors, Phase::AfterAction]);
    }

    #[tokio::test]
    async fn invoke_skips_unimplemented_phase() {
        let mut ctx = context();
        assert!(invoke(&Auditor, Phase::Bind, &mut ctx).await.is_none());
        assert!(matches!(
            invoke(&Auditor, Phase::AfterAction, &mut ctx).await,
            Some(Ok(()))
        ));
        assert!(ctx.state().contains("Audit.Done"));
    }

    #[tokio::test]
    async fn phase_fn_answers_for_one_phase() {
        let plugin = PhaseFn::new("skipper", Phase::BeforeAction, |ctx: &mut Context<Group>| {
            ctx.skip_default_action();
            Ok(())
        });
        assert_eq!(plugin.phase(), Phase::BeforeAction);
        assert!(plugin.implements(Phase::BeforeAction));
        assert!(!plugin.implements(Phase::AfterAction));

        let mut ctx = context();
        invoke(&plugin, Phase::BeforeAction, &mut ctx).await;
        assert!(ctx.is_default_action_skipped());
    }
}
