//! Verbs and the phase orchestrator
//!
//! Every operation runs the same sequence:
//!
//! ```text
//! prepare ─► HandleInput ─► admit ─► ValidateInput ─► bind actors
//!        ─► DefineActors ─► Bind ─► BeforeAction ─► [default action]
//!        ─► AfterAction ─► ReleaseUnmanagedResources
//! ```
//!
//! A [`Verb`] supplies only what differs between operations: which inputs
//! it reads (`prepare`), the built-in precondition checks and the actors
//! they produce (`admit`), and the default action. [`run`] owns the phase
//! sequencing, cancellation checks and the skip decision.

use crate::actor::ActorBinding;
use crate::config::{CancellationCheck, ServiceConfig};
use crate::context::{ActionDecision, Context};
use crate::error::PipelineError;
use crate::phase::Phase;
use async_trait::async_trait;
use ofx_resource::{Resource, ResourceStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Actor bindings produced by a precondition check
pub type Bindings<R> = Vec<(String, ActorBinding<R>)>;

/// What a verb may touch besides the context
#[derive(Debug)]
pub struct Scope<'a, R: Resource> {
    /// Backing store
    pub store: &'a ResourceStore<R>,
    /// Service configuration
    pub config: &'a ServiceConfig,
}

impl<'a, R: Resource> Scope<'a, R> {
    /// Create scope
    #[inline]
    #[must_use]
    pub fn new(store: &'a ResourceStore<R>, config: &'a ServiceConfig) -> Self {
        Self { store, config }
    }
}

/// One operation kind run through the phase sequence
#[async_trait]
pub trait Verb<R: Resource>: Send + Sync {
    /// Data read from inputs and carried to `admit` and the default action
    type Prepared: Send;

    /// Verb name (for logs)
    fn name(&self) -> &'static str;

    /// Read required inputs and parse payloads
    ///
    /// Runs before any phase.
    ///
    /// # Errors
    /// Input errors (`MissingInput`, `TypeMismatch`), payload parse errors,
    /// and lookups that must fail before the first phase
    fn prepare(&self, scope: &Scope<'_, R>, ctx: &Context<R>) -> Result<Self::Prepared, PipelineError>;

    /// Built-in precondition checks
    ///
    /// Runs after `HandleInput` and before `ValidateInput`. The returned
    /// bindings are added to the actors before `DefineActors`.
    ///
    /// # Errors
    /// `EntityNotFound`, `EntityInvalid` or `InvalidOperation`
    fn admit(
        &self,
        scope: &Scope<'_, R>,
        ctx: &Context<R>,
        prepared: &Self::Prepared,
    ) -> Result<Bindings<R>, PipelineError>;

    /// Built-in behavior, unless an extension skipped it
    ///
    /// # Errors
    /// Any failure of the action itself
    async fn default_action(
        &self,
        scope: &Scope<'_, R>,
        ctx: &mut Context<R>,
        prepared: Self::Prepared,
    ) -> Result<(), PipelineError>;
}

/// Run `verb` through the full phase sequence
///
/// # Errors
/// The first error raised by a precondition, a phase, the default action or
/// cancellation; nothing runs after it
pub async fn run<R, V>(
    verb: &V,
    scope: &Scope<'_, R>,
    ctx: &mut Context<R>,
    cancel: &CancellationToken,
) -> Result<(), PipelineError>
where
    R: Resource,
    V: Verb<R> + ?Sized,
{
    let span = tracing::debug_span!("operation", verb = verb.name(), kind = R::KIND);
    drive(verb, scope, ctx, cancel).instrument(span).await
}

async fn drive<R, V>(
    verb: &V,
    scope: &Scope<'_, R>,
    ctx: &mut Context<R>,
    cancel: &CancellationToken,
) -> Result<(), PipelineError>
where
    R: Resource,
    V: Verb<R> + ?Sized,
{
    if ctx.is_consumed() {
        return Err(PipelineError::InvalidOperation(
            "context was already used by another operation".to_string(),
        ));
    }
    ctx.mark_started();
    ctx.attach_cancellation(cancel.clone());
    checkpoint(cancel)?;

    let every_phase = scope.config.cancellation == CancellationCheck::EveryPhase;

    let prepared = verb.prepare(scope, ctx)?;
    dispatch(Phase::HandleInput, ctx, cancel, every_phase).await?;

    let bindings = verb.admit(scope, ctx, &prepared)?;
    dispatch(Phase::ValidateInput, ctx, cancel, every_phase).await?;

    ctx.actors_mut().extend(bindings);
    dispatch(Phase::DefineActors, ctx, cancel, every_phase).await?;
    dispatch(Phase::Bind, ctx, cancel, every_phase).await?;
    dispatch(Phase::BeforeAction, ctx, cancel, every_phase).await?;

    match ctx.decide() {
        ActionDecision::Run => {
            if every_phase {
                checkpoint(cancel)?;
            }
            tracing::debug!("running default action");
            verb.default_action(scope, ctx, prepared).await?;
        }
        ActionDecision::Skip => {
            tracing::debug!("default action skipped by extension");
        }
    }

    // No cancellation checks past the action: release always follows it.
    dispatch(Phase::AfterAction, ctx, cancel, false).await?;
    dispatch(Phase::ReleaseUnmanagedResources, ctx, cancel, false).await
}

async fn dispatch<R: Resource>(
    phase: Phase,
    ctx: &mut Context<R>,
    cancel: &CancellationToken,
    check: bool,
) -> Result<(), PipelineError> {
    if check {
        checkpoint(cancel)?;
    }
    let plugins = Arc::clone(ctx.plugins());
    plugins.execute(phase, ctx).await
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        tracing::debug!("operation cancelled");
        return Err(PipelineError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Inputs;
    use crate::context::OperationResult;
    use crate::plugin::PhaseFn;
    use crate::registry::PluginRegistry;
    use ofx_resource::entities::Group;
    use serde_json::Value;

    /// Verb that echoes the `Message` input into the result
    struct Echo;

    #[async_trait]
    impl Verb<Group> for Echo {
        type Prepared = String;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn prepare(&self, _: &Scope<'_, Group>, ctx: &Context<Group>) -> Result<String, PipelineError> {
            ctx.required_value("Message")
        }

        fn admit(
            &self,
            _: &Scope<'_, Group>,
            _: &Context<Group>,
            message: &String,
        ) -> Result<Bindings<Group>, PipelineError> {
            if message.is_empty() {
                return Err(PipelineError::InvalidOperation("empty message".to_string()));
            }
            Ok(vec![("Message".to_string(), ActorBinding::Value(Value::from(message.as_str())))])
        }

        async fn default_action(
            &self,
            _: &Scope<'_, Group>,
            ctx: &mut Context<Group>,
            message: String,
        ) -> Result<(), PipelineError> {
            ctx.set_result(OperationResult::Value(Value::from(message)));
            Ok(())
        }
    }

    fn trace_phases(registry: &mut PluginRegistry<Group>) {
        for phase in Phase::ALL {
            registry.register(PhaseFn::new(phase.as_str(), phase, move |ctx: &mut Context<Group>| {
                let mut seen = ctx.state().optional::<Vec<String>>("Phases")?.unwrap_or_default();
                seen.push(phase.to_string());
                ctx.state_mut().insert("Phases", seen);
                Ok(())
            }));
        }
    }

    fn phases(ctx: &Context<Group>) -> Vec<String> {
        ctx.state()
            .optional::<Vec<String>>("Phases")
            .unwrap()
            .unwrap_or_default()
    }

    async fn run_echo(
        registry: PluginRegistry<Group>,
        inputs: Inputs,
        config: &ServiceConfig,
        cancel: &CancellationToken,
    ) -> (Context<Group>, Result<(), PipelineError>) {
        let store = ResourceStore::new();
        let scope = Scope::new(&store, config);
        let mut ctx = Context::new(inputs, Arc::new(registry));
        let outcome = run(&Echo, &scope, &mut ctx, cancel).await;
        (ctx, outcome)
    }

    #[tokio::test]
    async fn run_visits_every_phase_in_order() {
        let mut registry = PluginRegistry::new();
        trace_phases(&mut registry);

        let (ctx, outcome) = run_echo(
            registry,
            Inputs::new().with("Message", "hi"),
            &ServiceConfig::new(),
            &CancellationToken::new(),
        )
        .await;

        outcome.unwrap();
        let expected: Vec<String> = Phase::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(phases(&ctx), expected);
        assert_eq!(ctx.result().and_then(OperationResult::as_value), Some(&Value::from("hi")));
        assert!(ctx.actors().contains("Message"));
        assert_eq!(ctx.decision(), Some(ActionDecision::Run));
    }

    #[tokio::test]
    async fn run_missing_input_fails_before_any_phase() {
        let mut registry = PluginRegistry::new();
        trace_phases(&mut registry);

        let (ctx, outcome) =
            run_echo(registry, Inputs::new(), &ServiceConfig::new(), &CancellationToken::new()).await;

        assert!(matches!(outcome, Err(PipelineError::MissingInput { path }) if path == "Message"));
        assert!(phases(&ctx).is_empty());
    }

    #[tokio::test]
    async fn run_admit_failure_stops_after_handle_input() {
        let mut registry = PluginRegistry::new();
        trace_phases(&mut registry);

        let (ctx, outcome) = run_echo(
            registry,
            Inputs::new().with("Message", ""),
            &ServiceConfig::new(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, Err(PipelineError::InvalidOperation(_))));
        assert_eq!(phases(&ctx), vec!["HandleInput"]);
    }

    #[tokio::test]
    async fn run_skip_still_releases() {
        let mut registry = PluginRegistry::new();
        registry.register(PhaseFn::new("skip", Phase::BeforeAction, |ctx: &mut Context<Group>| {
            ctx.skip_default_action();
            Ok(())
        }));
        trace_phases(&mut registry);

        let (ctx, outcome) = run_echo(
            registry,
            Inputs::new().with("Message", "hi"),
            &ServiceConfig::new(),
            &CancellationToken::new(),
        )
        .await;

        outcome.unwrap();
        assert!(ctx.result().is_none());
        assert_eq!(ctx.decision(), Some(ActionDecision::Skip));
        assert_eq!(phases(&ctx).last().map(String::as_str), Some("ReleaseUnmanagedResources"));
    }

    #[tokio::test]
    async fn run_cancelled_before_start() {
        let mut registry = PluginRegistry::new();
        trace_phases(&mut registry);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (ctx, outcome) = run_echo(
            registry,
            Inputs::new().with("Message", "hi"),
            &ServiceConfig::new().with_cancellation(CancellationCheck::OnEntry),
            &cancel,
        )
        .await;

        assert!(outcome.unwrap_err().is_cancelled());
        assert!(phases(&ctx).is_empty());
    }

    #[tokio::test]
    async fn run_cancelled_between_phases() {
        let cancel = CancellationToken::new();
        let mut registry = PluginRegistry::new();
        let trigger = cancel.clone();
        registry.register(PhaseFn::new("cancel", Phase::DefineActors, move |_: &mut Context<Group>| {
            trigger.cancel();
            Ok(())
        }));
        trace_phases(&mut registry);

        let (ctx, outcome) = run_echo(
            registry,
            Inputs::new().with("Message", "hi"),
            &ServiceConfig::new(),
            &cancel,
        )
        .await;

        assert!(outcome.unwrap_err().is_cancelled());
        assert_eq!(phases(&ctx), vec!["HandleInput", "ValidateInput", "DefineActors"]);
        assert!(ctx.result().is_none());
    }

    #[tokio::test]
    async fn run_on_entry_policy_ignores_late_cancellation() {
        let cancel = CancellationToken::new();
        let mut registry = PluginRegistry::new();
        let trigger = cancel.clone();
        registry.register(PhaseFn::new("cancel", Phase::HandleInput, move |_: &mut Context<Group>| {
            trigger.cancel();
            Ok(())
        }));

        let (ctx, outcome) = run_echo(
            registry,
            Inputs::new().with("Message", "hi"),
            &ServiceConfig::new().with_cancellation(CancellationCheck::OnEntry),
            &cancel,
        )
        .await;

        outcome.unwrap();
        assert!(ctx.result().is_some());
    }

    #[tokio::test]
    async fn run_rejects_reused_context() {
        let store = ResourceStore::new();
        let config = ServiceConfig::new();
        let scope = Scope::new(&store, &config);
        let cancel = CancellationToken::new();
        let mut ctx = Context::new(
            Inputs::new().with("Message", "hi"),
            Arc::new(PluginRegistry::new()),
        );

        run(&Echo, &scope, &mut ctx, &cancel).await.unwrap();
        assert!(matches!(
            run(&Echo, &scope, &mut ctx, &cancel).await,
            Err(PipelineError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn run_rejects_context_after_failed_run() {
        let store = ResourceStore::new();
        let config = ServiceConfig::new();
        let scope = Scope::new(&store, &config);
        let cancel = CancellationToken::new();
        let mut ctx = Context::new(Inputs::new(), Arc::new(PluginRegistry::new()));

        assert!(matches!(
            run(&Echo, &scope, &mut ctx, &cancel).await,
            Err(PipelineError::MissingInput { .. })
        ));
        assert!(matches!(
            run(&Echo, &scope, &mut ctx, &cancel).await,
            Err(PipelineError::InvalidOperation(_))
        ));
        assert!(ctx.result().is_none());
    }
}
