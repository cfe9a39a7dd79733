//! Testing utilities for OFX workspace
//!
//! Spy plugins, fixtures, and tracing setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use ofx_pipeline::{
    AfterAction, BeforeAction, Bind, ClientService, Context, DefineActors, GroupService,
    HandleInput, Inputs, OperationResult, Phase, PipelineError, Plugin, PluginRegistry,
    PluginResult, ReleaseUnmanagedResources, ValidateInput,
};
use ofx_resource::entities::{Client, Group};
use ofx_resource::{Resource, ResourceId, ResourceStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shared record of `(plugin, phase)` visits
#[derive(Debug, Clone, Default)]
pub struct PhaseLog(Arc<Mutex<Vec<(String, Phase)>>>);

impl PhaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, plugin: &str, phase: Phase) {
        self.0.lock().push((plugin.to_string(), phase));
    }

    pub fn entries(&self) -> Vec<(String, Phase)> {
        self.0.lock().clone()
    }

    /// Phases in visit order, across plugins
    pub fn phases(&self) -> Vec<Phase> {
        self.0.lock().iter().map(|(_, phase)| *phase).collect()
    }

    /// Plugins in visit order, for one phase
    pub fn plugins_at(&self, phase: Phase) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter(|(_, p)| *p == phase)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.0.lock().iter().any(|(_, p)| *p == phase)
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// Error raised by a failing [`SpyPlugin`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{plugin} failed at {phase}")]
pub struct SpyFailure {
    pub plugin: String,
    pub phase: Phase,
}

/// Plugin implementing every phase, logging each visit
///
/// Optionally skips the default action or fails at a chosen phase.
#[derive(Debug, Clone)]
pub struct SpyPlugin {
    name: String,
    log: PhaseLog,
    skip_at: Option<Phase>,
    fail_at: Option<Phase>,
}

impl SpyPlugin {
    pub fn new(name: impl Into<String>, log: &PhaseLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            skip_at: None,
            fail_at: None,
        }
    }

    /// Skip the default action when visiting `phase`
    #[must_use]
    pub fn skipping_at(mut self, phase: Phase) -> Self {
        self.skip_at = Some(phase);
        self
    }

    /// Fail with [`SpyFailure`] when visiting `phase` (after logging it)
    #[must_use]
    pub fn failing_at(mut self, phase: Phase) -> Self {
        self.fail_at = Some(phase);
        self
    }

    fn visit<R: Resource>(&self, phase: Phase, ctx: &mut Context<R>) -> PluginResult {
        self.log.record(&self.name, phase);
        if self.skip_at == Some(phase) {
            ctx.skip_default_action();
        }
        if self.fail_at == Some(phase) {
            return Err(PipelineError::extension(SpyFailure {
                plugin: self.name.clone(),
                phase,
            }));
        }
        Ok(())
    }
}

macro_rules! spy_capability {
    ($trait:ident, $method:ident, $phase:expr) => {
        #[async_trait]
        impl<R: Resource> $trait<R> for SpyPlugin {
            async fn $method(&self, ctx: &mut Context<R>) -> PluginResult {
                self.visit($phase, ctx)
            }
        }
    };
}

spy_capability!(HandleInput, handle_input, Phase::HandleInput);
spy_capability!(ValidateInput, validate_input, Phase::ValidateInput);
spy_capability!(DefineActors, define_actors, Phase::DefineActors);
spy_capability!(Bind, bind, Phase::Bind);
spy_capability!(BeforeAction, before_action, Phase::BeforeAction);
spy_capability!(AfterAction, after_action, Phase::AfterAction);
spy_capability!(
    ReleaseUnmanagedResources,
    release_unmanaged_resources,
    Phase::ReleaseUnmanagedResources
);

impl<R: Resource> Plugin<R> for SpyPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_handle_input(&self) -> Option<&dyn HandleInput<R>> {
        Some(self)
    }

    fn as_validate_input(&self) -> Option<&dyn ValidateInput<R>> {
        Some(self)
    }

    fn as_define_actors(&self) -> Option<&dyn DefineActors<R>> {
        Some(self)
    }

    fn as_bind(&self) -> Option<&dyn Bind<R>> {
        Some(self)
    }

    fn as_before_action(&self) -> Option<&dyn BeforeAction<R>> {
        Some(self)
    }

    fn as_after_action(&self) -> Option<&dyn AfterAction<R>> {
        Some(self)
    }

    fn as_release_unmanaged_resources(&self) -> Option<&dyn ReleaseUnmanagedResources<R>> {
        Some(self)
    }
}

/// Registry with one plugin
pub fn registry_with<R: Resource>(plugin: impl Plugin<R> + 'static) -> PluginRegistry<R> {
    PluginRegistry::new().with(plugin)
}

/// Stored client with a generated identifier
pub fn client(secret: &str) -> Client {
    Client::new(secret).with_id(ResourceId::generate())
}

/// Stored group with a generated identifier
pub fn group(name: &str) -> Group {
    Group::new(name).with_id(ResourceId::generate())
}

pub fn client_service(clients: Vec<Client>, registry: PluginRegistry<Client>) -> ClientService {
    let store = ResourceStore::with_records(clients).unwrap();
    ClientService::new(Arc::new(store), Arc::new(registry))
}

pub fn group_service(groups: Vec<Group>, registry: PluginRegistry<Group>) -> GroupService {
    let store = ResourceStore::with_records(groups).unwrap();
    GroupService::new(Arc::new(store), Arc::new(registry))
}

/// `Id` input
pub fn id_inputs(id: &ResourceId) -> Inputs {
    Inputs::new().with("Id", id.as_str())
}

/// `Pagination.Page` / `Pagination.PerPage` inputs
pub fn page_inputs(page: usize, per_page: usize) -> Inputs {
    Inputs::new()
        .with("Pagination.Page", page)
        .with("Pagination.PerPage", per_page)
}

/// Identifier left in the result slot by create
pub fn created_id<R: Resource>(ctx: &Context<R>) -> ResourceId {
    ctx.result()
        .and_then(OperationResult::as_identifier)
        .cloned()
        .expect("create leaves the new identifier in the result")
}

/// Install a test-writer subscriber (once per process)
///
/// Honors `RUST_LOG`; defaults to debug output for the pipeline.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ofx_pipeline=debug,ofx_patch=info,ofx_resource=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_log_queries() {
        let log = PhaseLog::new();
        log.record("a", Phase::Bind);
        log.record("b", Phase::Bind);
        log.record("a", Phase::AfterAction);

        assert_eq!(log.phases(), vec![Phase::Bind, Phase::Bind, Phase::AfterAction]);
        assert_eq!(log.plugins_at(Phase::Bind), vec!["a", "b"]);
        assert!(!log.contains(Phase::HandleInput));
        assert_eq!(log.entries().len(), 3);
    }

    #[test]
    fn spy_implements_every_phase() {
        let spy = SpyPlugin::new("spy", &PhaseLog::new());
        assert!(Phase::ALL
            .into_iter()
            .all(|phase| Plugin::<Client>::implements(&spy, phase)));
    }
}
