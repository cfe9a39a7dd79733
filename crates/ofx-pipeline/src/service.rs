//! Resource services
//!
//! Provides [`ResourceService`], the entry point embedders call: it owns a
//! store, the plugin registry and configuration, and runs the built-in
//! verbs through the phase pipeline.

use crate::bag::Inputs;
use crate::config::ServiceConfig;
use crate::context::Context;
use crate::error::PipelineError;
use crate::registry::PluginRegistry;
use crate::verb::{self, Scope, Verb};
use crate::verbs::{Create, Delete, FindByCredentials, GetById, List, Patch};
use ofx_resource::entities::{Client, Group};
use ofx_resource::{Resource, ResourceStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Service for clients
pub type ClientService = ResourceService<Client>;

/// Service for groups
pub type GroupService = ResourceService<Group>;

/// CRUD operations on one resource kind
///
/// Each call takes a fresh [`Context`] (see [`new_context`](Self::new_context))
/// holding the inputs, and leaves the outcome in its result slot.
#[derive(Debug)]
pub struct ResourceService<R: Resource> {
    store: Arc<ResourceStore<R>>,
    plugins: Arc<PluginRegistry<R>>,
    config: ServiceConfig,
}

impl<R: Resource> ResourceService<R> {
    /// Create service over `store` with `plugins`
    #[must_use]
    pub fn new(store: Arc<ResourceStore<R>>, plugins: Arc<PluginRegistry<R>>) -> Self {
        Self {
            store,
            plugins,
            config: ServiceConfig::default(),
        }
    }

    /// Replace configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<ResourceStore<R>> {
        &self.store
    }

    /// Plugin registry
    #[inline]
    #[must_use]
    pub fn plugins(&self) -> &Arc<PluginRegistry<R>> {
        &self.plugins
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Fresh context for one operation
    #[must_use]
    pub fn new_context(&self, inputs: impl Into<Inputs>) -> Context<R> {
        Context::new(inputs, Arc::clone(&self.plugins))
    }

    /// One page of records
    ///
    /// Result: serialized page. State: total count.
    ///
    /// # Errors
    /// Missing or invalid pagination inputs, extension errors, cancellation
    pub async fn get_all(&self, ctx: &mut Context<R>, cancel: &CancellationToken) -> Result<(), PipelineError> {
        self.run(&List, ctx, cancel).await
    }

    /// One record by identifier
    ///
    /// Result: serialized record.
    ///
    /// # Errors
    /// `EntityNotFound` before `ValidateInput` if absent
    pub async fn get_by_id(&self, ctx: &mut Context<R>, cancel: &CancellationToken) -> Result<(), PipelineError> {
        self.run(&GetById, ctx, cancel).await
    }

    /// Store a new record
    ///
    /// Result: the new identifier.
    ///
    /// # Errors
    /// `EntityInvalid` with every validation message if the payload is invalid
    pub async fn create(&self, ctx: &mut Context<R>, cancel: &CancellationToken) -> Result<(), PipelineError> {
        self.run(&Create, ctx, cancel).await
    }

    /// Remove a record by identifier
    ///
    /// # Errors
    /// `EntityNotFound` before `ValidateInput` if absent
    pub async fn delete(&self, ctx: &mut Context<R>, cancel: &CancellationToken) -> Result<(), PipelineError> {
        self.run(&Delete, ctx, cancel).await
    }

    /// Apply patch operations to a record
    ///
    /// # Errors
    /// - `EntityNotFound` if the target is absent
    /// - `InvalidOperation` for an empty operation list
    /// - `Patch` from the first failing operation (earlier ones stay applied)
    pub async fn patch(&self, ctx: &mut Context<R>, cancel: &CancellationToken) -> Result<(), PipelineError> {
        self.run(&Patch, ctx, cancel).await
    }

    /// Run any verb against this service's store and configuration
    ///
    /// # Errors
    /// See [`verb::run`]
    pub async fn run<V>(&self, verb: &V, ctx: &mut Context<R>, cancel: &CancellationToken) -> Result<(), PipelineError>
    where
        V: Verb<R> + ?Sized,
    {
        let scope = Scope::new(&self.store, &self.config);
        verb::run(verb, &scope, ctx, cancel).await
    }
}

impl ResourceService<Client> {
    /// Client matching the `ClientId`/`ClientSecret` inputs, if any
    ///
    /// Result: the client record when found, otherwise unset.
    ///
    /// # Errors
    /// Missing or invalid credential inputs, extension errors, cancellation
    pub async fn get_by_id_and_secret_or_default(
        &self,
        ctx: &mut Context<Client>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        self.run(&FindByCredentials, ctx, cancel).await
    }
}
