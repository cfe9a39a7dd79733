//! Per-operation execution context
//!
//! Provides [`Context`], the state shared by the orchestrator and every
//! extension during one operation: read-only inputs, a mutable state bag,
//! actor bindings, the result slot and the skip latch.

use crate::actor::Actors;
use crate::bag::{Inputs, PropertyBag};
use crate::error::PipelineError;
use crate::registry::PluginRegistry;
use ofx_resource::{Resource, ResourceId, SharedRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Output of an operation
#[derive(Debug, Clone)]
pub enum OperationResult<R: Resource> {
    /// Serialized resource or page (list, get)
    Serialized(String),

    /// Identifier of a created resource
    Identifier(ResourceId),

    /// Resource handle (credential lookup)
    Record(SharedRecord<R>),

    /// Value supplied by an extension
    Value(Value),
}

impl<R: Resource> OperationResult<R> {
    /// Serialized text, if that is what the result holds
    #[must_use]
    pub fn as_serialized(&self) -> Option<&str> {
        match self {
            Self::Serialized(text) => Some(text),
            _ => None,
        }
    }

    /// Identifier, if that is what the result holds
    #[must_use]
    pub fn as_identifier(&self) -> Option<&ResourceId> {
        match self {
            Self::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Record, if that is what the result holds
    #[must_use]
    pub fn as_record(&self) -> Option<&SharedRecord<R>> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Extension value, if that is what the result holds
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Whether the default action runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionDecision {
    /// Run the built-in action
    Run,

    /// An extension took over
    Skip,
}

/// Skip latch: open until an extension skips or the orchestrator decides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SkipLatch {
    #[default]
    Open,
    Skipped,
    Decided(ActionDecision),
}

/// State of one operation invocation
///
/// Created fresh per call (see `ResourceService::new_context`) and
/// discarded afterwards; a context that already went through an operation
/// is rejected by the orchestrator.
#[derive(Debug)]
pub struct Context<R: Resource> {
    inputs: Inputs,
    state: PropertyBag,
    actors: Actors<R>,
    result: Option<OperationResult<R>>,
    latch: SkipLatch,
    started: bool,
    plugins: Arc<PluginRegistry<R>>,
    cancellation: CancellationToken,
}

impl<R: Resource> Context<R> {
    /// Create context for one operation
    #[must_use]
    pub fn new(inputs: impl Into<Inputs>, plugins: Arc<PluginRegistry<R>>) -> Self {
        Self {
            inputs: inputs.into(),
            state: PropertyBag::new(),
            actors: Actors::new(),
            result: None,
            latch: SkipLatch::Open,
            started: false,
            plugins,
            cancellation: CancellationToken::new(),
        }
    }

    /// Operation inputs
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Required input as `T`
    ///
    /// # Errors
    /// - `PipelineError::MissingInput` if absent
    /// - `PipelineError::TypeMismatch` if not convertible to `T`
    #[inline]
    pub fn required_value<T: DeserializeOwned>(&self, path: &str) -> Result<T, PipelineError> {
        self.inputs.required(path)
    }

    /// State shared between extensions
    #[inline]
    #[must_use]
    pub fn state(&self) -> &PropertyBag {
        &self.state
    }

    /// Mutable state bag
    #[inline]
    pub fn state_mut(&mut self) -> &mut PropertyBag {
        &mut self.state
    }

    /// Actor bindings
    #[inline]
    #[must_use]
    pub fn actors(&self) -> &Actors<R> {
        &self.actors
    }

    /// Mutable actor bindings
    #[inline]
    pub fn actors_mut(&mut self) -> &mut Actors<R> {
        &mut self.actors
    }

    /// Operation result
    #[inline]
    #[must_use]
    pub fn result(&self) -> Option<&OperationResult<R>> {
        self.result.as_ref()
    }

    /// Set the result, returning the previous one
    pub fn set_result(&mut self, result: OperationResult<R>) -> Option<OperationResult<R>> {
        self.result.replace(result)
    }

    /// Take the result out of the context
    pub fn take_result(&mut self) -> Option<OperationResult<R>> {
        self.result.take()
    }

    /// Skip the default action
    ///
    /// Latches permanently. Returns `false` (and changes nothing) once the
    /// orchestrator has already decided whether the action runs.
    pub fn skip_default_action(&mut self) -> bool {
        match self.latch {
            SkipLatch::Open | SkipLatch::Skipped => {
                self.latch = SkipLatch::Skipped;
                true
            }
            SkipLatch::Decided(decision) => {
                tracing::warn!(?decision, "skip requested after the default action decision");
                false
            }
        }
    }

    /// Check if the default action is (or will be) skipped
    #[inline]
    #[must_use]
    pub fn is_default_action_skipped(&self) -> bool {
        matches!(
            self.latch,
            SkipLatch::Skipped | SkipLatch::Decided(ActionDecision::Skip)
        )
    }

    /// Decision taken after `BeforeAction`, if reached
    #[inline]
    #[must_use]
    pub fn decision(&self) -> Option<ActionDecision> {
        match self.latch {
            SkipLatch::Decided(decision) => Some(decision),
            _ => None,
        }
    }

    /// Plugin registry used for dispatch
    #[inline]
    #[must_use]
    pub fn plugins(&self) -> &Arc<PluginRegistry<R>> {
        &self.plugins
    }

    /// Cancellation token of the running operation
    #[inline]
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Consume the latch into the action decision
    pub(crate) fn decide(&mut self) -> ActionDecision {
        let decision = match self.latch {
            SkipLatch::Open => ActionDecision::Run,
            SkipLatch::Skipped => ActionDecision::Skip,
            SkipLatch::Decided(decision) => decision,
        };
        self.latch = SkipLatch::Decided(decision);
        decision
    }

    /// Check if an operation already started on this context
    #[inline]
    pub(crate) fn is_consumed(&self) -> bool {
        self.started || matches!(self.latch, SkipLatch::Decided(_))
    }

    /// Claim the context for the operation about to run
    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    /// Attach the caller's cancellation token
    pub(crate) fn attach_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }
}
