//! OFX Pipeline - extensible CRUD operations
//!
//! Every operation (list, get, create, delete, patch) runs a fixed phase
//! sequence. Extensions registered as plugins observe and override each
//! phase, and can take over the default action entirely.
//!
//! # Core Concepts
//!
//! - [`Context`]: Inputs, state, actor bindings, result slot and skip latch of one operation
//! - [`Phase`]: Extension points, in execution order
//! - [`Plugin`]: Extension advertising the phases it implements
//! - [`PluginRegistry`]: Registration-order dispatcher per phase
//! - [`Verb`]: What differs between operations; [`run`] does the rest
//! - [`ResourceService`]: Store + registry + config, one method per operation
//!
//! # Example
//!
//! ```rust
//! use ofx_pipeline::{ClientService, Inputs, OperationResult, PluginRegistry};
//! use ofx_resource::ResourceStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), ofx_pipeline::PipelineError> {
//! let service = ClientService::new(
//!     Arc::new(ResourceStore::new()),
//!     Arc::new(PluginRegistry::new()),
//! );
//! let cancel = CancellationToken::new();
//!
//! let mut ctx = service.new_context(Inputs::new().with("Resource", r#"{"secret":"s1"}"#));
//! service.create(&mut ctx, &cancel).await?;
//!
//! let id = ctx.result().and_then(OperationResult::as_identifier).cloned();
//! assert!(id.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod actor;
mod bag;
mod config;
mod context;
mod error;
mod phase;
mod plugin;
mod registry;
mod service;
mod verb;

pub mod verbs;

// Re-exports
pub use actor::{ActorBinding, Actors, OPERATIONS_ROLE};
pub use bag::{Inputs, PropertyBag};
pub use config::{CancellationCheck, ConfigError, InputPaths, ServiceConfig};
pub use context::{ActionDecision, Context, OperationResult};
pub use error::PipelineError;
pub use phase::Phase;
pub use plugin::{
    AfterAction, BeforeAction, Bind, DefineActors, HandleInput, PhaseFn, Plugin, PluginResult,
    ReleaseUnmanagedResources, ValidateInput,
};
pub use registry::PluginRegistry;
pub use service::{ClientService, GroupService, ResourceService};
pub use verb::{run, Bindings, Scope, Verb};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use ofx_resource::entities::Group;
    use ofx_resource::{Resource, ResourceStore};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn group_create_get_delete_flow() {
        let service = GroupService::new(Arc::new(ResourceStore::new()), Arc::new(PluginRegistry::new()));
        let cancel = CancellationToken::new();

        let mut ctx = service.new_context(Inputs::new().with("Resource", r#"{"displayName":"ops"}"#));
        service.create(&mut ctx, &cancel).await.unwrap();
        let id = ctx
            .result()
            .and_then(OperationResult::as_identifier)
            .cloned()
            .unwrap();

        let mut ctx = service.new_context(Inputs::new().with("Id", id.as_str()));
        service.get_by_id(&mut ctx, &cancel).await.unwrap();
        let json = ctx.result().and_then(OperationResult::as_serialized).unwrap();
        let group: Group = serde_json::from_str(json).unwrap();
        assert_eq!(group.display_name.as_deref(), Some("ops"));
        assert_eq!(group.id(), Some(&id));

        let mut ctx = service.new_context(Inputs::new().with("Id", id.as_str()));
        service.delete(&mut ctx, &cancel).await.unwrap();
        assert!(service.store().is_empty());
    }
}
