//! Built-in verbs
//!
//! [`List`], [`GetById`], [`Create`], [`Delete`] and [`Patch`] work for any
//! [`Resource`]; [`FindByCredentials`] is specific to clients.

mod create;
mod credentials;
mod delete;
mod get;
mod list;
mod patch;

pub use create::Create;
pub use credentials::{Credentials, FindByCredentials};
pub use delete::Delete;
pub use get::GetById;
pub use list::{List, PageRequest};
pub use patch::Patch;

use crate::context::Context;
use crate::error::PipelineError;
use ofx_resource::{Resource, ResourceId, ResourceStore, SharedRecord};
use uuid::Uuid;

/// Read the identifier input at `path`
///
/// Identifiers are UUIDs; anything else is a type mismatch.
fn read_id<R: Resource>(ctx: &Context<R>, path: &str) -> Result<ResourceId, PipelineError> {
    ctx.required_value::<Uuid>(path).map(ResourceId::from)
}

/// Stored record with `id`, or `EntityNotFound`
fn resolve<R: Resource>(store: &ResourceStore<R>, id: &ResourceId) -> Result<SharedRecord<R>, PipelineError> {
    store.find_by_id(id).ok_or_else(|| {
        tracing::debug!(kind = R::KIND, %id, "record not found");
        PipelineError::EntityNotFound {
            kind: R::KIND,
            id: id.to_string(),
        }
    })
}
