//! Delete verb

use super::{read_id, resolve};
use crate::context::Context;
use crate::error::PipelineError;
use crate::verb::{Bindings, Scope, Verb};
use crate::actor::ActorBinding;
use async_trait::async_trait;
use ofx_resource::{Resource, ResourceId};

/// Remove one record by identifier
///
/// Removal is by identity: whatever record is bound under the kind when the
/// action runs is the one removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

#[async_trait]
impl<R: Resource> Verb<R> for Delete {
    type Prepared = ResourceId;

    fn name(&self) -> &'static str {
        "delete"
    }

    fn prepare(&self, scope: &Scope<'_, R>, ctx: &Context<R>) -> Result<ResourceId, PipelineError> {
        read_id(ctx, &scope.config.inputs.id)
    }

    fn admit(&self, scope: &Scope<'_, R>, _: &Context<R>, id: &ResourceId) -> Result<Bindings<R>, PipelineError> {
        let record = resolve(scope.store, id)?;
        Ok(vec![(R::KIND.to_string(), ActorBinding::Resource(record))])
    }

    async fn default_action(
        &self,
        scope: &Scope<'_, R>,
        ctx: &mut Context<R>,
        id: ResourceId,
    ) -> Result<(), PipelineError> {
        let record = ctx.actors().require_resource(R::KIND)?;
        if !scope.store.remove(record) {
            tracing::debug!(kind = R::KIND, %id, "bound record was not stored");
        }
        Ok(())
    }
}
