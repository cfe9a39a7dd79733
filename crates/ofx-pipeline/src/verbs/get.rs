//! Get-by-id verb

use super::{read_id, resolve};
use crate::context::{Context, OperationResult};
use crate::error::PipelineError;
use crate::verb::{Bindings, Scope, Verb};
use crate::actor::ActorBinding;
use async_trait::async_trait;
use ofx_resource::{encode, Resource, ResourceId};

/// Fetch one record by identifier
///
/// The record is bound under its kind before `DefineActors`; the result is
/// its serialized form.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetById;

#[async_trait]
impl<R: Resource> Verb<R> for GetById {
    type Prepared = ResourceId;

    fn name(&self) -> &'static str {
        "get"
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
        _: &Scope<'_, R>,
        ctx: &mut Context<R>,
        _: ResourceId,
    ) -> Result<(), PipelineError> {
        let record = ctx.actors().require_resource(R::KIND)?.clone();
        let json = encode(&*record.read())?;
        ctx.set_result(OperationResult::Serialized(json));
        Ok(())
    }
}
