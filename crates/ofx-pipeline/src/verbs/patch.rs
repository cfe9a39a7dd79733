//! Patch verb

use super::{read_id, resolve};
use crate::actor::{ActorBinding, OPERATIONS_ROLE};
use crate::context::Context;
use crate::error::PipelineError;
use crate::verb::{Bindings, Scope, Verb};
use async_trait::async_trait;
use ofx_patch::PatchPlan;
use ofx_resource::Resource;

/// Apply an ordered operation list to one record
///
/// The target is resolved like [`GetById`](super::GetById) and the
/// operations payload parsed against it before any phase runs. The target is
/// bound under its kind and the plan under [`OPERATIONS_ROLE`]; the default
/// action applies whatever plan is bound there when it runs.
///
/// Lookup order differs from [`GetById`](super::GetById) and
/// [`Delete`](super::Delete): those resolve in `admit`, after `HandleInput`
/// ran, while a missing patch target or malformed payload fails before
/// `HandleInput`. An empty list is only rejected in `admit`.
///
/// Operations apply one at a time. A failing operation stops the list and
/// surfaces its error; the ones before it stay applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Patch;

#[async_trait]
impl<R: Resource> Verb<R> for Patch {
    type Prepared = PatchPlan<R>;

    fn name(&self) -> &'static str {
        "patch"
    }

    // Resolves the target up front; HandleInput never sees a missing one.
    fn prepare(&self, scope: &Scope<'_, R>, ctx: &Context<R>) -> Result<PatchPlan<R>, PipelineError> {
        let paths = &scope.config.inputs;
        let payload: String = ctx.required_value(&paths.operations)?;
        let id = read_id(ctx, &paths.id)?;
        let target = resolve(scope.store, &id)?;
        Ok(PatchPlan::parse(target, &payload)?)
    }

    fn admit(&self, _: &Scope<'_, R>, _: &Context<R>, plan: &PatchPlan<R>) -> Result<Bindings<R>, PipelineError> {
        if plan.is_empty() {
            return Err(PipelineError::InvalidOperation(
                "list of operations can't be empty".to_string(),
            ));
        }
        Ok(vec![
            (
                R::KIND.to_string(),
                ActorBinding::Resource(plan.target().clone()),
            ),
            (
                OPERATIONS_ROLE.to_string(),
                ActorBinding::Operations(plan.clone()),
            ),
        ])
    }

    async fn default_action(
        &self,
        _: &Scope<'_, R>,
        ctx: &mut Context<R>,
        _: PatchPlan<R>,
    ) -> Result<(), PipelineError> {
        let plan = ctx.actors().require_operations(OPERATIONS_ROLE)?;
        plan.apply()?;
        Ok(())
    }
}
