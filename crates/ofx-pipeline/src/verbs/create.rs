//! Create verb

use crate::actor::ActorBinding;
use crate::context::{Context, OperationResult};
use crate::error::PipelineError;
use crate::verb::{Bindings, Scope, Verb};
use async_trait::async_trait;
use ofx_resource::{decode, Decoded, Resource, ResourceId, SharedRecord};

/// Store a new record decoded from the resource payload
///
/// An invalid payload fails with every validation message before
/// `ValidateInput`. The unsaved record is bound under its kind; the default
/// action gives it a fresh identifier, stores it and returns the identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Create;

#[async_trait]
impl<R: Resource> Verb<R> for Create {
    type Prepared = Decoded<R>;

    fn name(&self) -> &'static str {
        "create"
    }

    fn prepare(&self, scope: &Scope<'_, R>, ctx: &Context<R>) -> Result<Decoded<R>, PipelineError> {
        let payload: String = ctx.required_value(&scope.config.inputs.resource)?;
        Ok(decode(&payload))
    }

    fn admit(&self, _: &Scope<'_, R>, _: &Context<R>, decoded: &Decoded<R>) -> Result<Bindings<R>, PipelineError> {
        let resource = match decoded.resource() {
            Some(resource) if decoded.is_valid() => resource.clone(),
            _ => {
                tracing::debug!(kind = R::KIND, messages = ?decoded.messages(), "payload rejected");
                return Err(PipelineError::EntityInvalid {
                    messages: decoded.messages().to_vec(),
                });
            }
        };
        Ok(vec![(
            R::KIND.to_string(),
            ActorBinding::Resource(SharedRecord::new(resource)),
        )])
    }

    async fn default_action(
        &self,
        scope: &Scope<'_, R>,
        ctx: &mut Context<R>,
        _: Decoded<R>,
    ) -> Result<(), PipelineError> {
        let record = ctx.actors().require_resource(R::KIND)?.clone();

        let id = loop {
            let candidate = ResourceId::generate();
            if !scope.store.contains_id(&candidate) {
                break candidate;
            }
        };
        record.write().set_id(id.clone());
        scope.store.insert(record)?;

        ctx.set_result(OperationResult::Identifier(id));
        Ok(())
    }
}
