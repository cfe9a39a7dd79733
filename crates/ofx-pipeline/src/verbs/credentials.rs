//! Client lookup by credentials

use crate::actor::ActorBinding;
use crate::context::{Context, OperationResult};
use crate::error::PipelineError;
use crate::verb::{Bindings, Scope, Verb};
use async_trait::async_trait;
use ofx_resource::entities::Client;
use ofx_resource::{Resource, ResourceId};
use uuid::Uuid;

/// Client whose identifier and secret both match, if any
///
/// No match is not an error: nothing is bound and the result stays empty.
/// A match is bound under `"Client"` and returned as a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindByCredentials;

/// Credential inputs
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Client identifier
    pub id: ResourceId,
    /// Client secret
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Verb<Client> for FindByCredentials {
    type Prepared = Credentials;

    fn name(&self) -> &'static str {
        "find_by_credentials"
    }

    fn prepare(&self, scope: &Scope<'_, Client>, ctx: &Context<Client>) -> Result<Credentials, PipelineError> {
        let paths = &scope.config.inputs;
        let id: Uuid = ctx.required_value(&paths.client_id)?;
        let secret: String = ctx.required_value(&paths.client_secret)?;
        Ok(Credentials {
            id: id.into(),
            secret,
        })
    }

    fn admit(
        &self,
        scope: &Scope<'_, Client>,
        _: &Context<Client>,
        credentials: &Credentials,
    ) -> Result<Bindings<Client>, PipelineError> {
        let found = scope.store.find(|client| {
            client.id.as_ref() == Some(&credentials.id) && client.secret == credentials.secret
        });
        Ok(match found {
            Some(record) => vec![(Client::KIND.to_string(), ActorBinding::Resource(record))],
            None => {
                tracing::debug!(id = %credentials.id, "no client matches credentials");
                Vec::new()
            }
        })
    }

    async fn default_action(
        &self,
        _: &Scope<'_, Client>,
        ctx: &mut Context<Client>,
        _: Credentials,
    ) -> Result<(), PipelineError> {
        if let Some(record) = ctx.actors().resource(Client::KIND).cloned() {
            ctx.set_result(OperationResult::Record(record));
        }
        Ok(())
    }
}
