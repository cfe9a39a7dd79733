//! List verb

use crate::context::{Context, OperationResult};
use crate::error::PipelineError;
use crate::verb::{Bindings, Scope, Verb};
use async_trait::async_trait;
use ofx_resource::Resource;

/// One page of records
///
/// Reads `page` (1-based) and `perPage`; the result is the serialized
/// [`PaginatedCollection`](ofx_resource::PaginatedCollection) and the total
/// record count is mirrored into the state bag.
#[derive(Debug, Clone, Copy, Default)]
pub struct List;

/// Validated pagination inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,
    /// Page size
    pub per_page: usize,
}

#[async_trait]
impl<R: Resource> Verb<R> for List {
    type Prepared = PageRequest;

    fn name(&self) -> &'static str {
        "list"
    }

    fn prepare(&self, scope: &Scope<'_, R>, ctx: &Context<R>) -> Result<PageRequest, PipelineError> {
        let paths = &scope.config.inputs;
        let page: usize = ctx.required_value(&paths.page)?;
        let per_page: usize = ctx.required_value(&paths.per_page)?;

        if page == 0 {
            return Err(PipelineError::InvalidOperation(
                "page numbers start at 1".to_string(),
            ));
        }
        if let Some(max) = scope.config.max_per_page.filter(|max| per_page > *max) {
            return Err(PipelineError::InvalidOperation(format!(
                "perPage {per_page} exceeds the maximum of {max}"
            )));
        }

        Ok(PageRequest { page, per_page })
    }

    fn admit(&self, _: &Scope<'_, R>, _: &Context<R>, _: &PageRequest) -> Result<Bindings<R>, PipelineError> {
        Ok(Vec::new())
    }

    async fn default_action(
        &self,
        scope: &Scope<'_, R>,
        ctx: &mut Context<R>,
        request: PageRequest,
    ) -> Result<(), PipelineError> {
        let collection = scope.store.paginate(request.page, request.per_page);
        tracing::debug!(
            page = request.page,
            per_page = request.per_page,
            returned = collection.records.len(),
            total = collection.total_count,
            "listed records"
        );

        ctx.state_mut()
            .insert(&scope.config.total_count_path, collection.total_count);
        ctx.set_result(OperationResult::Serialized(serde_json::to_string(&collection)?));
        Ok(())
    }
}
