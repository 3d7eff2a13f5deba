use std::sync::Arc;

use crate::source::DataSource;

/// Per-query bundle of collaborator handles. Constructed once per incoming
/// query and shared by reference across every resolver invocation in that
/// query; resolvers cannot replace or mutate it.
#[derive(Clone)]
pub struct ExecutionContext {
    sources: Arc<dyn DataSource>,
}

impl ExecutionContext {
    pub fn new(sources: Arc<dyn DataSource>) -> Self {
        ExecutionContext { sources }
    }

    pub fn sources(&self) -> &dyn DataSource {
        self.sources.as_ref()
    }
}
