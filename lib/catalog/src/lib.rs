pub mod client;
pub mod config;
pub mod resolvers;
pub mod schema;

#[cfg(test)]
mod tests;

use fieldline_engine::{
    context::ExecutionContext,
    execution::{execute_query, OperationKind},
    query::QueryShapeNode,
    resolvers::ResolverTable,
    response::QueryResponse,
    schema::{SchemaError, TypeRegistry},
};

/// The catalog schema and its resolver bindings, built once at startup and
/// shared read-only by all query executions.
pub struct Catalog {
    pub registry: TypeRegistry,
    pub resolvers: ResolverTable,
}

impl Catalog {
    pub fn build() -> Result<Self, SchemaError> {
        Ok(Catalog {
            registry: schema::catalog_registry()?,
            resolvers: resolvers::catalog_resolvers()?,
        })
    }

    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        selection: &[QueryShapeNode],
        operation: OperationKind,
    ) -> QueryResponse {
        execute_query(&self.registry, &self.resolvers, ctx, selection, operation).await
    }
}
