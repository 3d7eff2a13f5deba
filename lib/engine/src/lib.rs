pub mod context;
pub mod execution;
pub mod query;
pub mod resolvers;
pub mod response;
pub mod schema;
pub mod source;


pub use context::ExecutionContext;
pub use execution::{execute_query, OperationKind, ResolutionEngine};
pub use response::QueryResponse;
