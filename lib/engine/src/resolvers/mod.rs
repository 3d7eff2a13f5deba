use std::collections::HashMap;

use futures::future::BoxFuture;
use serde_json::Value as JsonValue;

use crate::{context::ExecutionContext, query::Arguments, schema::SchemaError, source::SourceError};

/// Failures a resolver can report. Collaborator failures pass through
/// unchanged; argument problems are the resolver's own.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ResolveError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Missing required argument \"{0}\" for field \"{1}\"")]
    MissingArgument(String, String),
}

pub type ResolverResult = Result<JsonValue, ResolveError>;

/// A field resolver: computes a raw value from the parent's resolved
/// record, the field arguments, and the shared execution context.
pub type Resolver = Box<
    dyn for<'a> Fn(&'a JsonValue, &'a Arguments, &'a ExecutionContext) -> BoxFuture<'a, ResolverResult>
        + Send
        + Sync,
>;

/// Builds the human-readable message for a successful mutation envelope
/// from the field arguments.
pub type MessageFn = Box<dyn Fn(&Arguments) -> String + Send + Sync>;

pub struct ResolverBinding {
    pub resolver: Resolver,
    pub success_message: Option<MessageFn>,
}

/// Process-wide map from `(type name, field name)` to a resolver. Like the
/// type registry it is populated at startup and read-only during execution.
/// A missing binding is not an error: the engine falls back to the default
/// resolver, which reads the field straight off the parent record.
#[derive(Default)]
pub struct ResolverTable {
    inner: HashMap<(String, String), ResolverBinding>,
}

impl ResolverTable {
    pub fn new() -> Self {
        ResolverTable {
            inner: HashMap::new(),
        }
    }

    pub fn bind<F>(&mut self, type_name: &str, field_name: &str, resolver: F) -> Result<(), SchemaError>
    where
        F: for<'a> Fn(&'a JsonValue, &'a Arguments, &'a ExecutionContext) -> BoxFuture<'a, ResolverResult>
            + Send
            + Sync
            + 'static,
    {
        self.insert(type_name, field_name, Box::new(resolver), None)
    }

    /// Binds a mutation resolver together with the closure producing its
    /// success-envelope message.
    pub fn bind_with_message<F, M>(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: F,
        message: M,
    ) -> Result<(), SchemaError>
    where
        F: for<'a> Fn(&'a JsonValue, &'a Arguments, &'a ExecutionContext) -> BoxFuture<'a, ResolverResult>
            + Send
            + Sync
            + 'static,
        M: Fn(&Arguments) -> String + Send + Sync + 'static,
    {
        self.insert(
            type_name,
            field_name,
            Box::new(resolver),
            Some(Box::new(message)),
        )
    }

    fn insert(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: Resolver,
        success_message: Option<MessageFn>,
    ) -> Result<(), SchemaError> {
        let key = (type_name.to_string(), field_name.to_string());
        if self.inner.contains_key(&key) {
            return Err(SchemaError::DuplicateBinding(
                type_name.to_string(),
                field_name.to_string(),
            ));
        }
        self.inner.insert(
            key,
            ResolverBinding {
                resolver,
                success_message,
            },
        );
        Ok(())
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&ResolverBinding> {
        self.inner
            .get(&(type_name.to_string(), field_name.to_string()))
    }
}

/// The fallback when no resolver is bound for a field: the corresponding
/// property of the parent record, or null when the parent has no such key.
pub fn default_resolve(parent: &JsonValue, field_name: &str) -> JsonValue {
    parent.get(field_name).cloned().unwrap_or(JsonValue::Null)
}
