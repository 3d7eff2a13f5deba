use futures::future::{join_all, BoxFuture, Either};
use serde_json::Value as JsonValue;
use tracing::{instrument, trace};

use crate::{
    context::ExecutionContext,
    query::QueryShapeNode,
    resolvers::{default_resolve, ResolverTable},
    response::{
        envelope::{normalize_failure, normalize_success},
        error::{render_path, FieldError, PathSegment},
        value::Value,
        QueryResponse,
    },
    schema::{EntityType, FieldDeclaration, FieldKind, TypeRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn root_type_name(&self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum ResolutionError {
    #[error("Cannot return null for non-nullable field \"{0}\"")]
    NonNullViolation(String),
    #[error("Field \"{0}\" is not declared on type \"{1}\"")]
    UndeclaredField(String, String),
    #[error("Field \"{0}\" resolved to a non-list value under a list declaration")]
    ExpectedList(String),
    #[error("Field \"{0}\" resolved to a composite value under a scalar declaration")]
    ExpectedScalar(String),
    #[error("Mutation field \"{0}\" must be declared with an entity envelope type")]
    MutationEnvelopeExpected(String),
    #[error("Field \"{0}\" declares a list nested inside a list")]
    NestedListDeclaration(String),
}

/// Outcome of one field's resolution. `Bubbled` means a non-nullable
/// contract was violated below this point and the nearest nullable
/// ancestor must resolve to null instead.
enum Resolved {
    Value(Value),
    Bubbled,
}

type FieldOutcome = (Resolved, Vec<FieldError>);

/// Executes one parsed query shape against a registry and resolver table.
///
/// Stateless between executions; the registry and table are shared
/// read-only across concurrent queries, per-query state lives in the
/// futures themselves. Dropping the returned future releases every
/// still-suspended sub-resolution.
pub async fn execute_query(
    registry: &TypeRegistry,
    resolvers: &ResolverTable,
    ctx: &ExecutionContext,
    selection: &[QueryShapeNode],
    operation: OperationKind,
) -> QueryResponse {
    ResolutionEngine::new(registry, resolvers)
        .execute(ctx, selection, operation)
        .await
}

pub struct ResolutionEngine<'s> {
    registry: &'s TypeRegistry,
    resolvers: &'s ResolverTable,
}

impl<'s> ResolutionEngine<'s> {
    pub fn new(registry: &'s TypeRegistry, resolvers: &'s ResolverTable) -> Self {
        ResolutionEngine {
            registry,
            resolvers,
        }
    }

    #[instrument(level = "trace", skip_all, fields(operation = ?operation))]
    pub async fn execute(
        &self,
        ctx: &ExecutionContext,
        selection: &[QueryShapeNode],
        operation: OperationKind,
    ) -> QueryResponse {
        let root_type = match self.registry.lookup(operation.root_type_name()) {
            Ok(root_type) => root_type,
            Err(error) => {
                return QueryResponse {
                    data: Value::Null,
                    errors: vec![FieldError::new(error.to_string(), Vec::new())],
                }
            }
        };

        let mut entries = Vec::with_capacity(selection.len());
        let mut errors = Vec::new();
        let mut bubbled_to_root = false;

        let results = match operation {
            OperationKind::Query => {
                let parent = JsonValue::Null;
                let jobs = selection
                    .iter()
                    .map(|node| self.resolve_root_field(ctx, root_type, node, &parent));
                join_all(jobs).await
            }
            OperationKind::Mutation => {
                // Mutation roots run in declaration order; their outcomes
                // are normalized into envelopes before sub-resolution.
                let mut results = Vec::with_capacity(selection.len());
                for node in selection {
                    results.push(self.resolve_mutation_field(ctx, root_type, node).await);
                }
                results
            }
        };

        for (node, (resolved, field_errors)) in selection.iter().zip(results) {
            errors.extend(field_errors);
            match resolved {
                Resolved::Value(value) => entries.push((node.name.clone(), value)),
                Resolved::Bubbled => bubbled_to_root = true,
            }
        }

        let data = if bubbled_to_root {
            Value::Null
        } else {
            Value::Object(entries)
        };
        QueryResponse { data, errors }
    }

    async fn resolve_root_field(
        &self,
        ctx: &ExecutionContext,
        root_type: &EntityType,
        node: &QueryShapeNode,
        parent: &JsonValue,
    ) -> FieldOutcome {
        let path = vec![PathSegment::Field(node.name.clone())];
        let Some(decl) = root_type.field(&node.name) else {
            let error =
                ResolutionError::UndeclaredField(node.name.clone(), root_type.name.clone());
            return (
                Resolved::Value(Value::Null),
                vec![FieldError::new(error.to_string(), path)],
            );
        };
        self.resolve_field(ctx, &root_type.name, decl, node, parent, path)
            .await
    }

    /// Resolves one field: dispatch to the bound resolver (or the default
    /// pass-through), then complete the raw result against the field's
    /// declared kind. Boxed because completion recurses back into it for
    /// entity sub-fields.
    fn resolve_field<'a>(
        &'a self,
        ctx: &'a ExecutionContext,
        owner: &'a str,
        decl: &'a FieldDeclaration,
        node: &'a QueryShapeNode,
        parent: &'a JsonValue,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, FieldOutcome> {
        Box::pin(async move {
            let mut errors = Vec::new();
            let outcome = match self.resolvers.get(owner, &node.name) {
                Some(binding) => {
                    trace!(field = %render_path(&path), "invoking bound resolver");
                    (binding.resolver)(parent, &node.arguments, ctx).await
                }
                None => Ok(default_resolve(parent, &node.name)),
            };

            let raw = match outcome {
                Ok(raw) => raw,
                Err(error) => {
                    trace!(field = %render_path(&path), %error, "resolver failed");
                    errors.push(FieldError::new(error.to_string(), path.clone()));
                    let resolved = if decl.nullable {
                        Resolved::Value(Value::Null)
                    } else {
                        Resolved::Bubbled
                    };
                    return (resolved, errors);
                }
            };

            let resolved = self
                .complete_value(
                    ctx,
                    &decl.kind,
                    decl.nullable,
                    &node.children,
                    &raw,
                    &mut errors,
                    &path,
                )
                .await;
            (resolved, errors)
        })
    }

    /// Routes a root mutation field's outcome through the error normalizer
    /// before sub-resolution, so mutation callers always receive a
    /// well-formed envelope and never a propagated failure.
    async fn resolve_mutation_field(
        &self,
        ctx: &ExecutionContext,
        root_type: &EntityType,
        node: &QueryShapeNode,
    ) -> FieldOutcome {
        let path = vec![PathSegment::Field(node.name.clone())];
        let Some(decl) = root_type.field(&node.name) else {
            let error =
                ResolutionError::UndeclaredField(node.name.clone(), root_type.name.clone());
            return (
                Resolved::Value(Value::Null),
                vec![FieldError::new(error.to_string(), path)],
            );
        };

        let mut errors = Vec::new();
        let parent = JsonValue::Null;
        let binding = self.resolvers.get(&root_type.name, &node.name);
        let outcome = match binding {
            Some(binding) => (binding.resolver)(&parent, &node.arguments, ctx).await,
            None => Ok(default_resolve(&parent, &node.name)),
        };

        let envelope = match outcome {
            Ok(value) => {
                let message = binding
                    .and_then(|binding| binding.success_message.as_ref())
                    .map(|message| message(&node.arguments))
                    .unwrap_or_else(|| format!("Successfully executed {}", node.name));
                normalize_success(value, message)
            }
            Err(error) => {
                trace!(field = %render_path(&path), %error, "mutation failure normalized");
                normalize_failure(&error)
            }
        };

        let FieldKind::Entity(envelope_type) = &decl.kind else {
            let error = ResolutionError::MutationEnvelopeExpected(node.name.clone());
            errors.push(FieldError::new(error.to_string(), path));
            return (Resolved::Value(Value::Null), errors);
        };

        let payload_field = self.payload_field_name(envelope_type);
        let record = envelope.into_record(&payload_field);
        let resolved = self
            .complete_value(
                ctx,
                &decl.kind,
                decl.nullable,
                &node.children,
                &record,
                &mut errors,
                &path,
            )
            .await;
        (resolved, errors)
    }

    /// The envelope's single non-scalar field is the payload slot.
    fn payload_field_name(&self, envelope_type: &str) -> String {
        self.registry
            .lookup(envelope_type)
            .ok()
            .and_then(|entity| {
                entity
                    .fields()
                    .iter()
                    .find(|field| !matches!(field.kind, FieldKind::Scalar))
            })
            .map(|field| field.name.clone())
            .unwrap_or_else(|| "payload".to_string())
    }

    /// Completes a raw resolver result against the declared kind: null
    /// checks, scalar conversion, entity recursion, ordered list fan-out.
    /// A bubbled failure from below stops here when this field may be null.
    #[allow(clippy::too_many_arguments)]
    async fn complete_value(
        &self,
        ctx: &ExecutionContext,
        kind: &FieldKind,
        nullable: bool,
        children: &[QueryShapeNode],
        raw: &JsonValue,
        errors: &mut Vec<FieldError>,
        path: &[PathSegment],
    ) -> Resolved {
        if raw.is_null() {
            if nullable {
                return Resolved::Value(Value::Null);
            }
            let error = ResolutionError::NonNullViolation(render_path(path));
            errors.push(FieldError::new(error.to_string(), path.to_vec()));
            return Resolved::Bubbled;
        }

        let resolved = match kind {
            FieldKind::Scalar => complete_scalar(raw, errors, path),
            FieldKind::Entity(type_name) => {
                self.complete_object(ctx, type_name, children, raw, errors, path)
                    .await
            }
            FieldKind::List {
                element,
                element_nullable,
            } => {
                let Some(items) = raw.as_array() else {
                    let error = ResolutionError::ExpectedList(render_path(path));
                    errors.push(FieldError::new(error.to_string(), path.to_vec()));
                    return if nullable {
                        Resolved::Value(Value::Null)
                    } else {
                        Resolved::Bubbled
                    };
                };

                // Elements complete concurrently; collection is by index,
                // so output order matches upstream order regardless of
                // which element finishes first.
                let jobs = items.iter().enumerate().map(|(index, item)| {
                    let mut element_path = path.to_vec();
                    element_path.push(PathSegment::Index(index));
                    self.complete_element(
                        ctx,
                        element,
                        *element_nullable,
                        children,
                        item,
                        element_path,
                    )
                });
                let results = join_all(jobs).await;

                let mut out = Vec::with_capacity(items.len());
                let mut list_bubbled = false;
                for (resolved, element_errors) in results {
                    errors.extend(element_errors);
                    match resolved {
                        Resolved::Value(value) => out.push(value),
                        Resolved::Bubbled => list_bubbled = true,
                    }
                }
                if list_bubbled {
                    Resolved::Bubbled
                } else {
                    Resolved::Value(Value::Array(out))
                }
            }
        };

        match resolved {
            Resolved::Bubbled if nullable => Resolved::Value(Value::Null),
            other => other,
        }
    }

    async fn complete_element(
        &self,
        ctx: &ExecutionContext,
        kind: &FieldKind,
        nullable: bool,
        children: &[QueryShapeNode],
        raw: &JsonValue,
        path: Vec<PathSegment>,
    ) -> FieldOutcome {
        let mut errors = Vec::new();

        if raw.is_null() {
            if nullable {
                return (Resolved::Value(Value::Null), errors);
            }
            let error = ResolutionError::NonNullViolation(render_path(&path));
            errors.push(FieldError::new(error.to_string(), path));
            return (Resolved::Bubbled, errors);
        }

        let inner = match kind {
            FieldKind::Scalar => complete_scalar(raw, &mut errors, &path),
            FieldKind::Entity(type_name) => {
                self.complete_object(ctx, type_name, children, raw, &mut errors, &path)
                    .await
            }
            // Registry validation rejects nested list declarations; a
            // registry that skipped validation degrades to a recorded
            // error here instead of taking the engine down.
            FieldKind::List { .. } => {
                let error = ResolutionError::NestedListDeclaration(render_path(&path));
                errors.push(FieldError::new(error.to_string(), path.clone()));
                Resolved::Bubbled
            }
        };

        let resolved = match inner {
            Resolved::Bubbled if nullable => Resolved::Value(Value::Null),
            other => other,
        };
        (resolved, errors)
    }

    /// Resolves the requested sub-fields of an entity against its fetched
    /// record, concurrently, assembling the object in request order. An
    /// entity requested with no sub-selection is handed back verbatim.
    async fn complete_object(
        &self,
        ctx: &ExecutionContext,
        type_name: &str,
        children: &[QueryShapeNode],
        raw: &JsonValue,
        errors: &mut Vec<FieldError>,
        path: &[PathSegment],
    ) -> Resolved {
        if children.is_empty() {
            return Resolved::Value(Value::from_json(raw));
        }

        let entity = match self.registry.lookup(type_name) {
            Ok(entity) => entity,
            Err(error) => {
                errors.push(FieldError::new(error.to_string(), path.to_vec()));
                return Resolved::Bubbled;
            }
        };

        let jobs = children.iter().map(|child| {
            let mut child_path = path.to_vec();
            child_path.push(PathSegment::Field(child.name.clone()));
            match entity.field(&child.name) {
                Some(decl) => Either::Left(self.resolve_field(
                    ctx,
                    &entity.name,
                    decl,
                    child,
                    raw,
                    child_path,
                )),
                None => {
                    let error = ResolutionError::UndeclaredField(
                        child.name.clone(),
                        entity.name.clone(),
                    );
                    Either::Right(std::future::ready((
                        Resolved::Value(Value::Null),
                        vec![FieldError::new(error.to_string(), child_path)],
                    )))
                }
            }
        });
        let results = join_all(jobs).await;

        let mut entries = Vec::with_capacity(children.len());
        let mut object_bubbled = false;
        for (child, (resolved, child_errors)) in children.iter().zip(results) {
            errors.extend(child_errors);
            match resolved {
                Resolved::Value(value) => entries.push((child.name.clone(), value)),
                Resolved::Bubbled => object_bubbled = true,
            }
        }
        if object_bubbled {
            Resolved::Bubbled
        } else {
            Resolved::Value(Value::Object(entries))
        }
    }
}

fn complete_scalar(raw: &JsonValue, errors: &mut Vec<FieldError>, path: &[PathSegment]) -> Resolved {
    match raw {
        JsonValue::Object(_) | JsonValue::Array(_) => {
            let error = ResolutionError::ExpectedScalar(render_path(path));
            errors.push(FieldError::new(error.to_string(), path.to_vec()));
            Resolved::Bubbled
        }
        other => Resolved::Value(Value::from_json(other)),
    }
}
