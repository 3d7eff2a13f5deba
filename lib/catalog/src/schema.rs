use fieldline_engine::schema::{EntityType, FieldKind, SchemaError, TypeRegistry};

/// Declares the learning-catalog entity types: tracks composed of modules,
/// each track with a main author, plus the mutation envelope for the
/// view-counter increment.
pub fn catalog_registry() -> Result<TypeRegistry, SchemaError> {
    let mut registry = TypeRegistry::new();

    registry.register(
        EntityType::new("Query")
            .required("tracksForHome", FieldKind::list_of(FieldKind::entity("Track")))
            .required("track", FieldKind::entity("Track")),
    )?;

    registry.register(
        EntityType::new("Mutation")
            .required("incrementTrackViews", FieldKind::entity("IncrementTrackViewsResponse")),
    )?;

    registry.register(
        EntityType::new("IncrementTrackViewsResponse")
            .required("code", FieldKind::Scalar)
            .required("success", FieldKind::Scalar)
            .required("message", FieldKind::Scalar)
            .optional("track", FieldKind::entity("Track")),
    )?;

    registry.register(
        EntityType::new("Track")
            .required("id", FieldKind::Scalar)
            .required("title", FieldKind::Scalar)
            .required("author", FieldKind::entity("Author"))
            .optional("thumbnail", FieldKind::Scalar)
            .optional("length", FieldKind::Scalar)
            .optional("modulesCount", FieldKind::Scalar)
            .optional("description", FieldKind::Scalar)
            .optional("numberOfViews", FieldKind::Scalar)
            .required("modules", FieldKind::list_of(FieldKind::entity("Module"))),
    )?;

    registry.register(
        EntityType::new("Module")
            .required("id", FieldKind::Scalar)
            .required("title", FieldKind::Scalar)
            .optional("length", FieldKind::Scalar),
    )?;

    registry.register(
        EntityType::new("Author")
            .required("id", FieldKind::Scalar)
            .required("name", FieldKind::Scalar)
            .optional("photo", FieldKind::Scalar),
    )?;

    registry.validate()?;
    Ok(registry)
}
