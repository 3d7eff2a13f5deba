use std::collections::HashMap;

#[derive(thiserror::Error, Debug, Clone)]
pub enum SchemaError {
    #[error("Entity type \"{0}\" is already registered")]
    DuplicateType(String),
    #[error("Entity type \"{0}\" is not registered")]
    UnknownType(String),
    #[error("A resolver is already bound for \"{0}.{1}\"")]
    DuplicateBinding(String, String),
    #[error("Field \"{0}.{1}\" references unknown entity type \"{2}\"")]
    UnknownEntityReference(String, String, String),
    #[error("Field \"{0}.{1}\" declares a list of lists")]
    NestedList(String, String),
}

/// The shape a resolved field value is declared to take.
///
/// Lists carry their element kind and element nullability separately from
/// the nullability of the list field itself, so `[Track!]` and `[Track]!`
/// are distinct declarations. Lists of lists are rejected by
/// [`TypeRegistry::validate`].
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar,
    Entity(String),
    List {
        element: Box<FieldKind>,
        element_nullable: bool,
    },
}

impl FieldKind {
    pub fn entity(name: impl Into<String>) -> Self {
        FieldKind::Entity(name.into())
    }

    /// A list with non-nullable elements, the `[X!]` case.
    pub fn list_of(element: FieldKind) -> Self {
        FieldKind::List {
            element: Box::new(element),
            element_nullable: false,
        }
    }

    pub fn list_of_nullable(element: FieldKind) -> Self {
        FieldKind::List {
            element: Box::new(element),
            element_nullable: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
}

/// A named record shape: an ordered set of field declarations.
///
/// Root operation types (`Query`, `Mutation`) are registered as entity
/// types like any other, so root fields go through the same declaration
/// lookup as nested ones.
#[derive(Debug, Clone)]
pub struct EntityType {
    pub name: String,
    fields: Vec<FieldDeclaration>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        EntityType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn required(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            kind,
            nullable: false,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            kind,
            nullable: true,
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }
}

/// Process-wide registry of entity types. Populated once during startup,
/// read-only afterwards; execution never mutates it.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, EntityType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry {
            types: HashMap::new(),
        }
    }

    pub fn register(&mut self, entity: EntityType) -> Result<(), SchemaError> {
        if self.types.contains_key(&entity.name) {
            return Err(SchemaError::DuplicateType(entity.name));
        }
        self.types.insert(entity.name.clone(), entity);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&EntityType, SchemaError> {
        self.types
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// Checks that every entity reference names a registered type and that
    /// no declaration nests a list inside a list. Run after registration,
    /// before any execution begins.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for entity in self.types.values() {
            for field in &entity.fields {
                self.validate_kind(entity, field, &field.kind, false)?;
            }
        }
        Ok(())
    }

    fn validate_kind(
        &self,
        entity: &EntityType,
        field: &FieldDeclaration,
        kind: &FieldKind,
        inside_list: bool,
    ) -> Result<(), SchemaError> {
        match kind {
            FieldKind::Scalar => Ok(()),
            FieldKind::Entity(name) => {
                if self.types.contains_key(name) {
                    Ok(())
                } else {
                    Err(SchemaError::UnknownEntityReference(
                        entity.name.clone(),
                        field.name.clone(),
                        name.clone(),
                    ))
                }
            }
            FieldKind::List { element, .. } => {
                if inside_list {
                    return Err(SchemaError::NestedList(
                        entity.name.clone(),
                        field.name.clone(),
                    ));
                }
                self.validate_kind(entity, field, element, true)
            }
        }
    }
}
