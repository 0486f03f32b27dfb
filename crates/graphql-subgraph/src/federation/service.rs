use super::{
    metadata::FederationMetadata, ANY_SCALAR, ENTITIES_FIELD, ENTITY_UNION, SERVICE_FIELD, SERVICE_TYPE,
};
use crate::{
    error::ConfigurationError,
    registry::{MetaField, MetaInputValue, MetaType, ObjectType, Registry, ScalarType, UnionType},
};

/// Adds the federation types and root fields to a registry whose field names were already
/// assigned:
///
/// ```graphql
/// union _Entity = A | B
/// scalar _Any
/// type _Service { sdl: String }
///
/// type Query {
///   _entities(representations: [_Any]): [_Entity]
///   _service: _Service
/// }
/// ```
///
/// The entity parts are only added when the schema has entities.
pub(crate) fn create_federation_types(
    registry: &mut Registry,
    metadata: &FederationMetadata,
) -> Result<(), ConfigurationError> {
    let query_type = registry.query_type.clone();
    match registry.lookup_type(&query_type) {
        Some(MetaType::Object(_)) => {}
        Some(_) => return Err(ConfigurationError::InvalidQueryType(query_type)),
        None => registry.insert_type(ObjectType::new(&query_type)),
    }

    let entities = metadata.entities(registry).map(str::to_string).collect::<Vec<_>>();
    let has_entities = !entities.is_empty();

    if has_entities {
        registry.insert_type(UnionType {
            name: ENTITY_UNION.to_string(),
            description: None,
            possible_types: entities,
        });
        registry.insert_type(ScalarType {
            name: ANY_SCALAR.to_string(),
            description: Some("Anything".to_string()),
        });
    }

    registry.insert_type(
        ObjectType::new(SERVICE_TYPE).field(MetaField::new("sdl", "String").with_name("sdl")),
    );

    let Some(MetaType::Object(query)) = registry.types.get_mut(&query_type) else {
        return Err(ConfigurationError::InvalidQueryType(query_type));
    };

    if has_entities {
        let field = MetaField::new(ENTITIES_FIELD, format!("[{ENTITY_UNION}]"))
            .with_name(ENTITIES_FIELD)
            .argument(MetaInputValue::new("representations", format!("[{ANY_SCALAR}]")));
        query.fields.insert(ENTITIES_FIELD.to_string(), field);
    }
    query.fields.insert(
        SERVICE_FIELD.to_string(),
        MetaField::new(SERVICE_FIELD, SERVICE_TYPE).with_name(SERVICE_FIELD),
    );

    Ok(())
}
