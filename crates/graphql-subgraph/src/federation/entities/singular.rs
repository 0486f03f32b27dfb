use async_graphql_value::{ConstValue, Name};
use futures::future;
use indexmap::IndexMap;

use super::{
    entity_path, lookup_key, representation::TYPENAME, representation_key, resolve_key, EntityResult, Member, Resolution,
};
use crate::{
    error::EntityError,
    object::EntityObject,
    registry::ObjectType,
    resolvers::{GlobalId, ReferenceResolver},
};

/// Builds one entity per representation, then passes it through the reference hook if the type
/// has one.
pub(super) async fn resolve(
    resolution: &Resolution<'_>,
    ty: &ObjectType,
    hook: Option<&dyn ReferenceResolver>,
    members: &[Member],
) -> Vec<(usize, EntityResult)> {
    future::join_all(
        members
            .iter()
            .map(|member| async move { (member.index, resolve_one(resolution, ty, hook, member).await) }),
    )
    .await
}

async fn resolve_one(
    resolution: &Resolution<'_>,
    ty: &ObjectType,
    hook: Option<&dyn ReferenceResolver>,
    member: &Member,
) -> EntityResult {
    let Some(key) = representation_key(resolution, ty, &member.fields) else {
        tracing::debug!(index = member.index, "representation without any key field");
        return Ok(None);
    };
    let expected = member
        .fields
        .get(key.name.as_str())
        .map(|value| lookup_key(key, value))
        .unwrap_or_default();

    let entity = build_entity(ty, &member.fields)?;
    let entity = match hook {
        Some(hook) => match hook.resolve_reference(entity, resolution.ctx).await? {
            Some(entity) => entity,
            None => return Ok(None),
        },
        None => entity,
    };

    // The entity is found under the value its key resolves to. Global ids compare by payload.
    let value = resolve_key(resolution, resolution.ctx, ty, key, &entity, entity_path(member.index)).await?;
    if lookup_key(key, &value) == expected {
        Ok(Some(entity))
    } else {
        tracing::debug!(index = member.index, key = %key.name, %value, "resolved entity does not match its representation");
        Ok(None)
    }
}

/// Turns the fields of a representation into an entity: wire names become attribute names and
/// global ids are replaced by the raw id they wrap.
fn build_entity(ty: &ObjectType, fields: &IndexMap<Name, ConstValue>) -> Result<EntityObject, EntityError> {
    let mut entity = EntityObject::new(&ty.name);

    for (name, value) in fields {
        if name == TYPENAME {
            continue;
        }

        match ty.field_by_name(name) {
            Some(field) if field.global_id => entity.set(&field.attribute, decode_global_id(&ty.name, value)?),
            Some(field) => entity.set(&field.attribute, value.clone()),
            None => entity.set(name.as_str(), value.clone()),
        }
    }

    Ok(entity)
}

fn decode_global_id(typename: &str, value: &ConstValue) -> Result<ConstValue, EntityError> {
    let encoded = match value {
        ConstValue::Null => return Ok(ConstValue::Null),
        ConstValue::String(encoded) => encoded,
        value => return Err(EntityError::MalformedGlobalId(value.to_string())),
    };

    let id = GlobalId::decode(encoded)?;
    if id.ty != typename {
        return Err(EntityError::InvalidReference {
            expected: typename.to_string(),
            found: id.ty,
        });
    }

    Ok(id.payload())
}
