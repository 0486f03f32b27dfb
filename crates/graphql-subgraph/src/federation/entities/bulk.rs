use std::collections::HashMap;

use async_graphql_value::ConstValue;
use futures::future;

use super::{entity_path, lookup_key, representation_key, resolve_key, EntityResult, Member, Resolution};
use crate::{
    context::RequestContext,
    error::EntityError,
    object::EntityObject,
    registry::{MetaField, ObjectType},
    resolvers::{BulkQuery, BulkResolver},
};

/// Looks up every representation of the group with one call to the bulk resolver.
///
/// The key used is the first key of the type present on the first representation. Returned
/// entities are matched back to the representations by the value their key resolves to.
pub(super) async fn resolve(
    resolution: &Resolution<'_>,
    ty: &ObjectType,
    resolver: &dyn BulkResolver,
    members: &[Member],
) -> Vec<(usize, EntityResult)> {
    let Some(key) = members
        .first()
        .and_then(|first| representation_key(resolution, ty, &first.fields))
    else {
        tracing::debug!(typename = %ty.name, "no key field on the first representation");
        return members.iter().map(|member| (member.index, Ok(None))).collect();
    };

    let query = BulkQuery {
        typename: ty.name.clone(),
        key: key.name.clone(),
        values: members
            .iter()
            .map(|member| member.fields.get(key.name.as_str()).cloned().unwrap_or(ConstValue::Null))
            .collect(),
    };

    let ctx = resolution.ctx.for_representation(&ty.name);
    let entities = match lookup(resolution, &ctx, ty, key, resolver, query).await {
        Ok(entities) => entities,
        Err(err) => {
            tracing::debug!(typename = %ty.name, error = %err, "bulk resolution failed");
            return members.iter().map(|member| (member.index, Err(err.clone()))).collect();
        }
    };

    members
        .iter()
        .map(|member| {
            let entity = member
                .fields
                .get(key.name.as_str())
                .and_then(|value| entities.get(&lookup_key(key, value)))
                .cloned();
            (member.index, Ok(entity))
        })
        .collect()
}

/// Runs the bulk query and indexes the returned entities by the resolved value of `key`.
async fn lookup(
    resolution: &Resolution<'_>,
    ctx: &RequestContext,
    ty: &ObjectType,
    key: &MetaField,
    resolver: &dyn BulkResolver,
    query: BulkQuery,
) -> Result<HashMap<String, EntityObject>, EntityError> {
    let connection = resolver.resolve_references(query, ctx).await?;

    let entities = future::try_join_all(connection.edges.into_iter().enumerate().map(|(i, edge)| async move {
        let value = resolve_key(resolution, ctx, ty, key, &edge.node, entity_path(i)).await?;
        Ok::<_, EntityError>((lookup_key(key, &value), edge.node))
    }))
    .await?;

    Ok(entities.into_iter().collect())
}
