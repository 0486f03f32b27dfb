//! The `_entities` resolver.
//!
//! Representations are grouped by typename, every group is resolved concurrently with the
//! strategy of its type, and the results are put back in the order the representations came in.
//! A representation that cannot be resolved gives `null` at its position.

mod bulk;
mod representation;
mod singular;

use async_graphql_value::{ConstValue, Name, Variables};
use futures::future::{self, Either};
use indexmap::IndexMap;
use tracing::Instrument;

pub use self::representation::Representation;
use super::{metadata::EntityResolver, ENTITIES_FIELD};
use crate::{
    context::RequestContext,
    error::{EntityError, PathSegment},
    object::EntityObject,
    registry::{MetaField, ObjectType},
    resolvers::{resolve_field, GlobalId, ResolveInfo},
    Schema,
};

/// The outcome for a single representation: the entity, `None` when it does not resolve, or the
/// error that prevented its resolution.
pub type EntityResult = Result<Option<EntityObject>, EntityError>;

/// A representation with its position in the request.
struct Member {
    index: usize,
    fields: IndexMap<Name, ConstValue>,
}

/// What every group of a single `_entities` call shares.
struct Resolution<'a> {
    schema: &'a Schema,
    variables: &'a Variables,
    ctx: &'a RequestContext,
}

/// Resolves `representations`, returning one result per representation in the same order.
///
/// Fails as a whole only when the request gets cancelled before the results are assembled.
pub(crate) async fn resolve_entities(
    schema: &Schema,
    representations: Vec<Representation>,
    variables: &Variables,
    ctx: &RequestContext,
) -> Result<Vec<EntityResult>, EntityError> {
    let span = tracing::info_span!("federation_entities", representations = representations.len());

    async move {
        if ctx.is_cancelled() {
            return Err(EntityError::Cancelled);
        }

        let mut results: Vec<EntityResult> = vec![Ok(None); representations.len()];
        let groups = group_by_typename(schema, representations, variables);

        let resolution = Resolution { schema, variables, ctx };
        let pending = future::join_all(
            groups
                .iter()
                .map(|(typename, members)| resolve_group(&resolution, typename, members)),
        );

        let resolved = match future::select(Box::pin(pending), Box::pin(ctx.cancellation_token().cancelled())).await {
            Either::Left((resolved, _)) => resolved,
            Either::Right(_) => {
                tracing::debug!("entity resolution cancelled");
                return Err(EntityError::Cancelled);
            }
        };

        if ctx.is_cancelled() {
            return Err(EntityError::Cancelled);
        }

        for (index, result) in resolved.into_iter().flatten() {
            results[index] = result;
        }

        Ok(results)
    }
    .instrument(span)
    .await
}

/// Groups the representations of known entities by typename, keeping arrival order.
fn group_by_typename(
    schema: &Schema,
    representations: Vec<Representation>,
    variables: &Variables,
) -> IndexMap<String, Vec<Member>> {
    let mut groups = IndexMap::<String, Vec<Member>>::new();

    for (index, representation) in representations.into_iter().enumerate() {
        let Some(fields) = representation.normalize(variables) else {
            tracing::debug!(index, "representation is not an object");
            continue;
        };

        let Some(typename) = representation::typename(&fields) else {
            tracing::debug!(index, "representation without __typename");
            continue;
        };

        if schema.registry().lookup_object(typename).is_none() || !schema.metadata().is_entity(typename) {
            tracing::debug!(index, typename, "representation of an unknown entity");
            continue;
        }

        let typename = typename.to_string();
        groups.entry(typename).or_default().push(Member { index, fields });
    }

    groups
}

async fn resolve_group(resolution: &Resolution<'_>, typename: &str, members: &[Member]) -> Vec<(usize, EntityResult)> {
    let Some(ty) = resolution.schema.registry().lookup_object(typename) else {
        return Vec::new();
    };

    let resolver = resolution
        .schema
        .metadata()
        .entity_resolver(typename)
        .cloned()
        .unwrap_or_default();

    let span = tracing::info_span!(
        "entity_group",
        typename,
        strategy = resolver.strategy(),
        representations = members.len()
    );

    async {
        match resolver {
            EntityResolver::Bulk(resolver) => bulk::resolve(resolution, ty, resolver.as_ref(), members).await,
            EntityResolver::Singular(hook) => singular::resolve(resolution, ty, hook.as_deref(), members).await,
        }
    }
    .instrument(span)
    .await
}

/// The first key of `ty` present in the representation.
fn representation_key<'a>(
    resolution: &Resolution<'_>,
    ty: &'a ObjectType,
    fields: &IndexMap<Name, ConstValue>,
) -> Option<&'a MetaField> {
    resolution
        .schema
        .metadata()
        .keys(&ty.name)
        .iter()
        .filter_map(|key| ty.field_by_attribute(key))
        .find(|field| fields.contains_key(field.name.as_str()))
}

/// The entry of a per group lookup table for an entity whose `key` has `value`.
///
/// Global ids are compared on their decoded payload: `User:1e2` and `User:100.0` name the same
/// entity even though their encodings differ.
fn lookup_key(key: &MetaField, value: &ConstValue) -> String {
    match value {
        ConstValue::String(encoded) if key.global_id => match GlobalId::decode(encoded) {
            Ok(id) => format!("{}:{}", key.name, id.payload()),
            Err(_) => format!("{}:{value}", key.name),
        },
        value => format!("{}:{value}", key.name),
    }
}

fn entity_path(index: usize) -> Vec<PathSegment> {
    vec![PathSegment::from(ENTITIES_FIELD), PathSegment::from(index)]
}

/// Computes the value of `key` on an entity, as a query selecting it would see it.
async fn resolve_key(
    resolution: &Resolution<'_>,
    ctx: &RequestContext,
    ty: &ObjectType,
    key: &MetaField,
    entity: &EntityObject,
    path: Vec<PathSegment>,
) -> Result<ConstValue, EntityError> {
    let info = ResolveInfo {
        schema: resolution.schema,
        parent_type: &ty.name,
        field: key,
        path,
        arguments: IndexMap::new(),
        variables: resolution.variables,
        context: ctx,
    };

    resolve_field(entity, &info).await
}
