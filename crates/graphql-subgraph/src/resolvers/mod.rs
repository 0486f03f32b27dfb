//! The resolver contracts a subgraph author implements.
//!
//! Every resolution step is asynchronous, even when the work behind it is not.

pub mod global_id;

use std::fmt;

use async_graphql_value::{ConstValue, Name, Variables};
use indexmap::IndexMap;

pub use self::global_id::{GlobalId, PayloadEncoding};
use crate::{
    context::RequestContext,
    error::{EntityError, PathSegment},
    object::EntityObject,
    registry::MetaField,
    Schema,
};

/// Everything a resolver knows about the field it is resolving.
pub struct ResolveInfo<'a> {
    pub schema: &'a Schema,
    /// The name of the type the field belongs to.
    pub parent_type: &'a str,
    pub field: &'a MetaField,
    pub path: Vec<PathSegment>,
    pub arguments: IndexMap<Name, ConstValue>,
    pub variables: &'a Variables,
    pub context: &'a RequestContext,
}

impl ResolveInfo<'_> {
    pub fn argument(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }
}

impl fmt::Debug for ResolveInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveInfo")
            .field("parent_type", &self.parent_type)
            .field("field", &self.field.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Computes the value of a field from its parent object.
#[async_trait::async_trait]
pub trait FieldResolver: Send + Sync {
    async fn resolve(&self, parent: &EntityObject, info: &ResolveInfo<'_>) -> Result<ConstValue, EntityError>;
}

/// Hook run on every entity built from a representation. It may replace the entity, or return
/// `None` when the reference does not exist.
#[async_trait::async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve_reference(
        &self,
        reference: EntityObject,
        ctx: &RequestContext,
    ) -> Result<Option<EntityObject>, EntityError>;
}

/// Resolves all the representations of one type with a single call.
#[async_trait::async_trait]
pub trait BulkResolver: Send + Sync {
    /// `ctx.representation()` holds the typename the query is issued for.
    async fn resolve_references(&self, query: BulkQuery, ctx: &RequestContext) -> Result<Connection, EntityError>;
}

/// A `<key> IN (values)` lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct BulkQuery {
    pub typename: String,
    /// Wire name of the key field.
    pub key: String,
    pub values: Vec<ConstValue>,
}

impl BulkQuery {
    /// The filter argument the query would be issued with, `id_In` for an `id` key.
    pub fn argument_name(&self) -> String {
        format!("{}_In", self.key)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Connection {
    pub edges: Vec<Edge>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub node: EntityObject,
}

impl From<Vec<EntityObject>> for Connection {
    fn from(nodes: Vec<EntityObject>) -> Self {
        Connection {
            edges: nodes.into_iter().map(|node| Edge { node }).collect(),
        }
    }
}

impl FromIterator<EntityObject> for Connection {
    fn from_iter<T: IntoIterator<Item = EntityObject>>(iter: T) -> Self {
        Connection {
            edges: iter.into_iter().map(|node| Edge { node }).collect(),
        }
    }
}

/// A field resolver backed by a synchronous closure.
pub struct FnResolver<F>(F);

/// Wraps a closure into a [`FieldResolver`].
pub fn resolver_fn<F>(f: F) -> FnResolver<F>
where
    F: Fn(&EntityObject, &ResolveInfo<'_>) -> Result<ConstValue, EntityError> + Send + Sync,
{
    FnResolver(f)
}

#[async_trait::async_trait]
impl<F> FieldResolver for FnResolver<F>
where
    F: Fn(&EntityObject, &ResolveInfo<'_>) -> Result<ConstValue, EntityError> + Send + Sync,
{
    async fn resolve(&self, parent: &EntityObject, info: &ResolveInfo<'_>) -> Result<ConstValue, EntityError> {
        (self.0)(parent, info)
    }
}

/// Resolves `info.field` on `parent`: through the field's resolver when it has one, otherwise by
/// reading the attribute, or the wire name for objects built from plain values.
pub(crate) async fn resolve_field(parent: &EntityObject, info: &ResolveInfo<'_>) -> Result<ConstValue, EntityError> {
    let field = info.field;
    match &field.resolver {
        Some(resolver) => resolver.resolve(parent, info).await,
        None => Ok(parent
            .get(&field.attribute)
            .or_else(|| parent.get(&field.name))
            .cloned()
            .unwrap_or(ConstValue::Null)),
    }
}
