//! Apollo Federation (v1) support for a GraphQL subgraph.
//!
//! Describe the schema with a [`registry::Registry`], declare entity keys and field directives
//! through [`Schema::build`], then serve `_service { sdl }` and `_entities(representations: ...)`
//! with [`Schema::execute`].

pub mod config;
pub mod context;
pub mod error;
mod executor;
pub mod federation;
pub mod object;
pub mod registry;
pub mod request;
pub mod resolvers;
mod schema;

pub use async_graphql_value::{ConstValue, Name, Variables};

pub use self::{
    config::FederationConfig,
    context::RequestContext,
    error::{ConfigurationError, EntityError, PathSegment, ServerError},
    object::EntityObject,
    request::{Request, Response},
    schema::{Schema, SchemaBuilder},
};
