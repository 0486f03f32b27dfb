//! Apollo federation (v1) support for a subgraph schema.
//!
//! See <https://www.apollographql.com/docs/federation/v1/federation-spec>.

pub mod entities;
mod field_set;
pub mod metadata;
pub mod sdl;
pub(crate) mod service;

pub use self::{
    entities::{EntityResult, Representation},
    field_set::FieldNames,
    metadata::{EntityResolver, FederationMetadata, FieldDecoration},
    sdl::SdlAnnotator,
};

pub const ANY_SCALAR: &str = "_Any";
pub const ENTITY_UNION: &str = "_Entity";
pub const SERVICE_TYPE: &str = "_Service";
pub const ENTITIES_FIELD: &str = "_entities";
pub const SERVICE_FIELD: &str = "_service";
