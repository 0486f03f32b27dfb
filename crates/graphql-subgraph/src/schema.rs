use std::{
    ops::Deref,
    sync::{Arc, OnceLock},
};

use async_graphql_value::Variables;

use crate::{
    config::FederationConfig,
    context::RequestContext,
    error::{ConfigurationError, EntityError},
    executor,
    federation::{
        entities, service, EntityResolver, EntityResult, FederationMetadata, FieldNames, Representation,
        SdlAnnotator,
    },
    registry::Registry,
    request::{Request, Response},
};

/// Registers the federation details of a registry, then freezes both into a [`Schema`].
///
/// Types and fields are referred to by their authored names: type names and field attribute
/// names.
#[derive(Debug)]
pub struct SchemaBuilder {
    registry: Registry,
    metadata: FederationMetadata,
    config: FederationConfig,
}

impl SchemaBuilder {
    #[must_use]
    pub fn with_config(mut self, config: FederationConfig) -> Self {
        self.config = config;
        self
    }

    /// Declares `field` as a key of the entity `ty`: `@key(fields: "field")`.
    pub fn key(mut self, ty: &str, field: &str) -> Result<Self, ConfigurationError> {
        self.metadata.register_key(&self.registry, ty, field)?;
        Ok(self)
    }

    /// Marks `ty` as owned by another subgraph: `extend type Ty`.
    pub fn extend(mut self, ty: &str) -> Result<Self, ConfigurationError> {
        self.metadata.mark_extended(&self.registry, ty)?;
        Ok(self)
    }

    /// Extends `ty` and declares `field` as its key in one go.
    pub fn extend_with_key(self, ty: &str, field: &str) -> Result<Self, ConfigurationError> {
        self.key(ty, field)?.extend(ty)
    }

    /// `@external`: the field is owned by another subgraph.
    pub fn external(mut self, ty: &str, field: &str) -> Result<Self, ConfigurationError> {
        self.metadata.mark_external(&self.registry, ty, field)?;
        Ok(self)
    }

    /// `@requires(fields: "...")`: resolving the field needs `fields` from another subgraph.
    pub fn requires(mut self, ty: &str, field: &str, fields: impl Into<FieldNames>) -> Result<Self, ConfigurationError> {
        self.metadata.mark_requires(&self.registry, ty, field, fields.into())?;
        Ok(self)
    }

    /// `@provides(fields: "...")`: the field returns entities with `fields` already resolved.
    pub fn provides(mut self, ty: &str, field: &str, fields: impl Into<FieldNames>) -> Result<Self, ConfigurationError> {
        self.metadata.mark_provides(&self.registry, ty, field, fields.into())?;
        Ok(self)
    }

    pub fn entity_resolver(mut self, ty: &str, resolver: EntityResolver) -> Result<Self, ConfigurationError> {
        self.metadata.set_entity_resolver(&self.registry, ty, resolver)?;
        Ok(self)
    }

    /// Assigns wire names and adds the federation types and root fields.
    pub fn finish(mut self) -> Result<Schema, ConfigurationError> {
        self.registry.auto_camel_case = self.config.auto_camel_case;
        self.registry.assign_field_names();
        service::create_federation_types(&mut self.registry, &self.metadata)?;

        Ok(Schema(Arc::new(SchemaInner {
            registry: self.registry,
            metadata: self.metadata,
            config: self.config,
            sdl: OnceLock::new(),
        })))
    }
}

#[doc(hidden)]
#[derive(Debug)]
pub struct SchemaInner {
    registry: Registry,
    metadata: FederationMetadata,
    config: FederationConfig,
    sdl: OnceLock<String>,
}

/// A subgraph schema. Cloning is cheap and clones share everything, the rendered SDL included.
#[derive(Clone, Debug)]
pub struct Schema(Arc<SchemaInner>);

impl Deref for Schema {
    type Target = SchemaInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Schema {
    pub fn build(registry: Registry) -> SchemaBuilder {
        let config = FederationConfig {
            auto_camel_case: registry.auto_camel_case,
            ..Default::default()
        };

        SchemaBuilder {
            registry,
            metadata: FederationMetadata::default(),
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn metadata(&self) -> &FederationMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// The schema with its federation types, as the schema printer renders it.
    pub fn sdl(&self) -> String {
        crate::registry::SchemaIntrospection::print_schema(&self.registry)
    }

    /// The SDL served by `_service { sdl }`. Rendered once per schema.
    pub fn federation_sdl(&self) -> &str {
        self.sdl.get_or_init(|| {
            let mut annotator = SdlAnnotator::new(&self.registry, &self.metadata, &self.registry.query_type);
            if !self.config.include_subscription {
                if let Some(subscription_type) = self.registry.subscription_type.as_deref() {
                    annotator = annotator.exclude_type(subscription_type);
                }
            }
            annotator.render()
        })
    }

    /// Resolves `_entities(representations: ...)`: one result per representation, in order.
    ///
    /// `variables` are used to resolve representation literals referencing variables.
    pub async fn resolve_entities(
        &self,
        representations: Vec<Representation>,
        variables: &Variables,
        ctx: &RequestContext,
    ) -> Result<Vec<EntityResult>, EntityError> {
        entities::resolve_entities(self, representations, variables, ctx).await
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        executor::execute(self, request.into()).await
    }
}
