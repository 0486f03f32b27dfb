//! Federation details attached to the types of a registry.
//!
//! Populated while the schema is being built and frozen with it afterwards.

use std::{collections::HashMap, fmt, sync::Arc};

use indexmap::{IndexMap, IndexSet};

use super::FieldNames;
use crate::{
    error::ConfigurationError,
    registry::{MetaField, MetaType, ObjectType, Registry},
    resolvers::{BulkResolver, ReferenceResolver},
};

/// Directives attached to a single field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDecoration {
    pub external: bool,
    pub requires: Option<FieldNames>,
    pub provides: Option<FieldNames>,
}

impl FieldDecoration {
    /// Directive texts in rendering order: `@external`, `@requires`, `@provides`.
    pub(crate) fn directives(&self, convert: impl Fn(&FieldNames, Target) -> String) -> Vec<String> {
        let mut directives = Vec::new();
        if self.external {
            directives.push("@external".to_string());
        }
        if let Some(requires) = &self.requires {
            directives.push(format!("@requires(fields: \"{}\")", convert(requires, Target::Parent)));
        }
        if let Some(provides) = &self.provides {
            directives.push(format!("@provides(fields: \"{}\")", convert(provides, Target::ReturnType)));
        }
        directives
    }
}

/// The type a decoration's field names refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Target {
    /// `@requires` names fields of the type owning the decorated field.
    Parent,
    /// `@provides` names fields of the type the decorated field returns.
    ReturnType,
}

/// How the representations of an entity are turned into objects.
#[derive(Clone)]
pub enum EntityResolver {
    /// One object per representation, built from the representation itself and optionally passed
    /// through a hook.
    Singular(Option<Arc<dyn ReferenceResolver>>),
    /// All representations of the type are looked up with a single call.
    Bulk(Arc<dyn BulkResolver>),
}

impl Default for EntityResolver {
    fn default() -> Self {
        EntityResolver::Singular(None)
    }
}

impl EntityResolver {
    pub fn singular(resolver: impl ReferenceResolver + 'static) -> Self {
        EntityResolver::Singular(Some(Arc::new(resolver)))
    }

    pub fn bulk(resolver: impl BulkResolver + 'static) -> Self {
        EntityResolver::Bulk(Arc::new(resolver))
    }

    pub(crate) fn strategy(&self) -> &'static str {
        match self {
            EntityResolver::Singular(_) => "singular",
            EntityResolver::Bulk(_) => "bulk",
        }
    }
}

impl fmt::Debug for EntityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityResolver::Singular(hook) => f.debug_tuple("Singular").field(&hook.is_some()).finish(),
            EntityResolver::Bulk(_) => f.debug_tuple("Bulk").finish_non_exhaustive(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FederationMetadata {
    /// Key attributes per entity type, in registration order.
    keys: IndexMap<String, Vec<String>>,
    extended: IndexSet<String>,
    /// Decorations per type, then per field attribute.
    decorations: IndexMap<String, IndexMap<String, FieldDecoration>>,
    resolvers: HashMap<String, EntityResolver>,
}

impl FederationMetadata {
    /// Declares `field` (an attribute name) as a key of `ty`. Keys are kept in call order,
    /// duplicates included.
    pub fn register_key(&mut self, registry: &Registry, ty: &str, field: &str) -> Result<(), ConfigurationError> {
        if field.contains(char::is_whitespace) {
            return Err(ConfigurationError::CompoundKey);
        }

        let object = lookup_object(registry, ty)?;
        if object.field_by_attribute(field).is_none() {
            return Err(ConfigurationError::UnknownKeyField {
                ty: ty.to_string(),
                field: field.to_string(),
            });
        }

        self.keys.entry(ty.to_string()).or_default().push(field.to_string());
        Ok(())
    }

    pub fn mark_extended(&mut self, registry: &Registry, ty: &str) -> Result<(), ConfigurationError> {
        lookup_object(registry, ty)?;
        self.extended.insert(ty.to_string());
        Ok(())
    }

    pub fn mark_external(&mut self, registry: &Registry, ty: &str, field: &str) -> Result<(), ConfigurationError> {
        let decoration = self.decoration_mut(registry, ty, field)?;
        if decoration.external {
            return Err(ConfigurationError::DecorationAlreadyApplied { directive: "external" });
        }
        decoration.external = true;
        Ok(())
    }

    pub fn mark_requires(
        &mut self,
        registry: &Registry,
        ty: &str,
        field: &str,
        fields: FieldNames,
    ) -> Result<(), ConfigurationError> {
        let decoration = self.decoration_mut(registry, ty, field)?;
        if decoration.requires.is_some() {
            return Err(ConfigurationError::DecorationAlreadyApplied { directive: "requires" });
        }
        decoration.requires = Some(fields);
        Ok(())
    }

    pub fn mark_provides(
        &mut self,
        registry: &Registry,
        ty: &str,
        field: &str,
        fields: FieldNames,
    ) -> Result<(), ConfigurationError> {
        let decoration = self.decoration_mut(registry, ty, field)?;
        if decoration.provides.is_some() {
            return Err(ConfigurationError::DecorationAlreadyApplied { directive: "provides" });
        }
        decoration.provides = Some(fields);
        Ok(())
    }

    pub fn set_entity_resolver(
        &mut self,
        registry: &Registry,
        ty: &str,
        resolver: EntityResolver,
    ) -> Result<(), ConfigurationError> {
        lookup_object(registry, ty)?;
        self.resolvers.insert(ty.to_string(), resolver);
        Ok(())
    }

    pub fn keys(&self, ty: &str) -> &[String] {
        self.keys.get(ty).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_entity(&self, ty: &str) -> bool {
        !self.keys(ty).is_empty()
    }

    pub fn is_extended(&self, ty: &str) -> bool {
        self.extended.contains(ty)
    }

    /// Whether at least one field of `ty` carries a `@provides` decoration.
    pub fn is_provides_parent(&self, ty: &str) -> bool {
        self.decorations
            .get(ty)
            .is_some_and(|fields| fields.values().any(|decoration| decoration.provides.is_some()))
    }

    /// Types with at least one `@provides` field, in decoration order.
    pub fn provides_parents(&self) -> impl Iterator<Item = &str> + '_ {
        self.decorations.keys().map(String::as_str).filter(|ty| self.is_provides_parent(ty))
    }

    pub fn decoration(&self, ty: &str, field: &str) -> Option<&FieldDecoration> {
        self.decorations.get(ty)?.get(field)
    }

    /// Decorated fields of `ty`, by attribute name.
    pub fn decorations(&self, ty: &str) -> impl Iterator<Item = (&str, &FieldDecoration)> + '_ {
        self.decorations
            .get(ty)
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(field, decoration)| (field.as_str(), decoration)))
    }

    /// Entity type names, in the order the registry defines them.
    pub fn entities<'a>(&'a self, registry: &'a Registry) -> impl Iterator<Item = &'a str> + 'a {
        registry
            .types
            .keys()
            .map(String::as_str)
            .filter(|name| self.is_entity(name))
    }

    pub fn has_entities(&self) -> bool {
        self.keys.values().any(|keys| !keys.is_empty())
    }

    pub fn entity_resolver(&self, ty: &str) -> Option<&EntityResolver> {
        self.resolvers.get(ty)
    }

    fn decoration_mut(
        &mut self,
        registry: &Registry,
        ty: &str,
        field: &str,
    ) -> Result<&mut FieldDecoration, ConfigurationError> {
        lookup_field(registry, ty, field)?;
        Ok(self
            .decorations
            .entry(ty.to_string())
            .or_default()
            .entry(field.to_string())
            .or_default())
    }
}

fn lookup_object<'a>(registry: &'a Registry, ty: &str) -> Result<&'a ObjectType, ConfigurationError> {
    match registry.lookup_type(ty) {
        Some(MetaType::Object(object)) => Ok(object),
        Some(_) => Err(ConfigurationError::NotAnObject(ty.to_string())),
        None => Err(ConfigurationError::UnknownType(ty.to_string())),
    }
}

fn lookup_field<'a>(registry: &'a Registry, ty: &str, field: &str) -> Result<&'a MetaField, ConfigurationError> {
    lookup_object(registry, ty)?
        .field_by_attribute(field)
        .ok_or_else(|| ConfigurationError::UnknownField {
            ty: ty.to_string(),
            field: field.to_string(),
        })
}
