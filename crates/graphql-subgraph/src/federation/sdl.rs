//! Renders the SDL served by `_service { sdl }`.
//!
//! Object types are rebuilt as structured definitions (head, type directives, field lines with
//! their directives) and printed, everything else is printed as the schema printer does.

use std::fmt::{self, Write};

use super::{
    metadata::{FederationMetadata, Target},
    FieldNames, ANY_SCALAR, ENTITIES_FIELD, ENTITY_UNION, SERVICE_FIELD, SERVICE_TYPE,
};
use crate::registry::{
    utils::{camel_case_field_name, named_type},
    MetaType, ObjectType, SchemaIntrospection, BUILTIN_SCALARS,
};

/// Annotates a schema with the federation directives of its metadata.
pub struct SdlAnnotator<'a, S: ?Sized> {
    schema: &'a S,
    metadata: &'a FederationMetadata,
    query_type: &'a str,
    excluded: Vec<&'a str>,
}

impl<'a, S: SchemaIntrospection + ?Sized> SdlAnnotator<'a, S> {
    pub fn new(schema: &'a S, metadata: &'a FederationMetadata, query_type: &'a str) -> Self {
        SdlAnnotator {
            schema,
            metadata,
            query_type,
            excluded: Vec::new(),
        }
    }

    /// Leaves a type out of the rendered document.
    #[must_use]
    pub fn exclude_type(mut self, name: &'a str) -> Self {
        self.excluded.push(name);
        self
    }

    pub fn render(&self) -> String {
        let definitions = self
            .schema
            .types()
            .filter(|ty| self.is_rendered(ty))
            .filter_map(|ty| match ty {
                MetaType::Object(object) => self.object_definition(object).map(|definition| definition.to_string()),
                ty => Some(self.schema.print_type(ty)),
            })
            .collect::<Vec<_>>();

        let mut sdl = definitions.join("\n\n");
        sdl.push('\n');
        sdl
    }

    fn is_rendered(&self, ty: &MetaType) -> bool {
        let name = ty.name();
        !name.starts_with("__")
            && !BUILTIN_SCALARS.contains(&name)
            && ![ANY_SCALAR, ENTITY_UNION, SERVICE_TYPE].contains(&name)
            && !self.excluded.contains(&name)
    }

    fn object_definition(&self, ty: &ObjectType) -> Option<ObjectDefinition> {
        let name = ty.name.as_str();
        let extend = self.metadata.is_extended(name);
        let decorate_fields = extend || self.metadata.is_provides_parent(name);

        if !decorate_fields {
            for (field, _) in self.metadata.decorations(name) {
                tracing::warn!(
                    type_name = name,
                    field,
                    "field decoration not rendered, its type is neither extended nor providing fields"
                );
            }
        }

        let fields = ty
            .fields
            .values()
            .filter(|field| {
                name != self.query_type || ![ENTITIES_FIELD, SERVICE_FIELD].contains(&field.name.as_str())
            })
            .enumerate()
            .map(|(i, field)| {
                let directives = self
                    .metadata
                    .decoration(name, &field.attribute)
                    .filter(|_| decorate_fields)
                    .map(|decoration| {
                        decoration.directives(|names, target| {
                            let target = match target {
                                Target::Parent => name,
                                Target::ReturnType => named_type(&field.ty),
                            };
                            self.wire_names(target, names)
                        })
                    })
                    .unwrap_or_default();

                FieldDefinition {
                    sdl: self.schema.print_field(field, i == 0),
                    directives,
                }
            })
            .collect::<Vec<_>>();

        // Only the federation root fields were defined on the query type.
        if fields.is_empty() && !ty.fields.is_empty() {
            return None;
        }

        let directives = self
            .metadata
            .keys(name)
            .iter()
            .map(|key| format!("@key(fields: \"{}\")", self.wire_name(name, key)))
            .collect();

        Some(ObjectDefinition {
            description: self.schema.print_description(ty.description.as_deref()),
            extend,
            head: self.schema.print_object_head(ty),
            directives,
            fields,
        })
    }

    fn wire_names(&self, ty: &str, names: &FieldNames) -> String {
        names
            .iter()
            .map(|attribute| self.wire_name(ty, attribute))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The wire name of an attribute of `ty`, derived from the camel case mode when the type does
    /// not declare it.
    fn wire_name(&self, ty: &str, attribute: &str) -> String {
        let declared = self
            .schema
            .get_type(ty)
            .and_then(MetaType::fields)
            .and_then(|fields| fields.get(attribute));

        match declared {
            Some(field) => field.name.clone(),
            None if self.schema.is_auto_camel_case() => camel_case_field_name(attribute),
            None => attribute.to_string(),
        }
    }
}

struct ObjectDefinition {
    description: String,
    extend: bool,
    head: String,
    directives: Vec<String>,
    fields: Vec<FieldDefinition>,
}

struct FieldDefinition {
    sdl: String,
    directives: Vec<String>,
}

impl fmt::Display for ObjectDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)?;
        if self.extend {
            f.write_str("extend ")?;
        }
        f.write_str(&self.head)?;
        for directive in &self.directives {
            write!(f, " {directive}")?;
        }

        if self.fields.is_empty() {
            return Ok(());
        }

        f.write_str(" {\n")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            f.write_str(&field.sdl)?;
            for directive in &field.directives {
                write!(f, " {directive}")?;
            }
        }
        f.write_str("\n}")
    }
}
