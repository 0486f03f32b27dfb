//! The schema model the federation layer is hosted on.
//!
//! Types and fields are authored with their internal attribute names (usually snake case). The
//! names exposed on the wire are assigned once, when the schema is built, according to the
//! registry's camel case mode.

mod export_sdl;
mod introspection;
pub mod utils;

use std::{fmt, sync::Arc};

use async_graphql_value::ConstValue;
use indexmap::IndexMap;

pub use self::introspection::SchemaIntrospection;
use crate::resolvers::{global_id::GlobalIdResolver, FieldResolver, PayloadEncoding};

/// Names of the scalars every GraphQL schema has. They are never printed.
pub const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Deprecation {
    #[default]
    NoDeprecated,
    Deprecated {
        reason: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: String,
    pub default_value: Option<ConstValue>,
    pub deprecation: Deprecation,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
            deprecation: Deprecation::NoDeprecated,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: ConstValue) -> Self {
        self.default_value = Some(default);
        self
    }
}

/// A field of an object or interface type.
#[derive(Clone)]
pub struct MetaField {
    /// The name exposed on the wire.
    pub name: String,
    /// The name the field was authored with.
    pub attribute: String,
    pub description: Option<String>,
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: String,
    pub deprecation: Deprecation,
    /// Whether values of this field are opaque global identifiers (`base64("<Type>:<id>")`).
    pub global_id: bool,
    pub resolver: Option<Arc<dyn FieldResolver>>,
    renamed: bool,
}

impl MetaField {
    pub fn new(attribute: impl Into<String>, ty: impl Into<String>) -> MetaField {
        let attribute = attribute.into();
        MetaField {
            name: attribute.clone(),
            attribute,
            description: None,
            args: IndexMap::new(),
            ty: ty.into(),
            deprecation: Deprecation::NoDeprecated,
            global_id: false,
            resolver: None,
            renamed: false,
        }
    }

    /// Overrides the wire name, which is otherwise derived from the attribute name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.renamed = true;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, arg: MetaInputValue) -> Self {
        self.args.insert(arg.name.clone(), arg);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation = Deprecation::Deprecated {
            reason: reason.map(str::to_string),
        };
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl FieldResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Marks the field as a global identifier. The stored attribute is the raw id, the wire value
    /// is the encoded global id.
    #[must_use]
    pub fn global_id(mut self, encoding: PayloadEncoding) -> Self {
        self.global_id = true;
        self.resolver = Some(Arc::new(GlobalIdResolver::new(encoding)));
        self
    }

    pub(crate) fn is_renamed(&self) -> bool {
        self.renamed
    }
}

impl fmt::Debug for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaField")
            .field("name", &self.name)
            .field("attribute", &self.attribute)
            .field("ty", &self.ty)
            .field("global_id", &self.global_id)
            .field("has_resolver", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// An object type, also used to describe interfaces.
#[derive(Clone, Debug)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub implements: Vec<String>,
    /// Fields keyed by attribute name, in declaration order.
    pub fields: IndexMap<String, MetaField>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            implements: Vec::new(),
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: MetaField) -> Self {
        self.fields.insert(field.attribute.clone(), field);
        self
    }

    pub fn field_by_attribute(&self, attribute: &str) -> Option<&MetaField> {
        self.fields.get(attribute)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.values().find(|field| field.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MetaEnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Deprecation,
}

#[derive(Clone, Debug)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<MetaEnumValue>,
}

#[derive(Clone, Debug)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, MetaInputValue>,
}

#[derive(Clone, Debug)]
pub enum MetaType {
    Object(ObjectType),
    Interface(ObjectType),
    Union(UnionType),
    Scalar(ScalarType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Object(ty) | MetaType::Interface(ty) => &ty.name,
            MetaType::Union(ty) => &ty.name,
            MetaType::Scalar(ty) => &ty.name,
            MetaType::Enum(ty) => &ty.name,
            MetaType::InputObject(ty) => &ty.name,
        }
    }

    pub fn object(&self) -> Option<&ObjectType> {
        match self {
            MetaType::Object(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        match self {
            MetaType::Object(ty) | MetaType::Interface(ty) => Some(&ty.fields),
            _ => None,
        }
    }
}

impl From<ObjectType> for MetaType {
    fn from(value: ObjectType) -> Self {
        MetaType::Object(value)
    }
}

impl From<UnionType> for MetaType {
    fn from(value: UnionType) -> Self {
        MetaType::Union(value)
    }
}

impl From<ScalarType> for MetaType {
    fn from(value: ScalarType) -> Self {
        MetaType::Scalar(value)
    }
}

impl From<EnumType> for MetaType {
    fn from(value: EnumType) -> Self {
        MetaType::Enum(value)
    }
}

impl From<InputObjectType> for MetaType {
    fn from(value: InputObjectType) -> Self {
        MetaType::InputObject(value)
    }
}

/// All the types of a schema, in the order they were registered.
#[derive(Clone, Debug)]
pub struct Registry {
    pub types: IndexMap<String, MetaType>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub auto_camel_case: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new("Query")
    }
}

impl Registry {
    pub fn new(query_type: impl Into<String>) -> Self {
        Registry {
            types: IndexMap::new(),
            query_type: query_type.into(),
            mutation_type: None,
            subscription_type: None,
            auto_camel_case: true,
        }
    }

    #[must_use]
    pub fn with_type(mut self, ty: impl Into<MetaType>) -> Self {
        self.insert_type(ty);
        self
    }

    #[must_use]
    pub fn with_mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type = Some(name.into());
        self
    }

    /// Adds a type, replacing any previous type with the same name in place.
    pub fn insert_type(&mut self, ty: impl Into<MetaType>) {
        let ty = ty.into();
        self.types.insert(ty.name().to_string(), ty);
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn lookup_object(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name).and_then(MetaType::object)
    }

    /// Assigns wire names to every field and argument that was not explicitly renamed.
    pub(crate) fn assign_field_names(&mut self) {
        let auto_camel_case = self.auto_camel_case;
        let rename = |name: &str| {
            if auto_camel_case {
                utils::camel_case_field_name(name)
            } else {
                name.to_string()
            }
        };

        for ty in self.types.values_mut() {
            match ty {
                MetaType::Object(ty) | MetaType::Interface(ty) => {
                    for field in ty.fields.values_mut() {
                        if !field.is_renamed() {
                            field.name = rename(&field.attribute);
                        }
                        field.args = std::mem::take(&mut field.args)
                            .into_values()
                            .map(|mut arg| {
                                arg.name = rename(&arg.name);
                                (arg.name.clone(), arg)
                            })
                            .collect();
                    }
                }
                MetaType::InputObject(ty) => {
                    ty.fields = std::mem::take(&mut ty.fields)
                        .into_values()
                        .map(|mut field| {
                            field.name = rename(&field.name);
                            (field.name.clone(), field)
                        })
                        .collect();
                }
                MetaType::Union(_) | MetaType::Scalar(_) | MetaType::Enum(_) => {}
            }
        }
    }
}
