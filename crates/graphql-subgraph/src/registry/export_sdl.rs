//! Prints a registry the way reference GraphQL printers do: two space indentation, block string
//! descriptions, one blank line between definitions.

use std::fmt::Write;

use async_graphql_value::ConstValue;

use super::{
    Deprecation, EnumType, InputObjectType, MetaField, MetaInputValue, MetaType, ObjectType, Registry, ScalarType,
    UnionType, BUILTIN_SCALARS,
};

const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub(crate) fn is_printable(ty: &MetaType) -> bool {
    !ty.name().starts_with("__") && !BUILTIN_SCALARS.contains(&ty.name())
}

pub(crate) fn export_schema(registry: &Registry) -> String {
    let mut definitions = vec![export_schema_definition(registry)];
    definitions.extend(
        registry
            .types
            .values()
            .filter(|ty| is_printable(ty))
            .map(export_type),
    );

    let mut sdl = definitions.join("\n\n");
    sdl.push('\n');
    sdl
}

/// The `schema { ... }` block, printed even when the operation types use their default names.
fn export_schema_definition(registry: &Registry) -> String {
    let mut sdl = String::from("schema {\n");
    writeln!(sdl, "  query: {}", registry.query_type).ok();
    if let Some(mutation_type) = registry.mutation_type.as_deref() {
        writeln!(sdl, "  mutation: {mutation_type}").ok();
    }
    if let Some(subscription_type) = registry.subscription_type.as_deref() {
        writeln!(sdl, "  subscription: {subscription_type}").ok();
    }
    sdl.push('}');
    sdl
}

pub(crate) fn export_type(ty: &MetaType) -> String {
    match ty {
        MetaType::Object(object) => export_object(object, "type"),
        MetaType::Interface(interface) => export_object(interface, "interface"),
        MetaType::Union(union) => export_union(union),
        MetaType::Scalar(scalar) => export_scalar(scalar),
        MetaType::Enum(enum_type) => export_enum(enum_type),
        MetaType::InputObject(input) => export_input_object(input),
    }
}

fn export_object(ty: &ObjectType, keyword: &str) -> String {
    let fields = export_fields(ty.fields.values());
    format!(
        "{}{}{}",
        export_description(ty.description.as_deref(), "", true),
        export_object_head(ty, keyword),
        export_block(&fields)
    )
}

/// `type Name implements A & B`, without trailing space.
pub(crate) fn export_object_head(ty: &ObjectType, keyword: &str) -> String {
    let mut head = format!("{keyword} {}", ty.name);
    if !ty.implements.is_empty() {
        write!(head, " implements {}", ty.implements.join(" & ")).ok();
    }
    head
}

pub(crate) fn export_fields<'a>(fields: impl Iterator<Item = &'a MetaField>) -> String {
    fields
        .enumerate()
        .map(|(i, field)| export_field(field, i == 0))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn export_field(field: &MetaField, first_in_block: bool) -> String {
    format!(
        "{}  {}{}: {}{}",
        export_description(field.description.as_deref(), "  ", first_in_block),
        field.name,
        export_args(field.args.values(), "  "),
        field.ty,
        export_deprecation(&field.deprecation)
    )
}

pub(crate) fn export_block(content: &str) -> String {
    if content.is_empty() {
        String::new()
    } else {
        format!(" {{\n{content}\n}}")
    }
}

fn export_args<'a>(args: impl ExactSizeIterator<Item = &'a MetaInputValue> + Clone, indentation: &str) -> String {
    if args.len() == 0 {
        return String::new();
    }

    if args.clone().all(|arg| arg.description.is_none()) {
        let args = args.map(export_input_value).collect::<Vec<_>>();
        return format!("({})", args.join(", "));
    }

    let inner_indentation = format!("  {indentation}");
    let args = args
        .enumerate()
        .map(|(i, arg)| {
            format!(
                "{}{inner_indentation}{}",
                export_description(arg.description.as_deref(), &inner_indentation, i == 0),
                export_input_value(arg)
            )
        })
        .collect::<Vec<_>>();

    format!("(\n{}\n{indentation})", args.join("\n"))
}

fn export_input_value(value: &MetaInputValue) -> String {
    let mut sdl = format!("{}: {}", value.name, value.ty);
    if let Some(default_value) = &value.default_value {
        write!(sdl, " = {default_value}").ok();
    }
    sdl.push_str(&export_deprecation(&value.deprecation));
    sdl
}

fn export_deprecation(deprecation: &Deprecation) -> String {
    match deprecation {
        Deprecation::NoDeprecated => String::new(),
        Deprecation::Deprecated { reason: None } => " @deprecated".to_string(),
        Deprecation::Deprecated { reason: Some(reason) } if reason == DEFAULT_DEPRECATION_REASON => {
            " @deprecated".to_string()
        }
        Deprecation::Deprecated { reason: Some(reason) } => {
            format!(" @deprecated(reason: {})", ConstValue::String(reason.clone()))
        }
    }
}

pub(crate) fn export_description(description: Option<&str>, indentation: &str, first_in_block: bool) -> String {
    let Some(description) = description else {
        return String::new();
    };

    let escaped = description.replace("\"\"\"", "\\\"\"\"");
    let block = if escaped.contains('\n') {
        format!("\"\"\"\n{escaped}\n\"\"\"")
    } else {
        format!("\"\"\"{escaped}\"\"\"")
    };

    let prefix = if !indentation.is_empty() && !first_in_block {
        format!("\n{indentation}")
    } else {
        indentation.to_string()
    };

    format!("{prefix}{}\n", block.replace('\n', &format!("\n{indentation}")))
}

fn export_union(ty: &UnionType) -> String {
    let mut sdl = format!(
        "{}union {}",
        export_description(ty.description.as_deref(), "", true),
        ty.name
    );
    if !ty.possible_types.is_empty() {
        write!(sdl, " = {}", ty.possible_types.join(" | ")).ok();
    }
    sdl
}

fn export_scalar(ty: &ScalarType) -> String {
    format!(
        "{}scalar {}",
        export_description(ty.description.as_deref(), "", true),
        ty.name
    )
}

fn export_enum(ty: &EnumType) -> String {
    let values = ty
        .values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            format!(
                "{}  {}{}",
                export_description(value.description.as_deref(), "  ", i == 0),
                value.name,
                export_deprecation(&value.deprecation)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}enum {}{}",
        export_description(ty.description.as_deref(), "", true),
        ty.name,
        export_block(&values)
    )
}

fn export_input_object(ty: &InputObjectType) -> String {
    let fields = ty
        .fields
        .values()
        .enumerate()
        .map(|(i, field)| {
            format!(
                "{}  {}",
                export_description(field.description.as_deref(), "  ", i == 0),
                export_input_value(field)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}input {}{}",
        export_description(ty.description.as_deref(), "", true),
        ty.name,
        export_block(&fields)
    )
}
