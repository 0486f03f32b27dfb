use super::{export_sdl, MetaField, MetaType, ObjectType, Registry};

/// Read-only view over a built schema. This is everything the federation layer needs from the
/// schema it decorates.
pub trait SchemaIntrospection {
    fn get_type(&self, name: &str) -> Option<&MetaType>;

    /// Every type, in registration order.
    fn types(&self) -> Box<dyn Iterator<Item = &MetaType> + '_>;

    fn is_auto_camel_case(&self) -> bool;

    /// Prints a single field line exactly as it appears inside its type's field block.
    fn print_field(&self, field: &MetaField, first_in_block: bool) -> String;

    /// Prints the field block of a type, without the surrounding braces.
    fn print_fields(&self, ty: &ObjectType) -> String {
        ty.fields
            .values()
            .enumerate()
            .map(|(i, field)| self.print_field(field, i == 0))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Prints `type Name implements A & B`, without description nor field block.
    fn print_object_head(&self, ty: &ObjectType) -> String;

    /// Prints a top level description followed by a newline, or nothing.
    fn print_description(&self, description: Option<&str>) -> String;

    fn print_type(&self, ty: &MetaType) -> String;

    /// Prints the whole schema, starting with a `schema { ... }` block even when only a query root
    /// exists.
    fn print_schema(&self) -> String;
}

impl SchemaIntrospection for Registry {
    fn get_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    fn types(&self) -> Box<dyn Iterator<Item = &MetaType> + '_> {
        Box::new(self.types.values())
    }

    fn is_auto_camel_case(&self) -> bool {
        self.auto_camel_case
    }

    fn print_field(&self, field: &MetaField, first_in_block: bool) -> String {
        export_sdl::export_field(field, first_in_block)
    }

    fn print_object_head(&self, ty: &ObjectType) -> String {
        export_sdl::export_object_head(ty, "type")
    }

    fn print_description(&self, description: Option<&str>) -> String {
        export_sdl::export_description(description, "", true)
    }

    fn print_type(&self, ty: &MetaType) -> String {
        export_sdl::export_type(ty)
    }

    fn print_schema(&self) -> String {
        export_sdl::export_schema(self)
    }
}
