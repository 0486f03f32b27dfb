use inflector::Inflector;

/// Converts an attribute name into its camel case field name: `shipping_estimate` becomes
/// `shippingEstimate`.
///
/// Leading underscores are kept and names without any inner underscore are returned untouched,
/// so `_entities`, `aCamel` or `ID` stay as they are.
pub fn camel_case_field_name(attribute: &str) -> String {
    let trimmed = attribute.trim_start_matches('_');
    if !trimmed.contains('_') {
        return attribute.to_string();
    }

    let prefix = &attribute[..attribute.len() - trimmed.len()];
    format!("{prefix}{}", trimmed.to_camel_case())
}

/// Strips list and non-null wrappers from a type reference: `[User!]!` gives `User`.
pub fn named_type(ty: &str) -> &str {
    ty.trim_matches(|c| matches!(c, '[' | ']' | '!'))
}
