use graphql_subgraph::{
    registry::{Registry, ScalarType},
    ConfigurationError, Schema,
};

use crate::{accounts, reviews};

#[test]
fn keys_must_name_a_single_existing_field() {
    let err = Schema::build(accounts()).key("Nope", "id").unwrap_err();
    assert_eq!(err, ConfigurationError::UnknownType("Nope".to_string()));

    let err = Schema::build(accounts()).key("User", "name").unwrap_err();
    assert_eq!(err.to_string(), "Field \"name\" does not exist on type \"User\"");

    let err = Schema::build(accounts()).key("User", "email identifier").unwrap_err();
    assert_eq!(err.to_string(), "Compound primary keys are not supported.");
}

#[test]
fn keys_are_looked_up_by_attribute_name() {
    let err = Schema::build(accounts()).key("User", "displayName").unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::UnknownKeyField {
            ty: "User".to_string(),
            field: "displayName".to_string(),
        }
    );

    assert!(Schema::build(accounts()).key("User", "display_name").is_ok());
}

#[test]
fn decorations_apply_once_per_field() {
    let err = Schema::build(reviews())
        .external("User", "id")
        .unwrap()
        .external("User", "id")
        .unwrap_err();
    assert_eq!(err.to_string(), "Can't chain `external()` method calls on one field.");

    let err = Schema::build(reviews())
        .requires("Product", "shipping_estimate", "weight")
        .unwrap()
        .requires("Product", "shipping_estimate", "in_stock")
        .unwrap_err();
    assert_eq!(err, ConfigurationError::DecorationAlreadyApplied { directive: "requires" });

    // Different directives on one field are fine.
    let schema = Schema::build(reviews())
        .external("Review", "author")
        .unwrap()
        .provides("Review", "author", "username")
        .unwrap()
        .finish()
        .unwrap();
    assert!(schema
        .federation_sdl()
        .contains("  author: User @external @provides(fields: \"username\")\n"));
}

#[test]
fn decorations_need_an_existing_field() {
    let err = Schema::build(reviews()).external("Review", "rating").unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::UnknownField {
            ty: "Review".to_string(),
            field: "rating".to_string(),
        }
    );
}

#[test]
fn only_objects_can_be_entities() {
    let registry = accounts().with_type(ScalarType {
        name: "Date".to_string(),
        description: None,
    });

    let err = Schema::build(registry).extend("Date").unwrap_err();
    assert_eq!(err.to_string(), "Type \"Date\" is not an object type");
}

#[test]
fn query_type_must_be_an_object() {
    let registry = Registry::new("Query").with_type(ScalarType {
        name: "Query".to_string(),
        description: None,
    });

    let err = Schema::build(registry).finish().unwrap_err();
    assert_eq!(err, ConfigurationError::InvalidQueryType("Query".to_string()));
}
