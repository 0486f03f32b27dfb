use graphql_subgraph::{FederationConfig, Schema};

use crate::{accounts, reviews};

#[test]
fn keys_keep_registration_order() {
    let schema = Schema::build(accounts())
        .key("User", "email")
        .unwrap()
        .key("User", "identifier")
        .unwrap()
        .key("NotUser", "identifier")
        .unwrap()
        .finish()
        .unwrap();

    insta::assert_snapshot!(schema.federation_sdl(), @r###"
    type Query {
      me: User
    }

    type User @key(fields: "email") @key(fields: "identifier") {
      id: ID!
      email: String!
      identifier: String!
      displayName: String
    }

    type NotUser @key(fields: "identifier") {
      id: ID!
      identifier: String!
    }
    "###);
}

#[test]
fn extended_types() {
    let schema = Schema::build(reviews())
        .extend_with_key("User", "id")
        .unwrap()
        .external("User", "id")
        .unwrap()
        .external("User", "username")
        .unwrap()
        .provides("Review", "author", "username")
        .unwrap()
        .extend_with_key("Product", "upc")
        .unwrap()
        .external("Product", "upc")
        .unwrap()
        .external("Product", "weight")
        .unwrap()
        .requires("Product", "shipping_estimate", "weight")
        .unwrap()
        .finish()
        .unwrap();

    insta::assert_snapshot!(schema.federation_sdl(), @r###"
    type Query {
      topReviews: [Review]
    }

    type Review {
      body: String!
      author: User @provides(fields: "username")
      product: Product
    }

    extend type User @key(fields: "id") {
      id: ID! @external
      username: String @external
      reviews: [Review]
    }

    extend type Product @key(fields: "upc") {
      upc: String! @external
      inStock: Boolean
      weight: Int @external
      shippingEstimate: Int @requires(fields: "weight")
    }
    "###);
}

#[test]
fn field_sets_follow_the_camel_case_mode() {
    let build = |config: FederationConfig| {
        Schema::build(reviews())
            .with_config(config)
            .extend_with_key("Product", "upc")
            .unwrap()
            .external("Product", "in_stock")
            .unwrap()
            .requires("Product", "shipping_estimate", ["in_stock", "weight", "price_in_cents"])
            .unwrap()
            .finish()
            .unwrap()
    };

    let schema = build(FederationConfig::default());
    assert!(schema
        .federation_sdl()
        .contains("  shippingEstimate: Int @requires(fields: \"inStock weight priceInCents\")\n"));
    assert!(schema.federation_sdl().contains("  inStock: Boolean @external\n"));

    let schema = build(FederationConfig {
        auto_camel_case: false,
        ..Default::default()
    });
    assert!(schema
        .federation_sdl()
        .contains("  shipping_estimate: Int @requires(fields: \"in_stock weight price_in_cents\")\n"));
    assert!(schema.federation_sdl().contains("  top_reviews: [Review]\n"));
}

#[test]
fn decorations_of_owned_types_are_left_out() {
    let schema = Schema::build(reviews())
        .key("Product", "upc")
        .unwrap()
        .external("Product", "weight")
        .unwrap()
        .requires("Product", "shipping_estimate", "weight")
        .unwrap()
        .finish()
        .unwrap();

    let sdl = schema.federation_sdl();
    assert!(sdl.contains("type Product @key(fields: \"upc\") {\n"));
    assert!(!sdl.contains("extend type Product"));
    assert!(!sdl.contains("@external"));
    assert!(!sdl.contains("@requires"));
}

#[test]
fn provides_parents_render_their_decorations() {
    let schema = Schema::build(reviews())
        .external("Review", "body")
        .unwrap()
        .provides("Review", "author", ["username", "id"])
        .unwrap()
        .finish()
        .unwrap();

    let sdl = schema.federation_sdl();
    assert!(sdl.contains("  body: String! @external\n"));
    assert!(sdl.contains("  author: User @provides(fields: \"username id\")\n"));
}

#[test]
fn federation_types_are_not_part_of_the_service_sdl() {
    let schema = Schema::build(accounts())
        .key("User", "identifier")
        .unwrap()
        .finish()
        .unwrap();

    let sdl = schema.federation_sdl();
    for name in ["_Any", "_Entity", "_Service", "_entities", "_service", "schema {"] {
        assert!(!sdl.contains(name), "{name} found in:\n{sdl}");
    }

    let full = schema.sdl();
    assert!(full.contains("union _Entity = User\n"));
    assert!(full.contains("\"\"\"Anything\"\"\"\nscalar _Any"));
    assert!(full.contains("  _entities(representations: [_Any]): [_Entity]\n"));
    assert!(full.contains("  _service: _Service\n"));
}

#[test]
fn query_type_with_only_federation_fields_is_omitted() {
    let mut registry = accounts();
    registry.query_type = "Root".to_string();
    registry.types.shift_remove("Query");

    let schema = Schema::build(registry).key("User", "identifier").unwrap().finish().unwrap();

    let sdl = schema.federation_sdl();
    assert!(!sdl.contains("Root"));
    assert!(sdl.starts_with("type User @key(fields: \"identifier\") {\n"));
    assert!(schema.sdl().contains("type Root {\n  _entities"));
}
