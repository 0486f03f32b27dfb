use std::sync::{Arc, Mutex};

use graphql_subgraph::{
    federation::{EntityResolver, Representation},
    registry::{MetaField, ObjectType, Registry},
    resolvers::{BulkQuery, BulkResolver, Connection, GlobalId, ReferenceResolver},
    ConstValue, EntityError, EntityObject, Request, RequestContext, Schema, Variables,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::accounts;

const ENTITIES: &str = "query($representations: [_Any!]!) { _entities(representations: $representations) { __typename ... on User { identifier displayName } ... on NotUser { identifier } } }";

fn request(query: &str, representations: serde_json::Value) -> Request {
    Request::new(query).variables(Variables::from_json(json!({ "representations": representations })))
}

fn schema_by_identifier() -> Schema {
    Schema::build(accounts())
        .key("User", "identifier")
        .unwrap()
        .key("NotUser", "identifier")
        .unwrap()
        .finish()
        .unwrap()
}

#[tokio::test]
async fn results_follow_representation_order() {
    let schema = schema_by_identifier();

    let response = schema
        .execute(request(
            ENTITIES,
            json!([
                { "__typename": "User", "identifier": "u1", "displayName": "Jane" },
                { "__typename": "NotUser", "identifier": "n1" },
                { "__typename": "User", "identifier": "u2" },
            ]),
        ))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "_entities": [
          {
            "__typename": "User",
            "identifier": "u1",
            "displayName": "Jane"
          },
          {
            "__typename": "NotUser",
            "identifier": "n1"
          },
          {
            "__typename": "User",
            "identifier": "u2",
            "displayName": null
          }
        ]
      }
    }
    "###);
}

#[tokio::test]
async fn global_ids_are_checked_against_the_representation_type() {
    let schema = Schema::build(accounts())
        .key("User", "id")
        .unwrap()
        .key("NotUser", "id")
        .unwrap()
        .finish()
        .unwrap();

    let query = "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on User { id email } } }";
    let response = schema
        .execute(request(
            query,
            json!([
                { "__typename": "User", "id": "VXNlcjox", "email": "jane@example.com" },
                { "__typename": "User", "id": "Tm90VXNlcjox" },
            ]),
        ))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "_entities": [
          {
            "id": "VXNlcjox",
            "email": "jane@example.com"
          },
          null
        ]
      },
      "errors": [
        {
          "message": "Invalid global id type: User != NotUser",
          "locations": [
            {
              "line": 1,
              "column": 37
            }
          ],
          "path": [
            "_entities",
            1
          ]
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn global_ids_match_on_their_decoded_payload() {
    let schema = Schema::build(accounts()).key("User", "id").unwrap().finish().unwrap();

    // Payloads whose raw re-encoding differs from the text they were sent with.
    let payloads = ["1e2", "\"abc\"", " 7", "null", "1"];
    let representations = payloads
        .iter()
        .map(|payload| {
            Representation::from_json(json!({ "__typename": "User", "id": GlobalId::new("User", *payload).encode() }))
        })
        .collect();

    let results = schema
        .resolve_entities(representations, &Variables::default(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(results.len(), payloads.len());
    for (payload, result) in payloads.iter().zip(&results) {
        let expected = EntityObject::new("User").with("id", GlobalId::new("User", *payload).payload());
        assert_eq!(result, &Ok(Some(expected)), "payload {payload:?}");
    }
}

#[tokio::test]
async fn snake_case_keys_round_trip_through_their_wire_name() {
    let registry = Registry::new("Query")
        .with_type(ObjectType::new("Query").field(MetaField::new("me", "User")))
        .with_type(
            ObjectType::new("User")
                .field(MetaField::new("user_id", "ID!"))
                .field(MetaField::new("display_name", "String")),
        );
    let schema = Schema::build(registry).key("User", "user_id").unwrap().finish().unwrap();

    assert!(schema.federation_sdl().contains("type User @key(fields: \"userId\") {\n"));

    let results = schema
        .resolve_entities(
            vec![Representation::from_json(json!({ "__typename": "User", "userId": "A" }))],
            &Variables::default(),
            &RequestContext::new(),
        )
        .await
        .unwrap();
    assert_eq!(results, vec![Ok(Some(EntityObject::new("User").with("user_id", "A")))]);

    let user = results.into_iter().next().and_then(Result::ok).flatten().unwrap();
    assert_eq!(user.attributes().keys().collect::<Vec<_>>(), ["user_id"]);

    let query = "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on User { userId } } }";
    let response = schema
        .execute(request(query, json!([{ "__typename": "User", "userId": "A" }])))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "_entities": [
          {
            "userId": "A"
          }
        ]
      }
    }
    "###);
}

#[tokio::test]
async fn global_ids_are_decoded_before_reaching_the_hook() {
    struct Recorder(Arc<Mutex<Vec<EntityObject>>>);

    #[async_trait::async_trait]
    impl ReferenceResolver for Recorder {
        async fn resolve_reference(
            &self,
            reference: EntityObject,
            _ctx: &RequestContext,
        ) -> Result<Option<EntityObject>, EntityError> {
            self.0.lock().unwrap().push(reference.clone());
            Ok(Some(reference))
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let schema = Schema::build(accounts())
        .key("User", "id")
        .unwrap()
        .entity_resolver("User", EntityResolver::singular(Recorder(seen.clone())))
        .unwrap()
        .finish()
        .unwrap();

    let results = schema
        .resolve_entities(
            vec![Representation::from_json(
                json!({ "__typename": "User", "id": "VXNlcjox", "displayName": "Jane" }),
            )],
            &Variables::default(),
            &RequestContext::new(),
        )
        .await
        .unwrap();

    let expected = EntityObject::new("User").with("id", 1).with("display_name", "Jane");
    assert_eq!(results, vec![Ok(Some(expected.clone()))]);
    assert_eq!(*seen.lock().unwrap(), vec![expected]);
}

struct Tenant(&'static str);

struct Directory;

#[async_trait::async_trait]
impl ReferenceResolver for Directory {
    async fn resolve_reference(
        &self,
        reference: EntityObject,
        ctx: &RequestContext,
    ) -> Result<Option<EntityObject>, EntityError> {
        let tenant = ctx.data::<Tenant>().map_or("unknown", |tenant| tenant.0);
        let identifier = match reference.get("identifier") {
            Some(ConstValue::String(identifier)) => identifier.clone(),
            _ => return Ok(None),
        };

        match identifier.as_str() {
            "gone" => Ok(None),
            "broken" => Err(EntityError::resolver("directory unavailable")),
            "moved" => Ok(Some(reference.with("identifier", "elsewhere"))),
            _ => Ok(Some(reference.with("display_name", format!("{identifier} ({tenant})")))),
        }
    }
}

#[tokio::test]
async fn reference_hook() {
    let schema = Schema::build(accounts())
        .key("User", "identifier")
        .unwrap()
        .entity_resolver("User", EntityResolver::singular(Directory))
        .unwrap()
        .finish()
        .unwrap();

    let representations = ["u1", "gone", "broken", "moved"]
        .into_iter()
        .map(|identifier| Representation::from_json(json!({ "__typename": "User", "identifier": identifier })))
        .collect();

    let ctx = RequestContext::new().with_data(Tenant("acme"));
    let results = schema
        .resolve_entities(representations, &Variables::default(), &ctx)
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![
            Ok(Some(
                EntityObject::new("User")
                    .with("identifier", "u1")
                    .with("display_name", "u1 (acme)")
            )),
            Ok(None),
            Err(EntityError::resolver("directory unavailable")),
            Ok(None),
        ]
    );
}

type QueryLog = Arc<Mutex<Vec<(BulkQuery, Option<String>)>>>;

struct Users(QueryLog);

#[async_trait::async_trait]
impl BulkResolver for Users {
    async fn resolve_references(&self, query: BulkQuery, ctx: &RequestContext) -> Result<Connection, EntityError> {
        self.0
            .lock()
            .unwrap()
            .push((query.clone(), ctx.representation().map(str::to_string)));

        Ok(query
            .values
            .iter()
            .filter_map(|value| match value {
                ConstValue::String(identifier) if identifier != "u3" => Some(
                    EntityObject::new("User")
                        .with("identifier", identifier.as_str())
                        .with("email", format!("{identifier}@example.com")),
                ),
                _ => None,
            })
            .rev()
            .collect())
    }
}

#[tokio::test]
async fn bulk_resolution_issues_one_query_per_type() {
    let log = QueryLog::default();
    let schema = Schema::build(accounts())
        .key("User", "identifier")
        .unwrap()
        .key("NotUser", "identifier")
        .unwrap()
        .entity_resolver("User", EntityResolver::bulk(Users(log.clone())))
        .unwrap()
        .finish()
        .unwrap();

    let query = "query($representations: [_Any!]!) { _entities(representations: $representations) { ... on User { identifier email } ... on NotUser { identifier } } }";
    let response = schema
        .execute(request(
            query,
            json!([
                { "__typename": "User", "identifier": "u2" },
                { "__typename": "NotUser", "identifier": "n1" },
                { "__typename": "User", "identifier": "u1" },
                { "__typename": "User", "identifier": "u3" },
            ]),
        ))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "_entities": [
          {
            "identifier": "u2",
            "email": "u2@example.com"
          },
          {
            "identifier": "n1"
          },
          {
            "identifier": "u1",
            "email": "u1@example.com"
          },
          null
        ]
      }
    }
    "###);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);

    let (query, representation) = &log[0];
    assert_eq!(query.typename, "User");
    assert_eq!(query.argument_name(), "identifier_In");
    assert_eq!(
        query.values,
        vec![
            ConstValue::String("u2".into()),
            ConstValue::String("u1".into()),
            ConstValue::String("u3".into()),
        ]
    );
    assert_eq!(representation.as_deref(), Some("User"));
}

#[tokio::test]
async fn failing_bulk_query_fails_its_group_only() {
    struct Down;

    #[async_trait::async_trait]
    impl BulkResolver for Down {
        async fn resolve_references(&self, _: BulkQuery, _: &RequestContext) -> Result<Connection, EntityError> {
            Err(EntityError::resolver("database is down"))
        }
    }

    let schema = Schema::build(accounts())
        .key("User", "identifier")
        .unwrap()
        .key("NotUser", "identifier")
        .unwrap()
        .entity_resolver("User", EntityResolver::bulk(Down))
        .unwrap()
        .finish()
        .unwrap();

    let representations = vec![
        Representation::from_json(json!({ "__typename": "User", "identifier": "u1" })),
        Representation::from_json(json!({ "__typename": "NotUser", "identifier": "n1" })),
        Representation::from_json(json!({ "__typename": "User", "identifier": "u2" })),
    ];

    let results = schema
        .resolve_entities(representations, &Variables::default(), &RequestContext::new())
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![
            Err(EntityError::resolver("database is down")),
            Ok(Some(EntityObject::new("NotUser").with("identifier", "n1"))),
            Err(EntityError::resolver("database is down")),
        ]
    );
}

#[tokio::test]
async fn unresolvable_representations_are_null() {
    let schema = schema_by_identifier();

    let query = r#"query($id: String = "u1") { _entities(representations: [{__typename: "Nope", identifier: "x"}, 42, {__typename: "User", identifier: $id}, {__typename: "Query"}, {__typename: "User"}, {identifier: "u1"}]) { ... on User { identifier } } }"#;
    let response = schema.execute(query).await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "_entities": [
          null,
          null,
          {
            "identifier": "u1"
          },
          null,
          null,
          null
        ]
      }
    }
    "###);
}

#[tokio::test]
async fn cancelled_requests_resolve_nothing() {
    let schema = schema_by_identifier();

    let token = CancellationToken::new();
    token.cancel();
    let ctx = RequestContext::new().with_cancellation(token);

    let err = schema
        .resolve_entities(
            vec![Representation::from_json(json!({ "__typename": "User", "identifier": "u1" }))],
            &Variables::default(),
            &ctx,
        )
        .await
        .unwrap_err();
    assert_eq!(err, EntityError::Cancelled);

    let query = "query($representations: [_Any!]!) { _entities(representations: $representations) { __typename } }";
    let response = schema
        .execute(request(query, json!([{ "__typename": "User", "identifier": "u1" }])).context(ctx))
        .await;

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "_entities": null
      },
      "errors": [
        {
          "message": "Entity resolution was cancelled",
          "locations": [
            {
              "line": 1,
              "column": 37
            }
          ],
          "path": [
            "_entities"
          ]
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn cancellation_interrupts_pending_resolvers() {
    struct Stuck;

    #[async_trait::async_trait]
    impl BulkResolver for Stuck {
        async fn resolve_references(&self, _: BulkQuery, ctx: &RequestContext) -> Result<Connection, EntityError> {
            ctx.cancellation_token().cancel();
            futures::future::pending().await
        }
    }

    let schema = Schema::build(accounts())
        .key("User", "identifier")
        .unwrap()
        .entity_resolver("User", EntityResolver::bulk(Stuck))
        .unwrap()
        .finish()
        .unwrap();

    let err = schema
        .resolve_entities(
            vec![Representation::from_json(json!({ "__typename": "User", "identifier": "u1" }))],
            &Variables::default(),
            &RequestContext::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, EntityError::Cancelled);
}
