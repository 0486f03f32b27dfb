//! Executes the queries a router sends to a subgraph: `_service { sdl }`, `_entities(...)` and
//! `__typename` at the root, with arbitrary selections on the returned entities.

use std::collections::HashMap;

use async_graphql_parser::{
    parse_query,
    types::{
        DocumentOperations, ExecutableDocument, Field, FragmentDefinition, OperationDefinition, OperationType,
        Selection, SelectionSet,
    },
    Positioned,
};
use async_graphql_value::{ConstValue, Name, Value, Variables};
use futures::{future::BoxFuture, FutureExt};
use indexmap::IndexMap;
use tracing::Instrument;

use crate::{
    context::RequestContext,
    error::{PathSegment, ServerError},
    federation::{Representation, ENTITIES_FIELD, SERVICE_FIELD, SERVICE_TYPE},
    object::EntityObject,
    registry::{utils::named_type, MetaField, MetaType, ObjectType},
    request::{Request, Response},
    resolvers::{resolve_field, ResolveInfo},
    Schema,
};

const TYPENAME_FIELD: &str = "__typename";

pub(crate) async fn execute(schema: &Schema, request: Request) -> Response {
    let Request {
        query,
        operation_name,
        mut variables,
        context,
    } = request;

    let span = tracing::info_span!("subgraph_request", operation_name = operation_name.as_deref());

    async move {
        let document = match parse_query(&query) {
            Ok(document) => document,
            Err(err) => {
                tracing::debug!(error = %err, "invalid query");
                return Response::from_errors(vec![ServerError::new(err.to_string(), err.positions().next())]);
            }
        };

        let operation = match select_operation(&document, operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(err) => return Response::from_errors(vec![err]),
        };

        if operation.node.ty != OperationType::Query {
            return Response::from_errors(vec![ServerError::new(
                format!("Unsupported operation type: {}", operation.node.ty),
                Some(operation.pos),
            )]);
        }

        for definition in &operation.node.variable_definitions {
            let name = &definition.node.name.node;
            if let (false, Some(default)) = (variables.contains_key(name), definition.node.default_value()) {
                variables.insert(name.clone(), default.clone());
            }
        }

        let executor = Executor {
            schema,
            fragments: &document.fragments,
            variables: &variables,
            ctx: &context,
        };

        executor.execute_root(&operation.node.selection_set).await
    }
    .instrument(span)
    .await
}

fn select_operation<'d>(
    document: &'d ExecutableDocument,
    name: Option<&str>,
) -> Result<&'d Positioned<OperationDefinition>, ServerError> {
    match (&document.operations, name) {
        (DocumentOperations::Single(operation), _) => Ok(operation),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .get(name)
            .ok_or_else(|| ServerError::new(format!("Unknown operation named \"{name}\"."), None)),
        (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => operations
            .values()
            .next()
            .ok_or_else(|| ServerError::new("Missing operation.", None)),
        (DocumentOperations::Multiple(_), None) => Err(ServerError::new("Operation name required in request.", None)),
    }
}

struct Executor<'a> {
    schema: &'a Schema,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    variables: &'a Variables,
    ctx: &'a RequestContext,
}

impl<'a> Executor<'a> {
    async fn execute_root(&self, selection_set: &'a Positioned<SelectionSet>) -> Response {
        let registry = self.schema.registry();
        let query_type = registry.query_type.as_str();

        let mut fields = Vec::new();
        if let Err(err) = self.collect_fields(&selection_set.node, query_type, &mut fields, &mut Vec::new()) {
            return Response::from_errors(vec![err]);
        }

        // Everything but the federation root fields is rejected before anything gets resolved.
        let has_entities = self.schema.metadata().has_entities();
        for field in &fields {
            match field.node.name.node.as_str() {
                TYPENAME_FIELD | SERVICE_FIELD => {}
                ENTITIES_FIELD if has_entities => {}
                name => {
                    return Response::from_errors(vec![ServerError::new(
                        format!("Cannot query field \"{name}\" on type \"{query_type}\"."),
                        Some(field.pos),
                    )]);
                }
            }
        }

        let mut errors = Vec::new();
        let mut data = IndexMap::new();

        for field in fields {
            let response_key = field.node.response_key().node.clone();
            let path = vec![PathSegment::Field(response_key.to_string())];

            let value = match field.node.name.node.as_str() {
                TYPENAME_FIELD => ConstValue::String(query_type.to_string()),
                SERVICE_FIELD => {
                    let service = EntityObject::new(SERVICE_TYPE).with("sdl", self.schema.federation_sdl());
                    self.complete_object(&service, &field.node.selection_set, path, &mut errors)
                        .await
                }
                _ => self.resolve_entities(field, path, &mut errors).await,
            };

            data.insert(response_key, value);
        }

        Response {
            data: ConstValue::Object(data),
            errors,
        }
    }

    async fn resolve_entities(
        &self,
        field: &'a Positioned<Field>,
        path: Vec<PathSegment>,
        errors: &mut Vec<ServerError>,
    ) -> ConstValue {
        let representations = match self.representations(field) {
            Ok(Some(representations)) => representations,
            Ok(None) => return ConstValue::Null,
            Err(message) => {
                errors.push(ServerError::new(message, Some(field.pos)).with_path(path));
                return ConstValue::Null;
            }
        };

        let results = match self
            .schema
            .resolve_entities(representations, self.variables, self.ctx)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                errors.push(ServerError::new(err.to_string(), Some(field.pos)).with_path(path));
                return ConstValue::Null;
            }
        };

        let mut items = Vec::with_capacity(results.len());
        for (index, result) in results.into_iter().enumerate() {
            let mut path = path.clone();
            path.push(PathSegment::Index(index));

            let item = match result {
                Ok(Some(entity)) => {
                    self.complete_object(&entity, &field.node.selection_set, path, errors)
                        .await
                }
                Ok(None) => ConstValue::Null,
                Err(err) => {
                    errors.push(ServerError::new(err.to_string(), Some(field.pos)).with_path(path));
                    ConstValue::Null
                }
            };
            items.push(item);
        }

        ConstValue::List(items)
    }

    /// The `representations` argument. `None` when it is null.
    fn representations(&self, field: &Positioned<Field>) -> Result<Option<Vec<Representation>>, String> {
        let Some(argument) = field.node.get_argument("representations") else {
            return Err(format!(
                "Field \"{ENTITIES_FIELD}\" argument \"representations\" of type \"[_Any]\" is required but not provided."
            ));
        };

        let representations = match &argument.node {
            Value::Null => return Ok(None),
            Value::Variable(name) => match self.variables.get(name) {
                None | Some(ConstValue::Null) => return Ok(None),
                Some(ConstValue::List(items)) => items.iter().cloned().map(Representation::from).collect(),
                Some(value) => vec![Representation::from(value.clone())],
            },
            Value::List(items) => items.iter().cloned().map(Representation::Literal).collect(),
            value => vec![Representation::Literal(value.clone())],
        };

        Ok(Some(representations))
    }

    /// Projects `entity` onto a selection set.
    fn complete_object<'b>(
        &'b self,
        entity: &'b EntityObject,
        selection_set: &'a Positioned<SelectionSet>,
        path: Vec<PathSegment>,
        errors: &'b mut Vec<ServerError>,
    ) -> BoxFuture<'b, ConstValue> {
        async move {
            let typename = entity.typename();
            let Some(ty) = self.schema.registry().lookup_object(typename) else {
                errors.push(
                    ServerError::new(format!("Type \"{typename}\" is not an object type."), Some(selection_set.pos))
                        .with_path(path),
                );
                return ConstValue::Null;
            };

            let mut fields = Vec::new();
            if let Err(err) = self.collect_fields(&selection_set.node, typename, &mut fields, &mut Vec::new()) {
                errors.push(err.with_path(path));
                return ConstValue::Null;
            }

            let mut object = IndexMap::new();
            for field in fields {
                let response_key = field.node.response_key().node.clone();
                let mut field_path = path.clone();
                field_path.push(PathSegment::Field(response_key.to_string()));

                let value = if field.node.name.node == TYPENAME_FIELD {
                    ConstValue::String(typename.to_string())
                } else if let Some(meta) = ty.field_by_name(&field.node.name.node) {
                    self.execute_field(ty, meta, entity, field, field_path, errors).await
                } else {
                    errors.push(
                        ServerError::new(
                            format!("Cannot query field \"{}\" on type \"{typename}\".", field.node.name.node),
                            Some(field.pos),
                        )
                        .with_path(field_path),
                    );
                    ConstValue::Null
                };

                object.insert(response_key, value);
            }

            ConstValue::Object(object)
        }
        .boxed()
    }

    async fn execute_field(
        &self,
        ty: &ObjectType,
        meta: &MetaField,
        parent: &EntityObject,
        field: &'a Positioned<Field>,
        path: Vec<PathSegment>,
        errors: &mut Vec<ServerError>,
    ) -> ConstValue {
        let info = ResolveInfo {
            schema: self.schema,
            parent_type: &ty.name,
            field: meta,
            path: path.clone(),
            arguments: self.arguments(meta, &field.node),
            variables: self.variables,
            context: self.ctx,
        };

        match resolve_field(parent, &info).await {
            Ok(value) => {
                self.complete_value(&meta.ty, value, &field.node.selection_set, path, errors)
                    .await
            }
            Err(err) => {
                errors.push(ServerError::new(err.to_string(), Some(field.pos)).with_path(path));
                ConstValue::Null
            }
        }
    }

    /// Projects nested objects and lists of objects onto the field's selection set. Leaves are
    /// returned as they are.
    fn complete_value<'b>(
        &'b self,
        ty: &'b str,
        value: ConstValue,
        selection_set: &'a Positioned<SelectionSet>,
        path: Vec<PathSegment>,
        errors: &'b mut Vec<ServerError>,
    ) -> BoxFuture<'b, ConstValue> {
        async move {
            if selection_set.node.items.is_empty() {
                return value;
            }

            match value {
                ConstValue::List(items) => {
                    let mut completed = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        let mut path = path.clone();
                        path.push(PathSegment::Index(index));
                        completed.push(self.complete_value(ty, item, selection_set, path, &mut *errors).await);
                    }
                    ConstValue::List(completed)
                }
                ConstValue::Object(fields) => {
                    let typename = match fields.get(TYPENAME_FIELD) {
                        Some(ConstValue::String(typename)) => typename.clone(),
                        _ => named_type(ty).to_string(),
                    };
                    let entity = EntityObject::from_attributes(
                        typename,
                        fields
                            .into_iter()
                            .map(|(name, value)| (name.to_string(), value))
                            .collect(),
                    );
                    self.complete_object(&entity, selection_set, path, errors).await
                }
                value => value,
            }
        }
        .boxed()
    }

    fn arguments(&self, meta: &MetaField, field: &Field) -> IndexMap<Name, ConstValue> {
        let mut arguments = field
            .arguments
            .iter()
            .map(|(name, value)| {
                let value = value
                    .node
                    .clone()
                    .into_const_with(|variable| {
                        Ok::<_, std::convert::Infallible>(self.variables.get(&variable).cloned().unwrap_or(ConstValue::Null))
                    })
                    .unwrap_or(ConstValue::Null);
                (name.node.clone(), value)
            })
            .collect::<IndexMap<_, _>>();

        for arg in meta.args.values() {
            if let (false, Some(default)) = (arguments.contains_key(arg.name.as_str()), &arg.default_value) {
                arguments.insert(Name::new(&arg.name), default.clone());
            }
        }

        arguments
    }

    /// Flattens fragments into the list of fields selected on `typename`.
    fn collect_fields(
        &self,
        selection_set: &'a SelectionSet,
        typename: &str,
        fields: &mut Vec<&'a Positioned<Field>>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), ServerError> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => fields.push(field),
                Selection::InlineFragment(fragment) => {
                    let applies = fragment
                        .node
                        .type_condition
                        .as_ref()
                        .map_or(true, |condition| self.type_condition_applies(&condition.node.on.node, typename));
                    if applies {
                        self.collect_fields(&fragment.node.selection_set.node, typename, fields, visiting)?;
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let Some(fragment) = self.fragments.get(name) else {
                        return Err(ServerError::new(format!("Unknown fragment \"{name}\"."), Some(spread.pos)));
                    };
                    if visiting.contains(&name) {
                        return Err(ServerError::new(
                            format!("Cannot spread fragment \"{name}\" within itself."),
                            Some(spread.pos),
                        ));
                    }

                    if self.type_condition_applies(&fragment.node.type_condition.node.on.node, typename) {
                        visiting.push(name);
                        self.collect_fields(&fragment.node.selection_set.node, typename, fields, visiting)?;
                        visiting.pop();
                    }
                }
            }
        }

        Ok(())
    }

    /// Whether a fragment on `condition` applies to an object of type `typename`.
    fn type_condition_applies(&self, condition: &str, typename: &str) -> bool {
        if condition == typename {
            return true;
        }

        let registry = self.schema.registry();
        match registry.lookup_type(condition) {
            Some(MetaType::Union(union)) => union.possible_types.iter().any(|ty| ty == typename),
            Some(MetaType::Interface(_)) => registry
                .lookup_object(typename)
                .is_some_and(|ty| ty.implements.iter().any(|interface| interface == condition)),
            _ => false,
        }
    }
}
