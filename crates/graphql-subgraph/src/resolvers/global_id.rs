use std::fmt;

use async_graphql_value::ConstValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{FieldResolver, ResolveInfo};
use crate::{error::EntityError, object::EntityObject};

/// A relay style opaque identifier: `base64("<Type>:<id>")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalId {
    pub ty: String,
    pub id: String,
}

impl GlobalId {
    pub fn new(ty: impl Into<String>, id: impl Into<String>) -> Self {
        GlobalId {
            ty: ty.into(),
            id: id.into(),
        }
    }

    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.ty, self.id))
    }

    pub fn decode(encoded: &str) -> Result<Self, EntityError> {
        let malformed = || EntityError::MalformedGlobalId(encoded.to_string());

        let bytes = STANDARD.decode(encoded).map_err(|_| malformed())?;
        let decoded = String::from_utf8(bytes).map_err(|_| malformed())?;
        let (ty, id) = decoded.split_once(':').ok_or_else(malformed)?;

        Ok(GlobalId::new(ty, id))
    }

    /// The id as a value: JSON decoded when it is valid JSON, the raw string otherwise.
    pub fn payload(&self) -> ConstValue {
        serde_json::from_str::<ConstValue>(&self.id).unwrap_or_else(|_| ConstValue::String(self.id.clone()))
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// How the raw id is turned into the text embedded in a global id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Strings are embedded as is, everything else in its GraphQL notation: `User:1`, `User:abc`.
    #[default]
    Raw,
    /// Every value is embedded as JSON: `User:1`, `User:"abc"`.
    Json,
}

impl PayloadEncoding {
    pub fn encode(self, value: &ConstValue) -> Result<String, EntityError> {
        match (self, value) {
            (PayloadEncoding::Raw, ConstValue::String(id)) => Ok(id.clone()),
            (PayloadEncoding::Raw, value) => Ok(value.to_string()),
            (PayloadEncoding::Json, value) => {
                serde_json::to_string(value).map_err(|err| EntityError::resolver(err.to_string()))
            }
        }
    }
}

/// Exposes the raw id stored in the attribute as a global id of the parent type.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalIdResolver {
    encoding: PayloadEncoding,
}

impl GlobalIdResolver {
    pub fn new(encoding: PayloadEncoding) -> Self {
        GlobalIdResolver { encoding }
    }
}

#[async_trait::async_trait]
impl FieldResolver for GlobalIdResolver {
    async fn resolve(&self, parent: &EntityObject, info: &ResolveInfo<'_>) -> Result<ConstValue, EntityError> {
        match parent.get(&info.field.attribute) {
            None | Some(ConstValue::Null) => Ok(ConstValue::Null),
            Some(id) => {
                let id = self.encoding.encode(id)?;
                Ok(ConstValue::String(GlobalId::new(info.parent_type, id).encode()))
            }
        }
    }
}
