use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DeltaResult;
use crate::source::{ContinuationToken, Keyed, Positioned, Segment};

/// Partition and row key of an entity, ordered partition first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub partition_key: String,
    pub row_key: String,
}

impl EntityKey {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

/// Typed value of an entity property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Binary(Vec<u8>),
}

impl PropertyValue {
    /// Plain JSON rendition used when projecting onto a typed entity.
    fn to_json(&self) -> Value {
        match self {
            PropertyValue::String(value) => Value::from(value.clone()),
            PropertyValue::Boolean(value) => Value::from(*value),
            PropertyValue::Int32(value) => Value::from(*value),
            PropertyValue::Int64(value) => Value::from(*value),
            PropertyValue::Double(value) => Value::from(*value),
            PropertyValue::DateTime(value) => Value::from(value.to_rfc3339()),
            PropertyValue::Guid(value) => Value::from(value.to_string()),
            PropertyValue::Binary(value) => Value::from(value.clone()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int32(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int64(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

/// An entity as returned by the service: keys, system properties and a property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub key: EntityKey,
    pub timestamp: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl RawEntity {
    pub fn new(key: EntityKey) -> Self {
        Self {
            key,
            timestamp: None,
            etag: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Deserializes the entity into `T`.
    ///
    /// Keys and system properties are exposed as `PartitionKey`, `RowKey`, `Timestamp` and
    /// `ETag` next to the user properties.
    pub fn project<T: DeserializeOwned>(&self) -> DeltaResult<T> {
        let mut object = Map::new();
        object.insert(
            "PartitionKey".to_string(),
            Value::from(self.key.partition_key.clone()),
        );
        object.insert("RowKey".to_string(), Value::from(self.key.row_key.clone()));
        if let Some(timestamp) = &self.timestamp {
            object.insert("Timestamp".to_string(), Value::from(timestamp.to_rfc3339()));
        }
        if let Some(etag) = &self.etag {
            object.insert("ETag".to_string(), Value::from(etag.clone()));
        }
        for (name, value) in &self.properties {
            object.insert(name.clone(), value.to_json());
        }

        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

impl Keyed for RawEntity {
    type Key = EntityKey;

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

/// Parameters of one segmented table query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQueryRequest {
    pub take_count: usize,
    pub continuation: Option<ContinuationToken>,
}

pub type EntitySegment = Segment<RawEntity>;

/// A queried entity with its position and a lazily built typed view.
///
/// The raw property bag is read first; `T` is only deserialized when [`EntityContext::entity`]
/// is called, and then cached in this item.
#[derive(Debug, Clone)]
pub struct EntityContext<T> {
    raw: RawEntity,
    continuation: Option<ContinuationToken>,
    segment_index: usize,
    entity_index: usize,
    entity: OnceLock<T>,
}

impl<T> EntityContext<T> {
    pub fn new(positioned: Positioned<RawEntity>) -> Self {
        Self {
            raw: positioned.item,
            continuation: positioned.continuation,
            segment_index: positioned.segment_index,
            entity_index: positioned.item_index,
            entity: OnceLock::new(),
        }
    }

    pub fn raw(&self) -> &RawEntity {
        &self.raw
    }

    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn entity_index(&self) -> usize {
        self.entity_index
    }

    /// Typed projection of the entity, built on first use.
    pub fn entity(&self) -> DeltaResult<&T>
    where
        T: DeserializeOwned,
    {
        if let Some(entity) = self.entity.get() {
            return Ok(entity);
        }

        let entity = self.raw.project()?;
        Ok(self.entity.get_or_init(|| entity))
    }
}

impl<T> Keyed for EntityContext<T> {
    type Key = EntityKey;

    fn key(&self) -> &EntityKey {
        &self.raw.key
    }
}
