use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};
use thiserror::Error;

use self::{
    dynamodb::{DynamoDBOptions, DynamoDBStorage},
    memory::MemoryStorage,
};

pub mod attribute;
pub mod dynamodb;
pub mod memory;

/// A single stored item, attribute name to value
pub type Document = Map<String, Value>;

#[derive(Error, Debug)]
pub enum StorageError {
    /// The update's condition expression did not hold for the current item
    #[error("The conditional request failed")]
    ConditionalCheckFailed,

    #[error("Table does not exist: {0}")]
    TableNotFound(String),

    #[error("Item is missing its key attribute: {0}")]
    MissingKey(String),

    #[error("Item could not be decoded: {0}")]
    MalformedItem(String),

    #[error("Unable to initialize table: {0}")]
    UnableToInitializeTable(anyhow::Error),

    #[error("Storage backend error: {0}")]
    Backend(anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'a>>;

/// `attribute = value`
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub attribute: String,
    pub value: Value,
}

impl Filter {
    pub fn equals(attribute: &str, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Document) -> bool {
        item.get(&self.attribute) == Some(&self.value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    AttributeExists(String),
}

impl Condition {
    pub fn holds(&self, item: Option<&Document>) -> bool {
        match self {
            Condition::AttributeExists(attribute) => {
                item.is_some_and(|item| item.contains_key(attribute))
            }
        }
    }
}

/// Key of a single item, the partition key attribute and its value
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    pub attribute: String,
    pub value: Value,
}

impl Key {
    pub fn new(attribute: &str, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableDefinition {
    pub table: String,
    /// Partition key, always a string attribute
    pub key: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PutRequest {
    pub table: String,
    pub item: Document,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScanRequest {
    pub table: String,
    pub filter: Option<Filter>,
    pub projection: Option<Vec<String>>,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl ScanRequest {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filter: None,
            projection: None,
        }
    }

    pub fn set_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn set_projection(mut self, attributes: &[&str]) -> Self {
        self.projection = Some(attributes.iter().map(|a| a.to_string()).collect());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub key: Key,
    pub filter: Option<Filter>,
    pub projection: Option<Vec<String>>,
}

impl QueryRequest {
    pub fn new(table: &str, key: Key) -> Self {
        Self {
            table: table.to_string(),
            key,
            filter: None,
            projection: None,
        }
    }

    pub fn set_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn set_projection(mut self, attributes: &[&str]) -> Self {
        self.projection = Some(attributes.iter().map(|a| a.to_string()).collect());
        self
    }
}

/// Sets each attribute in `set` on the item at `key` and returns the whole item afterwards.
/// Without a condition a missing item is created.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub key: Key,
    pub set: Vec<(String, Value)>,
    pub condition: Option<Condition>,
}

impl UpdateRequest {
    pub fn new(table: &str, key: Key) -> Self {
        Self {
            table: table.to_string(),
            key,
            set: vec![],
            condition: None,
        }
    }

    pub fn set(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.set.push((attribute.to_string(), value.into()));
        self
    }

    pub fn set_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Keeps only the projected attributes of an item
pub fn project(item: &Document, projection: Option<&Vec<String>>) -> Document {
    match projection {
        None => item.clone(),
        Some(attributes) => attributes
            .iter()
            .filter_map(|attribute| {
                item.get(attribute)
                    .map(|value| (attribute.clone(), value.clone()))
            })
            .collect(),
    }
}

/// The document store collaborator. Every verb is a single asynchronous round trip.
pub trait DocumentStore: Send + Sync {
    /// Creates the table if it does not exist yet
    fn init_table(&self, definition: TableDefinition) -> StorageFuture<'_, ()>;

    /// Unconditional write, replaces any item with the same key
    fn put(&self, request: PutRequest) -> StorageFuture<'_, ()>;

    fn scan(&self, request: ScanRequest) -> StorageFuture<'_, Vec<Document>>;

    fn query(&self, request: QueryRequest) -> StorageFuture<'_, Vec<Document>>;

    fn update(&self, request: UpdateRequest) -> StorageFuture<'_, Document>;
}

#[derive(Debug, Clone)]
pub enum StorageEngine {
    Memory,
    DynamoDB(DynamoDBOptions),
}

impl StorageEngine {
    pub async fn connect(self) -> Arc<dyn DocumentStore> {
        match self {
            StorageEngine::Memory => Arc::new(MemoryStorage::new()),
            StorageEngine::DynamoDB(options) => Arc::new(DynamoDBStorage::new(options).await),
        }
    }
}
