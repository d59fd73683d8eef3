use std::{
    collections::{BTreeMap, HashMap},
    future::ready,
    sync::{PoisonError, RwLock},
};

use serde_json::Value;

use super::{
    project, Document, DocumentStore, Key, PutRequest, QueryRequest, ScanRequest, StorageError,
    StorageFuture, StorageResult, TableDefinition, UpdateRequest,
};

struct MemoryTable {
    key: String,
    /// Ordered by key so scans are deterministic
    rows: BTreeMap<String, Document>,
}

/// In process document store with the same put / scan / query / update semantics as the
/// DynamoDB backend. Each verb holds the table lock for its whole duration.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_table(&self, definition: TableDefinition) -> StorageResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        tables
            .entry(definition.table)
            .or_insert_with(|| MemoryTable {
                key: definition.key,
                rows: BTreeMap::new(),
            });

        Ok(())
    }

    fn put_item(&self, request: PutRequest) -> StorageResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        let table = tables
            .get_mut(&request.table)
            .ok_or_else(|| StorageError::TableNotFound(request.table.clone()))?;

        let key = match request.item.get(&table.key) {
            Some(value) => key_string(value)?,
            None => return Err(StorageError::MissingKey(table.key.clone())),
        };

        table.rows.insert(key, request.item);

        Ok(())
    }

    fn scan_items(&self, request: ScanRequest) -> StorageResult<Vec<Document>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);

        let table = tables
            .get(&request.table)
            .ok_or_else(|| StorageError::TableNotFound(request.table.clone()))?;

        Ok(table
            .rows
            .values()
            .filter(|item| request.filter.as_ref().map_or(true, |f| f.matches(item)))
            .map(|item| project(item, request.projection.as_ref()))
            .collect())
    }

    fn query_items(&self, request: QueryRequest) -> StorageResult<Vec<Document>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);

        let table = tables
            .get(&request.table)
            .ok_or_else(|| StorageError::TableNotFound(request.table.clone()))?;

        let key = table_key(table, &request.key)?;

        Ok(table
            .rows
            .get(&key)
            .into_iter()
            .filter(|item| request.filter.as_ref().map_or(true, |f| f.matches(item)))
            .map(|item| project(item, request.projection.as_ref()))
            .collect())
    }

    fn update_item(&self, request: UpdateRequest) -> StorageResult<Document> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        let table = tables
            .get_mut(&request.table)
            .ok_or_else(|| StorageError::TableNotFound(request.table.clone()))?;

        let key = table_key(table, &request.key)?;

        if let Some(condition) = &request.condition {
            if !condition.holds(table.rows.get(&key)) {
                return Err(StorageError::ConditionalCheckFailed);
            }
        }

        let item = table.rows.entry(key).or_insert_with(|| {
            let mut item = Document::new();
            item.insert(request.key.attribute.clone(), request.key.value.clone());
            item
        });

        for (attribute, value) in request.set {
            item.insert(attribute, value);
        }

        Ok(item.clone())
    }
}

fn key_string(value: &Value) -> StorageResult<String> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| StorageError::MalformedItem(format!("key must be a string, got {value}")))
}

fn table_key(table: &MemoryTable, key: &Key) -> StorageResult<String> {
    if key.attribute != table.key {
        return Err(StorageError::MissingKey(table.key.clone()));
    }

    key_string(&key.value)
}

impl DocumentStore for MemoryStorage {
    fn init_table(&self, definition: TableDefinition) -> StorageFuture<'_, ()> {
        Box::pin(ready(self.create_table(definition)))
    }

    fn put(&self, request: PutRequest) -> StorageFuture<'_, ()> {
        Box::pin(ready(self.put_item(request)))
    }

    fn scan(&self, request: ScanRequest) -> StorageFuture<'_, Vec<Document>> {
        Box::pin(ready(self.scan_items(request)))
    }

    fn query(&self, request: QueryRequest) -> StorageFuture<'_, Vec<Document>> {
        Box::pin(ready(self.query_items(request)))
    }

    fn update(&self, request: UpdateRequest) -> StorageFuture<'_, Document> {
        Box::pin(ready(self.update_item(request)))
    }
}
