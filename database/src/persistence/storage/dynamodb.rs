use std::collections::HashMap;

use anyhow::anyhow;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    config::{Credentials, Region},
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
        ReturnValue, ScalarAttributeType,
    },
    Client, Error as DynamoDBError,
};
use serde_json::Value;

use super::{
    attribute::{from_item, to_attribute_value, to_item, Item},
    Condition, Document, DocumentStore, Filter, PutRequest, QueryRequest, ScanRequest,
    StorageError, StorageFuture, StorageResult, TableDefinition, UpdateRequest,
};

const CREDENTIALS_PROVIDER_NAME: &str = "participants-environment";

#[derive(Clone, Debug, Default)]
pub struct DynamoDBOptions {
    region: Option<String>,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    endpoint_url: Option<String>,
}

// Implements: https://rust-unofficial.github.io/patterns/patterns/creational/builder.html
impl DynamoDBOptions {
    /// Falls back to the SDK's region provider chain when unset
    pub fn set_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    /// Static credentials, only used when both halves are present. Otherwise the SDK's
    /// default credentials chain is used.
    pub fn set_credentials(
        mut self,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> Self {
        self.access_key_id = access_key_id;
        self.secret_access_key = secret_access_key;
        self
    }

    /// Used to point at DynamoDB local
    pub fn set_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }
}

pub struct DynamoDBStorage {
    client: Client,
}

impl DynamoDBStorage {
    pub async fn new(options: DynamoDBOptions) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = options.region {
            loader = loader.region(Region::new(region));
        }

        if let (Some(access_key_id), Some(secret_access_key)) =
            (options.access_key_id, options.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        if let Some(endpoint_url) = options.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk = loader.load().await;

        Self {
            client: Client::new(&sdk),
        }
    }
}

impl DocumentStore for DynamoDBStorage {
    fn init_table(&self, definition: TableDefinition) -> StorageFuture<'_, ()> {
        Box::pin(create_table(&self.client, definition))
    }

    fn put(&self, request: PutRequest) -> StorageFuture<'_, ()> {
        Box::pin(put_item(&self.client, request))
    }

    fn scan(&self, request: ScanRequest) -> StorageFuture<'_, Vec<Document>> {
        Box::pin(scan_items(&self.client, request))
    }

    fn query(&self, request: QueryRequest) -> StorageFuture<'_, Vec<Document>> {
        Box::pin(query_items(&self.client, request))
    }

    fn update(&self, request: UpdateRequest) -> StorageFuture<'_, Document> {
        Box::pin(update_item(&self.client, request))
    }
}

async fn create_table(client: &Client, definition: TableDefinition) -> StorageResult<()> {
    let attribute_definition = AttributeDefinition::builder()
        .attribute_name(&definition.key)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| StorageError::UnableToInitializeTable(anyhow!(e)))?;

    let key_schema = KeySchemaElement::builder()
        .attribute_name(&definition.key)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| StorageError::UnableToInitializeTable(anyhow!(e)))?;

    let result = client
        .create_table()
        .table_name(&definition.table)
        .attribute_definitions(attribute_definition)
        .key_schema(key_schema)
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match result {
        Ok(_) => {
            log::info!("Created table [{}]", definition.table);
            Ok(())
        }
        Err(e) => match DynamoDBError::from(e) {
            DynamoDBError::ResourceInUseException(_) => {
                log::info!("Table [{}] already exists", definition.table);
                Ok(())
            }
            e => Err(StorageError::UnableToInitializeTable(anyhow!(e))),
        },
    }
}

async fn put_item(client: &Client, request: PutRequest) -> StorageResult<()> {
    client
        .put_item()
        .table_name(&request.table)
        .set_item(Some(to_item(&request.item)))
        .send()
        .await
        .map(|_| {})
        .map_err(|e| storage_error(DynamoDBError::from(e), &request.table))
}

async fn scan_items(client: &Client, request: ScanRequest) -> StorageResult<Vec<Document>> {
    let mut expressions = Expressions::default();

    let filter_expression = request.filter.as_ref().map(|f| expressions.filter(f));
    let projection_expression = request
        .projection
        .as_ref()
        .map(|p| expressions.projection(p));

    let (names, values) = expressions.into_parts();

    let mut pages = client
        .scan()
        .table_name(&request.table)
        .set_filter_expression(filter_expression)
        .set_projection_expression(projection_expression)
        .set_expression_attribute_names(names)
        .set_expression_attribute_values(values)
        .into_paginator()
        .send();

    let mut documents = vec![];

    while let Some(page) = pages.next().await {
        let page = page.map_err(|e| storage_error(DynamoDBError::from(e), &request.table))?;

        for item in page.items() {
            documents.push(from_item(item)?);
        }
    }

    Ok(documents)
}

async fn query_items(client: &Client, request: QueryRequest) -> StorageResult<Vec<Document>> {
    let mut expressions = Expressions::default();

    let key_condition_expression = expressions.equals(&request.key.attribute, &request.key.value);
    let filter_expression = request.filter.as_ref().map(|f| expressions.filter(f));
    let projection_expression = request
        .projection
        .as_ref()
        .map(|p| expressions.projection(p));

    let (names, values) = expressions.into_parts();

    let mut pages = client
        .query()
        .table_name(&request.table)
        .key_condition_expression(key_condition_expression)
        .set_filter_expression(filter_expression)
        .set_projection_expression(projection_expression)
        .set_expression_attribute_names(names)
        .set_expression_attribute_values(values)
        .into_paginator()
        .send();

    let mut documents = vec![];

    while let Some(page) = pages.next().await {
        let page = page.map_err(|e| storage_error(DynamoDBError::from(e), &request.table))?;

        for item in page.items() {
            documents.push(from_item(item)?);
        }
    }

    Ok(documents)
}

async fn update_item(client: &Client, request: UpdateRequest) -> StorageResult<Document> {
    let mut expressions = Expressions::default();

    let update_expression = expressions.update(&request.set);
    let condition_expression = request
        .condition
        .as_ref()
        .map(|c| expressions.condition(c));

    let (names, values) = expressions.into_parts();

    let output = client
        .update_item()
        .table_name(&request.table)
        .key(
            &request.key.attribute,
            to_attribute_value(&request.key.value),
        )
        .update_expression(update_expression)
        .set_condition_expression(condition_expression)
        .set_expression_attribute_names(names)
        .set_expression_attribute_values(values)
        .return_values(ReturnValue::AllNew)
        .send()
        .await
        .map_err(|e| storage_error(DynamoDBError::from(e), &request.table))?;

    match output.attributes() {
        Some(attributes) => from_item(attributes),
        None => Ok(Document::new()),
    }
}

fn storage_error(error: DynamoDBError, table: &str) -> StorageError {
    match error {
        DynamoDBError::ConditionalCheckFailedException(_) => StorageError::ConditionalCheckFailed,
        DynamoDBError::ResourceNotFoundException(_) => StorageError::TableNotFound(table.to_string()),
        e => StorageError::Backend(anyhow!(e)),
    }
}

/// Collects expression attribute names / values, every attribute name and value is referenced
/// through a placeholder so reserved words never need special handling.
#[derive(Default)]
struct Expressions {
    names: HashMap<String, String>,
    values: Item,
}

impl Expressions {
    fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, name)| *name == attribute) {
            return placeholder.clone();
        }

        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: &Value) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values
            .insert(placeholder.clone(), to_attribute_value(value));
        placeholder
    }

    fn equals(&mut self, attribute: &str, value: &Value) -> String {
        let name = self.name(attribute);
        let value = self.value(value);

        format!("{name} = {value}")
    }

    fn filter(&mut self, filter: &Filter) -> String {
        self.equals(&filter.attribute, &filter.value)
    }

    fn projection(&mut self, attributes: &[String]) -> String {
        attributes
            .iter()
            .map(|attribute| self.name(attribute))
            .collect::<Vec<String>>()
            .join(", ")
    }

    fn update(&mut self, set: &[(String, Value)]) -> String {
        let assignments = set
            .iter()
            .map(|(attribute, value)| self.equals(attribute, value))
            .collect::<Vec<String>>()
            .join(", ");

        format!("SET {assignments}")
    }

    fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::AttributeExists(attribute) => {
                format!("attribute_exists({})", self.name(attribute))
            }
        }
    }

    /// DynamoDB rejects empty attribute maps, so they are omitted entirely
    fn into_parts(self) -> (Option<HashMap<String, String>>, Option<Item>) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then_some(self.values);

        (names, values)
    }
}
