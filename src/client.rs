use super::{
    error::Error,
    types::{
        from_sdk_item, into_sdk_item, ChangeRecord, DeleteItem, Expression, GetItem,
        GetRecordsOutput, GetShardsOutput, Item, ListStreamsOutput, Page, PutItem, Query, Scan,
        Shard, StreamSummary, TableDescription, TableSchema, TransactItem, UpdateItem,
    },
};

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::{
    operation::{
        batch_write_item::BatchWriteItemError, create_table::CreateTableError,
        delete_item::DeleteItemError, delete_table::DeleteTableError,
        describe_table::DescribeTableError, get_item::GetItemError, put_item::PutItemError,
        query::QueryError, scan::ScanError, transact_write_items::TransactWriteItemsError,
        update_item::UpdateItemError,
    },
    types::{
        AttributeDefinition, BillingMode, ConditionCheck, Delete, KeySchemaElement, KeyType, Put,
        PutRequest, ReturnValue, StreamSpecification, TransactWriteItem, Update, WriteRequest,
    },
    Client as DbClient,
};
use aws_sdk_dynamodbstreams::{
    operation::describe_stream::DescribeStreamError, types::ShardIteratorType,
    Client as StreamsClient,
};
use tracing::debug;
use ulid::Ulid;

/// Client for calling the DynamoDB and DynamoDB Streams APIs.
#[derive(Debug, Clone)]
pub struct Client {
    db: DbClient,
    streams: StreamsClient,
}

impl Client {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            db: DbClient::new(config),
            streams: StreamsClient::new(config),
        }
    }
}

/// The DynamoDB data plane: table lifecycle and item operations.
///
/// Each method is one request to the service. Errors the service reports for these operations
/// are classified into [`Error`] variants so callers can branch on them. Every operation on a
/// table that does not exist fails with [`Error::ResourceNotFound`].
#[async_trait]
pub trait DynamodbClient: Send + Sync {
    /// Create a table. Fails with [`Error::ResourceAlreadyExists`] when the name is taken.
    async fn create_table(&self, schema: &TableSchema) -> Result<TableDescription, Error>;

    /// Fails with [`Error::ResourceNotFound`] when the table does not exist.
    async fn describe_table(
        &self,
        table_name: impl Into<String> + Send,
    ) -> Result<TableDescription, Error>;

    /// Fails with [`Error::ResourceNotFound`] when the table does not exist.
    async fn delete_table(&self, table_name: impl Into<String> + Send) -> Result<(), Error>;

    /// Fails with [`Error::ConditionalCheckFailed`] when the request's condition does not hold.
    async fn put_item(&self, request: PutItem) -> Result<(), Error>;

    async fn get_item(&self, request: GetItem) -> Result<Option<Item>, Error>;

    /// Return the item as it is after the update.
    async fn update_item(&self, request: UpdateItem) -> Result<Item, Error>;

    async fn delete_item(&self, request: DeleteItem) -> Result<(), Error>;

    /// Send one batch write of at most 25 puts. Return the items the service left unprocessed.
    async fn batch_put(
        &self,
        table_name: impl Into<String> + Send,
        items: Vec<Item>,
    ) -> Result<Vec<Item>, Error>;

    /// Return one page of a query.
    async fn query(&self, request: &Query, exclusive_start_key: Option<Item>)
        -> Result<Page, Error>;

    /// Return one page of a scan.
    async fn scan(&self, request: &Scan, exclusive_start_key: Option<Item>) -> Result<Page, Error>;

    /// Apply all items atomically or none of them.
    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<(), Error>;

    /// Return LatestStreamArn from Dynamodb table description.
    async fn get_stream_arn(&self, table_name: impl Into<String> + Send) -> Result<String, Error> {
        let table_name: String = table_name.into();

        self.describe_table(table_name.as_str())
            .await?
            .latest_stream_arn
            .ok_or(Error::NotFoundStream(table_name))
    }
}

/// The DynamoDB Streams API.
#[async_trait]
pub trait DynamodbStreamsClient: Send + Sync {
    /// Return streams attached to the table and the ARN to continue listing from.
    async fn list_streams(
        &self,
        table_name: impl Into<String> + Send,
        exclusive_start_stream_arn: Option<String>,
    ) -> Result<ListStreamsOutput, Error>;

    /// Return shards and last shard id from Dynamodb Stream description.
    async fn get_shards(
        &self,
        stream_arn: impl Into<String> + Send,
        exclusive_start_shard_id: Option<String>,
    ) -> Result<GetShardsOutput, Error>;

    /// Return shard with shard iterator id.
    async fn get_shard_with_iterator(
        &self,
        stream_arn: impl Into<String> + Send,
        shard: Shard,
        shard_iterator_type: ShardIteratorType,
    ) -> Result<Shard, Error>;

    /// Return records from shard. The returned shard carries the next iterator, or none once the
    /// shard is closed.
    async fn get_records(&self, shard: Shard) -> Result<GetRecordsOutput, Error>;
}

#[async_trait]
impl DynamodbClient for Client {
    async fn create_table(&self, schema: &TableSchema) -> Result<TableDescription, Error> {
        let table_name = schema.table_name.clone();

        let keys = [
            (Some(&schema.partition_key), KeyType::Hash),
            (schema.sort_key.as_ref(), KeyType::Range),
        ];
        let mut attribute_definitions: Vec<AttributeDefinition> = vec![];
        let mut key_schema: Vec<KeySchemaElement> = vec![];

        for (attribute, key_type) in keys {
            if let Some(attribute) = attribute {
                attribute_definitions.push(
                    AttributeDefinition::builder()
                        .attribute_name(&attribute.name)
                        .attribute_type(attribute.scalar_type.into())
                        .build()?,
                );
                key_schema.push(
                    KeySchemaElement::builder()
                        .attribute_name(&attribute.name)
                        .key_type(key_type)
                        .build()?,
                );
            }
        }

        let stream_specification = schema
            .stream
            .map(|view| {
                StreamSpecification::builder()
                    .stream_enabled(true)
                    .stream_view_type(view.into())
                    .build()
            })
            .transpose()?;

        self.db
            .create_table()
            .table_name(&table_name)
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .billing_mode(BillingMode::PayPerRequest)
            .set_stream_specification(stream_specification)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err.as_service_error(),
                    Some(CreateTableError::ResourceInUseException(_))
                ) {
                    Error::ResourceAlreadyExists(table_name.clone())
                } else {
                    Error::service(err)
                }
            })?
            .table_description
            .map(TableDescription::from)
            .ok_or(Error::ResourceNotFound(table_name))
    }

    async fn describe_table(
        &self,
        table_name: impl Into<String> + Send,
    ) -> Result<TableDescription, Error> {
        let table_name: String = table_name.into();

        self.db
            .describe_table()
            .table_name(&table_name)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err.as_service_error(),
                    Some(DescribeTableError::ResourceNotFoundException(_))
                ) {
                    Error::ResourceNotFound(table_name.clone())
                } else {
                    Error::service(err)
                }
            })?
            .table
            .map(TableDescription::from)
            .ok_or(Error::ResourceNotFound(table_name))
    }

    async fn delete_table(&self, table_name: impl Into<String> + Send) -> Result<(), Error> {
        let table_name: String = table_name.into();

        self.db
            .delete_table()
            .table_name(&table_name)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err.as_service_error(),
                    Some(DeleteTableError::ResourceNotFoundException(_))
                ) {
                    Error::ResourceNotFound(table_name.clone())
                } else {
                    Error::service(err)
                }
            })?;

        Ok(())
    }

    async fn put_item(&self, request: PutItem) -> Result<(), Error> {
        let PutItem {
            table_name,
            item,
            condition,
        } = request;

        let mut expr = Expression::new();
        let condition_expression = condition.map(|condition| expr.condition(&condition));
        let (names, values) = expr.into_parts();

        self.db
            .put_item()
            .table_name(&table_name)
            .set_item(Some(into_sdk_item(item)))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(PutItemError::ConditionalCheckFailedException(_)) => {
                    Error::ConditionalCheckFailed(format!("put item into {table_name}"))
                }
                Some(PutItemError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(table_name.clone())
                }
                _ => Error::service(err),
            })?;

        Ok(())
    }

    async fn get_item(&self, request: GetItem) -> Result<Option<Item>, Error> {
        let GetItem {
            table_name,
            key,
            consistent_read,
        } = request;

        self.db
            .get_item()
            .table_name(&table_name)
            .set_key(Some(into_sdk_item(key)))
            .consistent_read(consistent_read)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(GetItemError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(table_name.clone())
                }
                _ => Error::service(err),
            })?
            .item
            .map(from_sdk_item)
            .transpose()
    }

    async fn update_item(&self, request: UpdateItem) -> Result<Item, Error> {
        let UpdateItem {
            table_name,
            key,
            actions,
            condition,
        } = request;

        let mut expr = Expression::new();
        let update_expression = expr.update(&actions);
        let condition_expression = condition.map(|condition| expr.condition(&condition));
        let (names, values) = expr.into_parts();

        let output = self
            .db
            .update_item()
            .table_name(&table_name)
            .set_key(Some(into_sdk_item(key)))
            .set_update_expression((!update_expression.is_empty()).then_some(update_expression))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(UpdateItemError::ConditionalCheckFailedException(_)) => {
                    Error::ConditionalCheckFailed(format!("update item in {table_name}"))
                }
                Some(UpdateItemError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(table_name.clone())
                }
                _ => Error::service(err),
            })?;

        from_sdk_item(output.attributes.unwrap_or_default())
    }

    async fn delete_item(&self, request: DeleteItem) -> Result<(), Error> {
        let DeleteItem {
            table_name,
            key,
            condition,
        } = request;

        let mut expr = Expression::new();
        let condition_expression = condition.map(|condition| expr.condition(&condition));
        let (names, values) = expr.into_parts();

        self.db
            .delete_item()
            .table_name(&table_name)
            .set_key(Some(into_sdk_item(key)))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(DeleteItemError::ConditionalCheckFailedException(_)) => {
                    Error::ConditionalCheckFailed(format!("delete item from {table_name}"))
                }
                Some(DeleteItemError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(table_name.clone())
                }
                _ => Error::service(err),
            })?;

        Ok(())
    }

    async fn batch_put(
        &self,
        table_name: impl Into<String> + Send,
        items: Vec<Item>,
    ) -> Result<Vec<Item>, Error> {
        let table_name: String = table_name.into();

        let requests = items
            .into_iter()
            .map(|item| {
                PutRequest::builder()
                    .set_item(Some(into_sdk_item(item)))
                    .build()
                    .map(|put| WriteRequest::builder().put_request(put).build())
            })
            .collect::<Result<Vec<WriteRequest>, _>>()?;

        let unprocessed = self
            .db
            .batch_write_item()
            .request_items(&table_name, requests)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(BatchWriteItemError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(table_name.clone())
                }
                _ => Error::service(err),
            })?
            .unprocessed_items
            .and_then(|mut tables| tables.remove(&table_name))
            .unwrap_or_default();

        unprocessed
            .into_iter()
            .filter_map(|request| request.put_request)
            .map(|put| from_sdk_item(put.item))
            .collect()
    }

    async fn query(
        &self,
        request: &Query,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page, Error> {
        let mut expr = Expression::new();
        let key_condition = expr.condition(&request.key_condition());
        let filter = request.filter.as_ref().map(|filter| expr.condition(filter));
        let (names, values) = expr.into_parts();

        let output = self
            .db
            .query()
            .table_name(&request.table_name)
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .consistent_read(request.consistent_read)
            .set_limit(request.limit)
            .set_exclusive_start_key(exclusive_start_key.map(into_sdk_item))
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(QueryError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(request.table_name.clone())
                }
                _ => Error::service(err),
            })?;

        Ok(Page {
            items: output
                .items
                .unwrap_or_default()
                .into_iter()
                .map(from_sdk_item)
                .collect::<Result<Vec<Item>, Error>>()?,
            last_evaluated_key: output.last_evaluated_key.map(from_sdk_item).transpose()?,
        })
    }

    async fn scan(&self, request: &Scan, exclusive_start_key: Option<Item>) -> Result<Page, Error> {
        let mut expr = Expression::new();
        let filter = request.filter.as_ref().map(|filter| expr.condition(filter));
        let (names, values) = expr.into_parts();

        let output = self
            .db
            .scan()
            .table_name(&request.table_name)
            .set_filter_expression(filter)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .set_limit(request.limit)
            .set_exclusive_start_key(exclusive_start_key.map(into_sdk_item))
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(ScanError::ResourceNotFoundException(_)) => {
                    Error::ResourceNotFound(request.table_name.clone())
                }
                _ => Error::service(err),
            })?;

        Ok(Page {
            items: output
                .items
                .unwrap_or_default()
                .into_iter()
                .map(from_sdk_item)
                .collect::<Result<Vec<Item>, Error>>()?,
            last_evaluated_key: output.last_evaluated_key.map(from_sdk_item).transpose()?,
        })
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<(), Error> {
        let mut table_names = items
            .iter()
            .map(|item| item.table_name().to_string())
            .collect::<Vec<String>>();
        table_names.sort();
        table_names.dedup();

        let items = items
            .into_iter()
            .map(into_transact_write_item)
            .collect::<Result<Vec<TransactWriteItem>, Error>>()?;
        let token = Ulid::new().to_string();
        debug!("Sending transaction {token} with {} items", items.len());

        self.db
            .transact_write_items()
            .set_transact_items(Some(items))
            .client_request_token(&token)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err.as_service_error(),
                    Some(TransactWriteItemsError::ResourceNotFoundException(_))
                ) {
                    return Error::ResourceNotFound(table_names.join(", "));
                }

                let reasons = match err.as_service_error() {
                    Some(TransactWriteItemsError::TransactionCanceledException(e)) => e
                        .cancellation_reasons()
                        .iter()
                        .filter_map(|reason| reason.code())
                        .map(str::to_string)
                        .collect::<Vec<String>>(),
                    _ => vec![],
                };

                if reasons.iter().any(|code| code == "ConditionalCheckFailed") {
                    Error::ConditionalCheckFailed(format!(
                        "transaction {token} cancelled: {}",
                        reasons.join(", ")
                    ))
                } else {
                    Error::service(err)
                }
            })?;

        Ok(())
    }
}

fn into_transact_write_item(item: TransactItem) -> Result<TransactWriteItem, Error> {
    let mut expr = Expression::new();

    let item = match item {
        TransactItem::ConditionCheck {
            table_name,
            key,
            condition,
        } => {
            let condition = expr.condition(&condition);
            let (names, values) = expr.into_parts();
            let check = ConditionCheck::builder()
                .table_name(table_name)
                .set_key(Some(into_sdk_item(key)))
                .condition_expression(condition)
                .set_expression_attribute_names(names)
                .set_expression_attribute_values(values)
                .build()?;
            TransactWriteItem::builder().condition_check(check).build()
        }
        TransactItem::Put(PutItem {
            table_name,
            item,
            condition,
        }) => {
            let condition = condition.map(|condition| expr.condition(&condition));
            let (names, values) = expr.into_parts();
            let put = Put::builder()
                .table_name(table_name)
                .set_item(Some(into_sdk_item(item)))
                .set_condition_expression(condition)
                .set_expression_attribute_names(names)
                .set_expression_attribute_values(values)
                .build()?;
            TransactWriteItem::builder().put(put).build()
        }
        TransactItem::Update(UpdateItem {
            table_name,
            key,
            actions,
            condition,
        }) => {
            let update_expression = expr.update(&actions);
            let condition = condition.map(|condition| expr.condition(&condition));
            let (names, values) = expr.into_parts();
            let update = Update::builder()
                .table_name(table_name)
                .set_key(Some(into_sdk_item(key)))
                .update_expression(update_expression)
                .set_condition_expression(condition)
                .set_expression_attribute_names(names)
                .set_expression_attribute_values(values)
                .build()?;
            TransactWriteItem::builder().update(update).build()
        }
        TransactItem::Delete(DeleteItem {
            table_name,
            key,
            condition,
        }) => {
            let condition = condition.map(|condition| expr.condition(&condition));
            let (names, values) = expr.into_parts();
            let delete = Delete::builder()
                .table_name(table_name)
                .set_key(Some(into_sdk_item(key)))
                .set_condition_expression(condition)
                .set_expression_attribute_names(names)
                .set_expression_attribute_values(values)
                .build()?;
            TransactWriteItem::builder().delete(delete).build()
        }
    };

    Ok(item)
}

#[async_trait]
impl DynamodbStreamsClient for Client {
    async fn list_streams(
        &self,
        table_name: impl Into<String> + Send,
        exclusive_start_stream_arn: Option<String>,
    ) -> Result<ListStreamsOutput, Error> {
        let output = self
            .streams
            .list_streams()
            .table_name(table_name)
            .set_exclusive_start_stream_arn(exclusive_start_stream_arn)
            .send()
            .await
            .map_err(Error::service)?;

        Ok(ListStreamsOutput {
            streams: output
                .streams
                .unwrap_or_default()
                .into_iter()
                .filter_map(StreamSummary::new)
                .collect(),
            last_stream_arn: output.last_evaluated_stream_arn,
        })
    }

    async fn get_shards(
        &self,
        stream_arn: impl Into<String> + Send,
        exclusive_start_shard_id: Option<String>,
    ) -> Result<GetShardsOutput, Error> {
        let stream_arn: String = stream_arn.into();

        self.streams
            .describe_stream()
            .stream_arn(&stream_arn)
            .set_exclusive_start_shard_id(exclusive_start_shard_id)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err.as_service_error(),
                    Some(DescribeStreamError::ResourceNotFoundException(_))
                ) {
                    Error::ResourceNotFound(stream_arn.clone())
                } else {
                    Error::service(err)
                }
            })?
            .stream_description
            .map(|description| {
                let shards = description
                    .shards
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(Shard::new)
                    .collect::<Vec<Shard>>();
                let last_shard_id = description.last_evaluated_shard_id;

                GetShardsOutput {
                    shards,
                    last_shard_id,
                }
            })
            .ok_or(Error::NotFoundStreamDescription(stream_arn))
    }

    async fn get_shard_with_iterator(
        &self,
        stream_arn: impl Into<String> + Send,
        shard: Shard,
        shard_iterator_type: ShardIteratorType,
    ) -> Result<Shard, Error> {
        let iterator = self
            .streams
            .get_shard_iterator()
            .stream_arn(stream_arn)
            .shard_id(shard.id())
            .shard_iterator_type(shard_iterator_type)
            .send()
            .await
            .map_err(Error::service)?
            .shard_iterator;

        Ok(shard.set_iterator(iterator))
    }

    async fn get_records(&self, shard: Shard) -> Result<GetRecordsOutput, Error> {
        let iterator = shard.iterator().map(|val| val.to_string());

        let output = self
            .streams
            .get_records()
            .set_shard_iterator(iterator)
            .send()
            .await
            .map_err(Error::service)?;

        let records = output
            .records
            .unwrap_or_default()
            .into_iter()
            .map(ChangeRecord::try_from)
            .collect::<Result<Vec<ChangeRecord>, Error>>()?;

        Ok(GetRecordsOutput {
            shard: shard.set_iterator(output.next_shard_iterator),
            records,
        })
    }
}
