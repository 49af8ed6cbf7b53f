use super::{
    client::DynamodbClient,
    error::Error,
    types::{TableDescription, TableSchema},
};

use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Result of [`create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(TableDescription),
    /// A table with that name was already there; nothing was changed.
    AlreadyExists,
}

/// Result of [`delete_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Create the table unless one with the same name exists.
pub async fn create_table<C>(client: &C, schema: &TableSchema) -> Result<CreateOutcome, Error>
where
    C: DynamodbClient,
{
    match client.create_table(schema).await {
        Ok(description) => {
            info!("Created table {}", schema.table_name);
            Ok(CreateOutcome::Created(description))
        }
        Err(Error::ResourceAlreadyExists(_)) => {
            info!("Table {} already exists", schema.table_name);
            Ok(CreateOutcome::AlreadyExists)
        }
        Err(err) => Err(err),
    }
}

/// Delete the table if it exists.
pub async fn delete_table<C>(client: &C, table_name: &str) -> Result<DeleteOutcome, Error>
where
    C: DynamodbClient,
{
    match client.delete_table(table_name).await {
        Ok(()) => {
            info!("Deleted table {table_name}");
            Ok(DeleteOutcome::Deleted)
        }
        Err(Error::ResourceNotFound(_)) => {
            info!("Table {table_name} does not exist");
            Ok(DeleteOutcome::NotFound)
        }
        Err(err) => Err(err),
    }
}

/// Poll the table description until the table is ACTIVE, at most `max_attempts` times.
pub async fn wait_until_active<C>(
    client: &C,
    table_name: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<TableDescription, Error>
where
    C: DynamodbClient,
{
    for attempt in 1..=max_attempts {
        let description = client.describe_table(table_name).await?;
        if description.is_active() {
            return Ok(description);
        }

        debug!(
            "Table {table_name} is {:?} (attempt {attempt}/{max_attempts})",
            description.status
        );
        sleep(interval).await;
    }

    Err(Error::Timeout(format!("table {table_name} to become active")))
}
