use super::{
    client::DynamodbClient,
    error::Error,
    types::{AttributeValue, Condition, Item, Query, Scan, TransactItem, UpdateAction, UpdateItem},
};

use tracing::{debug, warn};

/// Most puts the service accepts in one batch write.
pub const MAX_BATCH_SIZE: usize = 25;

/// How many times items left unprocessed by a batch write are sent again.
pub const MAX_BATCH_ATTEMPTS: usize = 5;

/// Most actions the service accepts in one transaction.
pub const MAX_TRANSACT_ITEMS: usize = 100;

/// Write all items in batches of [`MAX_BATCH_SIZE`].
///
/// Items the service leaves unprocessed go out again with the next batch. If some are still
/// left after [`MAX_BATCH_ATTEMPTS`] rounds the call fails and nothing is rolled back.
pub async fn batch_put<C>(client: &C, table_name: &str, items: Vec<Item>) -> Result<(), Error>
where
    C: DynamodbClient,
{
    let mut pending = items;

    for attempt in 1..=MAX_BATCH_ATTEMPTS {
        if pending.is_empty() {
            return Ok(());
        }

        let mut unprocessed: Vec<Item> = vec![];
        let mut rest = pending.into_iter().peekable();

        while rest.peek().is_some() {
            let chunk = rest.by_ref().take(MAX_BATCH_SIZE).collect::<Vec<Item>>();
            debug!("Writing {} items into {table_name}", chunk.len());
            let mut left = client.batch_put(table_name, chunk).await?;
            unprocessed.append(&mut left);
        }

        if !unprocessed.is_empty() {
            warn!(
                "{} items unprocessed by {table_name} (attempt {attempt}/{MAX_BATCH_ATTEMPTS})",
                unprocessed.len()
            );
        }
        pending = unprocessed;
    }

    if pending.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "{} items still unprocessed after {MAX_BATCH_ATTEMPTS} attempts",
            pending.len()
        )))
    }
}

/// Run the query page after page and return every matching item.
pub async fn query_all<C>(client: &C, query: &Query) -> Result<Vec<Item>, Error>
where
    C: DynamodbClient,
{
    let mut items: Vec<Item> = vec![];
    let mut start: Option<Item> = None;

    loop {
        let mut page = client.query(query, start.take()).await?;
        items.append(&mut page.items);

        match page.last_evaluated_key {
            Some(key) => start = Some(key),
            None => return Ok(items),
        }
    }
}

/// Run the scan page after page and return every matching item.
pub async fn scan_all<C>(client: &C, scan: &Scan) -> Result<Vec<Item>, Error>
where
    C: DynamodbClient,
{
    let mut items: Vec<Item> = vec![];
    let mut start: Option<Item> = None;

    loop {
        let mut page = client.scan(scan, start.take()).await?;
        items.append(&mut page.items);

        match page.last_evaluated_key {
            Some(key) => start = Some(key),
            None => return Ok(items),
        }
    }
}

/// Compare-and-swap on a numeric version attribute.
///
/// Applies `actions` and bumps `version_attribute` to `expected + 1`, but only while the stored
/// version is still `expected`. Otherwise fails with [`Error::ConditionalCheckFailed`]; the
/// caller decides whether to re-read and try again.
pub async fn update_versioned<C>(
    client: &C,
    table_name: &str,
    key: Item,
    version_attribute: &str,
    expected: i64,
    actions: Vec<UpdateAction>,
) -> Result<Item, Error>
where
    C: DynamodbClient,
{
    let next = expected.checked_add(1).ok_or_else(|| {
        Error::InvalidRequest(format!("{version_attribute} {expected} cannot be incremented"))
    })?;

    let mut request = UpdateItem::new(table_name, key)
        .set(version_attribute, AttributeValue::number(next))
        .condition(Condition::eq(
            version_attribute,
            AttributeValue::number(expected),
        ));
    request.actions.extend(actions);

    client.update_item(request).await
}

/// Send a write transaction after checking its size.
pub async fn transact_write<C>(client: &C, items: Vec<TransactItem>) -> Result<(), Error>
where
    C: DynamodbClient,
{
    if items.is_empty() {
        return Err(Error::InvalidRequest("empty transaction".into()));
    }
    if items.len() > MAX_TRANSACT_ITEMS {
        return Err(Error::InvalidRequest(format!(
            "{} items in one transaction, at most {MAX_TRANSACT_ITEMS} allowed",
            items.len()
        )));
    }

    client.transact_write(items).await
}
