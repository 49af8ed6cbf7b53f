use super::{
    super::{
        error::Error,
        types::{
            AttributeValue, ChangeRecord, Comparator, Condition, DeleteItem, GetItem,
            GetRecordsOutput, GetShardsOutput, Item, ListStreamsOutput, Page, PutItem, Query,
            Scan, Shard, StreamSummary, TableDescription, TableSchema, TableStatus, TransactItem,
            UpdateAction, UpdateItem,
        },
    },
    DynamodbClient, DynamodbStreamsClient,
};

use async_trait::async_trait;
use aws_sdk_dynamodbstreams::types::ShardIteratorType;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
    ops::Bound,
    sync::Mutex,
};

#[derive(Debug)]
struct MockTable {
    schema: TableSchema,
    items: BTreeMap<String, Item>,
    stream_arn: Option<String>,
    pending_describes: usize,
}

impl MockTable {
    fn key_of(&self, item: &Item) -> Result<String, Error> {
        self.schema
            .key_names()
            .into_iter()
            .map(|name| {
                item.get(name)
                    .map(|value| format!("{value:?}"))
                    .ok_or_else(|| Error::InvalidRequest(format!("missing key attribute {name}")))
            })
            .collect::<Result<Vec<String>, Error>>()
            .map(|parts| parts.join("|"))
    }

    fn key_item(&self, item: &Item) -> Item {
        self.schema
            .key_names()
            .into_iter()
            .filter_map(|name| item.get(name).map(|value| (name.to_string(), value.clone())))
            .collect()
    }

    fn description(&self, status: TableStatus) -> TableDescription {
        TableDescription {
            table_name: self.schema.table_name.clone(),
            status,
            latest_stream_arn: self.stream_arn.clone(),
            item_count: Some(self.items.len() as i64),
        }
    }

    /// Walk items in key order after `start`, evaluating at most `limit` of them.
    fn page(
        &self,
        start: Option<Item>,
        limit: Option<i32>,
        matches: impl Fn(&Item) -> bool,
    ) -> Result<Page, Error> {
        let lower = match start {
            Some(start) => Bound::Excluded(self.key_of(&start)?),
            None => Bound::Unbounded,
        };
        let limit = limit.map(|limit| limit as usize).unwrap_or(usize::MAX);

        let mut evaluated = self.items.range((lower, Bound::Unbounded)).peekable();
        let mut items: Vec<Item> = vec![];
        let mut last: Option<&Item> = None;
        let mut count = 0;

        while count < limit {
            match evaluated.next() {
                Some((_, item)) => {
                    count += 1;
                    last = Some(item);
                    if matches(item) {
                        items.push(item.clone());
                    }
                }
                None => break,
            }
        }

        let last_evaluated_key = match (last, evaluated.peek()) {
            (Some(item), Some(_)) => Some(self.key_item(item)),
            _ => None,
        };

        Ok(Page {
            items,
            last_evaluated_key,
        })
    }
}

/// In-memory stand-in for the DynamoDB data plane.
#[derive(Debug, Default)]
pub struct MockDatabase {
    tables: Mutex<HashMap<String, MockTable>>,
    batch_sizes: Mutex<Vec<usize>>,
    throttled: Mutex<usize>,
    describes_until_active: usize,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report new tables as CREATING for this many describe calls.
    pub fn describes_until_active(self, describes: usize) -> Self {
        Self {
            describes_until_active: describes,
            ..self
        }
    }

    /// Leave this many items unprocessed across the following batch writes.
    pub fn throttle(self, items: usize) -> Self {
        *self.throttled.lock().unwrap() = items;
        self
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    pub fn items(&self, table_name: &str) -> Vec<Item> {
        self.tables
            .lock()
            .unwrap()
            .get(table_name)
            .map(|table| table.items.values().cloned().collect())
            .unwrap_or_default()
    }

    fn with_table<T>(
        &self,
        table_name: &str,
        f: impl FnOnce(&mut MockTable) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut tables = self.tables.lock().unwrap();
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| Error::ResourceNotFound(table_name.to_string()))?;
        f(table)
    }
}

fn apply_update(mut item: Item, actions: &[UpdateAction]) -> Item {
    for action in actions {
        match action {
            UpdateAction::Set(name, value) => {
                item.insert(name.clone(), value.clone());
            }
            UpdateAction::Remove(name) => {
                item.remove(name);
            }
        }
    }
    item
}

fn check(condition: Option<&Condition>, item: Option<&Item>, what: &str) -> Result<(), Error> {
    match condition {
        Some(condition) if !evaluate(condition, item) => {
            Err(Error::ConditionalCheckFailed(what.to_string()))
        }
        _ => Ok(()),
    }
}

fn compare(left: &AttributeValue, right: &AttributeValue) -> Option<Ordering> {
    match (left, right) {
        (AttributeValue::N(_), AttributeValue::N(_)) => {
            left.as_f64()?.partial_cmp(&right.as_f64()?)
        }
        (AttributeValue::S(l), AttributeValue::S(r)) => Some(l.cmp(r)),
        (AttributeValue::B(l), AttributeValue::B(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

pub fn evaluate(condition: &Condition, item: Option<&Item>) -> bool {
    let get = |name: &str| item.and_then(|item| item.get(name));

    match condition {
        Condition::AttributeExists(name) => get(name).is_some(),
        Condition::AttributeNotExists(name) => get(name).is_none(),
        Condition::Compare(name, comparator, value) => {
            let Some(actual) = get(name) else {
                return false;
            };
            let ordering = compare(actual, value);
            match comparator {
                Comparator::Eq => actual == value,
                Comparator::Ne => actual != value,
                Comparator::Lt => ordering == Some(Ordering::Less),
                Comparator::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                Comparator::Gt => ordering == Some(Ordering::Greater),
                Comparator::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            }
        }
        Condition::BeginsWith(name, prefix) => match (get(name), prefix) {
            (Some(AttributeValue::S(s)), AttributeValue::S(p)) => s.starts_with(p.as_str()),
            (Some(AttributeValue::B(b)), AttributeValue::B(p)) => b.starts_with(p),
            _ => false,
        },
        Condition::Contains(name, operand) => match (get(name), operand) {
            (Some(AttributeValue::S(s)), AttributeValue::S(o)) => s.contains(o.as_str()),
            (Some(AttributeValue::Ss(set)), AttributeValue::S(o)) => set.contains(o),
            (Some(AttributeValue::Ns(set)), AttributeValue::N(o)) => set.contains(o),
            (Some(AttributeValue::L(list)), o) => list.contains(o),
            _ => false,
        },
        Condition::Between(name, low, high) => get(name).is_some_and(|actual| {
            matches!(
                compare(actual, low),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(compare(actual, high), Some(Ordering::Less | Ordering::Equal))
        }),
        Condition::And(left, right) => evaluate(left, item) && evaluate(right, item),
        Condition::Or(left, right) => evaluate(left, item) || evaluate(right, item),
        Condition::Not(inner) => !evaluate(inner, item),
    }
}

#[async_trait]
impl DynamodbClient for MockDatabase {
    async fn create_table(&self, schema: &TableSchema) -> Result<TableDescription, Error> {
        let mut tables = self.tables.lock().unwrap();
        if tables.contains_key(&schema.table_name) {
            return Err(Error::ResourceAlreadyExists(schema.table_name.clone()));
        }

        let table = MockTable {
            schema: schema.clone(),
            items: BTreeMap::new(),
            stream_arn: schema
                .stream
                .map(|_| format!("arn:aws:dynamodb:local:table/{}/stream", schema.table_name)),
            pending_describes: self.describes_until_active,
        };
        let description = table.description(TableStatus::Creating);
        tables.insert(schema.table_name.clone(), table);
        Ok(description)
    }

    async fn describe_table(
        &self,
        table_name: impl Into<String> + Send,
    ) -> Result<TableDescription, Error> {
        let table_name: String = table_name.into();
        self.with_table(&table_name, |table| {
            if table.pending_describes > 0 {
                table.pending_describes -= 1;
                Ok(table.description(TableStatus::Creating))
            } else {
                Ok(table.description(TableStatus::Active))
            }
        })
    }

    async fn delete_table(&self, table_name: impl Into<String> + Send) -> Result<(), Error> {
        let table_name: String = table_name.into();
        self.tables
            .lock()
            .unwrap()
            .remove(&table_name)
            .map(|_| ())
            .ok_or(Error::ResourceNotFound(table_name))
    }

    async fn put_item(&self, request: PutItem) -> Result<(), Error> {
        self.with_table(&request.table_name, |table| {
            let key = table.key_of(&request.item)?;
            check(
                request.condition.as_ref(),
                table.items.get(&key),
                "put item",
            )?;
            table.items.insert(key, request.item);
            Ok(())
        })
    }

    async fn get_item(&self, request: GetItem) -> Result<Option<Item>, Error> {
        self.with_table(&request.table_name, |table| {
            let key = table.key_of(&request.key)?;
            Ok(table.items.get(&key).cloned())
        })
    }

    async fn update_item(&self, request: UpdateItem) -> Result<Item, Error> {
        self.with_table(&request.table_name, |table| {
            let key = table.key_of(&request.key)?;
            let current = table.items.get(&key);
            check(request.condition.as_ref(), current, "update item")?;

            let base = current.cloned().unwrap_or_else(|| request.key.clone());
            let updated = apply_update(base, &request.actions);
            table.items.insert(key, updated.clone());
            Ok(updated)
        })
    }

    async fn delete_item(&self, request: DeleteItem) -> Result<(), Error> {
        self.with_table(&request.table_name, |table| {
            let key = table.key_of(&request.key)?;
            check(
                request.condition.as_ref(),
                table.items.get(&key),
                "delete item",
            )?;
            table.items.remove(&key);
            Ok(())
        })
    }

    async fn batch_put(
        &self,
        table_name: impl Into<String> + Send,
        mut items: Vec<Item>,
    ) -> Result<Vec<Item>, Error> {
        let table_name: String = table_name.into();
        if items.len() > 25 {
            return Err(Error::InvalidRequest("too many items in batch".into()));
        }
        self.batch_sizes.lock().unwrap().push(items.len());

        let unprocessed = {
            let mut throttled = self.throttled.lock().unwrap();
            let n = (*throttled).min(items.len());
            *throttled -= n;
            items.split_off(items.len() - n)
        };

        self.with_table(&table_name, |table| {
            for item in items {
                let key = table.key_of(&item)?;
                table.items.insert(key, item);
            }
            Ok(())
        })?;

        Ok(unprocessed)
    }

    async fn query(
        &self,
        request: &Query,
        exclusive_start_key: Option<Item>,
    ) -> Result<Page, Error> {
        let key_condition = request.key_condition();

        self.with_table(&request.table_name, |table| {
            let mut page = table.page(exclusive_start_key, None, |item| {
                evaluate(&key_condition, Some(item))
            })?;

            // Limit counts items read under the key condition, before the filter.
            if let Some(limit) = request.limit {
                let limit = limit as usize;
                if page.items.len() > limit {
                    page.items.truncate(limit);
                    page.last_evaluated_key = page.items.last().map(|item| table.key_item(item));
                }
            }

            if let Some(filter) = request.filter.as_ref() {
                page.items.retain(|item| evaluate(filter, Some(item)));
            }
            Ok(page)
        })
    }

    async fn scan(&self, request: &Scan, exclusive_start_key: Option<Item>) -> Result<Page, Error> {
        self.with_table(&request.table_name, |table| {
            table.page(exclusive_start_key, request.limit, |item| {
                request
                    .filter
                    .as_ref()
                    .map(|filter| evaluate(filter, Some(item)))
                    .unwrap_or(true)
            })
        })
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<(), Error> {
        let mut tables = self.tables.lock().unwrap();

        for item in items.iter() {
            let table = tables
                .get(item.table_name())
                .ok_or_else(|| Error::ResourceNotFound(item.table_name().to_string()))?;

            let (key, condition) = match item {
                TransactItem::ConditionCheck { key, condition, .. } => (key, Some(condition)),
                TransactItem::Put(put) => (&put.item, put.condition.as_ref()),
                TransactItem::Update(update) => (&update.key, update.condition.as_ref()),
                TransactItem::Delete(delete) => (&delete.key, delete.condition.as_ref()),
            };
            let current = table.items.get(&table.key_of(key)?);
            check(condition, current, "transaction cancelled: ConditionalCheckFailed")?;
        }

        for item in items {
            let Some(table) = tables.get_mut(item.table_name()) else {
                continue;
            };

            match item {
                TransactItem::ConditionCheck { .. } => {}
                TransactItem::Put(put) => {
                    let key = table.key_of(&put.item)?;
                    table.items.insert(key, put.item);
                }
                TransactItem::Update(update) => {
                    let key = table.key_of(&update.key)?;
                    let base = table.items.get(&key).cloned().unwrap_or(update.key);
                    table.items.insert(key, apply_update(base, &update.actions));
                }
                TransactItem::Delete(delete) => {
                    let key = table.key_of(&delete.key)?;
                    table.items.remove(&key);
                }
            }
        }

        Ok(())
    }
}

/// Scripted batches for one shard.
#[derive(Debug, Clone)]
pub struct ShardScript {
    shard: Shard,
    batches: Vec<Vec<ChangeRecord>>,
    closes: bool,
    has_iterator: bool,
}

impl ShardScript {
    /// A shard that closes after handing out `batches`.
    pub fn closing(shard: Shard, batches: Vec<Vec<ChangeRecord>>) -> Self {
        Self {
            shard,
            batches,
            closes: true,
            has_iterator: true,
        }
    }

    /// A shard that hands out `batches` and then empty batches forever.
    pub fn open(shard: Shard, batches: Vec<Vec<ChangeRecord>>) -> Self {
        Self {
            shard,
            batches,
            closes: false,
            has_iterator: true,
        }
    }

    /// A shard the service gives no iterator for.
    pub fn without_iterator(shard: Shard) -> Self {
        Self {
            shard,
            batches: vec![],
            closes: true,
            has_iterator: false,
        }
    }
}

/// In-memory stand-in for DynamoDB Streams.
///
/// Iterators are `<shard id>:<batch index>`. Each one is accepted once; handing the same
/// iterator in again fails the fetch.
#[derive(Debug, Default)]
pub struct MockStreams {
    streams: Vec<StreamSummary>,
    shard_pages: Vec<Vec<String>>,
    scripts: HashMap<String, ShardScript>,
    fail_on: Option<String>,
    issued: Mutex<HashSet<String>>,
    used: Mutex<Vec<String>>,
    iterator_types: Mutex<Vec<ShardIteratorType>>,
}

impl MockStreams {
    /// One page of shards, listed in the given order.
    pub fn new(scripts: Vec<ShardScript>) -> Self {
        let page = scripts
            .iter()
            .map(|script| script.shard.id().to_string())
            .collect::<Vec<String>>();
        Self::paged(scripts, vec![page])
    }

    pub fn paged(scripts: Vec<ShardScript>, shard_pages: Vec<Vec<String>>) -> Self {
        Self {
            shard_pages,
            scripts: scripts
                .into_iter()
                .map(|script| (script.shard.id().to_string(), script))
                .collect(),
            ..Self::default()
        }
    }

    pub fn streams(self, streams: Vec<StreamSummary>) -> Self {
        Self { streams, ..self }
    }

    /// Fail every fetch on the given shard.
    pub fn fail_on(self, shard_id: impl Into<String>) -> Self {
        Self {
            fail_on: Some(shard_id.into()),
            ..self
        }
    }

    /// Iterators handed to `get_records`, in call order.
    pub fn used_iterators(&self) -> Vec<String> {
        self.used.lock().unwrap().clone()
    }

    /// Iterator types requested through `get_shard_with_iterator`, in call order.
    pub fn iterator_types(&self) -> Vec<ShardIteratorType> {
        self.iterator_types.lock().unwrap().clone()
    }

    pub fn fetches(&self, shard_id: &str) -> usize {
        let prefix = format!("{shard_id}:");
        self.used
            .lock()
            .unwrap()
            .iter()
            .filter(|iterator| iterator.starts_with(&prefix))
            .count()
    }

    fn issue(&self, iterator: String) -> String {
        self.issued.lock().unwrap().insert(iterator.clone());
        iterator
    }
}

#[async_trait]
impl DynamodbStreamsClient for MockStreams {
    async fn list_streams(
        &self,
        table_name: impl Into<String> + Send,
        exclusive_start_stream_arn: Option<String>,
    ) -> Result<ListStreamsOutput, Error> {
        let table_name: String = table_name.into();
        let streams = self
            .streams
            .iter()
            .filter(|stream| stream.table_name.as_deref() == Some(table_name.as_str()))
            .skip_while(|stream| {
                exclusive_start_stream_arn
                    .as_ref()
                    .is_some_and(|start| &stream.stream_arn != start)
            })
            .skip(usize::from(exclusive_start_stream_arn.is_some()))
            .cloned()
            .collect::<Vec<StreamSummary>>();

        // One stream per page.
        let last_stream_arn = (streams.len() > 1).then(|| streams[0].stream_arn.clone());
        Ok(ListStreamsOutput {
            streams: streams.into_iter().take(1).collect(),
            last_stream_arn,
        })
    }

    async fn get_shards(
        &self,
        stream_arn: impl Into<String> + Send,
        exclusive_start_shard_id: Option<String>,
    ) -> Result<GetShardsOutput, Error> {
        let _stream_arn: String = stream_arn.into();

        let index = match exclusive_start_shard_id {
            Some(last) => {
                self.shard_pages
                    .iter()
                    .position(|page| page.last() == Some(&last))
                    .ok_or_else(|| Error::InvalidRequest(format!("unknown shard {last}")))?
                    + 1
            }
            None => 0,
        };
        let page = self.shard_pages.get(index).cloned().unwrap_or_default();
        let last_shard_id = if index + 1 < self.shard_pages.len() {
            page.last().cloned()
        } else {
            None
        };

        Ok(GetShardsOutput {
            shards: page
                .iter()
                .map(|id| self.scripts[id].shard.clone())
                .collect(),
            last_shard_id,
        })
    }

    async fn get_shard_with_iterator(
        &self,
        _stream_arn: impl Into<String> + Send,
        shard: Shard,
        shard_iterator_type: ShardIteratorType,
    ) -> Result<Shard, Error> {
        self.iterator_types.lock().unwrap().push(shard_iterator_type);

        let script = &self.scripts[shard.id()];
        let iterator = script
            .has_iterator
            .then(|| self.issue(format!("{}:0", shard.id())));
        Ok(shard.set_iterator(iterator))
    }

    async fn get_records(&self, shard: Shard) -> Result<GetRecordsOutput, Error> {
        let iterator = shard
            .iterator()
            .ok_or_else(|| Error::InvalidRequest("missing shard iterator".into()))?
            .to_string();

        if !self.issued.lock().unwrap().remove(&iterator) {
            return Err(Error::InvalidRequest(format!(
                "iterator {iterator} was not issued or is already used"
            )));
        }
        self.used.lock().unwrap().push(iterator.clone());

        if self.fail_on.as_deref() == Some(shard.id()) {
            return Err(Error::service(std::io::Error::new(
                std::io::ErrorKind::Other,
                "throttled",
            )));
        }

        let script = &self.scripts[shard.id()];
        let index = iterator
            .rsplit(':')
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or_default();

        let records = script.batches.get(index).cloned().unwrap_or_default();
        let next = if script.closes && index + 1 >= script.batches.len() {
            None
        } else {
            Some(self.issue(format!("{}:{}", shard.id(), index + 1)))
        };

        Ok(GetRecordsOutput {
            shard: shard.set_iterator(next),
            records,
        })
    }
}
