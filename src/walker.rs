//! # ShardWalker
//!
//! [`ShardWalker`] reads every shard of a DynamoDB stream from its oldest retained record and
//! reports the change records it finds, shard by shard.
//!
//! ```rust,no_run
//! # use aws_config::BehaviorVersion;
//! use dynamo_walker::{walker::ShardWalker, Client};
//!
//! # async fn wrapper() -> Result<(), dynamo_walker::error::Error> {
//! # let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
//! let client = Client::new(&config);
//! let walker = ShardWalker::builder(client.clone()).max_polls(20).build();
//!
//! let report = walker.walk_table(&client, "Music").await?;
//! for shard in report.shards.iter() {
//!     println!("{}: {:?} after {} polls", shard.shard_id, shard.status, shard.polls);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Polling bound
//!
//! An open shard can keep returning empty batches for as long as the table exists. Every fetch
//! that hands back a next iterator counts as one poll, and once a shard has been polled
//! `max_polls` times (150 unless configured) the walker moves on and reports the shard as
//! [`ShardStatus::PollLimitReached`]. That is not an error.
//!
//! ## Ordering
//!
//! Records of one shard come out in the order the service assigned them. Shards are walked in
//! the order the stream description lists them, which says nothing about the order of events
//! across shards: after a shard split the child shards' records follow the parent's, and only
//! the lineage in [`ShardReport::parent_shard_id`] tells which is which. The walker does not
//! reorder anything.

use super::{
    client::{DynamodbClient, DynamodbStreamsClient},
    error::Error,
    types::{
        ChangeRecord, GetRecordsOutput, GetShardsOutput, ListStreamsOutput, Shard, StreamSummary,
    },
};

use aws_sdk_dynamodbstreams::types::ShardIteratorType;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Default bound on polls per shard.
pub const DEFAULT_MAX_POLLS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStatus {
    /// The service returned no next iterator; nothing more will appear in this shard.
    Closed,
    /// The shard is still active but was polled `max_polls` times.
    PollLimitReached,
}

/// What the walker found in one shard.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardReport {
    pub shard_id: String,
    pub parent_shard_id: Option<String>,
    pub status: ShardStatus,
    /// Number of fetches that returned a next iterator.
    pub polls: usize,
    /// Records in arrival order.
    pub records: Vec<ChangeRecord>,
}

/// Per-shard reports in the order the shards were listed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WalkReport {
    pub shards: Vec<ShardReport>,
}

impl WalkReport {
    /// All records, shard after shard.
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.shards.iter().flat_map(|shard| shard.records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.shards.iter().map(|shard| shard.records.len()).sum()
    }
}

/// Sequential reader of all shards in a stream.
#[derive(Debug, Clone)]
pub struct ShardWalker<Client>
where
    Client: DynamodbStreamsClient,
{
    client: Client,
    shard_iterator_type: ShardIteratorType,
    max_polls: usize,
    interval: Option<Duration>,
}

#[derive(Debug)]
pub struct ShardWalkerBuilder<Client>
where
    Client: DynamodbStreamsClient,
{
    client: Client,
    shard_iterator_type: ShardIteratorType,
    max_polls: usize,
    interval: Option<Duration>,
}

impl<Client> ShardWalkerBuilder<Client>
where
    Client: DynamodbStreamsClient,
{
    pub fn new(client: Client) -> Self {
        Self {
            client,
            shard_iterator_type: ShardIteratorType::TrimHorizon,
            max_polls: DEFAULT_MAX_POLLS,
            interval: None,
        }
    }

    /// Where each shard is read from. Defaults to the oldest retained record.
    pub fn shard_iterator_type(self, shard_iterator_type: ShardIteratorType) -> Self {
        Self {
            shard_iterator_type,
            ..self
        }
    }

    /// Upper bound on polls per shard. Zero is treated as one.
    pub fn max_polls(self, max_polls: usize) -> Self {
        Self {
            max_polls: max_polls.max(1),
            ..self
        }
    }

    /// Pause between two polls of the same shard.
    pub fn interval(self, interval: Option<Duration>) -> Self {
        Self { interval, ..self }
    }

    pub fn build(self) -> ShardWalker<Client> {
        ShardWalker {
            client: self.client,
            shard_iterator_type: self.shard_iterator_type,
            max_polls: self.max_polls,
            interval: self.interval,
        }
    }
}

impl<Client> ShardWalker<Client>
where
    Client: DynamodbStreamsClient,
{
    pub fn builder(client: Client) -> ShardWalkerBuilder<Client> {
        ShardWalkerBuilder::new(client)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn max_polls(&self) -> usize {
        self.max_polls
    }

    /// Every stream the table has had, following the listing's pages.
    pub async fn list_all_streams(&self, table_name: &str) -> Result<Vec<StreamSummary>, Error> {
        let ListStreamsOutput {
            mut streams,
            mut last_stream_arn,
        } = self.client.list_streams(table_name, None).await?;

        while last_stream_arn.is_some() {
            let mut output = self
                .client
                .list_streams(table_name, last_stream_arn.take())
                .await?;
            streams.append(&mut output.streams);
            last_stream_arn = output.last_stream_arn;
        }

        Ok(streams)
    }

    /// Walk the latest stream of a table.
    pub async fn walk_table<Db>(&self, db: &Db, table_name: &str) -> Result<WalkReport, Error>
    where
        Db: DynamodbClient,
    {
        let stream_arn = db.get_stream_arn(table_name).await?;
        self.walk(&stream_arn).await
    }

    /// Walk every shard of the stream and collect the records.
    pub async fn walk(&self, stream_arn: &str) -> Result<WalkReport, Error> {
        self.walk_with(stream_arn, |_, _| {}).await
    }

    /// Walk every shard of the stream, calling `on_record` with the shard id and each record
    /// as soon as its batch arrives. The first failed request ends the walk.
    pub async fn walk_with<F>(&self, stream_arn: &str, mut on_record: F) -> Result<WalkReport, Error>
    where
        F: FnMut(&str, &ChangeRecord),
    {
        let shards = self.get_all_shards(stream_arn).await?;
        info!("Walking {} shards of {stream_arn}", shards.len());

        let mut report = WalkReport::default();
        for shard in shards {
            let shard = self.walk_shard(stream_arn, shard, &mut on_record).await?;
            report.shards.push(shard);
        }

        Ok(report)
    }

    /// Read one shard until it closes or the poll bound is reached.
    async fn walk_shard<F>(
        &self,
        stream_arn: &str,
        shard: Shard,
        on_record: &mut F,
    ) -> Result<ShardReport, Error>
    where
        F: FnMut(&str, &ChangeRecord),
    {
        let shard_id = shard.id().to_string();
        let parent_shard_id = shard.parent_shard_id().map(str::to_string);

        let mut shard = self
            .client
            .get_shard_with_iterator(stream_arn, shard, self.shard_iterator_type.clone())
            .await?;

        let mut records: Vec<ChangeRecord> = vec![];
        let mut polls = 0;

        let status = loop {
            if shard.is_closed() {
                info!("Shard {shard_id} is closed");
                break ShardStatus::Closed;
            }

            if polls >= self.max_polls {
                warn!("Shard {shard_id} is still active, polling limit reached after {polls} polls");
                break ShardStatus::PollLimitReached;
            }

            if polls > 0 {
                if let Some(interval) = self.interval {
                    sleep(interval).await;
                }
            }

            let GetRecordsOutput {
                shard: next,
                records: batch,
            } = self.client.get_records(shard).await?;
            shard = next;

            if !shard.is_closed() {
                polls += 1;
            }
            debug!("Shard {shard_id}: {} records in poll {polls}", batch.len());

            for record in batch {
                info!(shard_id = shard_id.as_str(), "{record}");
                on_record(&shard_id, &record);
                records.push(record);
            }
        };

        Ok(ShardReport {
            shard_id,
            parent_shard_id,
            status,
            polls,
            records,
        })
    }

    /// Get all shards of the stream, following the listing's pages.
    async fn get_all_shards(&self, stream_arn: &str) -> Result<Vec<Shard>, Error> {
        let GetShardsOutput {
            mut shards,
            mut last_shard_id,
        } = self.client.get_shards(stream_arn, None).await?;

        while last_shard_id.is_some() {
            let mut output = self
                .client
                .get_shards(stream_arn, last_shard_id.take())
                .await?;
            shards.append(&mut output.shards);
            last_shard_id = output.last_shard_id;
        }

        Ok(shards)
    }
}
