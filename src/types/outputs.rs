use super::{ChangeRecord, Item, Shard, StreamSummary};

#[derive(Debug, Clone)]
pub struct GetShardsOutput {
    pub shards: Vec<Shard>,
    pub last_shard_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GetRecordsOutput {
    pub shard: Shard,
    pub records: Vec<ChangeRecord>,
}

#[derive(Debug, Clone)]
pub struct ListStreamsOutput {
    pub streams: Vec<StreamSummary>,
    pub last_stream_arn: Option<String>,
}

/// One page of a query or scan.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}
