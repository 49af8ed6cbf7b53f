mod attribute_value;
mod condition;
mod expression;
mod outputs;
mod record;
mod request;
mod shard;
mod table;

pub use attribute_value::{display_item, AttributeValue, Item};
pub use condition::{Comparator, Condition};
pub use expression::Expression;
pub use outputs::{GetRecordsOutput, GetShardsOutput, ListStreamsOutput, Page};
pub use record::{ChangeRecord, EventKind, StreamSummary};
pub use request::{
    DeleteItem, GetItem, PutItem, Query, Scan, TransactItem, UpdateAction, UpdateItem,
};
pub use shard::Shard;
pub use table::{
    KeyAttribute, ScalarType, StreamView, TableDescription, TableSchema, TableStatus,
};

pub(crate) use attribute_value::{from_sdk_item, into_sdk_item};
