use super::{
    attribute_value::{display_item, from_stream_item},
    Item,
};
use super::super::error::Error;

use aws_sdk_dynamodbstreams::types;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Insert,
    Modify,
    Remove,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Modify => "MODIFY",
            Self::Remove => "REMOVE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl From<types::OperationType> for EventKind {
    fn from(value: types::OperationType) -> Self {
        match value {
            types::OperationType::Insert => Self::Insert,
            types::OperationType::Modify => Self::Modify,
            types::OperationType::Remove => Self::Remove,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutation of a table item as read from a stream shard.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub event: EventKind,
    pub keys: Item,
    pub old_image: Option<Item>,
    pub new_image: Option<Item>,
    pub sequence_number: Option<String>,
}

impl ChangeRecord {
    pub fn new(event: EventKind, keys: Item) -> Self {
        Self {
            event,
            keys,
            old_image: None,
            new_image: None,
            sequence_number: None,
        }
    }

    pub fn sequence_number(self, sequence_number: impl Into<String>) -> Self {
        Self {
            sequence_number: Some(sequence_number.into()),
            ..self
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.event, display_item(&self.keys))
    }
}

impl TryFrom<types::Record> for ChangeRecord {
    type Error = Error;

    fn try_from(value: types::Record) -> Result<Self, Self::Error> {
        let event = value
            .event_name
            .map(EventKind::from)
            .unwrap_or(EventKind::Unknown);
        let stream_record = value.dynamodb.unwrap_or_else(|| types::StreamRecord::builder().build());

        Ok(Self {
            event,
            keys: from_stream_item(stream_record.keys.unwrap_or_default())?,
            old_image: stream_record.old_image.map(from_stream_item).transpose()?,
            new_image: stream_record.new_image.map(from_stream_item).transpose()?,
            sequence_number: stream_record.sequence_number,
        })
    }
}

/// A stream attached to a table, as returned by stream listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub stream_arn: String,
    pub table_name: Option<String>,
    pub stream_label: Option<String>,
}

impl StreamSummary {
    pub fn new(stream: types::Stream) -> Option<Self> {
        let types::Stream {
            stream_arn,
            table_name,
            stream_label,
            ..
        } = stream;

        stream_arn.map(|stream_arn| Self {
            stream_arn,
            table_name,
            stream_label,
        })
    }
}
