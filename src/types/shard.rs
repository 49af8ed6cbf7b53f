use aws_sdk_dynamodbstreams as dynamodbstreams;

/// A shard of a DynamoDB stream together with the iterator to read it from.
///
/// The iterator is single-use. Reading records consumes the `Shard` and hands back a new one
/// carrying the next iterator, so a stale iterator can't be fed to the service twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    id: String,
    iterator: Option<String>,
    parent_shard_id: Option<String>,
}

impl Shard {
    pub fn new(shard: dynamodbstreams::types::Shard) -> Option<Self> {
        let dynamodbstreams::types::Shard {
            shard_id,
            parent_shard_id,
            ..
        } = shard;

        shard_id.map(|id| Self {
            id,
            iterator: None,
            parent_shard_id,
        })
    }

    /// A shard without an iterator yet.
    pub fn with_id(id: impl Into<String>, parent_shard_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            iterator: None,
            parent_shard_id,
        }
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn iterator(&self) -> Option<&str> {
        self.iterator.as_deref()
    }

    pub fn parent_shard_id(&self) -> Option<&str> {
        self.parent_shard_id.as_deref()
    }

    /// No iterator means the service has nothing more to hand out for this shard.
    pub fn is_closed(&self) -> bool {
        self.iterator.is_none()
    }

    pub fn set_iterator(self, iterator: Option<String>) -> Self {
        Self { iterator, ..self }
    }
}
