use aws_sdk_dynamodb::types;

/// Type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    S,
    N,
    B,
}

impl From<ScalarType> for types::ScalarAttributeType {
    fn from(value: ScalarType) -> Self {
        match value {
            ScalarType::S => types::ScalarAttributeType::S,
            ScalarType::N => types::ScalarAttributeType::N,
            ScalarType::B => types::ScalarAttributeType::B,
        }
    }
}

/// What a change record carries besides the key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamView {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOldImages,
}

impl From<StreamView> for types::StreamViewType {
    fn from(value: StreamView) -> Self {
        match value {
            StreamView::KeysOnly => types::StreamViewType::KeysOnly,
            StreamView::NewImage => types::StreamViewType::NewImage,
            StreamView::OldImage => types::StreamViewType::OldImage,
            StreamView::NewAndOldImages => types::StreamViewType::NewAndOldImages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub scalar_type: ScalarType,
}

/// Primary key layout and stream setting of a table to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub stream: Option<StreamView>,
}

impl TableSchema {
    pub fn new(
        table_name: impl Into<String>,
        partition_key: impl Into<String>,
        scalar_type: ScalarType,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: KeyAttribute {
                name: partition_key.into(),
                scalar_type,
            },
            sort_key: None,
            stream: None,
        }
    }

    pub fn sort_key(self, name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            sort_key: Some(KeyAttribute {
                name: name.into(),
                scalar_type,
            }),
            ..self
        }
    }

    /// Enable the table's change stream.
    pub fn stream(self, view: StreamView) -> Self {
        Self {
            stream: Some(view),
            ..self
        }
    }

    /// Names of the key attributes, partition key first.
    pub fn key_names(&self) -> Vec<&str> {
        let mut names = vec![self.partition_key.name.as_str()];
        if let Some(sort_key) = self.sort_key.as_ref() {
            names.push(sort_key.name.as_str());
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
}

impl From<types::TableStatus> for TableStatus {
    fn from(value: types::TableStatus) -> Self {
        match value {
            types::TableStatus::Creating => Self::Creating,
            types::TableStatus::Active => Self::Active,
            types::TableStatus::Updating => Self::Updating,
            types::TableStatus::Deleting => Self::Deleting,
            other => Self::Other(other.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub table_name: String,
    pub status: TableStatus,
    pub latest_stream_arn: Option<String>,
    pub item_count: Option<i64>,
}

impl TableDescription {
    pub fn is_active(&self) -> bool {
        self.status == TableStatus::Active
    }
}

impl From<types::TableDescription> for TableDescription {
    fn from(value: types::TableDescription) -> Self {
        Self {
            table_name: value.table_name.unwrap_or_default(),
            status: value
                .table_status
                .map(TableStatus::from)
                .unwrap_or_else(|| TableStatus::Other("UNKNOWN".into())),
            latest_stream_arn: value.latest_stream_arn,
            item_count: value.item_count,
        }
    }
}
