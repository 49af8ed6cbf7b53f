use super::{AttributeValue, Condition, Item};

/// Write a whole item, optionally only if `condition` holds for the stored item.
#[derive(Debug, Clone, PartialEq)]
pub struct PutItem {
    pub table_name: String,
    pub item: Item,
    pub condition: Option<Condition>,
}

impl PutItem {
    pub fn new(table_name: impl Into<String>, item: Item) -> Self {
        Self {
            table_name: table_name.into(),
            item,
            condition: None,
        }
    }

    pub fn condition(self, condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..self
        }
    }
}

/// Read one item by its full primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct GetItem {
    pub table_name: String,
    pub key: Item,
    pub consistent_read: bool,
}

impl GetItem {
    pub fn new(table_name: impl Into<String>, key: Item) -> Self {
        Self {
            table_name: table_name.into(),
            key,
            consistent_read: false,
        }
    }

    /// Ask for a strongly consistent read.
    pub fn consistent(self) -> Self {
        Self {
            consistent_read: true,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    Set(String, AttributeValue),
    Remove(String),
}

/// Change some attributes of one item. The service creates the item when it does not exist
/// unless the condition says otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItem {
    pub table_name: String,
    pub key: Item,
    pub actions: Vec<UpdateAction>,
    pub condition: Option<Condition>,
}

impl UpdateItem {
    pub fn new(table_name: impl Into<String>, key: Item) -> Self {
        Self {
            table_name: table_name.into(),
            key,
            actions: vec![],
            condition: None,
        }
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.actions
            .push(UpdateAction::Set(name.into(), value.into()));
        self
    }

    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.actions.push(UpdateAction::Remove(name.into()));
        self
    }

    pub fn condition(self, condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItem {
    pub table_name: String,
    pub key: Item,
    pub condition: Option<Condition>,
}

impl DeleteItem {
    pub fn new(table_name: impl Into<String>, key: Item) -> Self {
        Self {
            table_name: table_name.into(),
            key,
            condition: None,
        }
    }

    pub fn condition(self, condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..self
        }
    }
}

/// Read the items sharing one partition key, optionally narrowed by a sort key condition and a
/// filter. The filter runs after `limit` is applied, as it does in the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table_name: String,
    pub partition_key: (String, AttributeValue),
    pub sort_key: Option<Condition>,
    pub filter: Option<Condition>,
    pub consistent_read: bool,
    pub limit: Option<i32>,
}

impl Query {
    pub fn new(
        table_name: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: (name.into(), value.into()),
            sort_key: None,
            filter: None,
            consistent_read: false,
            limit: None,
        }
    }

    pub fn sort_key(self, condition: Condition) -> Self {
        Self {
            sort_key: Some(condition),
            ..self
        }
    }

    pub fn filter(self, condition: Condition) -> Self {
        Self {
            filter: Some(condition),
            ..self
        }
    }

    pub fn consistent(self) -> Self {
        Self {
            consistent_read: true,
            ..self
        }
    }

    pub fn limit(self, limit: i32) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    /// The key condition covering the partition key and, when set, the sort key.
    pub fn key_condition(&self) -> Condition {
        let (name, value) = &self.partition_key;
        let partition = Condition::eq(name.as_str(), value.clone());

        match &self.sort_key {
            Some(sort_key) => partition.and(sort_key.clone()),
            None => partition,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub table_name: String,
    pub filter: Option<Condition>,
    pub limit: Option<i32>,
}

impl Scan {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            filter: None,
            limit: None,
        }
    }

    pub fn filter(self, condition: Condition) -> Self {
        Self {
            filter: Some(condition),
            ..self
        }
    }

    pub fn limit(self, limit: i32) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }
}

/// One action of a write transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactItem {
    /// Require `condition` to hold for the item without writing it.
    ConditionCheck {
        table_name: String,
        key: Item,
        condition: Condition,
    },
    Put(PutItem),
    Update(UpdateItem),
    Delete(DeleteItem),
}

impl TransactItem {
    pub fn table_name(&self) -> &str {
        match self {
            Self::ConditionCheck { table_name, .. } => table_name,
            Self::Put(put) => &put.table_name,
            Self::Update(update) => &update.table_name,
            Self::Delete(delete) => &delete.table_name,
        }
    }
}
