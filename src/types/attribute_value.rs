use super::super::error::Error;

use aws_sdk_dynamodb::{primitives::Blob, types::AttributeValue as DbValue};
use aws_sdk_dynamodbstreams::{primitives::Blob as StreamBlob, types::AttributeValue as StreamValue};
use std::{collections::HashMap, fmt};

/// A set of named attributes, either a whole item or just its key attributes.
pub type Item = HashMap<String, AttributeValue>;

/// A DynamoDB attribute value with an explicit type tag.
///
/// Numbers keep the decimal string the service uses on the wire, so no precision is lost
/// between reading and writing them back.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null(bool),
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Build a number attribute from anything that prints as a number.
    pub fn number(n: impl fmt::Display) -> Self {
        Self::N(n.to_string())
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n.as_str()),
            _ => None,
        }
    }

    /// Parse a number attribute as `i64`. Returns `None` for other types or fractional numbers.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_n().and_then(|n| n.parse().ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_n().and_then(|n| n.parse().ok())
    }

    /// The type tag DynamoDB uses for this value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AttributeValue {
                fn from(value: $t) -> Self {
                    Self::number(value)
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize, f64);

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S(v) => write!(f, "{v:?}"),
            Self::N(v) => write!(f, "{v}"),
            Self::B(v) => write!(f, "<{} bytes>", v.len()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null(_) => write!(f, "null"),
            Self::Ss(v) => write!(f, "{v:?}"),
            Self::Ns(v) => write!(f, "[{}]", v.join(", ")),
            Self::Bs(v) => write!(f, "<{} binaries>", v.len()),
            Self::L(v) => {
                let values = v.iter().map(|v| v.to_string()).collect::<Vec<String>>();
                write!(f, "[{}]", values.join(", "))
            }
            Self::M(v) => write!(f, "{}", display_item(v)),
        }
    }
}

/// Render an item as `{a: 1, b: "x"}` with attribute names sorted.
pub fn display_item(item: &Item) -> String {
    let mut names = item.keys().collect::<Vec<&String>>();
    names.sort();

    let fields = names
        .into_iter()
        .map(|name| format!("{name}: {}", item[name]))
        .collect::<Vec<String>>();

    format!("{{{}}}", fields.join(", "))
}

impl From<AttributeValue> for DbValue {
    fn from(value: AttributeValue) -> DbValue {
        match value {
            AttributeValue::S(v) => DbValue::S(v),
            AttributeValue::N(v) => DbValue::N(v),
            AttributeValue::B(v) => DbValue::B(Blob::new(v)),
            AttributeValue::Bool(v) => DbValue::Bool(v),
            AttributeValue::Null(v) => DbValue::Null(v),
            AttributeValue::Ss(v) => DbValue::Ss(v),
            AttributeValue::Ns(v) => DbValue::Ns(v),
            AttributeValue::Bs(v) => DbValue::Bs(v.into_iter().map(Blob::new).collect()),
            AttributeValue::L(v) => DbValue::L(v.into_iter().map(DbValue::from).collect()),
            AttributeValue::M(v) => DbValue::M(into_sdk_item(v)),
        }
    }
}

impl TryFrom<DbValue> for AttributeValue {
    type Error = Error;

    fn try_from(value: DbValue) -> Result<Self, Self::Error> {
        let value = match value {
            DbValue::S(v) => AttributeValue::S(v),
            DbValue::N(v) => AttributeValue::N(v),
            DbValue::B(v) => AttributeValue::B(v.into_inner()),
            DbValue::Bool(v) => AttributeValue::Bool(v),
            DbValue::Null(v) => AttributeValue::Null(v),
            DbValue::Ss(v) => AttributeValue::Ss(v),
            DbValue::Ns(v) => AttributeValue::Ns(v),
            DbValue::Bs(v) => AttributeValue::Bs(v.into_iter().map(Blob::into_inner).collect()),
            DbValue::L(v) => AttributeValue::L(
                v.into_iter()
                    .map(AttributeValue::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            DbValue::M(v) => AttributeValue::M(from_sdk_item(v)?),
            other => return Err(Error::UnsupportedAttributeValue(format!("{other:?}"))),
        };
        Ok(value)
    }
}

impl TryFrom<StreamValue> for AttributeValue {
    type Error = Error;

    fn try_from(value: StreamValue) -> Result<Self, Self::Error> {
        let value = match value {
            StreamValue::S(v) => AttributeValue::S(v),
            StreamValue::N(v) => AttributeValue::N(v),
            StreamValue::B(v) => AttributeValue::B(v.into_inner()),
            StreamValue::Bool(v) => AttributeValue::Bool(v),
            StreamValue::Null(v) => AttributeValue::Null(v),
            StreamValue::Ss(v) => AttributeValue::Ss(v),
            StreamValue::Ns(v) => AttributeValue::Ns(v),
            StreamValue::Bs(v) => {
                AttributeValue::Bs(v.into_iter().map(StreamBlob::into_inner).collect())
            }
            StreamValue::L(v) => AttributeValue::L(
                v.into_iter()
                    .map(AttributeValue::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            StreamValue::M(v) => AttributeValue::M(from_stream_item(v)?),
            other => return Err(Error::UnsupportedAttributeValue(format!("{other:?}"))),
        };
        Ok(value)
    }
}

pub(crate) fn into_sdk_item(item: Item) -> HashMap<String, DbValue> {
    item.into_iter()
        .map(|(name, value)| (name, DbValue::from(value)))
        .collect()
}

pub(crate) fn from_sdk_item(item: HashMap<String, DbValue>) -> Result<Item, Error> {
    item.into_iter()
        .map(|(name, value)| AttributeValue::try_from(value).map(|value| (name, value)))
        .collect()
}

pub(crate) fn from_stream_item(item: HashMap<String, StreamValue>) -> Result<Item, Error> {
    item.into_iter()
        .map(|(name, value)| AttributeValue::try_from(value).map(|value| (name, value)))
        .collect()
}
