use super::AttributeValue;

/// Comparison operators accepted in condition, filter and key condition expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A predicate over the attributes of an item.
///
/// Used as the condition of conditional writes, as the filter of queries and scans, and as the
/// sort key condition of queries. Attribute names are top-level names; placeholders are
/// generated when the condition is rendered, so reserved words need no escaping.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    AttributeExists(String),
    AttributeNotExists(String),
    Compare(String, Comparator, AttributeValue),
    BeginsWith(String, AttributeValue),
    Contains(String, AttributeValue),
    Between(String, AttributeValue, AttributeValue),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn exists(name: impl Into<String>) -> Self {
        Self::AttributeExists(name.into())
    }

    pub fn not_exists(name: impl Into<String>) -> Self {
        Self::AttributeNotExists(name.into())
    }

    pub fn eq(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::Compare(name.into(), Comparator::Eq, value.into())
    }

    pub fn compare(
        name: impl Into<String>,
        comparator: Comparator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self::Compare(name.into(), comparator, value.into())
    }

    pub fn begins_with(name: impl Into<String>, prefix: impl Into<AttributeValue>) -> Self {
        Self::BeginsWith(name.into(), prefix.into())
    }

    pub fn contains(name: impl Into<String>, operand: impl Into<AttributeValue>) -> Self {
        Self::Contains(name.into(), operand.into())
    }

    pub fn between(
        name: impl Into<String>,
        low: impl Into<AttributeValue>,
        high: impl Into<AttributeValue>,
    ) -> Self {
        Self::Between(name.into(), low.into(), high.into())
    }

    pub fn and(self, other: Condition) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Condition) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}
