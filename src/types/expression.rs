use super::{
    attribute_value::into_sdk_item, request::UpdateAction, AttributeValue, Condition, Item,
};

use aws_sdk_dynamodb::types::AttributeValue as DbValue;
use std::collections::HashMap;

/// Placeholders collected while rendering one request's expressions.
///
/// Every attribute name becomes `#nX` and every operand becomes `:vX`. A name used twice in the
/// same request gets the same placeholder; operands never share one.
#[derive(Debug, Default)]
pub struct Expression {
    names: HashMap<String, String>,
    values: Item,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for an attribute name.
    pub fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, name)| *name == attribute) {
            return placeholder.clone();
        }

        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    /// Placeholder for an operand.
    pub fn value(&mut self, value: &AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value.clone());
        placeholder
    }

    pub fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::AttributeExists(name) => {
                format!("attribute_exists({})", self.name(name))
            }
            Condition::AttributeNotExists(name) => {
                format!("attribute_not_exists({})", self.name(name))
            }
            Condition::Compare(name, comparator, value) => {
                let name = self.name(name);
                let value = self.value(value);
                format!("{name} {} {value}", comparator.symbol())
            }
            Condition::BeginsWith(name, value) => {
                let name = self.name(name);
                let value = self.value(value);
                format!("begins_with({name}, {value})")
            }
            Condition::Contains(name, value) => {
                let name = self.name(name);
                let value = self.value(value);
                format!("contains({name}, {value})")
            }
            Condition::Between(name, low, high) => {
                let name = self.name(name);
                let low = self.value(low);
                let high = self.value(high);
                format!("{name} BETWEEN {low} AND {high}")
            }
            Condition::And(left, right) => {
                let left = self.condition(left);
                let right = self.condition(right);
                format!("({left}) AND ({right})")
            }
            Condition::Or(left, right) => {
                let left = self.condition(left);
                let right = self.condition(right);
                format!("({left}) OR ({right})")
            }
            Condition::Not(inner) => format!("NOT ({})", self.condition(inner)),
        }
    }

    /// Render `SET a = :v, b = :v REMOVE c`. Returns an empty string for no actions.
    pub fn update(&mut self, actions: &[UpdateAction]) -> String {
        let mut sets: Vec<String> = vec![];
        let mut removes: Vec<String> = vec![];

        for action in actions {
            match action {
                UpdateAction::Set(name, value) => {
                    let name = self.name(name);
                    let value = self.value(value);
                    sets.push(format!("{name} = {value}"));
                }
                UpdateAction::Remove(name) => {
                    removes.push(self.name(name));
                }
            }
        }

        let mut clauses: Vec<String> = vec![];
        if !sets.is_empty() {
            clauses.push(format!("SET {}", sets.join(", ")));
        }
        if !removes.is_empty() {
            clauses.push(format!("REMOVE {}", removes.join(", ")));
        }
        clauses.join(" ")
    }

    /// Name and value maps ready for the SDK. The service rejects empty maps, so those are `None`.
    pub fn into_parts(
        self,
    ) -> (
        Option<HashMap<String, String>>,
        Option<HashMap<String, DbValue>>,
    ) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then(|| into_sdk_item(self.values));
        (names, values)
    }
}
