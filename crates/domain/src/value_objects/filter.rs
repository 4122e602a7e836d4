//! Creature filters
//!
//! A `RootFilter` is sent to the server as the `filter` query parameter of
//! the character listing, and can also be evaluated locally against a
//! creature. Each rule reads `<creature field> <operator> <value>`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::Creature;
use crate::error::DomainError;
use crate::value_objects::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicType {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Initiative,
    Name,
    Role,
    HitPoints,
    Conditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "eq")]
    Equals,
    #[serde(rename = "neq")]
    NotEquals,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "lte")]
    LessThanOrEqual,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    DoesNotContain,
    #[serde(rename = "startswith")]
    StartsWith,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: FilterField,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: FilterField, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }

    pub fn evaluate(&self, creature: &Creature) -> Result<bool, DomainError> {
        match self.field {
            FilterField::Initiative => {
                compare_number(self.operator, f64::from(creature.initiative), &self.value)
            }
            FilterField::HitPoints => compare_number(
                self.operator,
                f64::from(creature.hit_points.current()),
                &self.value,
            ),
            FilterField::Name => compare_text(self.operator, &creature.name, &self.value),
            FilterField::Role => compare_text(self.operator, creature.role.as_str(), &self.value),
            FilterField::Conditions => {
                compare_list(self.operator, &creature.conditions, &self.value)
            }
        }
    }
}

/// A set of rules combined with one logic operator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RootFilter {
    pub filters: Vec<Filter>,
    pub logic: LogicType,
}

impl RootFilter {
    pub fn all(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            logic: LogicType::And,
        }
    }

    pub fn any(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            logic: LogicType::Or,
        }
    }

    /// Connected player characters only; used for the recipient roster.
    pub fn players() -> Self {
        Self::all(vec![Filter::new(
            FilterField::Role,
            FilterOperator::Equals,
            Role::Player.as_str(),
        )])
    }

    /// An empty filter matches everything.
    pub fn evaluate(&self, creature: &Creature) -> Result<bool, DomainError> {
        if self.filters.is_empty() {
            return Ok(true);
        }

        match self.logic {
            LogicType::And => {
                for filter in &self.filters {
                    if !filter.evaluate(creature)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicType::Or => {
                for filter in &self.filters {
                    if filter.evaluate(creature)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Like `evaluate`, treating an inapplicable rule as a non-match.
    pub fn matches(&self, creature: &Creature) -> bool {
        self.evaluate(creature).unwrap_or(false)
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn compare_number(op: FilterOperator, actual: f64, expected: &Value) -> Result<bool, DomainError> {
    let expected = number_of(expected)
        .ok_or_else(|| DomainError::filter(format!("expected a number, got {}", expected)))?;
    Ok(match op {
        FilterOperator::Equals => actual == expected,
        FilterOperator::NotEquals => actual != expected,
        FilterOperator::LessThan => actual < expected,
        FilterOperator::LessThanOrEqual => actual <= expected,
        FilterOperator::GreaterThan => actual > expected,
        FilterOperator::GreaterThanOrEqual => actual >= expected,
        FilterOperator::Contains | FilterOperator::DoesNotContain | FilterOperator::StartsWith => {
            return Err(DomainError::filter(format!(
                "{:?} does not apply to numeric fields",
                op
            )))
        }
    })
}

fn compare_text(op: FilterOperator, actual: &str, expected: &Value) -> Result<bool, DomainError> {
    let expected = expected
        .as_str()
        .ok_or_else(|| DomainError::filter(format!("expected a string, got {}", expected)))?;
    Ok(match op {
        FilterOperator::Equals => actual == expected,
        FilterOperator::NotEquals => actual != expected,
        FilterOperator::LessThan => actual < expected,
        FilterOperator::LessThanOrEqual => actual <= expected,
        FilterOperator::GreaterThan => actual > expected,
        FilterOperator::GreaterThanOrEqual => actual >= expected,
        FilterOperator::Contains => actual.contains(expected),
        FilterOperator::DoesNotContain => !actual.contains(expected),
        FilterOperator::StartsWith => actual.starts_with(expected),
    })
}

fn compare_list(
    op: FilterOperator,
    actual: &[String],
    expected: &Value,
) -> Result<bool, DomainError> {
    match (op, expected) {
        (FilterOperator::Contains, Value::String(item)) => Ok(actual.contains(item)),
        (FilterOperator::DoesNotContain, Value::String(item)) => Ok(!actual.contains(item)),
        (FilterOperator::Equals | FilterOperator::NotEquals, Value::Array(items)) => {
            let same = items.len() == actual.len()
                && items
                    .iter()
                    .zip(actual)
                    .all(|(item, held)| item.as_str() == Some(held.as_str()));
            Ok(same == (op == FilterOperator::Equals))
        }
        _ => Err(DomainError::filter(format!(
            "{:?} with {} does not apply to conditions",
            op, expected
        ))),
    }
}
