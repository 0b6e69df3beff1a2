// dqstudio-core/src/domain/rules/parameters.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Kind-specific configuration attached to a rule before it is resolved.
///
/// Tabular sources only ever produce text values; structured documents may
/// carry numbers, booleans and lists. Keys are normalised to lowercase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleParameters(BTreeMap<String, Value>);

impl RuleParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.trim().to_lowercase(), value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    fn lookup(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !is_blank(value))
    }

    /// First non-blank value among `aliases`, rendered as trimmed text.
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        self.lookup(aliases).and_then(value_to_text)
    }

    pub fn number(&self, aliases: &[&str]) -> Result<Option<f64>, String> {
        let Some(value) = self.lookup(aliases) else {
            return Ok(None);
        };
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(format!(
                "parameter '{}' must be a finite number, got {}",
                aliases[0], value
            )),
        }
    }

    pub fn count(&self, aliases: &[&str]) -> Result<Option<usize>, String> {
        let Some(value) = self.lookup(aliases) else {
            return Ok(None);
        };
        let count = match value {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        };
        count.map(Some).ok_or_else(|| {
            format!(
                "parameter '{}' must be a non-negative integer, got {}",
                aliases[0], value
            )
        })
    }

    pub fn flag(&self, aliases: &[&str]) -> Result<Option<bool>, String> {
        let Some(value) = self.lookup(aliases) else {
            return Ok(None);
        };
        match value {
            Value::Bool(b) => Ok(Some(*b)),
            Value::Number(n) if n.as_u64() == Some(1) => Ok(Some(true)),
            Value::Number(n) if n.as_u64() == Some(0) => Ok(Some(false)),
            Value::String(s) => parse_flag(s).map(Some).ok_or_else(|| {
                format!("parameter '{}' must be true or false, got '{}'", aliases[0], s)
            }),
            other => Err(format!(
                "parameter '{}' must be true or false, got {}",
                aliases[0], other
            )),
        }
    }

    /// A list parameter. Text values are split on `|`, `;` or `,` (first
    /// separator found wins) so spreadsheet cells can carry a list.
    pub fn list(&self, aliases: &[&str]) -> Option<Vec<String>> {
        match self.lookup(aliases)? {
            Value::Array(items) => Some(items.iter().filter_map(value_to_text).collect()),
            Value::String(s) => Some(split_list(s)),
            other => value_to_text(other).map(|v| vec![v]),
        }
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    let separator = ['|', ';', ',']
        .into_iter()
        .find(|sep| raw.contains(*sep))
        .unwrap_or(',');
    raw.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
