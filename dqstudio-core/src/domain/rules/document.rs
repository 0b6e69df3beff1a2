// dqstudio-core/src/domain/rules/document.rs
//
// Interchange format of a rulebook (reuse / audit). Serialized as YAML or JSON.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::parameters::RuleParameters;
use super::rulebook::Rulebook;

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulebookDocument {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Column name -> ordered rule specifications.
    #[serde(default)]
    pub columns: ColumnSpecs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combinations: Vec<CombinationSpec>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "RuleParameters::is_empty")]
    pub parameters: RuleParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationSpec {
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Column mapping that keeps document order (a plain map would sort or
/// shuffle columns, and execution order must follow the source).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSpecs(Vec<(String, Vec<RuleSpec>)>);

impl ColumnSpecs {
    pub fn push(&mut self, column: String, spec: RuleSpec) {
        match self.0.iter_mut().find(|(name, _)| *name == column) {
            Some((_, specs)) => specs.push(spec),
            None => self.0.push((column, vec![spec])),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleSpec])> {
        self.0
            .iter()
            .map(|(name, specs)| (name.as_str(), specs.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ColumnSpecs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, specs) in &self.0 {
            map.serialize_entry(column, specs)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnSpecs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ColumnSpecs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of column name to a list of rule specifications")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut specs = ColumnSpecs::default();
                while let Some((column, rules)) = access.next_entry::<String, Vec<RuleSpec>>()? {
                    for rule in rules {
                        specs.push(column.clone(), rule);
                    }
                }
                Ok(specs)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

impl From<&Rulebook> for RulebookDocument {
    fn from(rulebook: &Rulebook) -> Self {
        let mut columns = ColumnSpecs::default();
        for rule in rulebook.rules() {
            columns.push(
                rule.column.clone(),
                RuleSpec {
                    kind: rule.kind.name().to_string(),
                    parameters: rule.kind.parameters(),
                    dimension: Some(rule.dimension.to_string()),
                    message: Some(rule.message.clone()),
                },
            );
        }
        let combinations = rulebook
            .combinations()
            .iter()
            .map(|c| CombinationSpec {
                columns: c.columns.clone(),
                dimension: Some(c.dimension.to_string()),
                message: Some(c.message.clone()),
            })
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            columns,
            combinations,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::rules::kind::{FormatKind, RuleKind};
    use crate::domain::rules::rule::{CombinationRule, Rule};

    #[test]
    fn test_yaml_column_order_is_preserved() {
        let yaml = r#"
columns:
  zeta:
    - kind: not_null
  alpha:
    - kind: format
      parameters:
        format: email
      dimension: Validation
  mid:
    - kind: unique
combinations:
  - columns: [alpha, mid]
"#;
        let doc: RulebookDocument = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = doc.columns.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.combinations[0].columns, vec!["alpha", "mid"]);
    }

    #[test]
    fn test_json_export_snapshot() {
        let mut book = Rulebook::new();
        book.add_rule(Rule::new(
            "email",
            RuleKind::NotNull,
            None,
            Some("Email is required".into()),
        ));
        book.add_rule(Rule::new(
            "email",
            RuleKind::Format(FormatKind::Email),
            None,
            Some("Email is malformed".into()),
        ));
        book.add_combination(CombinationRule::new(
            vec!["first_name".into(), "last_name".into()],
            None,
            Some("Duplicate person".into()),
        ));

        let json = serde_json::to_string_pretty(&RulebookDocument::from(&book)).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "version": 1,
          "columns": {
            "email": [
              {
                "kind": "not_null",
                "dimension": "Completeness",
                "message": "Email is required"
              },
              {
                "kind": "format",
                "parameters": {
                  "format": "email"
                },
                "dimension": "Validation",
                "message": "Email is malformed"
              }
            ]
          },
          "combinations": [
            {
              "columns": [
                "first_name",
                "last_name"
              ],
              "dimension": "Uniqueness",
              "message": "Duplicate person"
            }
          ]
        }
        "#);
    }
}
