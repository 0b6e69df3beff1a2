// dqstudio-core/src/domain/rules/dimension.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Quality category used to group rules for aggregate scoring.
///
/// The four canonical dimensions are matched case-insensitively. Anything else
/// supplied by a rule source is kept verbatim as a custom dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    Completeness,
    Standardization,
    Uniqueness,
    Validation,
    Custom(String),
}

impl Dimension {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completeness => "Completeness",
            Self::Standardization => "Standardization",
            Self::Uniqueness => "Uniqueness",
            Self::Validation => "Validation",
            Self::Custom(name) => name,
        }
    }

    /// Parses a dimension tag. Returns `None` for blank input so callers can
    /// fall back on the default dimension of the rule kind.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let dimension = match trimmed.to_lowercase().as_str() {
            "completeness" => Self::Completeness,
            "standardization" | "standardisation" => Self::Standardization,
            "uniqueness" => Self::Uniqueness,
            "validation" | "validity" => Self::Validation,
            _ => Self::Custom(trimmed.to_string()),
        };
        Some(dimension)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Dimension {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Dimension::parse(&s).ok_or_else(|| serde::de::Error::custom("dimension cannot be blank"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_dimensions_are_case_insensitive() {
        assert_eq!(Dimension::parse(" completeness "), Some(Dimension::Completeness));
        assert_eq!(Dimension::parse("UNIQUENESS"), Some(Dimension::Uniqueness));
        assert_eq!(Dimension::parse("Standardisation"), Some(Dimension::Standardization));
    }

    #[test]
    fn test_custom_dimension_is_kept_verbatim() {
        assert_eq!(
            Dimension::parse("  Timeliness "),
            Some(Dimension::Custom("Timeliness".to_string()))
        );
        assert_eq!(Dimension::parse("   "), None);
    }

    #[test]
    fn test_display_and_parsing_consistency() {
        for dim in [
            Dimension::Completeness,
            Dimension::Standardization,
            Dimension::Uniqueness,
            Dimension::Validation,
            Dimension::Custom("Accuracy".into()),
        ] {
            assert_eq!(Dimension::parse(&dim.to_string()), Some(dim));
        }
    }
}
