// dqstudio-core/src/domain/dataset/coerce.rs
//
// Typed coercions shared by every rule kind. Each one has the same fallback:
// a value that cannot be coerced yields `None`, and the rule fails that row.

use chrono::{NaiveDate, NaiveDateTime};
use datafusion::arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::DataType;
use datafusion::arrow::error::ArrowError;
use datafusion::arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::HashSet;

/// Placeholders that spreadsheet and dataframe exports use for "no value".
pub const DEFAULT_BLANK_SENTINELS: &[&str] = &["nan", "none", "null", "n/a", "na", "nat", "<na>"];

/// Decides which text values count as missing.
#[derive(Debug, Clone)]
pub struct BlankPolicy {
    sentinels: HashSet<String>,
}

impl Default for BlankPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BLANK_SENTINELS.iter().copied())
    }
}

impl BlankPolicy {
    pub fn new<I, S>(sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            sentinels: sentinels
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn is_blank(&self, text: &str) -> bool {
        let trimmed = text.trim();
        trimmed.is_empty() || self.sentinels.contains(&trimmed.to_lowercase())
    }
}

/// A column rendered as text once, with its missing-value mask.
#[derive(Debug, Clone)]
pub struct TextColumn {
    values: StringArray,
    missing: Vec<bool>,
}

impl TextColumn {
    pub fn from_array(array: &ArrayRef, blanks: &BlankPolicy) -> Result<Self, ArrowError> {
        let values = to_text(array)?;
        let missing = (0..values.len())
            .map(|i| values.is_null(i) || blanks.is_blank(values.value(i)))
            .collect();
        Ok(Self { values, missing })
    }

    pub fn len(&self) -> usize {
        self.missing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_missing(&self, row: usize) -> bool {
        self.missing[row]
    }

    /// The text of a row, or `None` when the value is missing.
    pub fn value(&self, row: usize) -> Option<&str> {
        if self.missing[row] {
            None
        } else {
            Some(self.values.value(row))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        (0..self.len()).map(|row| self.value(row))
    }
}

/// Casts any Arrow array to Utf8. Types without a cast kernel are rendered
/// with the display formatter instead.
fn to_text(array: &ArrayRef) -> Result<StringArray, ArrowError> {
    if let Ok(casted) = cast(array, &DataType::Utf8) {
        if let Some(strings) = casted.as_any().downcast_ref::<StringArray>() {
            return Ok(strings.clone());
        }
    }
    let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
    let rendered: Vec<Option<String>> = (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| formatter.value(i).to_string()))
        .collect();
    Ok(StringArray::from(rendered))
}

/// Numeric view of a column. Numeric Arrow types go through one cast kernel;
/// text is trimmed and parsed row by row.
pub fn to_number(array: &ArrayRef, text: &TextColumn) -> Result<Vec<Option<f64>>, ArrowError> {
    if array.data_type().is_numeric() {
        let casted = cast(array, &DataType::Float64)?;
        if let Some(floats) = casted.as_any().downcast_ref::<Float64Array>() {
            return Ok(floats
                .iter()
                .map(|v| v.filter(|n| n.is_finite()))
                .collect());
        }
    }
    Ok(text.iter().map(|v| v.and_then(parse_number)).collect())
}

pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses with a strftime pattern, trying a date-time first then a date.
pub fn to_date(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, pattern)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use datafusion::arrow::array::{BooleanArray, Date32Array, Int64Array};
    use std::sync::Arc;

    #[test]
    fn test_blank_policy() {
        let policy = BlankPolicy::default();
        assert!(policy.is_blank(""));
        assert!(policy.is_blank("   "));
        assert!(policy.is_blank(" NaN "));
        assert!(policy.is_blank("N/A"));
        assert!(!policy.is_blank("0"));
        assert!(!policy.is_blank("-"));

        let custom = BlankPolicy::new(["-", "?"]);
        assert!(custom.is_blank("-"));
        assert!(!custom.is_blank("null"));
    }

    #[test]
    fn test_text_column_missing_mask() {
        let array: ArrayRef = Arc::new(StringArray::from(vec![
            Some("a"),
            None,
            Some(" "),
            Some("null"),
        ]));
        let text = TextColumn::from_array(&array, &BlankPolicy::default()).unwrap();
        let values: Vec<Option<&str>> = text.iter().collect();
        assert_eq!(values, vec![Some("a"), None, None, None]);
    }

    #[test]
    fn test_text_from_typed_arrays() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(7), None]));
        let text = TextColumn::from_array(&ints, &BlankPolicy::default()).unwrap();
        assert_eq!(text.value(0), Some("7"));
        assert!(text.is_missing(1));

        let bools: ArrayRef = Arc::new(BooleanArray::from(vec![true]));
        let text = TextColumn::from_array(&bools, &BlankPolicy::default()).unwrap();
        assert_eq!(text.value(0), Some("true"));

        let dates: ArrayRef = Arc::new(Date32Array::from(vec![19_723]));
        let text = TextColumn::from_array(&dates, &BlankPolicy::default()).unwrap();
        assert_eq!(text.value(0), Some("2024-01-01"));
    }

    #[test]
    fn test_numbers_from_text_and_numeric_arrays() {
        let strings: ArrayRef = Arc::new(StringArray::from(vec![
            Some(" 12.5 "),
            Some("abc"),
            Some("inf"),
            None,
        ]));
        let text = TextColumn::from_array(&strings, &BlankPolicy::default()).unwrap();
        assert_eq!(
            to_number(&strings, &text).unwrap(),
            vec![Some(12.5), None, None, None]
        );

        let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(3), None]));
        let text = TextColumn::from_array(&ints, &BlankPolicy::default()).unwrap();
        assert_eq!(to_number(&ints, &text).unwrap(), vec![Some(3.0), None]);
    }

    #[test]
    fn test_dates() {
        assert!(to_date("2024-02-29", "%Y-%m-%d").is_some());
        assert!(to_date("2023-02-29", "%Y-%m-%d").is_none());
        assert!(to_date("29/02/2024 10:30", "%d/%m/%Y %H:%M").is_some());
        assert!(to_date("not a date", "%Y-%m-%d").is_none());
    }
}
