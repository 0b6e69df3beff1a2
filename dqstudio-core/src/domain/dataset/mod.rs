// dqstudio-core/src/domain/dataset/mod.rs

pub mod coerce;

use datafusion::arrow::array::{ArrayRef, StringArray};
use datafusion::arrow::compute::concat_batches;
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::domain::error::DomainError;

pub use coerce::{BlankPolicy, TextColumn};

/// Stable identity of each row: its position in the source dataset.
///
/// Carried alongside the data so outcomes can always be joined back to the
/// original records, whatever order they were produced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIndex(Vec<u64>);

impl RowIndex {
    pub fn sequential(len: usize) -> Self {
        Self((0..len as u64).collect())
    }

    pub fn positions(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The tabular dataset under assessment. Read-only for the engine.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    row_index: RowIndex,
}

impl Dataset {
    pub fn new(batch: RecordBatch) -> Self {
        let row_index = RowIndex::sequential(batch.num_rows());
        Self { batch, row_index }
    }

    /// Concatenates the batches produced by a reader into one dataset.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self, DomainError> {
        let batch = concat_batches(&schema, batches)
            .map_err(|e| DomainError::SchemaError(format!("Cannot assemble dataset: {}", e)))?;
        Ok(Self::new(batch))
    }

    /// Builds an all-text dataset, e.g. from an in-memory grid.
    pub fn from_text_columns(
        columns: Vec<(String, Vec<Option<String>>)>,
    ) -> Result<Self, DomainError> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, _)| Field::new(name, DataType::Utf8, true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        if columns.is_empty() {
            return Ok(Self::new(RecordBatch::new_empty(schema)));
        }
        let arrays: Vec<ArrayRef> = columns
            .into_iter()
            .map(|(_, values)| Arc::new(StringArray::from(values)) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(schema, arrays)
            .map_err(|e| DomainError::SchemaError(format!("Inconsistent columns: {}", e)))?;
        Ok(Self::new(batch))
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn row_index(&self) -> &RowIndex {
        &self.row_index
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use datafusion::arrow::array::Int64Array;

    #[test]
    fn test_text_columns() {
        let ds = Dataset::from_text_columns(vec![
            ("a".into(), vec![Some("x".into()), None]),
            ("b".into(), vec![Some("1".into()), Some("2".into())]),
        ])
        .unwrap();
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert!(ds.has_column("b"));
        assert!(!ds.has_column("c"));
        assert_eq!(ds.row_index().positions(), &[0, 1]);
    }

    #[test]
    fn test_ragged_columns_are_rejected() {
        let err = Dataset::from_text_columns(vec![
            ("a".into(), vec![Some("x".into())]),
            ("b".into(), vec![]),
        ]);
        assert!(matches!(err, Err(DomainError::SchemaError(_))));
    }

    #[test]
    fn test_from_batches_concatenates() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
        let b1 = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef],
        )
        .unwrap();
        let b2 = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int64Array::from(vec![3])) as ArrayRef],
        )
        .unwrap();
        let ds = Dataset::from_batches(schema, &[b1, b2]).unwrap();
        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.row_index().len(), 3);
    }
}
