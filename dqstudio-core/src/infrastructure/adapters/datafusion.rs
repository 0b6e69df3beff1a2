// dqstudio-core/src/infrastructure/adapters/datafusion.rs

use async_trait::async_trait;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

// Hexagonal Imports
use crate::domain::dataset::Dataset;
use crate::error::DqError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::DatasetSource;

/// File layouts the adapter knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Parquet,
    NdJson,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, InfrastructureError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "parquet" | "pq" => Ok(Self::Parquet),
            "json" | "ndjson" | "jsonl" => Ok(Self::NdJson),
            _ => Err(InfrastructureError::UnsupportedFormat(format!(
                "{} (extension '{}')",
                path.display(),
                ext
            ))),
        }
    }
}

/// Reads datasets through a DataFusion session.
pub struct DataFusionSource {
    ctx: Arc<SessionContext>,
}

impl Default for DataFusionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFusionSource {
    pub fn new() -> Self {
        Self {
            ctx: Arc::new(SessionContext::new()),
        }
    }

    /// Delimited files keep their source text: every column is read as Utf8,
    /// so `1.50` or `2024-01-05 10:30:00` reach the rules unchanged. Numeric
    /// rules parse the text themselves.
    async fn read_delimited(
        &self,
        path: &str,
        ext: &str,
        delimiter: u8,
    ) -> Result<DataFrame, InfrastructureError> {
        let options = || {
            CsvReadOptions::new()
                .has_header(true)
                .delimiter(delimiter)
                .file_extension(ext)
        };
        let inferred = self.ctx.read_csv(path, options()).await?;
        let text_schema = Schema::new(
            inferred
                .schema()
                .as_arrow()
                .fields()
                .iter()
                .map(|field| Field::new(field.name(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );
        Ok(self.ctx.read_csv(path, options().schema(&text_schema)).await?)
    }

    async fn read(
        &self,
        path: &str,
        ext: &str,
        format: FileFormat,
    ) -> Result<DataFrame, InfrastructureError> {
        let df = match format {
            FileFormat::Csv => self.read_delimited(path, ext, b',').await?,
            FileFormat::Tsv => self.read_delimited(path, ext, b'\t').await?,
            FileFormat::Parquet => {
                self.ctx
                    .read_parquet(
                        path,
                        ParquetReadOptions {
                            file_extension: ext,
                            ..Default::default()
                        },
                    )
                    .await?
            }
            FileFormat::NdJson => {
                self.ctx
                    .read_json(path, NdJsonReadOptions::default().file_extension(ext))
                    .await?
            }
        };
        Ok(df)
    }
}

#[async_trait]
impl DatasetSource for DataFusionSource {
    #[instrument(skip(self), fields(engine = "datafusion"))]
    async fn load(&self, path: &Path) -> Result<Dataset, DqError> {
        if !path.is_file() {
            return Err(InfrastructureError::FileNotFound(path.display().to_string()).into());
        }
        let format = FileFormat::from_path(path)?;
        let path_str = path.to_str().ok_or_else(|| {
            DqError::InternalError(format!("Invalid path for dataset: {:?}", path))
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let df = self.read(path_str, &ext, format).await?;
        let schema: Arc<Schema> = Arc::new(df.schema().as_arrow().clone());
        let batches = df.collect().await?;
        let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);

        let dataset = Dataset::from_batches(schema, &batches)?;
        info!(
            rows = dataset.num_rows(),
            columns = dataset.column_names().len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    fn engine_name(&self) -> &str {
        "datafusion"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::dataset::{BlankPolicy, TextColumn};
    use crate::domain::engine::execute_all_rules;
    use crate::domain::rules::{Rule, RuleKind, Rulebook, StandardKind, TextPattern};
    use anyhow::Result;
    use std::fs;

    #[tokio::test]
    async fn test_load_csv() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("customers.csv");
        fs::write(&path, "id,email,age\n1,a@x.com,30\n2,,41\n3,bad,\n")?;

        let dataset = DataFusionSource::new().load(&path).await?;
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.column_names(), vec!["id", "email", "age"]);
        assert_eq!(dataset.row_index().positions(), &[0, 1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delimited_cells_keep_source_text() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("orders.csv");
        fs::write(
            &path,
            "ordered_at,amount\n2024-01-05 10:30:00,1.50\n2024-02-11 08:00:00,12.00\n",
        )?;
        let dataset = DataFusionSource::new().load(&path).await?;

        let blanks = BlankPolicy::default();
        let amounts = TextColumn::from_array(dataset.column("amount").unwrap(), &blanks)?;
        assert_eq!(amounts.value(0), Some("1.50"));
        let stamps = TextColumn::from_array(dataset.column("ordered_at").unwrap(), &blanks)?;
        assert_eq!(stamps.value(0), Some("2024-01-05 10:30:00"));

        let mut book = Rulebook::new();
        book.add_rule(Rule::new(
            "ordered_at",
            RuleKind::Standard(StandardKind::Date {
                date_format: "%Y-%m-%d %H:%M:%S".into(),
            }),
            None,
            None,
        ));
        book.add_rule(Rule::new(
            "amount",
            RuleKind::Pattern(TextPattern::full_match(r"\d+\.\d{2}")?),
            None,
            None,
        ));
        book.add_rule(Rule::new(
            "amount",
            RuleKind::Range {
                min: Some(1.0),
                max: Some(20.0),
            },
            None,
            None,
        ));
        let outcome = execute_all_rules(&dataset, &book)?;
        assert_eq!(outcome.evaluation_totals(), (6, 6));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_tsv_and_ndjson() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let tsv = tmp.path().join("codes.tsv");
        fs::write(&tsv, "code\tlabel\nA1\tfirst\nB2\tsecond\n")?;
        let dataset = DataFusionSource::new().load(&tsv).await?;
        assert_eq!(dataset.column_names(), vec!["code", "label"]);
        assert_eq!(dataset.num_rows(), 2);

        let json = tmp.path().join("events.jsonl");
        fs::write(&json, "{\"kind\":\"a\",\"n\":1}\n{\"kind\":\"b\",\"n\":2}\n")?;
        let dataset = DataFusionSource::new().load(&json).await?;
        assert_eq!(dataset.num_rows(), 2);
        assert!(dataset.has_column("kind"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_and_missing_files() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let xlsx = tmp.path().join("book.xlsx");
        fs::write(&xlsx, "not really a workbook")?;

        let source = DataFusionSource::new();
        let err = source.load(&xlsx).await.unwrap_err();
        assert!(matches!(
            err,
            DqError::Infrastructure(InfrastructureError::UnsupportedFormat(_))
        ));

        let err = source.load(&tmp.path().join("absent.csv")).await.unwrap_err();
        assert!(matches!(
            err,
            DqError::Infrastructure(InfrastructureError::FileNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.CSV")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.parquet")).unwrap(), FileFormat::Parquet);
        assert!(FileFormat::from_path(Path::new("a")).is_err());
    }
}
