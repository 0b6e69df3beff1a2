// dqstudio-core/src/ports/source.rs

// What the engine needs from the outside world: a dataset, already parsed.
// Where it comes from (CSV on disk, Parquet, an in-memory grid) is the
// adapter's business.

use crate::domain::dataset::Dataset;
use crate::error::DqError;
use async_trait::async_trait;
use std::path::Path;

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Reads a whole file into one dataset.
    async fn load(&self, path: &Path) -> Result<Dataset, DqError>;

    /// Short name of the backing engine, for logs.
    fn engine_name(&self) -> &str;
}
