// dqstudio-core/src/infrastructure/adapters/mod.rs

pub mod datafusion;

pub use self::datafusion::{DataFusionSource, FileFormat};
