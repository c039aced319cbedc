//! Inputs of a FOCUS conversion: provider rule plans from YAML and lazy
//! batches of raw billing data.

pub mod error;
pub mod loader;
pub mod plans;

pub use error::{IngestError, Result};
pub use loader::{
    Batches, DEFAULT_BATCH_SIZE, DataFormat, DataLoader, LoaderOptions, MAX_BATCH_SIZE, ParquetLayout,
};
pub use plans::{
    list_providers, load_provider_plan, load_provider_plans, load_rule_file, order_from_file_name,
};
