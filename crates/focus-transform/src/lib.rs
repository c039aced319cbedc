//! Compile provider conversion plans into lazy transformations and run them
//! batch by batch.
//!
//! - **registry**: rule kind to compiler table
//! - **compilers**: per-kind expression and SQL compilers
//! - **plan**: [`CompiledPlan::build`], the side-effect free plan builder
//! - **executor**: [`CompiledPlan::apply`] and [`CompiledPlan::convert`]
//! - **graph**: column dependency graph and its DOT rendering

pub mod compilers;
pub mod converter;
pub mod error;
pub mod executor;
pub mod graph;
pub mod plan;
pub mod registry;
pub mod sql_refs;

pub use compilers::{CompiledExpr, SQL_TABLE_NAME, SqlStatement};
pub use converter::FocusConverter;
pub use error::{BoxError, ConvertError, Result};
pub use executor::{AppliedBatch, BatchExporter, ConversionSummary};
pub use graph::{DependencyEdge, DependencyGraph, DotRenderer, GraphRenderer};
pub use plan::{CompiledPlan, PROVIDER_COLUMN};
pub use registry::{ExprCompiler, RuleCompiler, RuleRegistry, SqlCompiler};
