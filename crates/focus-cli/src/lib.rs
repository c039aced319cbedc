//! CLI library components for the FOCUS converter.

pub mod logging;
pub mod pipeline;
