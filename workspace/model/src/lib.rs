pub mod dataset;
pub mod entities;

pub use dataset::{Dataset, ParseError, REQUIRED_COLUMNS, SalesRecord, month_ordinal, parse_dataset};

// Re-export tracing for use in this crate
pub use tracing;
