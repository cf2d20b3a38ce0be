//! Pure aggregation over typed sales records.
//!
//! Nothing here performs I/O or talks to the database: the service layer
//! resolves a dataset, hands rows and a filter in, and gets the computed
//! aggregates back. Identical inputs always produce identical output.

pub mod metrics;

pub use metrics::{PREVIEW_ROWS, compute_metrics, filter_options, filter_records, preview};
