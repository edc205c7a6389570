//! Run outcome aggregation and the final report.
mod aggregator;
mod types;


pub use aggregator::Aggregator;
pub use types::{Outcome, RunReport, STATUS_OK};
