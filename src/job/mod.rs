//! Job module: one pass over the input sheet
//!
//! This module ties the pieces together:
//! - Reading product URLs from the workbook
//! - Fetching prices through a bounded pool of workers
//! - Appending the timestamped results to the log sheet
//! - Summarizing the run

mod report;
mod runner;

pub use report::{print_fetch_report, print_report, JobReport};
pub use runner::{run_timestamp, JobRunner, JobSettings, LogRow, TIMESTAMP_FORMAT};
