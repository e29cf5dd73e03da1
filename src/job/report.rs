//! Job summaries
//!
//! This module provides the structured result of a job run and its
//! presentation on stdout.

use crate::fetch::{FetchReport, FetchState};
use crate::job::LogRow;
use crate::rotation::ProviderSnapshot;

/// Result of one job run
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Timestamp written on every row of this run
    pub timestamp: String,

    /// One report per URL, in completion order
    pub fetches: Vec<FetchReport>,

    /// Rows that were (or would have been) appended to the log sheet
    pub rows: Vec<LogRow>,

    /// Whether the rows reached the log sheet
    pub logged: bool,

    /// Provider health at the end of the run
    pub providers: Vec<ProviderSnapshot>,
}

impl JobReport {
    /// A run that found nothing to do
    pub fn empty(timestamp: String, providers: Vec<ProviderSnapshot>) -> Self {
        Self {
            timestamp,
            fetches: Vec::new(),
            rows: Vec::new(),
            logged: false,
            providers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fetches.is_empty()
    }

    /// Number of URLs that ended in the same kind of state as `state`
    ///
    /// Prices are ignored: any `Success` matches `Success(_)`.
    pub fn count(&self, state: FetchState) -> usize {
        self.fetches
            .iter()
            .filter(|f| f.state.as_str() == state.as_str())
            .count()
    }

    pub fn success_count(&self) -> usize {
        self.fetches.iter().filter(|f| f.state.is_success()).count()
    }
}

/// Prints a job report to stdout
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &JobReport) {
    println!("=== Price Watch Run {} ===\n", report.timestamp);

    if report.is_empty() {
        println!("No URLs to process.");
        return;
    }

    let total = report.fetches.len();
    println!("Overview:");
    println!("  URLs processed: {}", total);
    println!(
        "  Prices found: {} ({:.1}%)",
        report.success_count(),
        report.success_count() as f64 / total as f64 * 100.0
    );
    println!(
        "  Logged: {}",
        if report.logged { "yes" } else { "NO (append failed)" }
    );
    println!();

    println!("Outcomes:");
    for name in FetchState::terminal_names() {
        let count = report
            .fetches
            .iter()
            .filter(|f| f.state.as_str() == name)
            .count();
        if count > 0 {
            println!("  {}: {}", name, count);
        }
    }
    println!();

    println!("Results:");
    for row in &report.rows {
        match row.price {
            Some(price) => println!("  {:>10.2}  {}", price, row.url),
            None => println!("  {:>10}  {}", "N/A", row.url),
        }
    }
    println!();

    print_providers(&report.providers);
}

/// Prints the outcome of a single-URL check
pub fn print_fetch_report(report: &FetchReport, providers: &[ProviderSnapshot]) {
    println!("URL: {}", report.url);
    println!("Outcome: {}", report.state);
    println!("Attempts: {}", report.attempts);
    println!();
    print_providers(providers);
}

fn print_providers(providers: &[ProviderSnapshot]) {
    if providers.is_empty() {
        return;
    }

    println!("Providers:");
    for provider in providers {
        println!(
            "  #{} {}: quota {}{}",
            provider.id,
            provider.kind,
            provider.quota,
            if provider.healthy { "" } else { " (disabled)" }
        );
    }
}
