//! Integration tests for price-watch
//!
//! These tests run whole jobs against wiremock servers standing in for the
//! scraping providers, the pricing API and the Sheets API.

mod job_tests;
mod sheets_tests;
