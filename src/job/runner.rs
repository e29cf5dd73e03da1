//! Job runner - reads URLs, fetches prices, appends the log

use crate::config::{parse_timezone, Config};
use crate::extract::{PlatformExtractor, PriceSource, PricingClient};
use crate::fetch::{fetch_with_retry, FetchReport, FetchState, RetryPolicy};
use crate::job::JobReport;
use crate::provider::{build_http_client, PageSource};
use crate::rotation::Rotation;
use crate::workbook::{
    ensure_log_sheet, ensure_sheet, open_workbook, CellValue, ValueInput, Workbook,
    INPUT_HEADER,
};
use crate::{ConfigResult, PriceWatchError};
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Format of the timestamp written to the log sheet
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Placeholder written when no price was found
const NO_PRICE: &str = "N/A";

/// One result row of the log sheet
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: String,
    pub url: String,
    pub price: Option<f64>,
}

impl LogRow {
    /// `[timestamp, url, price | "N/A"]`
    pub fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::text(&self.timestamp),
            CellValue::text(&self.url),
            match self.price {
                Some(price) => CellValue::Number(price),
                None => CellValue::text(NO_PRICE),
            },
        ]
    }
}

/// Formats the current time in `timezone`, or in local time when unset
pub fn run_timestamp(timezone: Option<Tz>) -> String {
    format_timestamp(Utc::now(), timezone)
}

/// Formats `instant` as wall-clock time in `timezone`, daylight saving included
pub fn format_timestamp(instant: DateTime<Utc>, timezone: Option<Tz>) -> String {
    match timezone {
        Some(tz) => instant.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
        None => instant
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    }
}

/// Runtime knobs of a job, resolved from the configuration
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub policy: RetryPolicy,
    pub workers: usize,
    pub dispatch_delay: Duration,
    pub append_attempts: u32,
    pub append_delay: Duration,
    pub timezone: Option<Tz>,
    pub input_sheet: String,
    pub log_sheet: String,
}

impl JobSettings {
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let job = &config.job;
        let timezone = job.timezone.as_deref().map(parse_timezone).transpose()?;

        Ok(Self {
            policy: RetryPolicy::from_config(job),
            workers: job.workers.max(1) as usize,
            dispatch_delay: job.dispatch_delay(),
            append_attempts: job.append_attempts.max(1),
            append_delay: job.append_delay(),
            timezone,
            input_sheet: config.workbook.input_sheet.clone(),
            log_sheet: config.workbook.log_sheet.clone(),
        })
    }
}

/// Runs price-watch jobs against one workbook
pub struct JobRunner {
    workbook: Arc<dyn Workbook>,
    source: Arc<dyn PriceSource>,
    rotation: Rotation,
    settings: JobSettings,
}

impl JobRunner {
    /// Creates a runner from already-built parts
    ///
    /// `rotation` must be the handle the price source charges misses against.
    pub fn new(
        workbook: Arc<dyn Workbook>,
        source: Arc<dyn PriceSource>,
        rotation: Rotation,
        settings: JobSettings,
    ) -> Self {
        Self {
            workbook,
            source,
            rotation,
            settings,
        }
    }

    /// Builds the workbook, providers and pricing client from the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(JobRunner)` - Ready to run
    /// * `Err(PriceWatchError)` - The HTTP client or workbook could not be set up
    pub fn from_config(config: &Config) -> Result<Self, PriceWatchError> {
        let settings = JobSettings::from_config(config)?;
        let client = build_http_client(config.job.request_timeout())?;

        let workbook = open_workbook(&config.workbook, client.clone())?;
        let pages = PageSource::from_entries(&config.providers, client.clone());
        let pricing = config
            .pricing
            .as_ref()
            .map(|pricing| PricingClient::new(client.clone(), pricing));

        let extractor = PlatformExtractor::new(pages, pricing);
        let rotation = extractor.rotation().clone();

        tracing::debug!(
            providers = config.providers.len(),
            pricing = config.pricing.is_some(),
            workers = settings.workers,
            "Job runner configured"
        );

        Ok(Self::new(workbook, Arc::new(extractor), rotation, settings))
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Runs one pass: read URLs, fetch every price, append the results
    ///
    /// A failure to append is recorded in the report rather than returned.
    pub async fn run(&self) -> Result<JobReport, PriceWatchError> {
        let settings = &self.settings;

        if ensure_log_sheet(self.workbook.as_ref(), &settings.log_sheet).await? {
            tracing::info!(sheet = %settings.log_sheet, "Created log sheet");
        }

        let timestamp = run_timestamp(settings.timezone);
        let urls = self.read_urls().await?;

        if urls.is_empty() {
            tracing::warn!(sheet = %settings.input_sheet, "No URLs to process");
            return Ok(JobReport::empty(timestamp, self.rotation.snapshot()));
        }

        tracing::info!(
            urls = urls.len(),
            workers = settings.workers,
            timestamp = %timestamp,
            "Starting job"
        );

        let fetches = self.fetch_all(urls).await;

        let rows: Vec<LogRow> = fetches
            .iter()
            .map(|report| LogRow {
                timestamp: timestamp.clone(),
                url: report.url.clone(),
                price: report.price(),
            })
            .collect();

        let logged = self.append_log(&rows).await;

        Ok(JobReport {
            timestamp,
            fetches,
            rows,
            logged,
            providers: self.rotation.snapshot(),
        })
    }

    /// Fetches a single URL without touching the workbook
    pub async fn check(&self, url: &str) -> FetchReport {
        fetch_with_retry(
            self.source.as_ref(),
            &self.rotation,
            url.trim(),
            &self.settings.policy,
        )
        .await
    }

    /// Appends URLs to the input sheet, creating it with a `URL` header if needed
    ///
    /// Returns the number of URLs appended.
    pub async fn add_urls(&self, urls: &[String]) -> Result<usize, PriceWatchError> {
        let sheet = &self.settings.input_sheet;
        ensure_sheet(self.workbook.as_ref(), sheet, &INPUT_HEADER).await?;

        let rows: Vec<Vec<CellValue>> = urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(|url| vec![CellValue::text(url)])
            .collect();

        if !rows.is_empty() {
            self.workbook
                .append_rows(sheet, &rows, ValueInput::Raw)
                .await?;
        }

        tracing::info!(sheet = %sheet, count = rows.len(), "Added URLs");
        Ok(rows.len())
    }

    /// Column A of the input sheet without the header row and blank cells
    async fn read_urls(&self) -> Result<Vec<String>, PriceWatchError> {
        let column = self
            .workbook
            .read_column(&self.settings.input_sheet, 1)
            .await?;

        Ok(column
            .into_iter()
            .skip(1)
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect())
    }

    /// Fetches every URL on a bounded pool, returning reports in completion order
    async fn fetch_all(&self, urls: Vec<String>) -> Vec<FetchReport> {
        let settings = &self.settings;
        let semaphore = Arc::new(Semaphore::new(settings.workers));
        let mut tasks = JoinSet::new();
        let total = urls.len();
        // URLs whose report has not come back yet
        let mut outstanding: Vec<String> = Vec::with_capacity(total);

        for (index, url) in urls.into_iter().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let source = Arc::clone(&self.source);
            let rotation = self.rotation.clone();
            let policy = settings.policy;
            outstanding.push(url.clone());

            tasks.spawn(async move {
                let _permit = permit;
                let report = fetch_with_retry(source.as_ref(), &rotation, &url, &policy).await;
                tracing::info!(url = %report.url, outcome = %report.state, "Fetched");
                report
            });

            if index + 1 < total {
                tokio::time::sleep(settings.dispatch_delay).await;
            }
        }

        let mut reports = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    if let Some(pos) = outstanding.iter().position(|u| *u == report.url) {
                        outstanding.swap_remove(pos);
                    }
                    reports.push(report);
                }
                Err(e) => tracing::error!(error = %e, "Fetch task failed"),
            }
        }

        // A task that panicked or was cancelled still gets a row
        for url in outstanding {
            tracing::warn!(url = %url, "No report for URL, logging it without a price");
            reports.push(FetchReport {
                url,
                state: FetchState::Aborted,
                attempts: 0,
            });
        }
        reports
    }

    /// Appends the result rows, retrying up to the configured attempts
    async fn append_log(&self, rows: &[LogRow]) -> bool {
        let settings = &self.settings;
        let cells: Vec<Vec<CellValue>> = rows.iter().map(LogRow::cells).collect();

        for attempt in 1..=settings.append_attempts {
            match self
                .workbook
                .append_rows(&settings.log_sheet, &cells, ValueInput::UserEntered)
                .await
            {
                Ok(()) => {
                    tracing::info!(rows = rows.len(), sheet = %settings.log_sheet, "Logged results");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        attempts = settings.append_attempts,
                        error = %e,
                        "Appending results failed"
                    );
                    if attempt < settings.append_attempts {
                        tokio::time::sleep(settings.append_delay).await;
                    }
                }
            }
        }

        tracing::error!(rows = rows.len(), "Giving up on logging results");
        false
    }
}
