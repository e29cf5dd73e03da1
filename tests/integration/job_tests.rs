//! End-to-end job runs against a SQLite workbook

use price_watch::config::{parse_config, Config};
use price_watch::fetch::FetchState;
use price_watch::job::JobRunner;
use price_watch::workbook::{SqliteWorkbook, Workbook};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAYFAIR_URL: &str = "https://www.wayfair.com/furniture/pdp/desk-chair-w001.html";
const AMAZON_URL: &str = "https://www.amazon.com/Desk-Lamp/dp/B08N5WRWNW/ref=sr_1_1";

fn wayfair_page(price: &str) -> String {
    format!(
        r#"<html><body><div class="pdp">
        <span data-name-id="PriceDisplay">{}</span>
        </div></body></html>"#,
        price
    )
}

fn amazon_page(price: &str) -> String {
    format!(
        r#"<html><body><div id="corePriceDisplay_desktop_feature_div">
        <span class="a-offscreen">{}</span></div></body></html>"#,
        price
    )
}

/// Builds a validated config with zero delays and the given provider tables
fn create_test_config(db_path: &Path, providers: &str, extra: &str) -> Config {
    let toml = format!(
        r#"
[job]
attempts = 3
retry-delay-ms = 0
workers = 1
dispatch-delay-ms = 0
append-delay-ms = 0
timezone = "UTC"

[workbook]
backend = "sqlite"
database-path = "{}"

{}

{}
"#,
        db_path.display(),
        extra,
        providers
    );
    parse_config(&toml).expect("test config should be valid")
}

fn scrapingant(server: &MockServer) -> String {
    format!(
        r#"
[[provider]]
kind = "scrapingant"
api-key = "ant-key"
base-url = "{}"
"#,
        server.uri()
    )
}

async fn mount_scrapingant(server: &MockServer, target: &str, body: String, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v2/general"))
        .and(query_param("url", target))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(calls)
        .mount(server)
        .await;
}

async fn read_log(db_path: &Path, column: u32) -> Vec<String> {
    let workbook = SqliteWorkbook::new(db_path).unwrap();
    workbook.read_column("Logs", column).await.unwrap()
}

#[tokio::test]
async fn test_wayfair_price_is_logged() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    mount_scrapingant(&ant, WAYFAIR_URL, wayfair_page("$123.45"), 1).await;

    let config = create_test_config(&db_path, &scrapingant(&ant), "");
    let runner = JobRunner::from_config(&config).unwrap();
    runner.add_urls(&[WAYFAIR_URL.to_string()]).await.unwrap();

    let report = runner.run().await.unwrap();

    assert!(report.logged);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].price, Some(123.45));

    assert_eq!(read_log(&db_path, 2).await, vec!["URL", WAYFAIR_URL]);
    assert_eq!(read_log(&db_path, 3).await, vec!["Price", "123.45"]);
    assert_eq!(read_log(&db_path, 1).await[1], report.timestamp);
}

#[tokio::test]
async fn test_amazon_falls_back_to_scraping_when_pricing_fails() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    let pricing = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/queries"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&pricing)
        .await;
    mount_scrapingant(&ant, AMAZON_URL, amazon_page("$19.99"), 1).await;

    let pricing_section = format!(
        r#"
[pricing]
username = "user"
password = "pass"
geo-location = "10001"
base-url = "{}/v1/queries"
"#,
        pricing.uri()
    );
    let config = create_test_config(&db_path, &scrapingant(&ant), &pricing_section);
    let runner = JobRunner::from_config(&config).unwrap();
    runner.add_urls(&[AMAZON_URL.to_string()]).await.unwrap();

    let report = runner.run().await.unwrap();

    assert_eq!(report.rows[0].price, Some(19.99));
    assert_eq!(read_log(&db_path, 3).await, vec!["Price", "19.99"]);
}

#[tokio::test]
async fn test_amazon_zero_price_falls_back_to_scraping() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    let pricing = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"content": {"pricing": [{"price": 0}]}}]
        })))
        .expect(1)
        .mount(&pricing)
        .await;
    mount_scrapingant(&ant, AMAZON_URL, amazon_page("$19.99"), 1).await;

    let pricing_section = format!(
        r#"
[pricing]
username = "user"
password = "pass"
geo-location = "10001"
base-url = "{}/v1/queries"
"#,
        pricing.uri()
    );
    let config = create_test_config(&db_path, &scrapingant(&ant), &pricing_section);
    let runner = JobRunner::from_config(&config).unwrap();
    runner.add_urls(&[AMAZON_URL.to_string()]).await.unwrap();

    let report = runner.run().await.unwrap();

    assert_eq!(report.rows[0].price, Some(19.99));
    assert_eq!(read_log(&db_path, 3).await, vec!["Price", "19.99"]);
}

#[tokio::test]
async fn test_amazon_pricing_api_skips_scraping() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    let pricing = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"content": {"pricing": [{"price": 42.0}]}}]
        })))
        .expect(1)
        .mount(&pricing)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ant)
        .await;

    let pricing_section = format!(
        r#"
[pricing]
username = "user"
password = "pass"
geo-location = "10001"
base-url = "{}"
"#,
        pricing.uri()
    );
    let config = create_test_config(&db_path, &scrapingant(&ant), &pricing_section);
    let runner = JobRunner::from_config(&config).unwrap();
    runner.add_urls(&[AMAZON_URL.to_string()]).await.unwrap();

    let report = runner.run().await.unwrap();

    assert_eq!(report.rows[0].price, Some(42.0));
    assert_eq!(read_log(&db_path, 3).await, vec!["Price", "42"]);
}

#[tokio::test]
async fn test_fatal_provider_is_never_used_again() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let wsai = MockServer::start().await;
    let ant = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&wsai)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/general"))
        .respond_with(ResponseTemplate::new(200).set_body_string(wayfair_page("$80.00")))
        .expect(2)
        .mount(&ant)
        .await;

    let providers = format!(
        r#"
[[provider]]
kind = "webscrapingai"
api-key = "wsai-key"
base-url = "{}"

{}
"#,
        wsai.uri(),
        scrapingant(&ant)
    );
    let config = create_test_config(&db_path, &providers, "");
    let runner = JobRunner::from_config(&config).unwrap();
    runner
        .add_urls(&[
            WAYFAIR_URL.to_string(),
            "https://www.wayfair.com/furniture/pdp/desk-w002.html".to_string(),
        ])
        .await
        .unwrap();

    let report = runner.run().await.unwrap();

    assert_eq!(report.success_count(), 2);
    assert!(!report.providers[0].healthy);
    assert!(report.providers[1].healthy);
}

#[tokio::test]
async fn test_exhausted_url_logs_na() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    mount_scrapingant(&ant, WAYFAIR_URL, wayfair_page("Out of stock"), 3).await;

    let config = create_test_config(&db_path, &scrapingant(&ant), "");
    let runner = JobRunner::from_config(&config).unwrap();
    runner.add_urls(&[WAYFAIR_URL.to_string()]).await.unwrap();

    let report = runner.run().await.unwrap();

    assert_eq!(report.fetches[0].state, FetchState::Exhausted);
    assert_eq!(report.fetches[0].attempts, 3);
    assert_eq!(read_log(&db_path, 3).await, vec!["Price", "N/A"]);
}

#[tokio::test]
async fn test_rejected_urls_never_reach_providers() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ant)
        .await;

    let config = create_test_config(&db_path, &scrapingant(&ant), "");
    let runner = JobRunner::from_config(&config).unwrap();
    runner
        .add_urls(&[
            "https://www.amazon.com/Desk-Lamp/ref=sr_1_1".to_string(),
            "https://www.ikea.com/us/en/p/desk-123".to_string(),
        ])
        .await
        .unwrap();

    let report = runner.run().await.unwrap();

    assert_eq!(report.count(FetchState::UrlError), 1);
    assert_eq!(report.count(FetchState::UnsupportedPlatform), 1);
    assert!(report.fetches.iter().all(|f| f.attempts == 0));
    assert_eq!(read_log(&db_path, 3).await, vec!["Price", "N/A", "N/A"]);
}

#[tokio::test]
async fn test_empty_input_makes_no_requests() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("book.db");
    let ant = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ant)
        .await;

    let config = create_test_config(&db_path, &scrapingant(&ant), "");
    let runner = JobRunner::from_config(&config).unwrap();
    runner.add_urls(&[]).await.unwrap();

    let report = runner.run().await.unwrap();

    assert!(report.is_empty());
    assert_eq!(read_log(&db_path, 1).await, vec!["Timestamp"]);
}
