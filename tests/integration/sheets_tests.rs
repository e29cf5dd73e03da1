//! Job runs against a mocked Google Sheets API

use price_watch::config::{parse_config, Config};
use price_watch::job::JobRunner;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAYFAIR_URL: &str = "https://www.wayfair.com/furniture/pdp/desk-chair-w001.html";
const TOKEN_AUTH: &str = r#"access-token = "secret-token""#;
const TEST_KEY: &str = include_str!("../fixtures/service-account-key.pem");

/// `credentials` is the workbook's auth line
fn create_test_config(sheets: &MockServer, ant: &MockServer, credentials: &str) -> Config {
    let toml = format!(
        r#"
[job]
retry-delay-ms = 0
dispatch-delay-ms = 0
append-delay-ms = 0

[workbook]
backend = "google-sheets"
spreadsheet-id = "book-id"
{}
base-url = "{}"

[[provider]]
kind = "scrapingant"
api-key = "ant-key"
base-url = "{}"
"#,
        credentials,
        sheets.uri(),
        ant.uri()
    );
    parse_config(&toml).expect("test config should be valid")
}

async fn mount_provider(ant: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/general"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<span data-name-id="PriceDisplay">$1,299.00</span>"#,
        ))
        .expect(1)
        .mount(ant)
        .await;
}

async fn mount_input_column(sheets: &MockServer, bearer: &str) {
    Mock::given(method("GET"))
        .and(path("/book-id/values/Sheet1!A:A"))
        .and(query_param("majorDimension", "COLUMNS"))
        .and(header("authorization", format!("Bearer {}", bearer).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:A2",
            "majorDimension": "COLUMNS",
            "values": [["URL", WAYFAIR_URL]]
        })))
        .expect(1)
        .mount(sheets)
        .await;
}

async fn mount_sheet_list(sheets: &MockServer, titles: &[&str]) {
    let listed: Vec<Value> = titles
        .iter()
        .map(|t| json!({"properties": {"title": t}}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/book-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sheets": listed })))
        .mount(sheets)
        .await;
}

#[tokio::test]
async fn test_results_are_appended_user_entered() {
    let sheets = MockServer::start().await;
    let ant = MockServer::start().await;
    mount_provider(&ant).await;
    mount_sheet_list(&sheets, &["Sheet1", "Logs"]).await;
    mount_input_column(&sheets, "secret-token").await;
    Mock::given(method("POST"))
        .and(path("/book-id/values/Logs!A1:append"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&sheets)
        .await;

    let runner = JobRunner::from_config(&create_test_config(&sheets, &ant, TOKEN_AUTH)).unwrap();
    let report = runner.run().await.unwrap();

    assert!(report.logged);

    let requests = sheets.received_requests().await.unwrap();
    let append = requests
        .iter()
        .find(|r| r.url.path().ends_with(":append"))
        .unwrap();
    let body: Value = serde_json::from_slice(&append.body).unwrap();
    assert_eq!(
        body["values"],
        json!([[report.timestamp.clone(), WAYFAIR_URL, 1299.0]])
    );
}

#[tokio::test]
async fn test_missing_log_sheet_is_created_with_header() {
    let sheets = MockServer::start().await;
    let ant = MockServer::start().await;
    mount_provider(&ant).await;
    mount_sheet_list(&sheets, &["Sheet1"]).await;
    mount_input_column(&sheets, "secret-token").await;

    Mock::given(method("POST"))
        .and(path("/book-id:batchUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"replies": [{}]})))
        .expect(1)
        .mount(&sheets)
        .await;
    Mock::given(method("POST"))
        .and(path("/book-id/values/Logs!A1:append"))
        .and(query_param("valueInputOption", "RAW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&sheets)
        .await;
    Mock::given(method("POST"))
        .and(path("/book-id/values/Logs!A1:append"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&sheets)
        .await;

    let runner = JobRunner::from_config(&create_test_config(&sheets, &ant, TOKEN_AUTH)).unwrap();
    let report = runner.run().await.unwrap();

    assert!(report.logged);
    assert_eq!(report.rows[0].price, Some(1299.0));
}

#[tokio::test]
async fn test_failed_append_is_reported() {
    let sheets = MockServer::start().await;
    let ant = MockServer::start().await;
    mount_provider(&ant).await;
    mount_sheet_list(&sheets, &["Sheet1", "Logs"]).await;
    mount_input_column(&sheets, "secret-token").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend error"))
        .expect(5)
        .mount(&sheets)
        .await;

    let runner = JobRunner::from_config(&create_test_config(&sheets, &ant, TOKEN_AUTH)).unwrap();
    let report = runner.run().await.unwrap();

    assert!(!report.logged);
    assert_eq!(report.rows.len(), 1);
}

#[tokio::test]
async fn test_service_account_token_is_used() {
    let sheets = MockServer::start().await;
    let ant = MockServer::start().await;
    mount_provider(&ant).await;
    mount_sheet_list(&sheets, &["Sheet1", "Logs"]).await;
    mount_input_column(&sheets, "sa-token").await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "sa-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&sheets)
        .await;
    Mock::given(method("POST"))
        .and(path("/book-id/values/Logs!A1:append"))
        .and(header("authorization", "Bearer sa-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&sheets)
        .await;

    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("service-account.json");
    let key = json!({
        "type": "service_account",
        "private_key": TEST_KEY,
        "client_email": "watcher@price-watch-test.iam.gserviceaccount.com",
        "token_uri": format!("{}/oauth2/token", sheets.uri()),
    });
    std::fs::write(&key_path, key.to_string()).unwrap();

    let credentials = format!("credentials-path = \"{}\"", key_path.display());
    let runner =
        JobRunner::from_config(&create_test_config(&sheets, &ant, &credentials)).unwrap();
    let report = runner.run().await.unwrap();

    assert!(report.logged);
    assert_eq!(report.rows[0].price, Some(1299.0));
}
