//! Bearer credentials for the Google Sheets API
//!
//! A workbook either carries a ready access token or signs in as a service
//! account. Service-account tokens are exchanged on first use and cached by
//! the authenticator until they expire.

use crate::workbook::traits::{WorkbookError, WorkbookResult};
use std::fs;
use std::path::Path;
use tokio::sync::OnceCell;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// Read and write access to spreadsheets
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Source of the bearer token sent with every Sheets request
pub enum SheetsAuth {
    /// Token supplied as is, never refreshed
    Token(String),
    ServiceAccount(ServiceAccountAuth),
}

impl SheetsAuth {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Loads a service-account JSON key file
    pub fn service_account_file(path: &Path) -> WorkbookResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            WorkbookError::Config(format!(
                "cannot read credentials {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::ServiceAccount(ServiceAccountAuth::from_json(&json)?))
    }

    /// Returns a bearer token valid for [`SHEETS_SCOPE`]
    pub async fn bearer(&self) -> WorkbookResult<String> {
        match self {
            Self::Token(token) => Ok(token.clone()),
            Self::ServiceAccount(auth) => auth.bearer().await,
        }
    }
}

/// Service-account sign-in, built lazily on the first request
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    authenticator: OnceCell<DefaultAuthenticator>,
}

impl ServiceAccountAuth {
    pub fn from_json(json: &str) -> WorkbookResult<Self> {
        let key = yup_oauth2::parse_service_account_key(json)
            .map_err(|e| WorkbookError::Config(format!("invalid service-account key: {}", e)))?;
        Ok(Self {
            key,
            authenticator: OnceCell::new(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    async fn bearer(&self) -> WorkbookResult<String> {
        let authenticator = self
            .authenticator
            .get_or_try_init(|| async {
                tracing::debug!(
                    account = %self.key.client_email,
                    "Building service-account authenticator"
                );
                ServiceAccountAuthenticator::builder(self.key.clone())
                    .build()
                    .await
                    .map_err(|e| WorkbookError::Auth(e.to_string()))
            })
            .await?;

        let token = authenticator
            .token(&[SHEETS_SCOPE])
            .await
            .map_err(|e| WorkbookError::Auth(e.to_string()))?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| WorkbookError::Auth("token response had no access token".to_string()))
    }
}
