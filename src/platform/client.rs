//! Thin client for the organization-management API.
//!
//! Covers the database inventory operations the gateway exposes as
//! tools: listing and creating databases. Token issuance lives in
//! `auth::issuer` and shares the same endpoint family.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::AppError;

#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
    organization: String,
    org_token: String,
}

/// A database as reported by the platform inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListDatabasesResponse {
    databases: Vec<Database>,
}

#[derive(Debug, Deserialize)]
struct CreateDatabaseResponse {
    database: Database,
}

impl PlatformClient {
    pub fn new(
        base_url: impl Into<String>,
        organization: impl Into<String>,
        org_token: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization: organization.into(),
            org_token: org_token.into(),
        }
    }

    /// GET the organization's database inventory.
    pub async fn list_databases(&self) -> Result<Vec<Database>, AppError> {
        let url = format!(
            "{}/v1/organizations/{}/databases",
            self.base_url, self.organization
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.org_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("listing databases failed: {}", e)))?;

        let resp = self.check_status(resp, "listing databases").await?;
        let body: ListDatabasesResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid database list response: {}", e)))?;
        Ok(body.databases)
    }

    /// Create a new database in the organization.
    pub async fn create_database(&self, name: &str) -> Result<Database, AppError> {
        let url = format!(
            "{}/v1/organizations/{}/databases",
            self.base_url, self.organization
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.org_token)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| {
                AppError::Upstream(format!("creating database '{}' failed: {}", name, e))
            })?;

        let resp = self
            .check_status(resp, &format!("creating database '{}'", name))
            .await?;
        let body: CreateDatabaseResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid create-database response: {}", e)))?;

        tracing::info!(database = %body.database.name, "database created");
        Ok(body.database)
    }

    async fn check_status(
        &self,
        resp: reqwest::Response,
        action: &str,
    ) -> Result<reqwest::Response, AppError> {
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::AuthorizationFailure(format!(
                    "organization credential rejected while {}",
                    action
                )))
            }
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                let body: String = body.chars().take(200).collect();
                Err(AppError::Upstream(format!(
                    "{} returned {}: {}",
                    action, status, body
                )))
            }
            _ => Ok(resp),
        }
    }
}
