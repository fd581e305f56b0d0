/// HTTP client for the per-database query API.
///
/// A pure passthrough once a scoped token is in hand: statements in,
/// typed rows out. Never retries; re-executing a write on an ambiguous
/// failure could apply it twice.
use reqwest::StatusCode;
use std::time::Duration;

use crate::errors::AppError;
use crate::query::pipeline::{
    PipelineEntry, PipelineRequest, PipelineResponse, PipelineResult, Stmt, StmtResult,
};

pub struct QueryClient {
    http: reqwest::Client,
    /// URL template with `{database}` / `{organization}` placeholders.
    url_template: String,
    organization: String,
}

impl QueryClient {
    pub fn new(url_template: impl Into<String>, organization: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            url_template: url_template.into(),
            organization: organization.into(),
        }
    }

    /// Address of a single database's query endpoint.
    pub fn database_url(&self, database: &str) -> String {
        self.url_template
            .replace("{database}", database)
            .replace("{organization}", &self.organization)
    }

    /// Run a batch of statements against one database and return the
    /// per-statement results in order.
    pub async fn execute(
        &self,
        database_url: &str,
        token: &str,
        statements: Vec<Stmt>,
    ) -> Result<Vec<StmtResult>, AppError> {
        let mut requests: Vec<PipelineEntry> = statements
            .into_iter()
            .map(|stmt| PipelineEntry::Execute { stmt })
            .collect();
        requests.push(PipelineEntry::Close);

        let url = format!("{}/v2/pipeline", database_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&PipelineRequest { requests })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("query to {} failed: {}", url, e)))?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::AuthorizationFailure(format!(
                    "database token rejected by {}",
                    url
                )));
            }
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                let body: String = body.chars().take(200).collect();
                return Err(AppError::Upstream(format!(
                    "query to {} returned {}: {}",
                    url, status, body
                )));
            }
            _ => {}
        }

        let body: PipelineResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid pipeline response: {}", e)))?;

        let mut results = Vec::new();
        for result in body.results {
            match result {
                PipelineResult::Ok { response } => {
                    if let Some(stmt_result) = response.result {
                        results.push(stmt_result);
                    }
                }
                PipelineResult::Error { error } => {
                    return Err(AppError::Upstream(format!("query failed: {}", error.message)));
                }
            }
        }
        Ok(results)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_substitution() {
        let client = QueryClient::new("https://{database}-{organization}.db.dblink.dev", "acme");
        assert_eq!(
            client.database_url("shop"),
            "https://shop-acme.db.dblink.dev"
        );
    }

    #[test]
    fn test_database_url_literal_template() {
        // Tests point the template at a mock server with no placeholders.
        let client = QueryClient::new("http://127.0.0.1:9999", "acme");
        assert_eq!(client.database_url("shop"), "http://127.0.0.1:9999");
    }
}
