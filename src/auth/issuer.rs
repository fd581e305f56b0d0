//! Token issuer — mints permission-scoped database tokens from the
//! platform API using the organization credential.
//!
//! Stateless: one network call per issuance, no internal retries.
//! Retry policy belongs to the operation layer.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::token::{Permission, ScopedToken};

#[derive(Clone)]
pub struct TokenIssuer {
    http: reqwest::Client,
    platform_url: String,
    organization: String,
    org_token: String,
    /// Requested token lifetime (e.g. "2h"), passed through to the
    /// platform. The issued token's own expiry claim is authoritative.
    expiration: String,
}

#[derive(Debug, Deserialize)]
struct IssueTokenResponse {
    jwt: String,
}

#[derive(Debug, Deserialize)]
struct ExpClaim {
    exp: Option<i64>,
}

impl TokenIssuer {
    pub fn new(
        platform_url: impl Into<String>,
        organization: impl Into<String>,
        org_token: impl Into<String>,
        expiration: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            platform_url: platform_url.into().trim_end_matches('/').to_string(),
            organization: organization.into(),
            org_token: org_token.into(),
            expiration: expiration.into(),
        }
    }

    /// Mint a new token for `database` at `permission`.
    pub async fn issue(
        &self,
        database: &str,
        permission: Permission,
    ) -> Result<ScopedToken, AppError> {
        let url = format!(
            "{}/v1/organizations/{}/databases/{}/auth/tokens",
            self.platform_url, self.organization, database
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.org_token)
            .query(&[
                ("expiration", self.expiration.as_str()),
                ("authorization", permission.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::Upstream(format!(
                    "token issuance for database '{}' ({}) failed: {}",
                    database, permission, e
                ))
            })?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AppError::AuthorizationFailure(format!(
                    "organization credential rejected while issuing a {} token for database '{}'",
                    permission, database
                )));
            }
            StatusCode::NOT_FOUND => {
                return Err(AppError::DatabaseNotFound(database.to_string()));
            }
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(AppError::Upstream(format!(
                    "token issuance for database '{}' ({}) returned {}: {}",
                    database,
                    permission,
                    status,
                    truncate(&body, 200)
                )));
            }
            _ => {}
        }

        let body: IssueTokenResponse = resp.json().await.map_err(|e| {
            AppError::Upstream(format!(
                "invalid token issuance response for database '{}': {}",
                database, e
            ))
        })?;

        // The platform's expiry claim is authoritative. An undecodable
        // claim falls back to a short trust window instead of failing.
        let expires_at = decode_expiry(&body.jwt).unwrap_or_else(|| Utc::now() + Duration::hours(1));

        tracing::debug!(
            database = %database,
            permission = %permission,
            expires_at = %expires_at,
            "issued database token"
        );

        Ok(ScopedToken {
            database: database.to_string(),
            permission,
            token: body.jwt,
            expires_at,
        })
    }
}

/// Read the `exp` claim (seconds since epoch) out of an issued token.
/// The signature is not verified; the gateway is not the token's
/// audience and only needs the expiry for cache bookkeeping.
fn decode_expiry(jwt: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = Default::default();

    let data =
        jsonwebtoken::decode::<ExpClaim>(jwt, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn unsigned_jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn test_decode_expiry_reads_exp_claim() {
        let exp = Utc::now().timestamp() + 7200;
        let jwt = unsigned_jwt(serde_json::json!({ "exp": exp, "a": "ro" }));
        assert_eq!(decode_expiry(&jwt).unwrap().timestamp(), exp);
    }

    #[test]
    fn test_decode_expiry_accepts_past_exp() {
        // Cache bookkeeping must see real expiries, even past ones.
        let exp = Utc::now().timestamp() - 60;
        let jwt = unsigned_jwt(serde_json::json!({ "exp": exp }));
        assert_eq!(decode_expiry(&jwt).unwrap().timestamp(), exp);
    }

    #[test]
    fn test_decode_expiry_missing_claim() {
        let jwt = unsigned_jwt(serde_json::json!({ "sub": "db" }));
        assert!(decode_expiry(&jwt).is_none());
    }

    #[test]
    fn test_decode_expiry_garbage_token() {
        assert!(decode_expiry("not-a-token").is_none());
        assert!(decode_expiry("a.b.c").is_none());
        assert!(decode_expiry("").is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 2), "he");
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
