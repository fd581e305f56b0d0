use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Base URL of the platform (organization management) API.
    pub platform_url: String,
    /// Organization slug all databases belong to.
    pub organization: String,
    /// Organization-wide bearer token, used only to mint database tokens.
    /// Held in memory for the process lifetime; never logged.
    pub org_token: String,
    /// Database used when an operation names none and the session has
    /// no current database. Set via DBLINK_DEFAULT_DATABASE.
    pub default_database: Option<String>,
    /// Requested lifetime for minted database tokens (e.g. "2h").
    /// The platform's expiry claim is authoritative, not this value.
    pub token_expiration: String,
    /// Seconds between background sweeps of the token cache.
    pub eviction_interval_secs: u64,
    /// URL template addressing a single database; `{database}` and
    /// `{organization}` are substituted.
    pub database_url_template: String,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let org_token = std::env::var("DBLINK_ORG_TOKEN").unwrap_or_default();
    if org_token.trim().is_empty() {
        anyhow::bail!(
            "DBLINK_ORG_TOKEN is not set. The gateway cannot mint database \
             tokens without the organization credential."
        );
    }

    let organization = std::env::var("DBLINK_ORG").unwrap_or_default();
    if organization.trim().is_empty() {
        anyhow::bail!("DBLINK_ORG is not set. Set it to your organization slug.");
    }

    Ok(Config {
        port: std::env::var("DBLINK_PORT")
            .unwrap_or_else(|_| "8090".into())
            .parse()
            .unwrap_or(8090),
        platform_url: std::env::var("DBLINK_PLATFORM_URL")
            .unwrap_or_else(|_| "https://api.dblink.dev".into()),
        organization,
        org_token,
        default_database: std::env::var("DBLINK_DEFAULT_DATABASE")
            .ok()
            .filter(|s| !s.trim().is_empty()),
        token_expiration: std::env::var("DBLINK_TOKEN_EXPIRATION")
            .unwrap_or_else(|_| "2h".into()),
        eviction_interval_secs: std::env::var("DBLINK_EVICTION_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(300),
        database_url_template: std::env::var("DBLINK_DATABASE_URL_TEMPLATE")
            .unwrap_or_else(|_| "https://{database}-{organization}.db.dblink.dev".into()),
    })
}
