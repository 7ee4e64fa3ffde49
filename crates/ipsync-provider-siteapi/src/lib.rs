// # Site API Provider
//
// This crate provides the site-management REST client for ipsync.
//
// ## Behavior
//
// - One HTTP request per trait call
// - No retry logic (every error is terminal for the run)
// - GET bodies go to the JSON decoder whatever the status
// - A PUT counts as applied once the server answered; a non-success status
//   is only logged
// - Dry-run mode for safe testing
//
// ## Security Requirements
//
// - API key and secret NEVER appear in logs
// - Header values are marked sensitive so they are hidden from `Debug`
//
// ## API Reference
//
// - List sites: GET `{api}/v1/sites` → `{ "data": [ {id, domain, ...} ] }`
// - Site detail: GET `{api}/v1/sites/:id` → `{ "data": { "backend": "<json string>" } }`
// - Replace backends: PUT `{api}/v1/sites/:id` with `{ "backend": [...] }`

use async_trait::async_trait;
use ipsync_core::traits::{Backend, Site, SiteProvider, decode_backends};
use ipsync_core::{Error, Result, SyncConfig};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

/// User-Agent sent on every site API request
pub const SITE_API_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

const API_KEY_HEADER: &str = "api-key";
const API_SECRET_HEADER: &str = "api-secret";

/// `GET /v1/sites` response
#[derive(Debug, Deserialize)]
struct SiteListEnvelope {
    #[serde(default)]
    data: Option<Vec<Site>>,
}

/// `GET /v1/sites/:id` response
#[derive(Debug, Deserialize)]
struct SiteDetailEnvelope {
    #[serde(default)]
    data: SiteDetail,
}

#[derive(Debug, Default, Deserialize)]
struct SiteDetail {
    /// Backend list, JSON-encoded a second time
    #[serde(default)]
    backend: String,
}

/// `PUT /v1/sites/:id` request body
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    backend: &'a [Backend],
}

/// Site-management API client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all GET requests (site list, site detail)
/// - Log the intended PUT payload
/// - **NOT** actually modify the backend list
pub struct SiteApiClient {
    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client carrying User-Agent and auth headers by default
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation; credentials only live inside the client's
// default headers and are never printed
impl std::fmt::Debug for SiteApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteApiClient")
            .field("api_base", &self.api_base)
            .field("credentials", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl SiteApiClient {
    /// Create a new site API client
    ///
    /// # Parameters
    ///
    /// - `api_base`: API base URL, e.g. `https://waf.example.com/api`
    /// - `api_key`, `api_secret`: Sent as `api-key` / `api-secret` headers
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if a credential is not a valid header value.
    pub fn new(
        api_base: impl Into<String>,
        api_key: &str,
        api_secret: &str,
        dry_run: bool,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SITE_API_USER_AGENT));
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            sensitive_header(API_KEY_HEADER, api_key)?,
        );
        headers.insert(
            HeaderName::from_static(API_SECRET_HEADER),
            sensitive_header(API_SECRET_HEADER, api_secret)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
            dry_run,
        })
    }

    /// Create a client from a resolved configuration
    pub fn from_config(config: &SyncConfig, dry_run: bool) -> Result<Self> {
        if dry_run {
            tracing::warn!("Site API client running in DRY-RUN mode - no changes will be made");
        }
        Self::new(&config.api, &config.api_key, &config.api_secret, dry_run)
    }

    /// Whether PUT requests are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn sites_url(&self) -> String {
        format!("{}/v1/sites", self.api_base)
    }

    fn site_url(&self, site_id: i64) -> String {
        format!("{}/v1/sites/{}", self.api_base, site_id)
    }

    /// GET `url` and decode the body as `T`, whatever the status
    async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            Error::decode(format!("GET {} (HTTP {}): {}", url, status.as_u16(), e))
        })
    }
}

fn sensitive_header(name: &str, value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("{} contains invalid characters", name)))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl SiteProvider for SiteApiClient {
    async fn list_sites(&self) -> Result<Vec<Site>> {
        let url = self.sites_url();
        tracing::debug!("Listing sites: {}", url);

        let envelope: SiteListEnvelope = self.get_json(&url).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Fetch the backend list of a site
    ///
    /// The envelope is decoded first; its `data.backend` string is then
    /// decoded again into the backend array.
    async fn get_backends(&self, site_id: i64) -> Result<Vec<Backend>> {
        let url = self.site_url(site_id);
        tracing::debug!("Fetching backends: {}", url);

        let envelope: SiteDetailEnvelope = self.get_json(&url).await?;
        decode_backends(&envelope.data.backend)
    }

    /// Replace the backend list of a site
    ///
    /// The response body is discarded and the status is only logged: a
    /// transport failure is the only error reported.
    async fn replace_backends(&self, site_id: i64, backends: &[Backend]) -> Result<()> {
        let url = self.site_url(site_id);
        let payload = UpdateRequest { backend: backends };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        tracing::info!("Replacing {} backend(s) of site {}", backends.len(), site_id);

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::network(format!("PUT {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            tracing::warn!(
                "PUT {} answered {}; the update may not have been applied",
                url,
                response.status()
            );
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "siteapi"
    }
}
