// # Site Provider Trait
//
// Defines the interface to the remote site-management API: listing sites,
// reading a site's backend list and replacing it.
//
// ## Implementations
//
// - REST site API: `ipsync-provider-siteapi` crate
//
// ## Wire Quirk
//
// The site detail endpoint returns the backend list as a JSON-encoded
// string inside the JSON envelope:
//
// ```json
// { "data": { "backend": "[{\"_rowKey\":21,\"state\":\"up\",\"addr\":\"1.2.3.4\",\"weight\":1,\"_index\":0}]" } }
// ```
//
// [`decode_backends`] performs the second decode. It must stay a two-stage
// decode to remain wire compatible with the API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Row key written on every synthesized backend
pub const SYNTHESIZED_ROW_KEY: i64 = 21;

/// State written on every synthesized backend
pub const SYNTHESIZED_STATE: &str = "up";

/// Weight written on every synthesized backend
pub const SYNTHESIZED_WEIGHT: i64 = 1;

/// A site as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Numeric site identifier
    #[serde(default)]
    pub id: i64,

    /// Site domain, matched by substring
    #[serde(default)]
    pub domain: String,

    /// Any additional fields the API returns
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Site {
    /// Create a site with no extra fields
    pub fn new(id: i64, domain: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// One upstream entry behind a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    /// Internal row key
    #[serde(rename = "_rowKey", default)]
    pub row_key: i64,

    /// Lifecycle state tag ("up" or other)
    #[serde(default)]
    pub state: String,

    /// Network address
    #[serde(default)]
    pub addr: String,

    /// Load weight
    #[serde(default)]
    pub weight: i64,

    /// Position index
    #[serde(rename = "_index", default)]
    pub index: i64,
}

impl Backend {
    /// Create a backend with the fixed placeholder metadata used on update
    ///
    /// Existing row keys, weights and states are never carried over.
    pub fn synthesized(addr: impl Into<String>) -> Self {
        Self {
            row_key: SYNTHESIZED_ROW_KEY,
            state: SYNTHESIZED_STATE.to_string(),
            addr: addr.into(),
            weight: SYNTHESIZED_WEIGHT,
            index: 0,
        }
    }
}

/// Decode the JSON-encoded backend string carried in a site detail envelope
///
/// A site without backends carries the literal `null`, which decodes to an
/// empty list. An empty string is still malformed.
pub fn decode_backends(raw: &str) -> Result<Vec<Backend>, crate::Error> {
    let backends: Option<Vec<Backend>> = serde_json::from_str(raw)
        .map_err(|e| crate::Error::decode(format!("invalid backend list: {}", e)))?;
    Ok(backends.unwrap_or_default())
}

/// Trait for site-management API implementations
///
/// # Rules
///
/// - One API request per method call
/// - No retry logic (every error is terminal for the run)
/// - Credentials never appear in logs or error messages
#[async_trait]
pub trait SiteProvider: Send + Sync {
    /// List all sites, in the order the API returns them
    async fn list_sites(&self) -> Result<Vec<Site>, crate::Error>;

    /// Fetch the current backend list of a site
    async fn get_backends(&self, site_id: i64) -> Result<Vec<Backend>, crate::Error>;

    /// Replace the whole backend list of a site
    ///
    /// This is destructive: remote-only entries are removed.
    async fn replace_backends(
        &self,
        site_id: i64,
        backends: &[Backend],
    ) -> Result<(), crate::Error>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
