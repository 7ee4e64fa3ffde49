//! Core sync engine
//!
//! The SyncEngine is responsible for one reconciliation run:
//! - Resolving the target site via SiteProvider
//! - Sampling distinct public IPs via IpSource
//! - Comparing them against the site's backend list
//! - Replacing the backend list on mismatch
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐                         ┌──────────────┐
//! │  IpSource   │──── sampled IpSet ─────▶│  SyncEngine  │
//! └─────────────┘                         └──────────────┘
//!                                                │
//!                     ┌──────────────────────────┼──────────────────────┐
//!                     ▼                          ▼                      ▼
//!             ┌──────────────┐          ┌──────────────┐       ┌──────────────┐
//!             │ list_sites   │          │ get_backends │       │ replace_     │
//!             │ (resolve)    │          │ (check)      │       │ backends     │
//!             └──────────────┘          └──────────────┘       └──────────────┘
//! ```
//!
//! ## Run Flow
//!
//! `SiteResolving → Sampling → Checking → {Updating | Done}`
//!
//! Strictly linear. Any stage error ends the run; nothing is retried.

pub mod reconcile;
pub mod sampler;

pub use reconcile::{backends_match, resolve_site, synthesize_backends};
pub use sampler::{IpSet, SamplerOptions, sample_ip_set};

use std::fmt;
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::traits::{Backend, IpSource, Site, SiteProvider};

/// Stages of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    SiteResolving,
    Sampling,
    Checking,
    Updating,
    Done,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::SiteResolving => "site-resolving",
            SyncStage::Sampling => "sampling",
            SyncStage::Checking => "checking",
            SyncStage::Updating => "updating",
            SyncStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Backend list already matched the sampled set (no-op)
    Unchanged {
        /// The resolved site
        site_id: i64,
        /// The sampled addresses
        addresses: IpSet,
    },

    /// Backend list was replaced
    Updated {
        /// The resolved site
        site_id: i64,
        /// Remote addresses before the update, as returned by the API
        previous: Vec<String>,
        /// The addresses written
        current: IpSet,
    },
}

/// Core sync engine
///
/// Owns one IP source and one site provider and drives a single run.
/// The engine holds no mutable state; calling [`SyncEngine::run`] twice
/// performs two independent runs.
pub struct SyncEngine {
    /// IP source for sampling
    ip_source: Box<dyn IpSource>,

    /// Site API for discovery, check and update
    provider: Box<dyn SiteProvider>,

    /// Substring matched against site domains
    site_domain: String,

    /// Number of distinct IPs to collect
    ip_set_count: usize,

    /// Sampler tuning
    sampler: SamplerOptions,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: Site API implementation
    /// - `config`: Resolved configuration (domain and target count are used)
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn SiteProvider>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            ip_source,
            provider,
            site_domain: config.site_domain.clone(),
            ip_set_count: config.ip_set_count,
            sampler: SamplerOptions::default(),
        }
    }

    /// Override sampler tuning
    pub fn with_sampler_options(mut self, options: SamplerOptions) -> Self {
        self.sampler = options;
        self
    }

    /// Run one reconciliation
    ///
    /// # Returns
    ///
    /// - `Ok(SyncOutcome)`: The backend list matched or was replaced
    /// - `Err(Error)`: The first stage error, unchanged
    pub async fn run(&self) -> Result<SyncOutcome> {
        enter(SyncStage::SiteResolving);
        let site = self.resolve_site().await?;
        info!("Resolved site {} ({})", site.id, site.domain);

        enter(SyncStage::Sampling);
        let ip_set = self.sample().await?;
        info!("Sampled {} distinct IP(s): {:?}", ip_set.len(), ip_set);

        enter(SyncStage::Checking);
        let (matches, backends) = self.compare(site.id, &ip_set).await?;
        if matches {
            enter(SyncStage::Done);
            info!("Backends of site {} already up to date", site.id);
            return Ok(SyncOutcome::Unchanged {
                site_id: site.id,
                addresses: ip_set,
            });
        }

        let previous: Vec<String> = backends.into_iter().map(|b| b.addr).collect();
        info!(
            "Backends of site {} differ: {:?} -> {:?}",
            site.id, previous, ip_set
        );

        enter(SyncStage::Updating);
        self.update(site.id, &ip_set).await?;

        enter(SyncStage::Done);
        info!("Backends of site {} updated", site.id);
        Ok(SyncOutcome::Updated {
            site_id: site.id,
            previous,
            current: ip_set,
        })
    }

    /// List sites and pick the one matching the configured domain
    ///
    /// No match is fatal ([`Error::NotFound`]).
    pub async fn resolve_site(&self) -> Result<Site> {
        let sites = self.provider.list_sites().await?;
        debug!(
            "{} listed {} site(s)",
            self.provider.provider_name(),
            sites.len()
        );

        resolve_site(&sites, &self.site_domain)
            .cloned()
            .ok_or_else(|| {
                Error::not_found(format!("no site matches domain: {}", self.site_domain))
            })
    }

    /// Collect the distinct IP set for this run
    pub async fn sample(&self) -> Result<IpSet> {
        sample_ip_set(self.ip_source.as_ref(), self.ip_set_count, self.sampler).await
    }

    /// Whether the site's backend list already matches `ip_set`
    pub async fn check(&self, site_id: i64, ip_set: &IpSet) -> Result<bool> {
        let (matches, _) = self.compare(site_id, ip_set).await?;
        Ok(matches)
    }

    /// Fetch the remote backend list once and compare it with `ip_set`
    async fn compare(&self, site_id: i64, ip_set: &IpSet) -> Result<(bool, Vec<Backend>)> {
        let backends = self.provider.get_backends(site_id).await?;
        Ok((backends_match(ip_set, &backends), backends))
    }

    /// Replace the site's backend list with one entry per address
    pub async fn update(&self, site_id: i64, ip_set: &IpSet) -> Result<()> {
        let backends = synthesize_backends(ip_set);
        self.provider.replace_backends(site_id, &backends).await
    }
}

fn enter(stage: SyncStage) {
    debug!("Stage: {}", stage);
}
