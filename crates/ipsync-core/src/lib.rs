// # ipsync-core
//
// Core library for ipsync: keep a site's backend list on a remote
// site-management API in line with the set of public IPs this host is seen
// from.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for observing the caller's public IP
// - **SiteProvider**: Trait for listing sites and reading/replacing backends
// - **SyncEngine**: Drives one run: resolve site → sample → check → update
// - **SyncConfig**: Environment-first configuration with a JSON file fallback
//
// ## Design Principles
//
// 1. **Core/Plugin Split**: HTTP clients live in their own crates behind traits
// 2. **Single Pass**: One linear run per invocation, scheduling is external
// 3. **Fail Fast**: Every error ends the run; no retries, no partial recovery

pub mod config;
pub mod engine;
pub mod error;
pub mod traits;

// Re-export core types for convenience
pub use config::SyncConfig;
pub use engine::{IpSet, SamplerOptions, SyncEngine, SyncOutcome, SyncStage};
pub use error::{Error, Result};
pub use traits::{Backend, IpSource, Site, SiteProvider};
