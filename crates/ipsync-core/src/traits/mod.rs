//! Core traits for ipsync
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Observe the caller's public IP address
//! - [`SiteProvider`]: Read and replace a site's backend list via the site API

pub mod ip_source;
pub mod site_provider;

pub use ip_source::IpSource;
pub use site_provider::{Backend, Site, SiteProvider, decode_backends};
