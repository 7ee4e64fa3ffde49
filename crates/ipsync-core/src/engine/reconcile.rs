//! Reconciliation rules
//!
//! Pure functions shared by the engine: site selection, the backend
//! comparison and the replacement list built on mismatch.

use std::collections::HashSet;

use super::sampler::IpSet;
use crate::traits::{Backend, Site};

/// Select the first site whose domain contains `domain`
///
/// Matching is a case-sensitive substring test, so overlapping domains
/// resolve to whichever the API lists first.
pub fn resolve_site<'a>(sites: &'a [Site], domain: &str) -> Option<&'a Site> {
    sites.iter().find(|site| site.domain.contains(domain))
}

/// Whether the remote backend list already matches the sampled set
///
/// True iff both have the same cardinality and every sampled address is
/// present among the trimmed remote addresses. Duplicate remote addresses
/// are not detected beyond the cardinality check.
pub fn backends_match(ip_set: &IpSet, backends: &[Backend]) -> bool {
    if ip_set.len() != backends.len() {
        return false;
    }

    let remote: HashSet<&str> = backends.iter().map(|b| b.addr.trim()).collect();
    ip_set.iter().all(|ip| remote.contains(ip.trim()))
}

/// Build the replacement backend list, one entry per sampled address
pub fn synthesize_backends(ip_set: &IpSet) -> Vec<Backend> {
    ip_set.iter().map(Backend::synthesized).collect()
}
