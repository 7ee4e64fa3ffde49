//! Distinct public IP sampling
//!
//! The sampler calls an [`IpSource`] repeatedly until it has seen
//! `target_count` distinct addresses or the attempt budget is spent.
//! Calls are strictly sequential with a fixed pause between them.

use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::IpSource;

/// Set of distinct observed addresses
///
/// Ordered so that anything derived from it (logs, update payloads) is
/// deterministic within a run.
pub type IpSet = BTreeSet<String>;

/// Attempt budget for one sampling pass
pub const DEFAULT_MAX_ATTEMPTS: usize = 30;

/// Pause between attempts
pub const DEFAULT_SAMPLE_DELAY: Duration = Duration::from_secs(1);

/// Sampler tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerOptions {
    /// Maximum number of fetches
    pub max_attempts: usize,

    /// Sleep between fetches that did not reach the target
    pub delay: Duration,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_SAMPLE_DELAY,
        }
    }
}

/// Collect up to `target_count` distinct addresses from `source`
///
/// # Behavior
///
/// - Stops as soon as the set reaches `target_count`
/// - Returns whatever was collected if the budget runs out (not an error)
/// - Any fetch error aborts the whole pass; addresses collected before the
///   failure are discarded
pub async fn sample_ip_set(
    source: &dyn IpSource,
    target_count: usize,
    options: SamplerOptions,
) -> Result<IpSet> {
    let mut ip_set = IpSet::new();

    for attempt in 1..=options.max_attempts {
        let ip = source.fetch().await?;
        let ip = ip.trim().to_string();
        debug!(
            "Sample {}/{} from {}: {}",
            attempt,
            options.max_attempts,
            source.source_name(),
            ip
        );

        ip_set.insert(ip);
        if ip_set.len() >= target_count {
            return Ok(ip_set);
        }

        if attempt < options.max_attempts {
            tokio::time::sleep(options.delay).await;
        }
    }

    warn!(
        "Collected {} of {} distinct IP(s) after {} attempt(s)",
        ip_set.len(),
        target_count,
        options.max_attempts
    );
    Ok(ip_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    struct Scripted(Mutex<Vec<Result<String>>>);

    #[async_trait::async_trait]
    impl IpSource for Scripted {
        async fn fetch(&self) -> Result<String> {
            let mut script = self.0.lock().unwrap();
            if script.is_empty() {
                return Err(Error::network("script exhausted"));
            }
            script.remove(0)
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn no_delay() -> SamplerOptions {
        SamplerOptions {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn trims_and_deduplicates() {
        let source = Scripted(Mutex::new(vec![
            Ok(" 1.1.1.1\n".to_string()),
            Ok("1.1.1.1".to_string()),
            Ok("2.2.2.2 ".to_string()),
        ]));

        let ip_set = sample_ip_set(&source, 2, no_delay()).await.unwrap();

        let expected: IpSet = ["1.1.1.1", "2.2.2.2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ip_set, expected);
    }

    #[test]
    fn default_options_use_thirty_attempts_one_second_apart() {
        let options = SamplerOptions::default();
        assert_eq!(options.max_attempts, 30);
        assert_eq!(options.delay, Duration::from_secs(1));
    }
}
