// # IP Source Trait
//
// Defines the interface for observing the caller's public IP address.
//
// ## Implementations
//
// - HTTP IP-echo service: `ipsync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ipsync_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     // One observation, one outbound request
//     let ip = source.fetch().await?;
//     println!("Observed {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for IP source implementations
///
/// A source answers one question per call: which public address did this
/// request leave from? Behind rotating NAT or multiple egress links,
/// consecutive calls may observe different addresses, which is what the
/// sampler relies on.
///
/// # Rules
///
/// - One call performs exactly one observation (no caching between calls)
/// - No retry logic (the sampler owns the attempt budget)
/// - Returned addresses are already trimmed of surrounding whitespace
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Observe the current public address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The observed address, trimmed
    /// - `Err(Error)`: Transport failure or an unusable response
    async fn fetch(&self) -> Result<String, crate::Error>;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
