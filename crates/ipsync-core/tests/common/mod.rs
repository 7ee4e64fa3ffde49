//! Test doubles and common utilities for contract tests
//!
//! The doubles share their internals through `Arc`, so a test can keep a
//! clone for inspection after handing the original to the engine.

#![allow(dead_code)]

use ipsync_core::error::{Error, Result};
use ipsync_core::traits::{Backend, IpSource, Site, SiteProvider};
use ipsync_core::{SamplerOptions, SyncConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An IpSource that replays a fixed script of responses
///
/// Once the script is exhausted, the last response is repeated.
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<ScriptStep>>>,
    fetch_call_count: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub enum ScriptStep {
    Ip(&'static str),
    Fail(&'static str),
}

impl ScriptedIpSource {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into())),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that always answers with the same address
    pub fn constant(ip: &'static str) -> Self {
        Self::new(vec![ScriptStep::Ip(ip)])
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn fetch(&self) -> Result<String> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);

        let step = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };

        match step {
            Some(ScriptStep::Ip(ip)) => Ok(ip.to_string()),
            Some(ScriptStep::Fail(msg)) => Err(Error::network(msg)),
            None => Err(Error::network("empty script")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A SiteProvider backed by in-memory sites and backends that records calls
#[derive(Clone)]
pub struct MockSiteProvider {
    sites: Arc<Vec<Site>>,
    backends: Arc<Mutex<Vec<Backend>>>,
    fail_get_backends: bool,
    fail_replace: bool,
    list_call_count: Arc<AtomicUsize>,
    requested_site_ids: Arc<Mutex<Vec<i64>>>,
    replacements: Arc<Mutex<Vec<(i64, Vec<Backend>)>>>,
}

impl MockSiteProvider {
    pub fn new(sites: Vec<Site>, remote_addrs: &[&str]) -> Self {
        let backends = remote_addrs
            .iter()
            .enumerate()
            .map(|(i, addr)| Backend {
                row_key: 100 + i as i64,
                state: "up".to_string(),
                addr: addr.to_string(),
                weight: 5,
                index: i as i64,
            })
            .collect();

        Self {
            sites: Arc::new(sites),
            backends: Arc::new(Mutex::new(backends)),
            fail_get_backends: false,
            fail_replace: false,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            requested_site_ids: Arc::new(Mutex::new(Vec::new())),
            replacements: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_get_backends(mut self) -> Self {
        self.fail_get_backends = true;
        self
    }

    pub fn failing_replace(mut self) -> Self {
        self.fail_replace = true;
        self
    }

    /// Get the number of times list_sites() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Site IDs passed to get_backends(), in call order
    pub fn requested_site_ids(&self) -> Vec<i64> {
        self.requested_site_ids.lock().unwrap().clone()
    }

    /// Arguments of every replace_backends() call
    pub fn replacements(&self) -> Vec<(i64, Vec<Backend>)> {
        self.replacements.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SiteProvider for MockSiteProvider {
    async fn list_sites(&self) -> Result<Vec<Site>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.sites.as_ref().clone())
    }

    async fn get_backends(&self, site_id: i64) -> Result<Vec<Backend>> {
        self.requested_site_ids.lock().unwrap().push(site_id);
        if self.fail_get_backends {
            return Err(Error::decode("invalid backend list"));
        }
        Ok(self.backends.lock().unwrap().clone())
    }

    async fn replace_backends(&self, site_id: i64, backends: &[Backend]) -> Result<()> {
        if self.fail_replace {
            return Err(Error::network("connection reset"));
        }
        self.replacements
            .lock()
            .unwrap()
            .push((site_id, backends.to_vec()));
        *self.backends.lock().unwrap() = backends.to_vec();
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Sampler options with no pause between attempts
pub fn instant_sampler() -> SamplerOptions {
    SamplerOptions {
        max_attempts: 30,
        delay: Duration::ZERO,
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(site_domain: &str, ip_set_count: usize) -> SyncConfig {
    SyncConfig {
        ip_set_count,
        api_key: "test-key".to_string(),
        api_secret: "test-secret".to_string(),
        api: "http://127.0.0.1:1".to_string(),
        site_domain: site_domain.to_string(),
        ..Default::default()
    }
}
