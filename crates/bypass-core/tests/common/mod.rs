//! Test doubles and common utilities for engine contract tests
//!
//! Every double shares its state through `Arc`, so a test can keep one handle
//! while the engine owns a clone.

#![allow(dead_code)]

use bypass_core::error::{Error, Result};
use bypass_core::traits::{BypassSubnetDescriptor, DomainStore, Resolver, SettingsApplier};
use bypass_core::{EngineConfig, EngineEvent, MemoryDomainStore, ReconciliationEngine};
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Parse an address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

/// Build an address set from literals
pub fn ips(list: &[&str]) -> BTreeSet<IpAddr> {
    list.iter().map(|s| ip(s)).collect()
}

/// A resolver whose answers are set by the test
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    answers: Arc<Mutex<HashMap<String, std::result::Result<Vec<IpAddr>, String>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `domain` resolve to `addrs`
    pub fn answer(&self, domain: &str, addrs: &[&str]) {
        self.answers.lock().unwrap().insert(
            domain.to_string(),
            Ok(addrs.iter().map(|s| ip(s)).collect()),
        );
    }

    /// Make `domain` fail to resolve
    pub fn fail(&self, domain: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(domain.to_string(), Err("NXDOMAIN".to_string()));
    }

    /// Number of resolve() calls
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, domain: &str) -> Result<Vec<IpAddr>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.answers.lock().unwrap().get(domain) {
            Some(Ok(addrs)) => Ok(addrs.clone()),
            Some(Err(e)) => Err(Error::resolver(format!("{}: {}", domain, e))),
            None => Ok(Vec::new()),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// An applier that records every call and can be told to fail
#[derive(Clone, Default)]
pub struct RecordingApplier {
    calls: Arc<Mutex<Vec<Vec<BypassSubnetDescriptor>>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent apply() calls fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Number of apply() calls, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Descriptors passed to the most recent apply() call
    pub fn last_call(&self) -> Option<Vec<BypassSubnetDescriptor>> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Subnets of the most recent apply() call
    pub fn last_subnets(&self) -> Option<BTreeSet<String>> {
        self.last_call()
            .map(|call| call.into_iter().map(|d| d.subnet).collect())
    }
}

#[async_trait::async_trait]
impl SettingsApplier for RecordingApplier {
    async fn apply(&self, descriptors: &[BypassSubnetDescriptor]) -> Result<()> {
        self.calls.lock().unwrap().push(descriptors.to_vec());
        if *self.failing.lock().unwrap() {
            return Err(Error::applier("recording", "piactl exited with status 1"));
        }
        Ok(())
    }

    fn applier_name(&self) -> &'static str {
        "recording"
    }
}

/// A domain store whose backing storage is broken
pub struct BrokenDomainStore;

#[async_trait::async_trait]
impl DomainStore for BrokenDomainStore {
    async fn read_all(&self) -> Result<BTreeSet<String>> {
        Err(Error::domain_store("Permission denied"))
    }

    async fn write_all(&self, _domains: &BTreeSet<String>) -> Result<()> {
        Err(Error::domain_store("Permission denied"))
    }

    fn store_name(&self) -> &'static str {
        "broken"
    }
}

/// Engine config with the given interval and reset window
pub fn engine_config(poll_interval_secs: u64, clear_window_secs: u64) -> EngineConfig {
    EngineConfig::default()
        .with_poll_interval_secs(poll_interval_secs)
        .with_clear_window_secs(clear_window_secs)
}

/// Everything a contract test needs to drive and observe an engine
pub struct Harness {
    pub engine: ReconciliationEngine,
    pub events: mpsc::Receiver<EngineEvent>,
    pub domains: MemoryDomainStore,
    pub resolver: ScriptedResolver,
    pub applier: RecordingApplier,
}

impl Harness {
    /// Engine over `domains` with the default 15s interval / 900s window
    pub fn new(domains: &[&str]) -> Self {
        Self::with_config(domains, &EngineConfig::default())
    }

    pub fn with_config(domains: &[&str], config: &EngineConfig) -> Self {
        let store = MemoryDomainStore::with_domains(domains.iter().copied());
        let resolver = ScriptedResolver::new();
        let applier = RecordingApplier::new();

        let (engine, events) = ReconciliationEngine::new(
            Box::new(store.clone()),
            Box::new(resolver.clone()),
            Box::new(applier.clone()),
            config,
        )
        .expect("engine construction succeeds");

        Self {
            engine,
            events,
            domains: store,
            resolver,
            applier,
        }
    }

    /// Drain every event emitted so far
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
