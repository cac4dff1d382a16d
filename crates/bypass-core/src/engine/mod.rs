//! Core reconciliation engine
//!
//! The ReconciliationEngine is responsible for:
//! - Resolving every whitelisted domain on each tick
//! - Diffing the result against the cached bypass set
//! - Force-clearing the cache once per reset window
//! - Pushing the full bypass list to the VPN client when the cache changed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌──────────────────────┐      ┌─────────────────┐
//! │ DomainStore │─────▶│ ReconciliationEngine │─────▶│ SettingsApplier │
//! └─────────────┘      └──────────────────────┘      └─────────────────┘
//!                         │        ▲        │
//!                 resolve │        │ ips    │ events
//!                         ▼        │        ▼
//!                      ┌─────────────┐   ┌─────────────┐
//!                      │  Resolver   │   │   Events    │
//!                      └─────────────┘   └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Read the whitelist and resolve each domain (failures contribute nothing)
//! 2. Advance the reset counter; clear the cache if the window elapsed
//! 3. Empty resolution clears a non-empty cache (revokes every bypass)
//! 4. Otherwise only new addresses change the cache; stale ones wait for the reset
//! 5. On change, apply the full cache as `exclude` subnets

pub mod scheduler;

pub use scheduler::{Scheduler, Termination};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::traits::{BypassSubnetDescriptor, DomainStore, Resolver, SettingsApplier};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// Events emitted by the ReconciliationEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Scheduler loop started
    Started {
        poll_interval_secs: u64,
        reset_counter_initial: u64,
    },

    /// A tick finished
    TickCompleted {
        changed: bool,
        added: Vec<IpAddr>,
        evicted: Vec<IpAddr>,
        bypassed: usize,
    },

    /// The reset window elapsed and the cache was cleared
    ResetFired {
        cleared: usize,
    },

    /// The VPN client accepted the bypass list
    ApplySucceeded {
        subnets: usize,
    },

    /// The VPN client rejected the bypass list
    ApplyFailed {
        error: String,
    },

    /// Scheduler loop stopped
    Stopped {
        reason: String,
    },
}

/// Outcome of a single tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the bypass set must be (re)applied
    pub changed: bool,
    /// Addresses newly added to the cache
    pub added: BTreeSet<IpAddr>,
    /// Addresses that left the cache this tick (reset or empty resolution)
    pub evicted: BTreeSet<IpAddr>,
    /// Whether the reset window elapsed on this tick
    pub reset_fired: bool,
    /// Domains that resolved to at least one address
    pub resolved_domains: usize,
    /// Domains that failed or resolved to nothing
    pub failed_domains: usize,
    /// When the tick finished
    pub completed_at: DateTime<Utc>,
}

/// Addresses gathered from one pass over the whitelist
struct Resolution {
    ips: BTreeSet<IpAddr>,
    resolved_domains: usize,
    failed_domains: usize,
}

/// Core reconciliation engine
///
/// Owns the cached bypass set and the reset counter. One instance per
/// process; the [`Scheduler`] drives it sequentially so no locking is needed.
///
/// ## Lifecycle
///
/// 1. Create with [`ReconciliationEngine::new()`]
/// 2. Hand to a [`Scheduler`], or call [`ReconciliationEngine::apply_if_changed()`] directly
/// 3. Drop to discard the cache (it is never persisted)
pub struct ReconciliationEngine {
    /// Whitelisted domains
    domain_store: Box<dyn DomainStore>,

    /// Domain → addresses
    resolver: Box<dyn Resolver>,

    /// Pushes the bypass list to the VPN client
    applier: Box<dyn SettingsApplier>,

    /// Addresses currently treated as bypassed
    bypass_set: BTreeSet<IpAddr>,

    /// Ticks left until the next forced clear
    reset_counter: u64,

    /// Value the reset counter is restored to
    reset_counter_initial: u64,

    /// Set when an apply failed; the next tick re-applies even if unchanged
    apply_pending: bool,

    /// Delay between ticks
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl ReconciliationEngine {
    /// Create a new reconciliation engine
    ///
    /// # Parameters
    ///
    /// - `domain_store`: Domain store implementation
    /// - `resolver`: Resolver implementation
    /// - `applier`: Settings applier implementation
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        domain_store: Box<dyn DomainStore>,
        resolver: Box<dyn Resolver>,
        applier: Box<dyn SettingsApplier>,
        config: &EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let reset_counter_initial = config.reset_counter_initial();

        let engine = Self {
            domain_store,
            resolver,
            applier,
            bypass_set: BTreeSet::new(),
            reset_counter: reset_counter_initial,
            reset_counter_initial,
            apply_pending: false,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one resolve-diff cycle without applying anything
    ///
    /// # Returns
    ///
    /// - `Ok(TickReport)`: The tick ran; `changed` says whether an apply is due
    /// - `Err(Error)`: The domain store failed (fatal)
    pub async fn tick(&mut self) -> Result<TickReport> {
        info!("Running IP whitelist update...");

        let resolution = self.resolve_all().await?;
        let previous = self.bypass_set.clone();

        let reset_fired = self.advance_reset_counter();

        let (changed, added) = if resolution.ips.is_empty() {
            if self.bypass_set.is_empty() {
                debug!("No IPs resolved and nothing cached");
                (false, BTreeSet::new())
            } else {
                warn!("No IPs found for any whitelisted domain; clearing cached IPs.");
                self.bypass_set.clear();
                (true, BTreeSet::new())
            }
        } else {
            let added: BTreeSet<IpAddr> = resolution
                .ips
                .difference(&self.bypass_set)
                .copied()
                .collect();

            if added.is_empty() {
                info!("No new IPs to update.");
                (false, added)
            } else {
                info!("Added IPs: {:?}", added);
                self.bypass_set.extend(added.iter().copied());
                (true, added)
            }
        };

        let evicted: BTreeSet<IpAddr> = previous.difference(&self.bypass_set).copied().collect();
        if !evicted.is_empty() {
            info!("Removed IPs: {:?}", evicted);
        }

        self.emit_event(EngineEvent::TickCompleted {
            changed,
            added: added.iter().copied().collect(),
            evicted: evicted.iter().copied().collect(),
            bypassed: self.bypass_set.len(),
        });

        Ok(TickReport {
            changed,
            added,
            evicted,
            reset_fired,
            resolved_domains: resolution.resolved_domains,
            failed_domains: resolution.failed_domains,
            completed_at: Utc::now(),
        })
    }

    /// Run one tick and push the full bypass list if it changed
    ///
    /// An apply failure is logged, not returned: the cache keeps the new
    /// state and the next call re-applies it even if nothing else changed.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: The bypass list changed and the VPN client accepted it
    /// - `Ok(false)`: Nothing to apply, or the apply failed
    /// - `Err(Error)`: Fatal error from the tick
    pub async fn apply_if_changed(&mut self) -> Result<bool> {
        let report = self.tick().await?;

        if !report.changed {
            if !self.apply_pending {
                return Ok(false);
            }
            info!("Retrying previously failed whitelist apply");
        }

        let descriptors = self.descriptors();
        let applier = self.applier.applier_name();

        match self.applier.apply(&descriptors).await {
            Ok(()) => {
                info!(
                    "Applied {} bypass subnet(s) via {}",
                    descriptors.len(),
                    applier
                );
                self.apply_pending = false;
                self.emit_event(EngineEvent::ApplySucceeded {
                    subnets: descriptors.len(),
                });
                Ok(true)
            }
            Err(e) => {
                error!("Failed to apply whitelist settings via {}: {}", applier, e);
                self.apply_pending = true;
                self.emit_event(EngineEvent::ApplyFailed {
                    error: e.to_string(),
                });
                Ok(false)
            }
        }
    }

    /// One `exclude` descriptor per cached address, in address order
    pub fn descriptors(&self) -> Vec<BypassSubnetDescriptor> {
        self.bypass_set
            .iter()
            .copied()
            .map(BypassSubnetDescriptor::exclude)
            .collect()
    }

    /// Copy of the cached bypass set
    pub fn bypassed_ips(&self) -> BTreeSet<IpAddr> {
        self.bypass_set.clone()
    }

    /// Ticks left until the next forced clear
    pub fn reset_counter(&self) -> u64 {
        self.reset_counter
    }

    /// Number of ticks in one reset window
    pub fn reset_counter_initial(&self) -> u64 {
        self.reset_counter_initial
    }

    /// Delay between ticks
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Resolve every whitelisted domain
    ///
    /// Per-domain failures are logged and skipped; only a domain store
    /// failure aborts the tick.
    async fn resolve_all(&self) -> Result<Resolution> {
        let domains = self.domain_store.read_all().await?;
        if domains.is_empty() {
            debug!(
                "Domain whitelist ({}) is empty",
                self.domain_store.store_name()
            );
        }

        let mut resolution = Resolution {
            ips: BTreeSet::new(),
            resolved_domains: 0,
            failed_domains: 0,
        };

        for domain in &domains {
            match self.resolver.resolve(domain).await {
                Ok(ips) if !ips.is_empty() => {
                    trace!("{} -> {:?}", domain, ips);
                    resolution.ips.extend(ips);
                    resolution.resolved_domains += 1;
                }
                Ok(_) => {
                    warn!("No IP addresses found for {}", domain);
                    resolution.failed_domains += 1;
                }
                Err(e) => {
                    warn!("Could not resolve the domain name {}: {}", domain, e);
                    resolution.failed_domains += 1;
                }
            }
        }

        Ok(resolution)
    }

    /// Decrement the reset counter, clearing the cache when it has run out
    ///
    /// Returns whether the reset window elapsed on this tick.
    fn advance_reset_counter(&mut self) -> bool {
        let elapsed = self.reset_counter == 0;

        if elapsed {
            if !self.bypass_set.is_empty() {
                info!("Clearing cached bypassed IPs due to scheduled reset.");
                let cleared = self.bypass_set.len();
                self.bypass_set.clear();
                self.emit_event(EngineEvent::ResetFired { cleared });
            }
            self.reset_counter = self.reset_counter_initial;
        }

        self.reset_counter -= 1;
        elapsed
    }

    /// Emit an engine event
    ///
    /// A full channel drops the event with a warning; a closed channel means
    /// nobody is listening and the event is discarded silently.
    pub(crate) fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. Consider increasing event_channel_capacity."
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
