// # System Resolver
//
// This crate provides a `Resolver` backed by the operating system's name
// resolution (`getaddrinfo` via `tokio::net::lookup_host`).
//
// ## Behaviour
//
// - One lookup per `resolve()` call; no caching, no retries
// - Results are filtered to the configured address family (IPv4 by default,
//   since bypass entries are host routes and the VPN client expects `/32`)
// - Duplicates are removed and the result is sorted
// - Timeouts are whatever the OS resolver imposes

use async_trait::async_trait;
use bypass_core::config::ResolverConfig;
use bypass_core::traits::{IpFamily, Resolver};
use bypass_core::{Error, Result};
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Resolver backed by the OS resolver
#[derive(Debug, Clone, Default)]
pub struct SystemResolver {
    /// Address family to keep
    family: IpFamily,
}

impl SystemResolver {
    /// Create a resolver that keeps addresses of `family`
    pub fn new(family: IpFamily) -> Self {
        Self { family }
    }

    /// Create a resolver from configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.family)
    }

    /// Address family this resolver keeps
    pub fn family(&self) -> IpFamily {
        self.family
    }

    /// Keep addresses of the configured family, deduplicated and sorted
    fn filter<I>(&self, addrs: I) -> Vec<IpAddr>
    where
        I: IntoIterator<Item = IpAddr>,
    {
        addrs
            .into_iter()
            .filter(|ip| self.family.matches(ip))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, domain: &str) -> Result<Vec<IpAddr>> {
        // Port is irrelevant; lookup_host needs a socket address
        let addrs = tokio::net::lookup_host((domain, 0))
            .await
            .map_err(|e| Error::resolver(format!("Could not resolve {}: {}", domain, e)))?;

        let ips = self.filter(addrs.map(|addr| addr.ip()));
        tracing::debug!("Resolved {} -> {:?}", domain, ips);
        Ok(ips)
    }

    fn resolver_name(&self) -> &'static str {
        "system"
    }
}
