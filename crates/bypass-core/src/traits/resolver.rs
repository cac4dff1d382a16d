// # Resolver Trait
//
// Defines the interface for turning a domain name into IP addresses.
//
// ## Implementations
//
// - OS resolver: `bypass-resolver-system` crate
//
// ## Failure Semantics
//
// A failed or empty resolution is never fatal. The engine logs a warning for
// the domain and carries on with the rest of the whitelist, so a resolver
// should report failure with `Err` and let the engine decide what to do.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Address family filter for resolution results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    /// IPv4 only
    #[default]
    V4,
    /// IPv6 only
    V6,
    /// Both IPv4 and IPv6
    Any,
}

impl IpFamily {
    /// Check whether an address belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpFamily::V4 => ip.is_ipv4(),
            IpFamily::V6 => ip.is_ipv6(),
            IpFamily::Any => true,
        }
    }
}

impl std::str::FromStr for IpFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v4" | "ipv4" => Ok(IpFamily::V4),
            "v6" | "ipv6" => Ok(IpFamily::V6),
            "any" | "both" => Ok(IpFamily::Any),
            other => Err(crate::Error::config(format!(
                "Unknown IP family '{}'. Valid: v4, v6, any",
                other
            ))),
        }
    }
}

/// Trait for resolver implementations
///
/// # Trust Level: Untrusted
///
/// Resolvers are single-shot lookups. They must not cache results across
/// calls, retry, or decide whether an address should be bypassed; the cache
/// and every policy decision belong to the `ReconciliationEngine`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a domain to zero or more addresses
    ///
    /// # Parameters
    ///
    /// - `domain`: The hostname to resolve (e.g., "example.com")
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<IpAddr>)`: The resolved addresses (may be empty)
    /// - `Err(Error)`: The lookup failed
    async fn resolve(&self, domain: &str) -> Result<Vec<IpAddr>, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
