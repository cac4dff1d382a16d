// # Settings Applier Trait
//
// Defines the interface for pushing the bypass subnet list to the VPN client.
//
// ## Implementations
//
// - Private Internet Access: `bypass-applier-piactl` crate
//
// ## Wire Format
//
// ```json
// {"bypassSubnets":[{"mode":"exclude","subnet":"93.184.216.34/32"}]}
// ```
//
// Keys are sorted and the list always carries the full bypass set; there is
// no incremental form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// How the VPN client should treat a subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BypassMode {
    /// Route traffic to the subnet outside the tunnel
    Exclude,
}

/// A single bypass entry sent to the VPN client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BypassSubnetDescriptor {
    /// Bypass mode (always `exclude`)
    pub mode: BypassMode,
    /// Subnet in CIDR notation
    pub subnet: String,
}

impl BypassSubnetDescriptor {
    /// Build a host-route exclusion for a single address
    ///
    /// IPv4 addresses get a `/32` suffix, IPv6 addresses `/128`.
    pub fn exclude(ip: IpAddr) -> Self {
        let prefix = match ip {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        Self {
            mode: BypassMode::Exclude,
            subnet: format!("{}/{}", ip, prefix),
        }
    }
}

/// The settings object understood by the VPN client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BypassSettings {
    /// Every subnet to bypass
    pub bypass_subnets: Vec<BypassSubnetDescriptor>,
}

impl BypassSettings {
    /// Create settings from a descriptor list
    pub fn new(bypass_subnets: Vec<BypassSubnetDescriptor>) -> Self {
        Self { bypass_subnets }
    }

    /// Render the compact JSON payload with object keys sorted
    pub fn to_payload(&self) -> Result<String, crate::Error> {
        // serde_json::Value objects are BTreeMap-backed, which sorts keys
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }
}

/// Trait for settings applier implementations
///
/// # Trust Level: Untrusted
///
/// Appliers are isolated, stateless and single-shot:
/// - One external call per `apply()`
/// - All-or-nothing: either every descriptor is applied or an error is returned
/// - No retries (the next engine tick re-applies the full set)
/// - A non-zero exit status or rejected request MUST surface as `Err`
#[async_trait]
pub trait SettingsApplier: Send + Sync {
    /// Replace the VPN client's bypass list with `descriptors`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The VPN client accepted the full list
    /// - `Err(Error)`: The VPN client rejected the list or could not be reached
    async fn apply(&self, descriptors: &[BypassSubnetDescriptor]) -> Result<(), crate::Error>;

    /// Get the applier name (for logging/debugging)
    fn applier_name(&self) -> &'static str;
}
