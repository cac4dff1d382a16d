//! Core traits for the bypass reconciler
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DomainStore`]: Persist the domain whitelist
//! - [`Resolver`]: Resolve a domain to IP addresses
//! - [`SettingsApplier`]: Push bypass subnets to the VPN client

pub mod domain_store;
pub mod resolver;
pub mod settings_applier;

pub use domain_store::{DomainStore, parse_domain_input, validate_domain_name};
pub use resolver::{IpFamily, Resolver};
pub use settings_applier::{BypassMode, BypassSettings, BypassSubnetDescriptor, SettingsApplier};
