// # Domain Store Trait
//
// Defines the interface for the persisted domain whitelist.
//
// ## Purpose
//
// The domain store holds the operator-maintained set of hostnames whose
// resolved addresses are bypassed. The engine only ever reads it; the CLI
// adds and removes entries.
//
// ## Implementations
//
// - File-based: newline-separated text file (`FileDomainStore`)
// - In-memory: tests and embedding (`MemoryDomainStore`)
//
// ## Usage
//
// ```rust,ignore
// use bypass_core::{DomainStore, traits::parse_domain_input};
//
// let store = /* DomainStore implementation */;
// let added = store.add_domains(&parse_domain_input("example.com,example.org")).await?;
// ```

use async_trait::async_trait;
use std::collections::BTreeSet;

/// Split a comma-separated domain list, trimming entries and dropping empties
pub fn parse_domain_input(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate that a string is a valid domain name
///
/// This implements basic DNS domain name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::invalid_input("Domain name cannot be empty"));
    }

    // RFC 1035: 253 chars max
    if domain.len() > 253 {
        return Err(crate::Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::invalid_input(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Trait for domain store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Missing Backing Store
///
/// A store whose backing file does not exist yet is not broken: `read_all()`
/// logs the condition and returns an empty set. Any other I/O failure is
/// returned as [`crate::Error::DomainStore`].
///
/// # Ordering
///
/// Domains are kept in a `BTreeSet`, so persisted output is always sorted.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Read every stored domain
    ///
    /// # Returns
    ///
    /// - `Ok(BTreeSet<String>)`: The stored domains (empty if the store is missing)
    /// - `Err(Error)`: Storage error
    async fn read_all(&self) -> Result<BTreeSet<String>, crate::Error>;

    /// Replace the stored domains with `domains`
    async fn write_all(&self, domains: &BTreeSet<String>) -> Result<(), crate::Error>;

    /// Add domains to the store
    ///
    /// Nothing is written when every domain is already present.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: At least one new domain was persisted
    /// - `Ok(false)`: Input was empty or already fully present
    async fn add_domains(&self, domains: &BTreeSet<String>) -> Result<bool, crate::Error> {
        if domains.is_empty() {
            return Ok(false);
        }

        let existing = self.read_all().await?;
        let merged: BTreeSet<String> = existing.union(domains).cloned().collect();
        if merged.len() == existing.len() {
            return Ok(false);
        }

        self.write_all(&merged).await?;
        Ok(true)
    }

    /// Remove domains from the store
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: At least one domain was removed
    /// - `Ok(false)`: Input was empty or none of the domains were stored
    async fn remove_domains(&self, domains: &BTreeSet<String>) -> Result<bool, crate::Error> {
        if domains.is_empty() {
            return Ok(false);
        }

        let existing = self.read_all().await?;
        let remaining: BTreeSet<String> = existing.difference(domains).cloned().collect();
        if remaining.len() == existing.len() {
            return Ok(false);
        }

        self.write_all(&remaining).await?;
        Ok(true)
    }

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
