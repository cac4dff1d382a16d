//! Command-line arguments
//!
//! Every global flag can also be set through a `BYPASS_*` environment
//! variable, so the daemon can be configured entirely from a service unit.

use anyhow::Result;
use bypass_applier_piactl::DEFAULT_PIACTL_BINARY;
use bypass_core::config::DEFAULT_DOMAINS_FILE;
use bypass_core::traits::{IpFamily, parse_domain_input, validate_domain_name};
use bypass_core::{ApplierConfig, BypassConfig, DomainStoreConfig, EngineConfig, ResolverConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default seconds between whitelist updates
pub const DEFAULT_INTERVAL_SECS: u64 = 15;

/// Default seconds between forced clears of the cached bypass set
pub const DEFAULT_CLEAR_WINDOW_SECS: u64 = 15 * 60;

#[derive(Parser, Debug)]
#[command(name = "bypassd")]
#[command(version)]
#[command(about = "Keep the VPN client's bypass list in sync with a domain whitelist", long_about = None)]
pub struct Args {
    /// Path to the domain whitelist file
    #[arg(long, global = true, env = "BYPASS_DOMAINS_FILE", default_value = DEFAULT_DOMAINS_FILE)]
    pub domains_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "BYPASS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also append logs to this file
    #[arg(long, global = true, env = "BYPASS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Path or name of the piactl binary
    #[arg(long = "piactl", global = true, env = "BYPASS_PIACTL_BIN", default_value = DEFAULT_PIACTL_BINARY)]
    pub piactl: String,

    /// Log the settings payload instead of applying it
    #[arg(long, global = true, env = "BYPASS_DRY_RUN")]
    pub dry_run: bool,

    /// Address family to bypass (v4, v6, any)
    #[arg(long, global = true, env = "BYPASS_IP_FAMILY", default_value = "v4")]
    pub ip_family: IpFamily,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a domain or comma-separated list of domains to the whitelist
    Add {
        /// Domains such as "example.com" or "example.com,example2.com"
        #[arg(long, default_value = "")]
        domain: String,
    },

    /// Remove a domain or comma-separated list of domains from the whitelist
    Remove {
        /// Domains such as "example.com" or "example.com,example2.com"
        #[arg(long, default_value = "")]
        domain: String,
    },

    /// Print the whitelisted domains
    ListDomains,

    /// Resolve the whitelist once and print the IPs that would be bypassed
    ListIps,

    /// Run the updater until interrupted
    Start {
        /// Seconds to wait between whitelist updates
        #[arg(
            long,
            env = "BYPASS_INTERVAL",
            default_value_t = DEFAULT_INTERVAL_SECS,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        interval: u64,

        /// Seconds between forced clears of the cached bypass set
        #[arg(
            long,
            env = "BYPASS_CLEAR_WINDOW",
            default_value_t = DEFAULT_CLEAR_WINDOW_SECS,
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        clear_window: u64,
    },
}

impl Args {
    /// Build the reconciler configuration
    pub fn to_config(&self) -> BypassConfig {
        let mut engine = EngineConfig::default();
        if let Command::Start {
            interval,
            clear_window,
        } = self.command
        {
            engine = engine
                .with_poll_interval_secs(interval)
                .with_clear_window_secs(clear_window);
        }

        BypassConfig {
            domain_store: DomainStoreConfig::File {
                path: self.domains_file.clone(),
            },
            resolver: ResolverConfig {
                family: self.ip_family,
            },
            applier: ApplierConfig::Piactl {
                binary: self.piactl.clone(),
                dry_run: self.dry_run,
            },
            engine,
        }
    }

    /// Validate arguments that clap cannot check on its own
    pub fn validate(&self) -> Result<()> {
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Log level '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        if let Command::Add { domain } = &self.command {
            for name in parse_domain_input(domain) {
                validate_domain_name(&name)?;
            }
        }

        Ok(())
    }
}
