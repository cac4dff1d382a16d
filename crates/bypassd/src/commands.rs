//! Subcommand handlers

use anyhow::{Context, Result};
use bypass_applier_piactl::PiactlApplier;
use bypass_core::traits::parse_domain_input;
use bypass_core::{
    BypassConfig, DomainStore, DomainStoreConfig, EngineEvent, FileDomainStore,
    MemoryDomainStore, ReconciliationEngine, Scheduler, Termination,
};
use bypass_resolver_system::SystemResolver;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::signals::ShutdownSignals;

fn build_domain_store(config: &DomainStoreConfig) -> Box<dyn DomainStore> {
    match config {
        DomainStoreConfig::File { path } => Box::new(FileDomainStore::new(path)),
        DomainStoreConfig::Memory => Box::new(MemoryDomainStore::new()),
    }
}

fn build_engine(
    config: &BypassConfig,
) -> Result<(ReconciliationEngine, mpsc::Receiver<EngineEvent>)> {
    let domains = build_domain_store(&config.domain_store);
    let resolver = SystemResolver::from_config(&config.resolver);
    let applier = PiactlApplier::from_config(&config.applier)?;

    let (engine, events) = ReconciliationEngine::new(
        domains,
        Box::new(resolver),
        Box::new(applier),
        &config.engine,
    )?;
    Ok((engine, events))
}

pub async fn add(config: &BypassConfig, input: &str) -> Result<()> {
    let store = build_domain_store(&config.domain_store);
    let domains = parse_domain_input(input);

    if store.add_domains(&domains).await? {
        println!("Domains added to whitelist.");
    } else {
        println!("No Domains added to whitelist.");
    }
    Ok(())
}

pub async fn remove(config: &BypassConfig, input: &str) -> Result<()> {
    let store = build_domain_store(&config.domain_store);
    let domains = parse_domain_input(input);

    if store.remove_domains(&domains).await? {
        println!("Domain removed from whitelist.");
    } else {
        println!("No Domain removed from whitelist.");
    }
    Ok(())
}

pub async fn list_domains(config: &BypassConfig) -> Result<()> {
    let store = build_domain_store(&config.domain_store);
    for domain in store.read_all().await? {
        println!("{}", domain);
    }
    Ok(())
}

/// Resolve once without touching the VPN client.
///
/// The bypass cache lives only in the running daemon, so this shows what a
/// fresh daemon would bypass on its first tick.
pub async fn list_ips(config: &BypassConfig) -> Result<()> {
    let (mut engine, _events) = build_engine(config)?;
    let report = engine.tick().await?;

    if report.failed_domains > 0 {
        debug!("{} domain(s) did not resolve", report.failed_domains);
    }
    for ip in engine.bypassed_ips() {
        println!("{}", ip);
    }
    Ok(())
}

/// Run the scheduler until a shutdown signal or a fatal error.
pub async fn start(config: &BypassConfig) -> Result<Termination> {
    let (engine, mut events) = build_engine(config)?;
    let mut signals = ShutdownSignals::install().context("failed to install signal handlers")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        let signal = signals.recv().await;
        info!("Received shutdown signal: {}", signal);
        signal_token.cancel();
    });

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "engine event");
        }
    });

    Ok(Scheduler::new(engine).run(cancel).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bypass_core::ApplierConfig;

    fn file_config(dir: &tempfile::TempDir) -> BypassConfig {
        BypassConfig {
            domain_store: DomainStoreConfig::File {
                path: dir.path().join("domain_whitelist.txt"),
            },
            applier: ApplierConfig::Piactl {
                binary: "piactl".to_string(),
                dry_run: true,
            },
            ..BypassConfig::default()
        }
    }

    #[tokio::test]
    async fn test_add_then_remove_updates_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(&dir);
        let path = dir.path().join("domain_whitelist.txt");

        add(&config, "b.example, a.example").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a.example\nb.example"
        );

        remove(&config, "a.example").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b.example");
    }

    #[tokio::test]
    async fn test_list_domains_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_domains(&file_config(&dir)).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_ips_with_literal_address() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(&dir);
        add(&config, "127.0.0.1").await.unwrap();

        assert!(list_ips(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_build_engine_rejects_bad_binary() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = file_config(&dir);
        config.applier = ApplierConfig::Piactl {
            binary: String::new(),
            dry_run: false,
        };

        assert!(build_engine(&config).is_err());
    }
}
