// # bypassd - VPN bypass whitelist daemon
//
// Thin integration layer over bypass-core. All reconciliation logic lives
// in the library; this binary only:
// 1. Parses flags (each with a `BYPASS_*` environment fallback)
// 2. Initializes logging and the runtime
// 3. Wires the file store, system resolver and piactl applier together
// 4. Runs one subcommand
//
// ## Example
//
// ```bash
// bypassd add --domain example.com,example.org
// bypassd list-ips
// BYPASS_LOG_FILE=/var/log/bypassd.log bypassd start --interval 15
// ```

mod cli;
mod commands;
mod logging;
mod signals;

use clap::Parser;
use std::process::ExitCode;
use tracing::error;

use bypass_core::Termination;
use cli::{Args, Command};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BypassExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<BypassExitCode> for ExitCode {
    fn from(code: BypassExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Configuration validation error: {}", e);
        return BypassExitCode::ConfigError.into();
    }

    let config = args.to_config();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return BypassExitCode::ConfigError.into();
    }

    if let Err(e) = logging::init(&args.log_level, args.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return BypassExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return BypassExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        let result = match &args.command {
            Command::Add { domain } => commands::add(&config, domain).await.map(|_| None),
            Command::Remove { domain } => commands::remove(&config, domain).await.map(|_| None),
            Command::ListDomains => commands::list_domains(&config).await.map(|_| None),
            Command::ListIps => commands::list_ips(&config).await.map(|_| None),
            Command::Start { .. } => commands::start(&config).await.map(Some),
        };

        match result {
            Ok(termination) => exit_code_for(termination.as_ref()),
            Err(e) => {
                error!("{:#}", e);
                BypassExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Map a scheduler outcome to an exit code; `None` means a one-shot command
/// finished.
fn exit_code_for(termination: Option<&Termination>) -> BypassExitCode {
    match termination {
        None | Some(Termination::Cancelled) => BypassExitCode::CleanShutdown,
        Some(Termination::Fatal(_)) => BypassExitCode::RuntimeError,
    }
}
