use anyhow::Result;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Shutdown signal handlers, installed before the scheduler starts so a
/// setup failure is reported as a startup error.
#[cfg(unix)]
pub struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    pub fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for SIGTERM or SIGINT and return its name
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Ctrl-C only on non-Unix platforms
#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn install() -> Result<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<&'static str>().await
            }
        }
    }
}
