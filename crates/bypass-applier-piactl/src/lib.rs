// # piactl Settings Applier
//
// This crate applies the bypass subnet list to the Private Internet Access
// client through its command-line control tool:
//
// ```text
// piactl -u applysettings '{"bypassSubnets":[{"mode":"exclude","subnet":"93.184.216.34/32"}]}'
// ```
//
// ## Behaviour
//
// - One `piactl` invocation per `apply()` call
// - The payload always carries the full bypass list (PIA replaces the setting)
// - Non-zero exit status is an error carrying piactl's stderr
// - NO retry logic (the engine re-applies on its next tick)
// - Dry-run mode logs the payload without spawning piactl
//
// ## Security
//
// piactl is spawned directly, never through a shell, so the JSON payload is
// passed as a single argument and cannot be interpreted as shell syntax.

use async_trait::async_trait;
use bypass_core::config::ApplierConfig;
use bypass_core::traits::{BypassSettings, BypassSubnetDescriptor, SettingsApplier};
use bypass_core::{Error, Result};
use tokio::process::Command;

/// Default piactl binary name (resolved through `PATH`)
pub const DEFAULT_PIACTL_BINARY: &str = "piactl";

/// Settings applier that shells out to `piactl`
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the applier will:
/// - Render the payload exactly as it would be sent
/// - Log it at info level
/// - **NOT** invoke piactl
#[derive(Debug, Clone)]
pub struct PiactlApplier {
    /// Path or name of the piactl binary
    binary: String,

    /// Dry-run mode: log the payload instead of applying it
    dry_run: bool,
}

impl PiactlApplier {
    /// Create a new piactl applier
    ///
    /// # Parameters
    ///
    /// - `binary`: Path or name of the piactl binary
    /// - `dry_run`: If true, log the payload but never invoke piactl
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `binary` is empty or contains whitespace.
    pub fn new(binary: impl Into<String>, dry_run: bool) -> Result<Self> {
        let binary = binary.into();
        ApplierConfig::Piactl {
            binary: binary.clone(),
            dry_run,
        }
        .validate()?;

        Ok(Self { binary, dry_run })
    }

    /// Create a piactl applier (live mode) using `piactl` from `PATH`
    pub fn new_live() -> Self {
        Self {
            binary: DEFAULT_PIACTL_BINARY.to_string(),
            dry_run: false,
        }
    }

    /// Create a piactl applier (dry-run mode) using `piactl` from `PATH`
    pub fn new_dry_run() -> Self {
        Self {
            binary: DEFAULT_PIACTL_BINARY.to_string(),
            dry_run: true,
        }
    }

    /// Create a piactl applier from configuration
    pub fn from_config(config: &ApplierConfig) -> Result<Self> {
        match config {
            ApplierConfig::Piactl { binary, dry_run } => Self::new(binary.clone(), *dry_run),
        }
    }

    /// Whether this applier is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Binary this applier invokes
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl SettingsApplier for PiactlApplier {
    async fn apply(&self, descriptors: &[BypassSubnetDescriptor]) -> Result<()> {
        let payload = BypassSettings::new(descriptors.to_vec()).to_payload()?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would run: {} -u applysettings {}",
                self.binary,
                payload
            );
            return Ok(());
        }

        tracing::debug!("Applying {} bypass subnet(s)", descriptors.len());

        let output = Command::new(&self.binary)
            .args(["-u", "applysettings", &payload])
            .output()
            .await
            .map_err(|e| {
                Error::applier(
                    self.applier_name(),
                    format!("Failed to execute {}: {}", self.binary, e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::applier(
                self.applier_name(),
                format!(
                    "{} -u applysettings failed ({}): {}",
                    self.binary,
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        tracing::info!("PIA whitelist settings applied successfully.");
        Ok(())
    }

    fn applier_name(&self) -> &'static str {
        "piactl"
    }
}
