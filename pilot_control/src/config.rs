//! Configuration loading and hot reload for the control core.
//!
//! Startup reads one `ControlsConfig` TOML document and freezes it into a
//! [`ConfigSnapshot`]. While running, a [`ConfigRefresher`] re-reads the file
//! on a fixed tick cadence. A reload goes through the same validation as
//! startup plus a scope check; a valid document is staged and the core swaps
//! it in on the first tick it is Disabled.
//!
//! **Reloadable**: every tuning table, timer and threshold, the lateral
//! controller choice, vehicle geometry.
//!
//! **NOT reloadable** (require restart):
//! - `timing.tick_period_us`
//! - `vehicle.steer_control`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pilot_common::config::ConfigLoader;
use pilot_common::controls::config::ControlsConfig;
use thiserror::Error;
use tracing::{info, warn};

use crate::lateral::LateralError;

/// Errors from loading or reloading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Read, parse or range-validation failure.
    #[error(transparent)]
    Load(#[from] pilot_common::config::ConfigError),

    /// The lateral controller tree cannot be built from this document.
    #[error("lateral controller: {0}")]
    Lateral(#[from] LateralError),

    /// Reload changed a field that requires a restart.
    #[error("reload scope violation: {0}")]
    ReloadScopeViolation(String),
}

// ─── Snapshot ───────────────────────────────────────────────────────

/// Immutable, validated configuration handed to the core.
///
/// Cloning is cheap; the document itself is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    config: Arc<ControlsConfig>,
    generation: u64,
}

impl ConfigSnapshot {
    /// Validate and freeze a configuration.
    pub fn new(config: ControlsConfig, generation: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            generation,
        })
    }

    #[inline]
    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    /// Increments on every accepted reload. Startup is generation 0.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tick period [s].
    #[inline]
    pub fn dt(&self) -> f64 {
        self.config.timing.dt()
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            config: Arc::new(ControlsConfig::default()),
            generation: 0,
        }
    }
}

/// Load and validate the startup configuration.
pub fn load_config(path: &Path) -> Result<ConfigSnapshot, ConfigError> {
    let config = ControlsConfig::load(path)?;
    let snapshot = ConfigSnapshot::new(config, 0)?;
    info!(
        path = %path.display(),
        controller = %snapshot.config().lateral.controller,
        tick_period_us = snapshot.config().timing.tick_period_us,
        "configuration loaded"
    );
    Ok(snapshot)
}

/// Parse and validate a configuration held in memory.
pub fn load_config_from_str(toml: &str) -> Result<ConfigSnapshot, ConfigError> {
    let config = ControlsConfig::from_toml_str(toml)?;
    ConfigSnapshot::new(config, 0)
}

// ─── Hot Reload ─────────────────────────────────────────────────────

/// Outcome of one reload attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReloadResult {
    /// File content matches the latest known configuration.
    Unchanged,
    /// New snapshot accepted, waiting for the core to apply it.
    Staged(ConfigSnapshot),
    /// Read, parse or validation failed. The active snapshot stays.
    ValidationFailed(String),
    /// The document changes a field that requires a restart.
    Denied(String),
}

/// Parse a candidate document against the active snapshot.
///
/// 1. Parse
/// 2. Full validation, same rules as startup
/// 3. Reload scope check
pub fn parse_shadow_config(
    toml: &str,
    active: &ConfigSnapshot,
) -> Result<ConfigSnapshot, ConfigError> {
    let shadow = ControlsConfig::from_toml_str(toml)?;
    shadow.validate()?;
    validate_reload_scope(active.config(), &shadow)?;
    crate::lateral::LateralController::from_config(&shadow.lateral, shadow.timing.dt())?;
    ConfigSnapshot::new(shadow, active.generation() + 1)
}

/// Reject changes to fields that require a restart.
pub fn validate_reload_scope(
    active: &ControlsConfig,
    shadow: &ControlsConfig,
) -> Result<(), ConfigError> {
    if active.timing.tick_period_us != shadow.timing.tick_period_us {
        return Err(ConfigError::ReloadScopeViolation(format!(
            "tick_period_us changed: {} → {} (requires restart)",
            active.timing.tick_period_us, shadow.timing.tick_period_us,
        )));
    }
    if active.vehicle.steer_control != shadow.vehicle.steer_control {
        return Err(ConfigError::ReloadScopeViolation(format!(
            "steer_control changed: {:?} → {:?} (requires restart)",
            active.vehicle.steer_control, shadow.vehicle.steer_control,
        )));
    }
    Ok(())
}

/// Re-reads the configuration file every `interval_ticks` ticks.
#[derive(Debug, Clone)]
pub struct ConfigRefresher {
    path: PathBuf,
    interval_ticks: u32,
    ticks: u32,
}

impl ConfigRefresher {
    pub fn new(path: impl Into<PathBuf>, interval_ticks: u32) -> Self {
        Self {
            path: path.into(),
            interval_ticks: interval_ticks.max(1),
            ticks: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn interval_ticks(&self) -> u32 {
        self.interval_ticks
    }

    /// Count one tick. Returns a reload result when the cadence is due.
    ///
    /// `latest` is the newest known snapshot: the staged one if a reload is
    /// still pending, otherwise the active one.
    pub fn poll(&mut self, latest: &ConfigSnapshot) -> Option<ReloadResult> {
        self.ticks += 1;
        if self.ticks < self.interval_ticks {
            return None;
        }
        self.ticks = 0;
        Some(self.reload_now(latest))
    }

    /// Read the file and evaluate it immediately.
    pub fn reload_now(&self, latest: &ConfigSnapshot) -> ReloadResult {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                let reason = format!("{}: {e}", self.path.display());
                warn!(%reason, "configuration reload failed");
                return ReloadResult::ValidationFailed(reason);
            }
        };

        match parse_shadow_config(&content, latest) {
            Ok(shadow) if shadow.config() == latest.config() => ReloadResult::Unchanged,
            Ok(shadow) => {
                info!(generation = shadow.generation(), "configuration reload staged");
                ReloadResult::Staged(shadow)
            }
            Err(ConfigError::ReloadScopeViolation(reason)) => {
                warn!(%reason, "configuration reload denied");
                ReloadResult::Denied(reason)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(%reason, "configuration reload rejected");
                ReloadResult::ValidationFailed(reason)
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_common::controls::command::LateralKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASE: &str = r#"
[shared]
service_name = "pilot-test"

[lateral]
controller = "pid"
"#;

    fn write(file: &mut NamedTempFile, content: &str) {
        let f = file.as_file_mut();
        f.set_len(0).unwrap();
        use std::io::Seek;
        f.rewind().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write(&mut file, BASE);
        let snap = load_config(file.path()).unwrap();
        assert_eq!(snap.generation(), 0);
        assert_eq!(snap.config().lateral.controller, LateralKind::Pid);
        assert!((snap.dt() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/pilot.toml")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Load(pilot_common::config::ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn out_of_range_value_rejected_at_startup() {
        let toml = "[lateral]\nsteer_max = 5.0\n";
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn shadow_bumps_generation() {
        let active = load_config_from_str(BASE).unwrap();
        let shadow = parse_shadow_config(
            "[shared]\nservice_name = \"pilot-test\"\n[lateral]\ncontroller = \"lqr\"\n",
            &active,
        )
        .unwrap();
        assert_eq!(shadow.generation(), 1);
        assert_eq!(shadow.config().lateral.controller, LateralKind::Lqr);
    }

    #[test]
    fn tick_period_change_is_out_of_scope() {
        let active = load_config_from_str(BASE).unwrap();
        let err = parse_shadow_config("[timing]\ntick_period_us = 20000\n", &active).unwrap_err();
        assert!(matches!(err, ConfigError::ReloadScopeViolation(_)));
    }

    #[test]
    fn steer_control_change_is_out_of_scope() {
        let active = load_config_from_str(BASE).unwrap();
        let toml = "[lateral]\ncontroller = \"angle\"\n[vehicle]\nsteer_control = \"angle\"\n";
        assert!(matches!(
            parse_shadow_config(toml, &active),
            Err(ConfigError::ReloadScopeViolation(_))
        ));
    }

    #[test]
    fn refresher_polls_on_cadence() {
        let mut file = NamedTempFile::new().unwrap();
        write(&mut file, BASE);
        let active = load_config(file.path()).unwrap();
        let mut refresher = ConfigRefresher::new(file.path(), 3);

        assert_eq!(refresher.poll(&active), None);
        assert_eq!(refresher.poll(&active), None);
        assert_eq!(refresher.poll(&active), Some(ReloadResult::Unchanged));
        assert_eq!(refresher.poll(&active), None);
    }

    #[test]
    fn refresher_stages_valid_change() {
        let mut file = NamedTempFile::new().unwrap();
        write(&mut file, BASE);
        let active = load_config(file.path()).unwrap();
        let refresher = ConfigRefresher::new(file.path(), 1);

        write(&mut file, "[lateral]\ncontroller = \"torque\"\n");
        match refresher.reload_now(&active) {
            ReloadResult::Staged(snap) => {
                assert_eq!(snap.config().lateral.controller, LateralKind::Torque);
                assert_eq!(snap.generation(), 1);
            }
            other => panic!("expected Staged, got {other:?}"),
        }
    }

    #[test]
    fn refresher_keeps_active_on_bad_document() {
        let mut file = NamedTempFile::new().unwrap();
        write(&mut file, BASE);
        let active = load_config(file.path()).unwrap();
        let refresher = ConfigRefresher::new(file.path(), 1);

        write(&mut file, "[lateral\ncontroller = ");
        assert!(matches!(
            refresher.reload_now(&active),
            ReloadResult::ValidationFailed(_)
        ));

        write(&mut file, "[timing]\ntick_period_us = 5000\n");
        assert!(matches!(refresher.reload_now(&active), ReloadResult::Denied(_)));
    }
}
