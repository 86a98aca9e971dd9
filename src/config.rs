//! Solve configuration.
//!
//! A [`SolveConfig`] carries the invocation parameters of one solve (time
//! budget, daily minimum) together with the modelling policies and the
//! backend choice. It can be built in code with `with_*` methods or read
//! from TOML:
//!
//! ```
//! use u_roster::config::{BackendKind, OverlapPolicy, SolveConfig};
//!
//! let config = SolveConfig::from_toml_str(r#"
//!     time_limit_secs = 10.0
//!     min_nurses_per_day = 2
//!     overlap = "partial"
//!     backend = "microlp"
//! "#).unwrap();
//! assert_eq!(config.overlap, OverlapPolicy::Partial);
//! assert_eq!(config.backend, BackendKind::Microlp);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SchedulingError};

/// When a shift may cover a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// The task window must lie inside the shift window.
    #[default]
    Containment,
    /// The task window must intersect the shift's working time
    /// (window minus break) for a positive length.
    Partial,
    /// The task's work (`duration_min`) must fit, at some start inside the
    /// task window, within one unbroken stretch of the shift's working time.
    Placement,
}

/// What the solver optimises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// Minimise `Σ shift.weight × nurses`.
    #[default]
    MinimizeCost,
    /// Minimise the number of nurses rostered.
    MinimizeHeadcount,
    /// Any feasible schedule.
    FeasibilityOnly,
}

/// Which solver backend runs the exact search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Pure-Rust MILP solver (open source, always available).
    #[default]
    Microlp,
    /// Gurobi command-line solver (requires a license).
    Gurobi,
}

/// Settings for the greedy incumbent heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncumbentConfig {
    /// Whether to build a heuristic solution before the exact search.
    pub enabled: bool,
    /// Randomised restarts after the first deterministic pass.
    pub restarts: u32,
    /// Seed for restart ordering.
    pub seed: u64,
}

impl Default for IncumbentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            restarts: 16,
            seed: 42,
        }
    }
}

/// Parameters of one solve invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Wall-clock budget in seconds (soft cutoff).
    pub time_limit_secs: f64,
    /// Minimum nurses rostered on each rostered day.
    pub min_nurses_per_day: u32,
    /// Shift/task overlap rule.
    pub overlap: OverlapPolicy,
    /// Optimisation target.
    pub objective: ObjectiveKind,
    /// Exact search backend.
    pub backend: BackendKind,
    /// Explicit license file for licensed backends.
    pub license_file: Option<PathBuf>,
    /// Greedy incumbent settings.
    pub incumbent: IncumbentConfig,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 30.0,
            min_nurses_per_day: 0,
            overlap: OverlapPolicy::default(),
            objective: ObjectiveKind::default(),
            backend: BackendKind::default(),
            license_file: None,
            incumbent: IncumbentConfig::default(),
        }
    }
}

impl SolveConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns [`SchedulingError::ConfigParse`] on malformed TOML and
    /// [`SchedulingError::InvalidConfig`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the time budget in seconds.
    pub fn with_time_limit_secs(mut self, secs: f64) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Sets the minimum nurses per day.
    pub fn with_min_nurses_per_day(mut self, min: u32) -> Self {
        self.min_nurses_per_day = min;
        self
    }

    /// Sets the overlap policy.
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: ObjectiveKind) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets an explicit license file.
    pub fn with_license_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.license_file = Some(path.into());
        self
    }

    /// Sets the incumbent heuristic settings.
    pub fn with_incumbent(mut self, incumbent: IncumbentConfig) -> Self {
        self.incumbent = incumbent;
        self
    }

    /// Disables the incumbent heuristic.
    pub fn without_incumbent(mut self) -> Self {
        self.incumbent.enabled = false;
        self
    }

    /// Time budget as a [`Duration`]. Call [`validate`](Self::validate) first.
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_secs.max(0.0))
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    /// Rejects non-positive or non-finite time limits.
    pub fn validate(&self) -> Result<()> {
        if !self.time_limit_secs.is_finite() || self.time_limit_secs <= 0.0 {
            return Err(SchedulingError::InvalidConfig(format!(
                "time_limit_secs must be a positive number, got {}",
                self.time_limit_secs
            )));
        }
        if self.time_limit_secs > 1.0e9 {
            return Err(SchedulingError::InvalidConfig(format!(
                "time_limit_secs {} is too large",
                self.time_limit_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolveConfig::default();
        assert_eq!(config.overlap, OverlapPolicy::Containment);
        assert_eq!(config.objective, ObjectiveKind::MinimizeCost);
        assert_eq!(config.backend, BackendKind::Microlp);
        assert!(config.incumbent.enabled);
        assert!(config.validate().is_ok());
        assert_eq!(config.time_limit(), Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = SolveConfig::new()
            .with_time_limit_secs(2.5)
            .with_min_nurses_per_day(3)
            .with_objective(ObjectiveKind::FeasibilityOnly)
            .with_backend(BackendKind::Gurobi)
            .with_license_file("/tmp/gurobi.lic")
            .without_incumbent();
        assert_eq!(config.min_nurses_per_day, 3);
        assert_eq!(config.time_limit(), Duration::from_millis(2500));
        assert!(!config.incumbent.enabled);
        assert_eq!(config.license_file, Some(PathBuf::from("/tmp/gurobi.lic")));
    }

    #[test]
    fn test_from_toml() {
        let config = SolveConfig::from_toml_str(
            r#"
            time_limit_secs = 5.0
            objective = "minimize_headcount"
            overlap = "placement"

            [incumbent]
            restarts = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.objective, ObjectiveKind::MinimizeHeadcount);
        assert_eq!(config.overlap, OverlapPolicy::Placement);
        assert_eq!(config.incumbent.restarts, 4);
        assert_eq!(config.incumbent.seed, 42);
        assert_eq!(config.min_nurses_per_day, 0);
    }

    #[test]
    fn test_invalid_time_limit() {
        assert!(matches!(
            SolveConfig::new().with_time_limit_secs(0.0).validate(),
            Err(SchedulingError::InvalidConfig(_))
        ));
        assert!(SolveConfig::new().with_time_limit_secs(f64::NAN).validate().is_err());
        assert!(matches!(
            SolveConfig::from_toml_str("time_limit_secs = -1.0"),
            Err(SchedulingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            SolveConfig::from_toml_str("overlap = \"sideways\""),
            Err(SchedulingError::ConfigParse(_))
        ));
    }
}
