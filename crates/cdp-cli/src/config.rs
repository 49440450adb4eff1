//! Planner configuration file.
//!
//! A `cdp.toml` may override any model constant under `[parameters]` and the
//! backend settings under `[solver]`. Partial files are fine; unspecified
//! values keep their defaults.
//!
//! ```toml
//! [parameters]
//! alpha = 250.0
//! min_separation_miles = 0.1
//!
//! [parameters.facility_types.L]
//! capacity_total = 400
//! capacity_under5 = 200
//! unit_cost = 120000.0
//!
//! [solver]
//! backend = "highs"
//! time_limit_seconds = 60.0
//! ```

use anyhow::{Context, Result};
use cdp_algo::SolverConfig;
use cdp_core::PlanParameters;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    pub parameters: PlanParameters,
    pub solver: SolverConfig,
}

impl CdpConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config file: {}", path.display()))?;
        Ok(config)
    }

    /// Defaults when no file is given.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_algo::MilpBackend;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: CdpConfig = toml::from_str(
            r#"
            [parameters]
            alpha = 250.0

            [parameters.demand]
            average_income = 55000.0

            [solver]
            time_limit_seconds = 30.0
            "#,
        )
        .unwrap();

        let defaults = PlanParameters::default();
        assert_eq!(config.parameters.alpha, 250.0);
        assert_eq!(config.parameters.demand.average_income, 55_000.0);
        assert_eq!(
            config.parameters.demand.employment_rate,
            defaults.demand.employment_rate
        );
        assert_eq!(config.parameters.beta, defaults.beta);
        assert_eq!(config.parameters.facility_types, defaults.facility_types);
        assert_eq!(config.solver.time_limit_seconds, Some(30.0));
        assert_eq!(config.solver.backend, MilpBackend::default());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: CdpConfig = toml::from_str("").unwrap();
        assert_eq!(config.parameters, PlanParameters::default());
        assert!(config.solver.time_limit_seconds.is_none());
    }

    #[test]
    fn test_facility_type_override() {
        let config: CdpConfig = toml::from_str(
            r#"
            [parameters.facility_types.S]
            capacity_total = 80
            capacity_under5 = 40
            unit_cost = 60000.0
            "#,
        )
        .unwrap();
        assert_eq!(config.parameters.facility_types.small.capacity_total, 80);
        assert_eq!(config.parameters.facility_types.large.capacity_total, 400);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cdp.toml");
        std::fs::write(
            &path,
            "[parameters]\nmin_separation_miles = 0.1\n\n[solver]\nmip_gap = 0.01\n",
        )
        .unwrap();

        let loaded = CdpConfig::load_optional(Some(&path)).unwrap();
        assert_eq!(loaded.parameters.min_separation_miles, 0.1);
        assert_eq!(loaded.solver.mip_gap, 0.01);
        assert_eq!(loaded.parameters.alpha, PlanParameters::default().alpha);
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = CdpConfig::load_from(Path::new("/nonexistent/cdp.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("reading config file"));
    }
}
