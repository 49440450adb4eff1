//! Planning errors.

use cdp_core::CdpError;
use thiserror::Error;

/// Why a plan could not be produced.
///
/// `Data` and `Configuration` are raised before any variable is declared.
/// `Infeasible`, `Unbounded` and `Solver` come back from the solve call and
/// carry no partial results. A time-limited solve is not an error; it returns
/// a solution whose status says so.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Data error in {entity}: {message}")]
    Data { entity: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model infeasible: {0}")]
    Infeasible(String),

    #[error("Model unbounded")]
    Unbounded,

    #[error("Solver failed: {0}")]
    Solver(String),
}

impl PlanError {
    /// True when the failure happened before the solver was called.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, PlanError::Data { .. } | PlanError::Configuration(_))
    }
}

impl From<CdpError> for PlanError {
    fn from(err: CdpError) -> Self {
        match err {
            CdpError::Data { entity, message } => PlanError::Data { entity, message },
            CdpError::Configuration(msg) => PlanError::Configuration(msg),
            CdpError::Parse(msg) => PlanError::Data {
                entity: "region data".into(),
                message: msg,
            },
        }
    }
}

impl From<good_lp::ResolutionError> for PlanError {
    fn from(err: good_lp::ResolutionError) -> Self {
        match err {
            good_lp::ResolutionError::Infeasible => {
                PlanError::Infeasible("no assignment satisfies every coverage constraint".into())
            }
            good_lp::ResolutionError::Unbounded => PlanError::Unbounded,
            other => PlanError::Solver(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_their_class() {
        let err: PlanError = CdpError::data("region 1", "missing population0_5").into();
        assert!(matches!(err, PlanError::Data { .. }));
        assert!(err.is_construction_error());

        let err: PlanError = CdpError::config("zero divisor").into();
        assert!(matches!(err, PlanError::Configuration(_)));

        let err: PlanError = CdpError::Parse("expected `,`".into()).into();
        assert!(matches!(err, PlanError::Data { .. }));
    }

    #[test]
    fn test_resolution_errors_classified() {
        let err: PlanError = good_lp::ResolutionError::Infeasible.into();
        assert!(matches!(err, PlanError::Infeasible(_)));
        assert!(!err.is_construction_error());

        let err: PlanError = good_lp::ResolutionError::Unbounded.into();
        assert!(matches!(err, PlanError::Unbounded));
    }
}
