//! Thin MILP facade over `good_lp`.
//!
//! The formulations only need to declare variables, add linear constraints, set
//! a minimisation objective, solve once and read values back. [`MilpModel`]
//! collects those calls and hands the finished problem to the backend chosen in
//! [`SolverConfig`].

use super::PlanError;
use good_lp::solvers::SolutionStatus;
use good_lp::{variable, Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// MILP backends compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilpBackend {
    /// Pure-Rust branch and bound (`microlp`)
    Microlp,
    /// HiGHS (native, honours time limits)
    Highs,
}

impl MilpBackend {
    pub fn is_available(self) -> bool {
        match self {
            MilpBackend::Microlp => cfg!(feature = "solver-microlp"),
            MilpBackend::Highs => cfg!(feature = "solver-highs"),
        }
    }

    pub fn supports_time_limit(self) -> bool {
        matches!(self, MilpBackend::Highs)
    }

    /// microlp always proves optimality; only HiGHS stops at a gap.
    pub fn supports_mip_gap(self) -> bool {
        matches!(self, MilpBackend::Highs)
    }

    pub fn name(self) -> &'static str {
        match self {
            MilpBackend::Microlp => "microlp",
            MilpBackend::Highs => "highs",
        }
    }
}

impl Default for MilpBackend {
    fn default() -> Self {
        if cfg!(feature = "solver-microlp") {
            MilpBackend::Microlp
        } else {
            MilpBackend::Highs
        }
    }
}

impl std::str::FromStr for MilpBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "microlp" => Ok(MilpBackend::Microlp),
            "highs" => Ok(MilpBackend::Highs),
            other => Err(format!("unknown MILP backend '{other}' (expected microlp or highs)")),
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub backend: MilpBackend,
    /// Wall-clock limit in seconds; `None` solves to optimality
    pub time_limit_seconds: Option<f64>,
    /// Relative MIP optimality gap (HiGHS only)
    pub mip_gap: f64,
    /// Whether to enable verbose solver output
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: MilpBackend::default(),
            time_limit_seconds: None,
            mip_gap: DEFAULT_MIP_GAP,
            verbose: false,
        }
    }
}

const DEFAULT_MIP_GAP: f64 = 1e-4;

impl SolverConfig {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Settings given explicitly that the selected backend cannot honour.
    pub fn ignored_settings(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.time_limit().is_some() && !self.backend.supports_time_limit() {
            ignored.push("time_limit_seconds");
        }
        if self.mip_gap != DEFAULT_MIP_GAP && !self.backend.supports_mip_gap() {
            ignored.push("mip_gap");
        }
        ignored
    }
}

/// Terminal status of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// Stopped at the time limit with a feasible incumbent
    TimeLimited,
    /// Stopped at the MIP gap tolerance
    GapLimited,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl From<SolutionStatus> for SolveStatus {
    fn from(status: SolutionStatus) -> Self {
        match status {
            SolutionStatus::Optimal => SolveStatus::Optimal,
            SolutionStatus::TimeLimit => SolveStatus::TimeLimited,
            SolutionStatus::GapLimit => SolveStatus::GapLimited,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::TimeLimited => "time-limited",
            SolveStatus::GapLimited => "gap-limited",
        })
    }
}

/// Read access to solved variable values, independent of the backend type.
pub trait ValueSource {
    fn value_of(&self, var: Variable) -> f64;
}

impl<S: Solution> ValueSource for S {
    fn value_of(&self, var: Variable) -> f64 {
        self.value(var)
    }
}

/// A model under construction.
pub struct MilpModel {
    name: String,
    vars: ProblemVariables,
    constraints: Vec<Constraint>,
    objective: Expression,
    num_vars: usize,
}

impl MilpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: ProblemVariables::new(),
            constraints: Vec::new(),
            objective: Expression::from(0.0),
            num_vars: 0,
        }
    }

    /// Integer variable in `[lower, upper]`; `None` leaves it unbounded above.
    pub fn add_integer_var(&mut self, lower: f64, upper: Option<f64>) -> Variable {
        self.num_vars += 1;
        let def = variable().integer().min(lower);
        match upper {
            Some(ub) => self.vars.add(def.max(ub)),
            None => self.vars.add(def),
        }
    }

    pub fn add_binary_var(&mut self) -> Variable {
        self.num_vars += 1;
        self.vars.add(variable().binary())
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Replace the (minimised) objective.
    pub fn set_objective(&mut self, objective: Expression) {
        self.objective = objective;
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Solve once and block until the backend reports a terminal status.
    pub fn solve(self, config: &SolverConfig) -> Result<SolvedModel, PlanError> {
        let start = Instant::now();
        info!(
            model = %self.name,
            backend = config.backend.name(),
            vars = self.num_vars,
            constraints = self.constraints.len(),
            "solving MILP"
        );

        if !config.backend.is_available() {
            return Err(PlanError::Solver(format!(
                "backend {} is not compiled in (enable feature solver-{})",
                config.backend.name(),
                config.backend.name()
            )));
        }
        for setting in config.ignored_settings() {
            warn!(
                backend = config.backend.name(),
                setting,
                "setting is not supported by this backend and will be ignored"
            );
        }

        let MilpModel {
            name,
            vars,
            constraints,
            objective,
            ..
        } = self;
        let problem = vars.minimise(objective.clone());

        let solved = match config.backend {
            #[cfg(feature = "solver-microlp")]
            MilpBackend::Microlp => {
                let mut model = problem.using(good_lp::solvers::microlp::microlp);
                for c in constraints {
                    model = model.with(c);
                }
                let solution = model.solve()?;
                SolvedModel::capture(solution, &objective)
            }
            #[cfg(feature = "solver-highs")]
            MilpBackend::Highs => {
                let mut model = problem
                    .using(good_lp::solvers::highs::highs)
                    .set_verbose(config.verbose)
                    .set_option("mip_rel_gap", config.mip_gap);
                if let Some(limit) = config.time_limit() {
                    model = model.set_time_limit(limit.as_secs_f64());
                }
                for c in constraints {
                    model = model.with(c);
                }
                let solution = model.solve()?;
                SolvedModel::capture(solution, &objective)
            }
            #[allow(unreachable_patterns)]
            other => {
                return Err(PlanError::Solver(format!(
                    "backend {} is not compiled in",
                    other.name()
                )))
            }
        };

        let solved = solved.with_solve_time(start.elapsed());
        info!(
            model = %name,
            status = %solved.status(),
            objective = solved.objective_value(),
            elapsed_ms = solved.solve_time().as_millis() as u64,
            "MILP solved"
        );
        Ok(solved)
    }
}

/// Values of a solved model.
pub struct SolvedModel {
    values: Box<dyn ValueSource>,
    status: SolveStatus,
    objective: f64,
    solve_time: Duration,
}

impl SolvedModel {
    fn capture<S: Solution + 'static>(solution: S, objective: &Expression) -> Self {
        let objective = objective.eval_with(&solution);
        Self {
            status: solution.status().into(),
            values: Box::new(solution),
            objective,
            solve_time: Duration::ZERO,
        }
    }

    fn with_solve_time(mut self, elapsed: Duration) -> Self {
        self.solve_time = elapsed;
        self
    }

    /// Raw value as reported by the backend (may carry tolerance residue).
    pub fn value(&self, var: Variable) -> f64 {
        self.values.value_of(var)
    }

    /// Value rounded to the nearest integer, clamped at zero.
    pub fn count(&self, var: Variable) -> u32 {
        let v = self.value(var).round();
        if v <= 0.0 {
            0
        } else {
            v as u32
        }
    }

    pub fn flag(&self, var: Variable) -> bool {
        self.value(var).round() >= 1.0
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn objective_value(&self) -> f64 {
        self.objective
    }

    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::constraint;

    #[test]
    fn test_backend_parse() {
        assert_eq!("microlp".parse::<MilpBackend>().unwrap(), MilpBackend::Microlp);
        assert_eq!("HiGHS".parse::<MilpBackend>().unwrap(), MilpBackend::Highs);
        assert!("gurobi".parse::<MilpBackend>().is_err());
    }

    #[test]
    fn test_time_limit_filtering() {
        let mut config = SolverConfig::default();
        assert!(config.time_limit().is_none());
        config.time_limit_seconds = Some(0.0);
        assert!(config.time_limit().is_none());
        config.time_limit_seconds = Some(2.5);
        assert_eq!(config.time_limit(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_ignored_settings_per_backend() {
        let mut config = SolverConfig {
            backend: MilpBackend::Microlp,
            ..SolverConfig::default()
        };
        assert!(config.ignored_settings().is_empty());

        config.time_limit_seconds = Some(10.0);
        config.mip_gap = 0.01;
        assert_eq!(config.ignored_settings(), vec!["time_limit_seconds", "mip_gap"]);

        config.backend = MilpBackend::Highs;
        assert!(config.ignored_settings().is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(SolveStatus::from(SolutionStatus::Optimal), SolveStatus::Optimal);
        assert_eq!(SolveStatus::from(SolutionStatus::TimeLimit), SolveStatus::TimeLimited);
        assert_eq!(SolveStatus::from(SolutionStatus::GapLimit), SolveStatus::GapLimited);
        assert!(!SolveStatus::TimeLimited.is_optimal());
        assert_eq!(SolveStatus::TimeLimited.to_string(), "time-limited");
    }

    #[cfg(feature = "solver-microlp")]
    #[test]
    fn test_small_integer_program() {
        // minimise 3a + 5b  s.t.  a + 2b >= 7, a <= 3
        let mut model = MilpModel::new("tiny");
        let a = model.add_integer_var(0.0, Some(3.0));
        let b = model.add_integer_var(0.0, None);
        model.add_constraint(constraint!(a + 2.0 * b >= 7.0));
        model.set_objective(3.0 * a + 5.0 * b);
        assert_eq!(model.num_vars(), 2);
        assert_eq!(model.num_constraints(), 1);

        let solved = model.solve(&SolverConfig::default()).unwrap();
        assert_eq!(solved.status(), SolveStatus::Optimal);
        assert_eq!(solved.count(a), 1);
        assert_eq!(solved.count(b), 3);
        assert!((solved.objective_value() - 18.0).abs() < 1e-6);
    }

    #[cfg(feature = "solver-microlp")]
    #[test]
    fn test_infeasible_is_classified() {
        let mut model = MilpModel::new("infeasible");
        let x = model.add_binary_var();
        model.add_constraint(constraint!(x >= 2.0));
        model.set_objective(Expression::from(x));
        let err = model.solve(&SolverConfig::default()).err().unwrap();
        assert!(matches!(err, PlanError::Infeasible(_)));
    }
}
