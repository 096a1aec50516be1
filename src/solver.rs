//! Solving the production problem with a chain of solver backends.
//!
//! Mixed-integer problems with a quadratic objective are not supported equally well by every
//! solver, and some solvers may not be available at all. Backends are therefore tried one after
//! another, in a fixed order, until one of them produces a solution.
use crate::model::{Problem, VariableIndex};
use itertools::Itertools;
use log::{info, warn};
use std::fmt;
use thiserror::Error;

pub mod branch_and_bound;
pub mod highs;
pub mod scip;

use branch_and_bound::BranchAndBoundBackend;
use highs::HighsBackend;
use scip::ScipBackend;

/// Why a backend did not produce a solution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverFailure {
    /// The backend cannot be used in this build or on this machine
    #[error("not available: {0}")]
    Unavailable(String),
    /// The backend cannot handle this kind of problem
    #[error("unsupported problem: {0}")]
    Unsupported(String),
    /// The problem has no feasible solution
    #[error("problem is infeasible")]
    Infeasible,
    /// The objective can be increased without limit
    #[error("problem is unbounded")]
    Unbounded,
    /// The backend finished without proving optimality
    #[error("finished with status {0}")]
    Status(String),
    /// The backend reported an error
    #[error("solver error: {0}")]
    Backend(String),
    /// The search was abandoned after exploring the maximum number of nodes
    #[error("node limit of {0} reached")]
    NodeLimit(u64),
    /// The backend returned a point which does not satisfy the problem
    #[error("invalid solution: {0}")]
    InvalidSolution(String),
}

/// Every backend failed to solve the problem
#[derive(Debug, Clone, PartialEq, Error)]
pub struct NoFeasibleSolution {
    /// The name of each backend tried, with the reason it failed
    pub attempts: Vec<(&'static str, SolverFailure)>,
}

impl fmt::Display for NoFeasibleSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No feasible solution found ({})",
            self.attempts
                .iter()
                .map(|(name, failure)| format!("{name}: {failure}"))
                .join("; ")
        )
    }
}

/// A solver which can attempt to solve a [`Problem`].
pub trait Backend {
    /// The name of the backend, used in log messages and the report
    fn name(&self) -> &'static str;

    /// Attempt to solve the problem.
    ///
    /// # Returns
    ///
    /// The value of every variable in the problem, in order, at the optimum.
    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverFailure>;
}

/// Options shared by the solver backends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Whether to let solvers print their own progress output
    pub show_output: bool,
    /// Maximum number of nodes explored by the branch and bound backend
    pub node_limit: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            show_output: false,
            node_limit: 100_000,
        }
    }
}

/// The backends to try, in order: HiGHS, SCIP and finally the built-in branch and bound.
pub fn default_backends(options: SolverOptions) -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(HighsBackend::new(options)),
        Box::new(ScipBackend::new(options)),
        Box::new(BranchAndBoundBackend::new(options)),
    ]
}

/// An optimal assignment of values to the variables of a problem.
///
/// A solution cannot be modified once it has been created.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    backend: &'static str,
    values: Vec<f64>,
    objective_value: f64,
}

impl Solution {
    /// The name of the backend which found the solution
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// The values of all variables
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The value of one variable
    pub fn value(&self, var: VariableIndex) -> f64 {
        self.values[var]
    }

    /// The objective value at the solution
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }
}

/// Try each backend in turn, returning the first solution found.
///
/// Failures are logged as warnings and the next backend is tried. A backend's result is only
/// accepted if it is feasible for the problem.
pub fn solve(
    problem: &Problem,
    backends: &[Box<dyn Backend>],
) -> Result<Solution, NoFeasibleSolution> {
    let mut attempts = Vec::new();
    for backend in backends {
        let name = backend.name();
        info!("Solving with {name}");

        let result = backend.solve(problem).and_then(|values| {
            problem
                .check_feasible(&values)
                .map_err(SolverFailure::InvalidSolution)?;
            Ok(values)
        });

        match result {
            Ok(values) => {
                let objective_value = problem.objective_value(&values);
                info!("{name} found an optimal solution with objective value {objective_value}");
                return Ok(Solution {
                    backend: name,
                    values,
                    objective_value,
                });
            }
            Err(failure) => {
                warn!("{name} could not solve the problem: {failure}");
                attempts.push((name, failure));
            }
        }
    }

    Err(NoFeasibleSolution { attempts })
}
