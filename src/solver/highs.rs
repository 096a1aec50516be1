//! Backend using the HiGHS mixed-integer linear solver.
use super::{Backend, SolverFailure, SolverOptions};
use crate::model::Problem;
use highs::{HighsModelStatus, RowProblem, Sense};

/// A column of the HiGHS problem
type Column = highs::Col;

/// Solves problems with a linear objective using HiGHS.
///
/// HiGHS does not support a quadratic objective together with integer variables, so any problem
/// with quadratic terms is refused.
pub struct HighsBackend {
    show_output: bool,
}

impl HighsBackend {
    /// Create a new [`HighsBackend`]
    pub fn new(options: SolverOptions) -> Self {
        Self {
            show_output: options.show_output,
        }
    }
}

impl Backend for HighsBackend {
    fn name(&self) -> &'static str {
        "HiGHS"
    }

    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverFailure> {
        if problem.has_quadratic_terms() {
            return Err(SolverFailure::Unsupported(
                "quadratic objective terms with integer variables".into(),
            ));
        }

        let mut highs_problem = RowProblem::default();
        let columns: Vec<Column> = problem
            .variables()
            .iter()
            // Binary variables are integers bounded by [0, 1]
            .map(|var| highs_problem.add_integer_column(var.linear, var.lower..=var.upper))
            .collect();

        for constraint in problem.constraints() {
            highs_problem.add_row(
                ..=constraint.rhs,
                constraint
                    .terms
                    .iter()
                    .map(|&(var, coeff)| (columns[var], coeff)),
            );
        }

        let mut model = highs_problem.optimise(Sense::Maximise);
        model.set_option("output_flag", self.show_output);

        let solved = model
            .try_solve()
            .map_err(|status| SolverFailure::Backend(format!("{status:?}")))?;
        match solved.status() {
            HighsModelStatus::Optimal => Ok(solved.get_solution().columns().to_vec()),
            HighsModelStatus::Infeasible => Err(SolverFailure::Infeasible),
            HighsModelStatus::Unbounded => Err(SolverFailure::Unbounded),
            status => Err(SolverFailure::Status(format!("{status:?}"))),
        }
    }
}
