//! Backend using the SCIP mixed-integer nonlinear solver.
//!
//! Requires the `scip` feature. Without it, the backend is reported as unavailable and the next
//! backend in the chain is used instead.
use super::{Backend, SolverFailure, SolverOptions};
use crate::model::Problem;

/// Solves mixed-integer quadratic problems using SCIP
pub struct ScipBackend {
    #[cfg_attr(not(feature = "scip"), allow(dead_code))]
    show_output: bool,
}

impl ScipBackend {
    /// Create a new [`ScipBackend`]
    pub fn new(options: SolverOptions) -> Self {
        Self {
            show_output: options.show_output,
        }
    }
}

impl Backend for ScipBackend {
    fn name(&self) -> &'static str {
        "SCIP"
    }

    #[cfg(feature = "scip")]
    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverFailure> {
        solve_scip(problem, self.show_output)
    }

    #[cfg(not(feature = "scip"))]
    fn solve(&self, _problem: &Problem) -> Result<Vec<f64>, SolverFailure> {
        Err(SolverFailure::Unavailable(
            "wineopt was built without the `scip` feature".into(),
        ))
    }
}

/// Build and solve the problem with SCIP.
///
/// SCIP takes a linear objective, so each squared term is moved into an auxiliary variable `s`
/// with the constraint `s - x^2 = 0`.
#[cfg(feature = "scip")]
fn solve_scip(problem: &Problem, show_output: bool) -> Result<Vec<f64>, SolverFailure> {
    use crate::model::VariableKind;
    use russcip::prelude::*;

    let model = Model::new();
    let model = if show_output {
        model
    } else {
        model.hide_output()
    };
    let mut model = model
        .include_default_plugins()
        .create_prob("wine_production")
        .set_obj_sense(ObjSense::Maximize);

    let vars: Vec<_> = problem
        .variables()
        .iter()
        .map(|var| {
            let var_type = match var.kind {
                VariableKind::Integer => VarType::Integer,
                VariableKind::Binary => VarType::Binary,
            };
            model.add_var(var.lower, var.upper, var.linear, &var.name, var_type)
        })
        .collect();

    for (var, scip_var) in problem.variables().iter().zip(&vars) {
        if var.quadratic == 0.0 {
            continue;
        }

        let square = model.add_var(
            0.0,
            f64::INFINITY,
            var.quadratic,
            &format!("{}^2", var.name),
            VarType::Continuous,
        );
        model.add_cons_quadratic(
            vec![&square],
            &mut [1.0],
            vec![scip_var],
            vec![scip_var],
            &mut [-1.0],
            0.0,
            0.0,
            &format!("square_{}", var.name),
        );
    }

    for constraint in problem.constraints() {
        let (cons_vars, coeffs): (Vec<_>, Vec<_>) = constraint
            .terms
            .iter()
            .map(|&(var, coeff)| (&vars[var], coeff))
            .unzip();
        model.add_cons(
            cons_vars,
            &coeffs,
            -f64::INFINITY,
            constraint.rhs,
            &constraint.name,
        );
    }

    let solved = model.solve();
    match solved.status() {
        Status::Optimal => {
            let sol = solved
                .best_sol()
                .ok_or_else(|| SolverFailure::Backend("no solution stored".into()))?;
            Ok(vars.iter().map(|var| sol.val(var)).collect())
        }
        Status::Infeasible => Err(SolverFailure::Infeasible),
        Status::Unbounded => Err(SolverFailure::Unbounded),
        status => Err(SolverFailure::Status(format!("{status:?}"))),
    }
}
