//! Building the production planning problem.
//!
//! The [`Problem`] defined here is independent of any particular solver. Each solver backend
//! translates it into its own representation.
use crate::parameters::Parameters;
use anyhow::{Context, Result};
use std::fmt;

/// Absolute tolerance used when checking a candidate solution
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Index of a variable in a [`Problem`]
pub type VariableIndex = usize;

/// The domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum VariableKind {
    /// Any whole number within the bounds
    Integer,
    /// Either zero or one
    Binary,
}

/// A decision variable in the problem.
///
/// Like the columns of the HiGHS problem, this does **not** include the value of the variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Display name, e.g. `X[1]`
    pub name: String,
    /// The domain of the variable
    pub kind: VariableKind,
    /// The variable's minimum value
    pub lower: f64,
    /// The variable's maximum value (may be infinite)
    pub upper: f64,
    /// The coefficient of the variable in the objective
    pub linear: f64,
    /// The coefficient of the square of the variable in the objective
    pub quadratic: f64,
}

/// A linear constraint of the form `a1*x1 + a2*x2 + ... <= rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Display name, e.g. `resource[1]`
    pub name: String,
    /// Pairs of variable and coefficient
    pub terms: Vec<(VariableIndex, f64)>,
    /// The right hand side
    pub rhs: f64,
}

impl Constraint {
    /// The value of the left hand side at the given point
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| coeff * values[var])
            .sum()
    }
}

/// A mixed-integer problem with a separable quadratic objective which is to be maximised
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Problem {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
}

impl Problem {
    /// Add a variable to the problem, returning its index
    pub fn add_variable(&mut self, variable: Variable) -> VariableIndex {
        self.variables.push(variable);
        self.variables.len() - 1
    }

    /// Add a `<=` constraint to the problem
    pub fn add_constraint(&mut self, name: String, terms: Vec<(VariableIndex, f64)>, rhs: f64) {
        self.constraints.push(Constraint { name, terms, rhs });
    }

    /// The variables of the problem, in the order they were added
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The constraints of the problem, in the order they were added
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether any variable has a quadratic objective term
    pub fn has_quadratic_terms(&self) -> bool {
        self.variables.iter().any(|var| var.quadratic != 0.0)
    }

    /// Evaluate the objective at the given point
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .iter()
            .zip(values)
            .map(|(var, &x)| var.linear * x + var.quadratic * x * x)
            .sum()
    }

    /// Check that a point satisfies the bounds, domains and constraints of the problem.
    pub fn check_feasible(&self, values: &[f64]) -> Result<(), String> {
        if values.len() != self.variables.len() {
            return Err(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            ));
        }

        for (var, &x) in self.variables.iter().zip(values) {
            if !x.is_finite() {
                return Err(format!("{} is not finite", var.name));
            }
            if x < var.lower - FEASIBILITY_TOLERANCE || x > var.upper + FEASIBILITY_TOLERANCE {
                return Err(format!("{} = {x} is outside its bounds", var.name));
            }
            if (x - x.round()).abs() > FEASIBILITY_TOLERANCE {
                return Err(format!("{} = {x} is not integral", var.name));
            }
        }

        for constraint in &self.constraints {
            let lhs = constraint.lhs(values);
            if lhs > constraint.rhs + FEASIBILITY_TOLERANCE * constraint.rhs.abs().max(1.0) {
                return Err(format!(
                    "{} is violated ({lhs} > {})",
                    constraint.name, constraint.rhs
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variables, {} constraints",
            self.variables.len(),
            self.constraints.len()
        )
    }
}

/// The variables of the production problem
#[derive(Debug, Clone, PartialEq)]
pub struct WineVariables {
    /// Production quantity for every wine (X)
    pub quantities: Vec<VariableIndex>,
    /// Activation decision for every premium wine (Y)
    pub activations: Vec<VariableIndex>,
}

/// The production problem together with its variables
#[derive(Debug, Clone, PartialEq)]
pub struct WineModel {
    /// The optimisation problem
    pub problem: Problem,
    /// The variables, for reading the solution
    pub variables: WineVariables,
}

/// Build the production problem from the given parameters.
///
/// The objective is
///
/// max  sum_i (A_i*X_i - B_i*X_i^2 - C_i*X_i) - sum_j F_j*Y_j
///
/// subject to non-negativity, resource and premium activation constraints (in that order).
pub fn build_model(params: &Parameters) -> Result<WineModel> {
    params
        .check_shape()
        .context("Parameters do not match the declared counts")?;

    let mut problem = Problem::default();
    let variables = add_variables(&mut problem, params);

    add_nonnegativity_constraints(&mut problem, &variables);
    add_resource_constraints(&mut problem, &variables, params);
    add_activation_constraints(&mut problem, &variables, params);

    Ok(WineModel { problem, variables })
}

/// Add production and activation variables to the problem
fn add_variables(problem: &mut Problem, params: &Parameters) -> WineVariables {
    let quantities = (0..params.num_wines())
        .map(|i| {
            problem.add_variable(Variable {
                name: format!("X[{}]", i + 1),
                kind: VariableKind::Integer,
                lower: 0.0,
                upper: f64::INFINITY,
                linear: params.revenue[i] - params.variable_cost[i],
                quadratic: -params.saturation[i],
            })
        })
        .collect();

    let activations = params
        .fixed_cost
        .iter()
        .enumerate()
        .map(|(j, fixed_cost)| {
            problem.add_variable(Variable {
                name: format!("Y[{}]", j + 1),
                kind: VariableKind::Binary,
                lower: 0.0,
                upper: 1.0,
                linear: -fixed_cost,
                quadratic: 0.0,
            })
        })
        .collect();

    WineVariables {
        quantities,
        activations,
    }
}

/// Add X_i >= 0 for every wine.
///
/// This repeats the lower bound of the variables, but some backends only look at constraints.
fn add_nonnegativity_constraints(problem: &mut Problem, variables: &WineVariables) {
    for (i, &var) in variables.quantities.iter().enumerate() {
        problem.add_constraint(format!("nonneg[{}]", i + 1), vec![(var, -1.0)], 0.0);
    }
}

/// Add sum_i r_ki*X_i <= R_k for every resource
fn add_resource_constraints(problem: &mut Problem, variables: &WineVariables, params: &Parameters) {
    for (k, (row, &available)) in params
        .consumption
        .iter()
        .zip(&params.availability)
        .enumerate()
    {
        let terms = variables
            .quantities
            .iter()
            .copied()
            .zip(row.iter().copied())
            .collect();
        problem.add_constraint(format!("resource[{}]", k + 1), terms, available);
    }
}

/// Add X_j - M*Y_j <= 0 for every premium wine, so it can only be produced when activated
fn add_activation_constraints(
    problem: &mut Problem,
    variables: &WineVariables,
    params: &Parameters,
) {
    for (j, &activation) in variables.activations.iter().enumerate() {
        let quantity = variables.quantities[params.premium_wine_index(j)];
        problem.add_constraint(
            format!("activation[{}]", j + 1),
            vec![(quantity, 1.0), (activation, -params.big_m)],
            0.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, single_wine, wine_portfolio};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_build_model_variables(wine_portfolio: Parameters) {
        let model = build_model(&wine_portfolio).unwrap();
        let vars = model.problem.variables();
        assert_eq!(vars.len(), 4);
        assert_eq!(model.variables.quantities, [0, 1, 2]);
        assert_eq!(model.variables.activations, [3]);

        assert_eq!(vars[2].name, "X[3]");
        assert_eq!(vars[2].kind, VariableKind::Integer);
        assert_approx_eq!(f64, vars[2].linear, 25.0);
        assert_approx_eq!(f64, vars[2].quadratic, -0.5);

        assert_eq!(vars[3].name, "Y[1]");
        assert_eq!(vars[3].kind, VariableKind::Binary);
        assert_approx_eq!(f64, vars[3].linear, -50.0);
        assert_approx_eq!(f64, vars[3].upper, 1.0);
    }

    #[rstest]
    fn test_build_model_constraint_order(wine_portfolio: Parameters) {
        let model = build_model(&wine_portfolio).unwrap();
        let names: Vec<_> = model
            .problem
            .constraints()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "nonneg[1]",
                "nonneg[2]",
                "nonneg[3]",
                "resource[1]",
                "resource[2]",
                "activation[1]"
            ]
        );

        let activation = &model.problem.constraints()[5];
        assert_eq!(activation.terms, [(2, 1.0), (3, -1000.0)]);
        assert_approx_eq!(f64, activation.rhs, 0.0);
    }

    #[rstest]
    fn test_build_model_shape_mismatch(mut wine_portfolio: Parameters) {
        wine_portfolio.saturation.push(0.0);
        assert_error!(
            build_model(&wine_portfolio),
            "Parameters do not match the declared counts"
        );
    }

    #[rstest]
    fn test_has_quadratic_terms(mut single_wine: Parameters) {
        assert!(build_model(&single_wine).unwrap().problem.has_quadratic_terms());

        single_wine.saturation[0] = 0.0;
        assert!(!build_model(&single_wine).unwrap().problem.has_quadratic_terms());
    }

    #[rstest]
    fn test_objective_value(single_wine: Parameters) {
        let model = build_model(&single_wine).unwrap();
        // 10*40 - 0.1*40^2 - 2*40
        assert_approx_eq!(f64, model.problem.objective_value(&[40.0]), 160.0, epsilon = 1e-9);
    }

    #[rstest]
    fn test_check_feasible(wine_portfolio: Parameters) {
        let problem = build_model(&wine_portfolio).unwrap().problem;
        assert!(problem.check_feasible(&[10.0, 10.0, 5.0, 1.0]).is_ok());
        assert_eq!(
            problem.check_feasible(&[10.0, 10.0, 5.0, 0.0]),
            Err("activation[1] is violated (5 > 0)".into())
        );
        assert_eq!(
            problem.check_feasible(&[10.5, 10.0, 0.0, 0.0]),
            Err("X[1] = 10.5 is not integral".into())
        );
        assert_eq!(
            problem.check_feasible(&[-1.0, 0.0, 0.0, 0.0]),
            Err("X[1] = -1 is outside its bounds".into())
        );
        assert!(problem.check_feasible(&[0.0]).is_err());
    }
}
