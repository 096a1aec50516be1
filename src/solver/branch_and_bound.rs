//! A built-in branch and bound backend.
//!
//! The continuous relaxation at each node is a convex quadratic program, which is solved with
//! the Clarabel interior point solver. This backend needs no external solver libraries, so it is
//! always available as the last resort.
use super::{Backend, SolverFailure, SolverOptions};
use crate::model::{FEASIBILITY_TOLERANCE, Problem, VariableIndex};
use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use log::debug;

/// Relaxation values this close to an integer are treated as integral
const INTEGRALITY_TOLERANCE: f64 = 1e-5;

/// A node is pruned unless its bound improves on the incumbent by more than this
const GAP_TOLERANCE: f64 = 1e-6;

/// Solves mixed-integer problems with a concave quadratic objective
pub struct BranchAndBoundBackend {
    show_output: bool,
    node_limit: u64,
}

impl BranchAndBoundBackend {
    /// Create a new [`BranchAndBoundBackend`]
    pub fn new(options: SolverOptions) -> Self {
        Self {
            show_output: options.show_output,
            node_limit: options.node_limit,
        }
    }
}

/// Variable bounds at one node of the search tree
#[derive(Debug, Clone, PartialEq)]
struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Node {
    /// The root node uses the bounds of the problem's variables
    fn root(problem: &Problem) -> Self {
        let (lower, upper) = problem
            .variables()
            .iter()
            .map(|var| (var.lower, var.upper))
            .unzip();
        Self { lower, upper }
    }

    /// Split this node on a fractional variable value.
    ///
    /// # Returns
    ///
    /// The child with `var <= floor(value)` and the child with `var >= ceil(value)`.
    fn branch(&self, var: VariableIndex, value: f64) -> (Node, Node) {
        let mut down = self.clone();
        down.upper[var] = value.floor();
        let mut up = self.clone();
        up.lower[var] = value.ceil();
        (down, up)
    }
}

/// The outcome of solving the relaxation at a node
enum Relaxation {
    /// The relaxation has an optimum
    Optimal(Vec<f64>),
    /// No point satisfies the node's bounds and constraints
    Infeasible,
}

impl Backend for BranchAndBoundBackend {
    fn name(&self) -> &'static str {
        "branch and bound"
    }

    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverFailure> {
        if let Some(var) = problem.variables().iter().find(|var| var.quadratic > 0.0) {
            return Err(SolverFailure::Unsupported(format!(
                "objective is not concave in {}",
                var.name
            )));
        }

        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut stack = vec![Node::root(problem)];
        let mut explored = 0;
        while let Some(node) = stack.pop() {
            explored += 1;
            if explored > self.node_limit {
                return Err(SolverFailure::NodeLimit(self.node_limit));
            }

            let Relaxation::Optimal(values) = solve_relaxation(problem, &node, self.show_output)?
            else {
                continue;
            };

            // The relaxation bounds every integer solution below this node
            let bound = problem.objective_value(&values);
            if incumbent
                .as_ref()
                .is_some_and(|(_, best)| bound <= best + GAP_TOLERANCE)
            {
                continue;
            }

            if let Some(var) = most_fractional(&values) {
                push_children(&mut stack, &node, var, values[var]);
                continue;
            }

            let rounded: Vec<f64> = values.iter().map(|x| x.round()).collect();
            if let Err(reason) = problem.check_feasible(&rounded) {
                // Small fractions multiplied by large coefficients can still break a constraint
                match rounding_culprit(problem, &node, &values, &rounded) {
                    Some(var) => push_children(&mut stack, &node, var, values[var]),
                    None => debug!("Discarding node after rounding: {reason}"),
                }
                continue;
            }

            let objective = problem.objective_value(&rounded);
            if incumbent.as_ref().is_none_or(|(_, best)| objective > *best) {
                debug!("New incumbent with objective value {objective}");
                incumbent = Some((rounded, objective));
            }
        }

        debug!("Branch and bound explored {explored} nodes");
        incumbent
            .map(|(values, _)| values)
            .ok_or(SolverFailure::Infeasible)
    }
}

/// Branch on `var`, pushing the child nearer to `value` last so that it is explored first
fn push_children(stack: &mut Vec<Node>, node: &Node, var: VariableIndex, value: f64) {
    let (down, up) = node.branch(var, value);
    if value - value.floor() < 0.5 {
        stack.push(up);
        stack.push(down);
    } else {
        stack.push(down);
        stack.push(up);
    }
}

/// Find the variable to branch on when rounding an almost-integral point breaks a constraint.
///
/// This is the variable in a violated constraint whose rounding changed the left hand side the
/// most, e.g. a binary of `1e-6` multiplied by a Big-M of `1e7`. Only variables for which both
/// children tighten the node's bounds are considered. Returns `None` if there are none.
fn rounding_culprit(
    problem: &Problem,
    node: &Node,
    values: &[f64],
    rounded: &[f64],
) -> Option<VariableIndex> {
    problem
        .constraints()
        .iter()
        .filter(|constraint| {
            constraint.lhs(rounded)
                > constraint.rhs + FEASIBILITY_TOLERANCE * constraint.rhs.abs().max(1.0)
        })
        .flat_map(|constraint| constraint.terms.iter())
        .filter(|&&(var, _)| {
            values[var].floor() < node.upper[var] && values[var].ceil() > node.lower[var]
        })
        .map(|&(var, coeff)| (var, (coeff * (values[var] - rounded[var])).abs()))
        .filter(|&(_, change)| change > 0.0)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(var, _)| var)
}

/// Find the variable whose value is furthest from an integer.
///
/// All variables in the problem are integer or binary. Returns `None` if every value is
/// integral (within tolerance).
fn most_fractional(values: &[f64]) -> Option<VariableIndex> {
    values
        .iter()
        .map(|x| (x - x.round()).abs())
        .enumerate()
        .filter(|&(_, fractionality)| fractionality > INTEGRALITY_TOLERANCE)
        .fold(None, |best: Option<(VariableIndex, f64)>, (var, fractionality)| {
            match best {
                Some((_, best_fractionality)) if best_fractionality >= fractionality => best,
                _ => Some((var, fractionality)),
            }
        })
        .map(|(var, _)| var)
}

/// Solve the continuous relaxation of the problem within the node's bounds.
///
/// Clarabel minimises `1/2 x'Px + q'x` subject to `Ax + s = b` with `s >= 0`, so the objective
/// is negated and each `<=` constraint or finite bound becomes a row of `A`.
fn solve_relaxation(
    problem: &Problem,
    node: &Node,
    show_output: bool,
) -> Result<Relaxation, SolverFailure> {
    let variables = problem.variables();
    let num_vars = variables.len();

    let p = diagonal_matrix(variables.iter().map(|var| -2.0 * var.quadratic));
    let q: Vec<f64> = variables.iter().map(|var| -var.linear).collect();

    let mut rows = RowBuilder::default();
    for constraint in problem.constraints() {
        rows.push(constraint.terms.iter().copied(), constraint.rhs);
    }
    for (var, (&lower, &upper)) in node.lower.iter().zip(&node.upper).enumerate() {
        if lower.is_finite() {
            rows.push([(var, -1.0)], -lower);
        }
        if upper.is_finite() {
            rows.push([(var, 1.0)], upper);
        }
    }
    let (a, b) = rows.build(num_vars);
    let cones = [SupportedConeT::NonnegativeConeT(b.len())];

    let settings = DefaultSettings {
        verbose: show_output,
        ..DefaultSettings::default()
    };
    let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
    solver.solve();

    match solver.solution.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {
            Ok(Relaxation::Optimal(solver.solution.x.clone()))
        }
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            Ok(Relaxation::Infeasible)
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            Err(SolverFailure::Unbounded)
        }
        status => Err(SolverFailure::Backend(format!(
            "relaxation finished with status {status:?}"
        ))),
    }
}

/// Create a square matrix in compressed sparse column format with the given diagonal
fn diagonal_matrix(diagonal: impl Iterator<Item = f64>) -> CscMatrix<f64> {
    let mut colptr = vec![0];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    for (i, value) in diagonal.enumerate() {
        if value != 0.0 {
            rowval.push(i);
            nzval.push(value);
        }
        colptr.push(rowval.len());
    }

    let n = colptr.len() - 1;
    CscMatrix::new(n, n, colptr, rowval, nzval)
}

/// Collects the rows of a constraint matrix and converts them to column format
#[derive(Default)]
struct RowBuilder {
    entries: Vec<(usize, VariableIndex, f64)>,
    rhs: Vec<f64>,
}

impl RowBuilder {
    /// Add the row `sum(coeff * x[var]) <= rhs`
    fn push(&mut self, terms: impl IntoIterator<Item = (VariableIndex, f64)>, rhs: f64) {
        let row = self.rhs.len();
        self.entries.extend(
            terms
                .into_iter()
                .filter(|&(_, coeff)| coeff != 0.0)
                .map(|(var, coeff)| (row, var, coeff)),
        );
        self.rhs.push(rhs);
    }

    /// Build the constraint matrix and right hand side vector
    fn build(mut self, num_vars: usize) -> (CscMatrix<f64>, Vec<f64>) {
        self.entries.sort_by_key(|&(row, var, _)| (var, row));

        let mut colptr = Vec::with_capacity(num_vars + 1);
        colptr.push(0);
        let mut entries = self.entries.iter().peekable();
        let mut rowval = Vec::with_capacity(self.entries.len());
        let mut nzval = Vec::with_capacity(self.entries.len());
        for var in 0..num_vars {
            while let Some((row, _, coeff)) = entries.next_if(|&&(_, v, _)| v == var) {
                rowval.push(*row);
                nzval.push(*coeff);
            }
            colptr.push(rowval.len());
        }

        let matrix = CscMatrix::new(self.rhs.len(), num_vars, colptr, rowval, nzval);
        (matrix, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{single_wine, wine_portfolio};
    use crate::model::build_model;
    use crate::parameters::Parameters;
    use float_cmp::assert_approx_eq;
    use itertools::iproduct;
    use rstest::rstest;

    fn solve(params: &Parameters) -> Result<Vec<f64>, SolverFailure> {
        let problem = build_model(params).unwrap().problem;
        BranchAndBoundBackend::new(SolverOptions::default()).solve(&problem)
    }

    #[test]
    fn test_most_fractional() {
        assert_eq!(most_fractional(&[1.0, 2.0, 3.0000001]), None);
        assert_eq!(most_fractional(&[1.2, 2.5, 3.7]), Some(1));
        assert_eq!(most_fractional(&[1.0, 0.4, 0.7]), Some(1));
    }

    #[test]
    fn test_node_branch() {
        let node = Node {
            lower: vec![0.0, 0.0],
            upper: vec![f64::INFINITY, 1.0],
        };
        let (down, up) = node.branch(0, 2.5);
        assert_eq!(down.upper, [2.0, 1.0]);
        assert_eq!(down.lower, node.lower);
        assert_eq!(up.lower, [3.0, 0.0]);
        assert_eq!(up.upper, node.upper);
    }

    #[test]
    fn test_row_builder() {
        let mut rows = RowBuilder::default();
        rows.push([(0, 1.0), (1, 2.0)], 4.0);
        rows.push([(1, -1.0), (0, 0.0)], 0.0);
        let (a, b) = rows.build(3);

        assert_eq!(b, [4.0, 0.0]);
        assert_eq!(a.colptr, [0, 1, 3, 3]);
        assert_eq!(a.rowval, [0, 0, 1]);
        assert_eq!(a.nzval, [1.0, 2.0, -1.0]);
    }

    #[test]
    fn test_diagonal_matrix() {
        let p = diagonal_matrix([0.2, 0.0, 1.0].into_iter());
        assert_eq!(p.colptr, [0, 1, 1, 2]);
        assert_eq!(p.rowval, [0, 2]);
        assert_eq!(p.nzval, [0.2, 1.0]);
    }

    #[rstest]
    fn test_single_wine(single_wine: Parameters) {
        let values = solve(&single_wine).unwrap();
        assert_eq!(values, [40.0]);
    }

    #[rstest]
    fn test_single_wine_resource_limited(mut single_wine: Parameters) {
        single_wine.availability[0] = 25.5;
        let values = solve(&single_wine).unwrap();
        assert_eq!(values, [25.0]);
    }

    #[rstest]
    fn test_matches_enumeration(wine_portfolio: Parameters) {
        let problem = build_model(&wine_portfolio).unwrap().problem;
        let values = solve(&wine_portfolio).unwrap();
        problem.check_feasible(&values).unwrap();

        // Every feasible integer point lies within these ranges
        let best = iproduct!(0..=100, 0..=60, 0..=50, 0..=1)
            .map(|(x0, x1, x2, y)| [x0 as f64, x1 as f64, x2 as f64, y as f64])
            .filter(|point| problem.check_feasible(point).is_ok())
            .map(|point| problem.objective_value(&point))
            .fold(f64::NEG_INFINITY, f64::max);

        assert_approx_eq!(
            f64,
            problem.objective_value(&values),
            best,
            epsilon = 1e-6
        );
    }

    /// One standard and one premium wine, where the premium wine is worth its fixed cost
    fn premium_pair(big_m: f64) -> Parameters {
        Parameters {
            num_standard: 1,
            num_premium: 1,
            revenue: vec![10.0, 20.0],
            saturation: vec![0.1, 0.5],
            variable_cost: vec![2.0, 1.0],
            fixed_cost: vec![10.0],
            availability: vec![1000.0],
            consumption: vec![vec![1.0, 1.0]],
            big_m,
        }
    }

    #[rstest]
    #[case(1e3)]
    #[case(1e6)]
    #[case(1e7)]
    fn test_large_big_m(#[case] big_m: f64) {
        let params = premium_pair(big_m);
        let problem = build_model(&params).unwrap().problem;
        let values = solve(&params).unwrap();

        problem.check_feasible(&values).unwrap();
        assert_eq!(values, [40.0, 19.0, 1.0]);
    }

    #[test]
    fn test_rounding_culprit() {
        let problem = build_model(&premium_pair(1e7)).unwrap().problem;
        let node = Node::root(&problem);

        // Y = 1.9e-6 rounds to zero, which breaks X[2] <= 1e7 * Y
        let values = [40.0, 19.0, 1.9e-6];
        let rounded = [40.0, 19.0, 0.0];
        assert_eq!(rounding_culprit(&problem, &node, &values, &rounded), Some(2));

        // Nothing to branch on once Y is fixed at zero
        let mut node = node;
        node.upper[2] = 0.0;
        assert_eq!(
            rounding_culprit(&problem, &node, &[40.0, 19.0, 0.0], &rounded),
            None
        );
    }

    #[rstest]
    fn test_infeasible(mut single_wine: Parameters) {
        single_wine.availability[0] = -1.0;
        assert_eq!(solve(&single_wine), Err(SolverFailure::Infeasible));
    }

    #[rstest]
    fn test_unbounded(mut single_wine: Parameters) {
        single_wine.saturation[0] = 0.0;
        single_wine.consumption[0][0] = 0.0;
        assert_eq!(solve(&single_wine), Err(SolverFailure::Unbounded));
    }

    #[rstest]
    fn test_not_concave(mut single_wine: Parameters) {
        single_wine.saturation[0] = -0.1;
        assert!(matches!(
            solve(&single_wine),
            Err(SolverFailure::Unsupported(_))
        ));
    }

    #[rstest]
    fn test_node_limit(wine_portfolio: Parameters) {
        let problem = build_model(&wine_portfolio).unwrap().problem;
        let backend = BranchAndBoundBackend::new(SolverOptions {
            show_output: false,
            node_limit: 1,
        });
        assert_eq!(backend.solve(&problem), Err(SolverFailure::NodeLimit(1)));
    }
}
