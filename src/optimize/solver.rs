//! Integer-programming backend behind a capability trait.
//!
//! The optimizer builds a neutral [`IlpModel`] (integer variables, linear
//! objective, equality / upper-bound constraints) and hands it to an
//! [`IlpSolver`]. Swapping the backend never touches constraint
//! construction. The default backend translates the model to `good_lp`
//! with the pure-Rust `microlp` solver.

use anyhow::Result;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};

/// A non-negative integer decision variable with its objective coefficient
#[derive(Debug, Clone)]
pub struct IlpVariable {
    /// Stable name for logging and constraint diagnostics
    pub name: String,
    /// Inclusive upper bound (lower bound is always 0)
    pub max: f64,
    pub objective_coeff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    Equal,
    AtMost,
}

/// `Σ coeff·x ⟨sense⟩ rhs` over variable indices
#[derive(Debug, Clone)]
pub struct IlpConstraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

/// Maximization model: integer variables, linear objective, linear constraints
#[derive(Debug, Clone, Default)]
pub struct IlpModel {
    pub variables: Vec<IlpVariable>,
    pub constraints: Vec<IlpConstraint>,
}

impl IlpModel {
    /// Add a variable and return its index for use in constraint terms
    pub fn add_variable(&mut self, name: impl Into<String>, max: f64, objective_coeff: f64) -> usize {
        self.variables.push(IlpVariable {
            name: name.into(),
            max,
            objective_coeff,
        });
        self.variables.len() - 1
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        sense: ConstraintSense,
        rhs: f64,
    ) {
        self.constraints.push(IlpConstraint {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
    }
}

/// Outcome of one solve: either an optimal assignment (one value per
/// variable, in model order) or an explicit infeasibility signal.
/// Infeasibility is a first-class value, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum IlpOutcome {
    Optimal(Vec<f64>),
    Infeasible,
}

/// Opaque integer-programming oracle. Implementations return an optimal
/// assignment or `Infeasible`; errors are reserved for backend failures.
pub trait IlpSolver {
    fn solve(&self, model: &IlpModel) -> Result<IlpOutcome>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Default backend: `good_lp` with the bundled pure-Rust `microlp` solver
#[derive(Debug, Default, Clone, Copy)]
pub struct MicrolpSolver;

impl IlpSolver for MicrolpSolver {
    fn name(&self) -> &str {
        "microlp"
    }

    fn solve(&self, model: &IlpModel) -> Result<IlpOutcome> {
        let mut vars = variables!();
        let handles: Vec<Variable> = model
            .variables
            .iter()
            .map(|v| vars.add(variable().integer().min(0.0).max(v.max)))
            .collect();

        let objective = model
            .variables
            .iter()
            .zip(&handles)
            .fold(Expression::from(0.0), |acc, (v, &h)| {
                acc + h * v.objective_coeff
            });

        let mut problem = vars.maximise(objective).using(good_lp::microlp);
        for c in &model.constraints {
            let lhs = c
                .terms
                .iter()
                .fold(Expression::from(0.0), |acc, &(idx, coeff)| {
                    acc + handles[idx] * coeff
                });
            problem = match c.sense {
                ConstraintSense::Equal => problem.with(constraint!(lhs == c.rhs)),
                ConstraintSense::AtMost => problem.with(constraint!(lhs <= c.rhs)),
            };
        }

        match problem.solve() {
            Ok(solution) => Ok(IlpOutcome::Optimal(
                handles.iter().map(|&h| solution.value(h)).collect(),
            )),
            Err(good_lp::ResolutionError::Infeasible) => Ok(IlpOutcome::Infeasible),
            Err(e) => Err(anyhow::anyhow!("ILP backend failure: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_simple_maximization() {
        // max 2x + y, x + y == 3, x ≤ 2 → x = 2, y = 1
        let mut model = IlpModel::default();
        let x = model.add_variable("x", 2.0, 2.0);
        let y = model.add_variable("y", 3.0, 1.0);
        model.add_constraint(
            "total",
            vec![(x, 1.0), (y, 1.0)],
            ConstraintSense::Equal,
            3.0,
        );

        let outcome = MicrolpSolver.solve(&model).unwrap();
        let IlpOutcome::Optimal(values) = outcome else {
            panic!("expected an optimal assignment");
        };
        assert_relative_eq!(values[x], 2.0, epsilon = 1e-6);
        assert_relative_eq!(values[y], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_infeasible_equality_reported_as_value() {
        // x ≤ 2 but x == 5 required
        let mut model = IlpModel::default();
        let x = model.add_variable("x", 2.0, 1.0);
        model.add_constraint("impossible", vec![(x, 1.0)], ConstraintSense::Equal, 5.0);

        assert_eq!(MicrolpSolver.solve(&model).unwrap(), IlpOutcome::Infeasible);
    }

    #[test]
    fn test_integer_solutions() {
        // max x + y with x + y ≤ 2.5 over integers → total 2
        let mut model = IlpModel::default();
        let x = model.add_variable("x", 10.0, 1.0);
        let y = model.add_variable("y", 10.0, 1.0);
        model.add_constraint(
            "budget",
            vec![(x, 1.0), (y, 1.0)],
            ConstraintSense::AtMost,
            2.5,
        );

        let IlpOutcome::Optimal(values) = MicrolpSolver.solve(&model).unwrap() else {
            panic!("expected an optimal assignment");
        };
        let total: f64 = values.iter().sum();
        assert_relative_eq!(total, 2.0, epsilon = 1e-6);
    }
}
