//! Solver boundary. The crate builds models; solving is delegated through
//! [`LpSolver`] so any LP/MIP backend can be plugged in against the dense or
//! sparse export of a [`Model`](crate::model::Model).

use rustc_hash::FxHashMap;

use crate::affine_expr::AffineExpression;
use crate::error::SolveError;
use crate::model::Model;
use crate::var::Variable;

/// Termination status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

/// Untyped backend result; turned into a [`Solution`] or a [`SolveError`] by
/// [`solve_with`].
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolveStatus,
    pub objective: f64,
    pub values: FxHashMap<Variable, f64>,
    /// Backend diagnostic, carried into the error on failure.
    pub message: String,
}

pub trait LpSolver {
    fn solve(&self, model: &Model) -> RawSolution;
}

/// A proven-optimal assignment.
#[derive(Debug, Clone)]
pub struct Solution {
    objective_value: f64,
    values: FxHashMap<Variable, f64>,
}

impl Solution {
    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    pub fn var_value(&self, var: &Variable) -> Option<f64> {
        self.values.get(var).copied()
    }

    /// Evaluate an expression under this assignment, e.g. a constraint side or
    /// a per-scenario cost term. None when the expression references a
    /// variable outside the solved model.
    pub fn expr_value(&self, expr: &AffineExpression) -> Option<f64> {
        expr.value_in(&self.values)
    }

    pub fn values(&self) -> &FxHashMap<Variable, f64> {
        &self.values
    }
}

/// Run `solver` on `model` and lift the raw status into a typed result.
pub fn solve_with<S: LpSolver>(solver: &S, model: &Model) -> Result<Solution, SolveError> {
    let raw = solver.solve(model);
    match raw.status {
        SolveStatus::Optimal => Ok(Solution {
            objective_value: raw.objective,
            values: raw.values,
        }),
        SolveStatus::Infeasible => Err(SolveError::Infeasible(raw.message)),
        SolveStatus::Unbounded => Err(SolveError::Unbounded(raw.message)),
        SolveStatus::Error => Err(SolveError::Failure(raw.message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Comp, Constraint};
    use crate::model::{Model, OptDir};
    use crate::var::{Environment, VarType, VariableDefinition};
    use approx::assert_relative_eq;

    /// Canned backend: returns a fixed status, and on success assigns every
    /// model variable its lower bound.
    struct StubSolver {
        status: SolveStatus,
    }

    impl LpSolver for StubSolver {
        fn solve(&self, model: &Model) -> RawSolution {
            let values: FxHashMap<Variable, f64> = model
                .variables()
                .into_iter()
                .map(|v| {
                    let lb = v.lb().unwrap_or(0.0);
                    (v, lb)
                })
                .collect();
            let objective = model.obj_fn().value_in(&values).unwrap_or(f64::NAN);
            RawSolution {
                status: self.status,
                objective,
                values,
                message: "stub".to_string(),
            }
        }
    }

    fn toy_model() -> (Model, Variable) {
        let mut env = Environment::new();
        let x = env.add_var(
            VariableDefinition::new(VarType::Float)
                .with_lb(2)
                .with_name("x"),
        );
        let mut mdl = Model::new("toy");
        mdl.set_obj_fn(OptDir::Min, 3 * &x + 1);
        mdl.add_constraint(Constraint::new("cap", AffineExpression::from(&x), Comp::Le, 10));
        (mdl, x)
    }

    #[test]
    fn optimal_status_yields_solution() {
        let (mdl, x) = toy_model();
        let sol = solve_with(&StubSolver { status: SolveStatus::Optimal }, &mdl).unwrap();
        assert_relative_eq!(sol.var_value(&x).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(sol.objective_value(), 7.0, epsilon = 1e-12);

        let expr = 10 * &x;
        assert_relative_eq!(sol.expr_value(&expr).unwrap(), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn failure_statuses_map_to_errors() {
        let (mdl, _) = toy_model();
        let solve = |status| solve_with(&StubSolver { status }, &mdl).unwrap_err();
        assert_eq!(
            solve(SolveStatus::Infeasible),
            SolveError::Infeasible("stub".to_string())
        );
        assert_eq!(
            solve(SolveStatus::Unbounded),
            SolveError::Unbounded("stub".to_string())
        );
        assert_eq!(
            solve(SolveStatus::Error),
            SolveError::Failure("stub".to_string())
        );
    }

    #[test]
    fn unknown_variable_has_no_value() {
        let (mdl, _) = toy_model();
        let sol = solve_with(&StubSolver { status: SolveStatus::Optimal }, &mdl).unwrap();

        let mut other = Environment::new();
        let stranger = other.add_var(VariableDefinition::new(VarType::Float).with_name("z"));
        assert_eq!(sol.var_value(&stranger), None);
        assert_eq!(sol.expr_value(&AffineExpression::from(&stranger)), None);
    }
}
