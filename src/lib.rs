//! Scenario-parameterized model construction for two-stage stochastic linear
//! programs.
//!
//! The workflow: describe the uncertainty as a [`ScenarioSet`], build one
//! deterministic-equivalent [`ScenarioModel`] per scenario from a problem
//! template, then [`aggregate`] them into an [`ExtensiveForm`] whose
//! first-stage variables are shared and whose objective is the
//! probability-weighted expectation of the scenario costs. The result exports
//! to dense or sparse matrices at the [`solve`] boundary.
//!
//! Two textbook problem families ship with the crate: the farmer planting
//! problem ([`farmer`]) and the integer newsvendor problem ([`newsvendor`]).

pub mod affine_expr;
pub mod constraint;
pub mod error;
pub mod farmer;
pub mod group;
pub mod model;
pub mod newsvendor;
pub mod report;
pub mod sampling;
pub mod scenario;
pub mod solve;
pub mod twostage;
pub mod var;

pub use affine_expr::AffineExpression;
pub use constraint::{Comp, Constraint};
pub use error::{BuildError, SolveError};
pub use group::{Stage, VariableGroup};
pub use model::{DenseForm, Model, OptDir, SparseForm};
pub use scenario::{Scenario, ScenarioSet, PROBABILITY_TOLERANCE};
pub use twostage::{
    aggregate, build_extensive_form, ExtensiveForm, ScenarioBlock, ScenarioModel, StageObjective,
};
pub use var::{Environment, VarType, Variable, VariableDefinition};
