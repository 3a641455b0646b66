//! Deterministic-equivalent scenario models and their extensive-form
//! aggregation. This is where first-stage variables become shared and the
//! objective becomes a probability-weighted expectation.

use crate::affine_expr::AffineExpression;
use crate::constraint::Constraint;
use crate::error::BuildError;
use crate::group::{Stage, VariableGroup};
use crate::model::{Model, OptDir};
use crate::scenario::{Scenario, ScenarioSet, PROBABILITY_TOLERANCE};
use crate::var::{Environment, Variable};

/// The three named linear terms of one scenario's objective. The scenario
/// cost (minimized) is `base_cost - revenue + recourse_cost`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageObjective {
    /// First-stage cost, e.g. planting cost. Scenario-independent by
    /// construction.
    pub base_cost: AffineExpression,
    /// Second-stage income, e.g. selling revenue.
    pub revenue: AffineExpression,
    /// Second-stage spend, e.g. purchasing cost.
    pub recourse_cost: AffineExpression,
}

impl StageObjective {
    pub fn scenario_cost(&self) -> AffineExpression {
        self.base_cost.clone() - self.revenue.clone() + self.recourse_cost.clone()
    }
}

/// One scenario's self-contained deterministic equivalent: private copies of
/// the first-stage variables, the scenario's recourse variables and
/// constraints, and a split objective. None of its coefficients reference any
/// other scenario's realized values.
#[derive(Debug, Clone)]
pub struct ScenarioModel {
    scenario: Scenario,
    first_stage: Vec<VariableGroup>,
    second_stage: Vec<VariableGroup>,
    first_stage_constraints: Vec<Constraint>,
    recourse_constraints: Vec<Constraint>,
    objective: StageObjective,
}

impl ScenarioModel {
    pub fn new(
        scenario: Scenario,
        first_stage: Vec<VariableGroup>,
        second_stage: Vec<VariableGroup>,
        first_stage_constraints: Vec<Constraint>,
        recourse_constraints: Vec<Constraint>,
        objective: StageObjective,
    ) -> Self {
        assert!(first_stage.iter().all(|g| g.stage() == Stage::First));
        assert!(second_stage.iter().all(|g| g.stage() == Stage::Second));
        Self {
            scenario,
            first_stage,
            second_stage,
            first_stage_constraints,
            recourse_constraints,
            objective,
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn first_stage(&self) -> &[VariableGroup] {
        &self.first_stage
    }

    pub fn second_stage(&self) -> &[VariableGroup] {
        &self.second_stage
    }

    pub fn first_stage_constraints(&self) -> &[Constraint] {
        &self.first_stage_constraints
    }

    pub fn recourse_constraints(&self) -> &[Constraint] {
        &self.recourse_constraints
    }

    pub fn objective(&self) -> &StageObjective {
        &self.objective
    }

    pub fn group(&self, name: &str) -> Option<&VariableGroup> {
        self.first_stage
            .iter()
            .chain(&self.second_stage)
            .find(|g| g.name() == name)
    }

    /// Solver-ready single-scenario model (minimize the scenario cost).
    pub fn to_model(&self) -> Model {
        let mut mdl = Model::new(self.scenario.id());
        mdl.set_obj_fn(OptDir::Min, self.objective.scenario_cost());
        for cons in self
            .first_stage_constraints
            .iter()
            .chain(&self.recourse_constraints)
        {
            mdl.add_constraint(cons.clone());
        }
        mdl
    }

    fn first_stage_shape_error(&self, reference: &Self) -> Option<String> {
        if self.first_stage.len() != reference.first_stage.len() {
            return Some(format!(
                "expected {} first-stage groups, found {}",
                reference.first_stage.len(),
                self.first_stage.len()
            ));
        }
        for (mine, theirs) in self.first_stage.iter().zip(&reference.first_stage) {
            if !mine.same_shape(theirs) {
                return Some(format!(
                    "group `{}` does not match reference group `{}`",
                    mine.name(),
                    theirs.name()
                ));
            }
        }
        None
    }
}

/// One scenario's slice of the extensive form: its recourse variables and its
/// constraints, rebound onto the shared first-stage variables.
#[derive(Debug, Clone)]
pub struct ScenarioBlock {
    scenario: Scenario,
    groups: Vec<VariableGroup>,
    constraints: Vec<Constraint>,
}

impl ScenarioBlock {
    pub fn id(&self) -> &str {
        self.scenario.id()
    }

    pub fn probability(&self) -> f64 {
        self.scenario.probability()
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn groups(&self) -> &[VariableGroup] {
        &self.groups
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn var(&self, group: &str, key: &str) -> Option<&Variable> {
        self.groups.iter().find(|g| g.name() == group)?.var(key)
    }

    pub fn num_vars(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }
}

/// The aggregated two-stage program: exactly one copy of every first-stage
/// variable, per-scenario recourse blocks, and a combined objective
///
///   min  sum_s  p_s * (base_cost + recourse_cost_s - revenue_s)
///
/// Convention: the first-stage cost is probability-weighted inside the sum
/// rather than factored out once. Both readings agree when the probabilities
/// sum to 1; when they do not, the weighted form is used and the scenario-set
/// normalization warning has already fired.
#[derive(Debug, Clone)]
pub struct ExtensiveForm {
    first_stage: Vec<VariableGroup>,
    shared_constraints: Vec<Constraint>,
    blocks: Vec<ScenarioBlock>,
    objective: AffineExpression,
}

impl ExtensiveForm {
    pub fn first_stage(&self) -> &[VariableGroup] {
        &self.first_stage
    }

    pub fn shared_constraints(&self) -> &[Constraint] {
        &self.shared_constraints
    }

    pub fn blocks(&self) -> &[ScenarioBlock] {
        &self.blocks
    }

    pub fn objective(&self) -> &AffineExpression {
        &self.objective
    }

    pub fn num_scenarios(&self) -> usize {
        self.blocks.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.shared_constraints.len() + self.blocks.iter().map(|b| b.constraints().len()).sum::<usize>()
    }

    pub fn block(&self, scenario_id: &str) -> Option<&ScenarioBlock> {
        self.blocks.iter().find(|b| b.id() == scenario_id)
    }

    /// (group, key) lookup for the shared first-stage variables.
    pub fn first_stage_var(&self, group: &str, key: &str) -> Option<&Variable> {
        self.first_stage
            .iter()
            .find(|g| g.name() == group)?
            .var(key)
    }

    /// (scenario, group, key) lookup for recourse variables.
    pub fn recourse_var(&self, scenario_id: &str, group: &str, key: &str) -> Option<&Variable> {
        self.block(scenario_id)?.var(group, key)
    }

    /// Solver-ready aggregate model.
    pub fn to_model(&self) -> Model {
        let mut mdl = Model::new("extensive_form");
        mdl.set_obj_fn(OptDir::Min, self.objective.clone());
        for cons in &self.shared_constraints {
            mdl.add_constraint(cons.clone());
        }
        for block in &self.blocks {
            for cons in block.constraints() {
                mdl.add_constraint(cons.clone());
            }
        }
        mdl
    }
}

fn substitutions(old: &VariableGroup, new: &VariableGroup) -> Vec<(Variable, AffineExpression)> {
    old.iter()
        .filter_map(|(key, var)| {
            new.var(key)
                .map(|shared| (var.clone(), AffineExpression::from(shared)))
        })
        .collect()
}

/// Merge per-scenario deterministic equivalents into one extensive form.
///
/// All models must share an identical first-stage shape (validated pairwise
/// against the first model). A fresh shared copy of each first-stage group is
/// minted; every scenario's constraints and objective are rebound onto it by
/// coefficient substitution. Per-scenario constraints are kept unchanged
/// (scenario-tagged), and one shared copy of each first-stage constraint
/// family is emitted on top.
pub fn aggregate(models: Vec<ScenarioModel>) -> Result<ExtensiveForm, BuildError> {
    let reference = models.first().ok_or(BuildError::EmptyScenarioSet)?;

    let total: f64 = models.iter().map(|m| m.scenario.probability()).sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        log::warn!(
            "aggregating scenarios whose probabilities sum to {} (expected 1)",
            total
        );
    }

    for m in &models[1..] {
        if let Some(detail) = m.first_stage_shape_error(reference) {
            return Err(BuildError::InconsistentFirstStage {
                scenario: m.scenario.id().to_string(),
                detail,
            });
        }
    }

    let mut env = Environment::new();
    let shared: Vec<VariableGroup> = reference
        .first_stage
        .iter()
        .map(|g| g.replicate(&mut env))
        .collect();
    let mut shared_constraints = reference.first_stage_constraints.clone();

    let mut objective = AffineExpression::default();
    let mut blocks = Vec::with_capacity(models.len());

    for (s_ix, m) in models.into_iter().enumerate() {
        let sid = m.scenario.id().to_string();
        let p = m.scenario.probability();

        let subs: Vec<(Variable, AffineExpression)> = m
            .first_stage
            .iter()
            .zip(&shared)
            .flat_map(|(old, new)| substitutions(old, new))
            .collect();

        //the shared constraint copies come from the first model
        if s_ix == 0 {
            for cons in &mut shared_constraints {
                for (var, expr) in &subs {
                    cons.replace_var(var, expr);
                }
            }
        }

        let mut constraints: Vec<Constraint> = m
            .first_stage_constraints
            .iter()
            .chain(&m.recourse_constraints)
            .cloned()
            .collect();
        for cons in &mut constraints {
            for (var, expr) in &subs {
                cons.replace_var(var, expr);
            }
            let tagged = format!("{}@{}", cons.name(), sid);
            *cons = cons.clone().with_name(tagged);
        }

        let mut cost = m.objective.scenario_cost();
        for (var, expr) in &subs {
            cost.replace_var(var, expr);
        }
        cost *= p;
        objective += cost;

        //recourse variables carry the scenario index in their display name
        for group in &m.second_stage {
            for (key, var) in group.iter() {
                *var.name_mut() = format!("{}[{},{}]", group.name(), sid, key);
            }
        }

        blocks.push(ScenarioBlock {
            scenario: m.scenario,
            groups: m.second_stage,
            constraints,
        });
    }

    Ok(ExtensiveForm {
        first_stage: shared,
        shared_constraints,
        blocks,
        objective,
    })
}

/// Build one model per scenario through `creator` and aggregate them. Mirrors
/// the usual scenario-creator callback shape of stochastic-programming
/// drivers.
pub fn build_extensive_form<F>(set: &ScenarioSet, mut creator: F) -> Result<ExtensiveForm, BuildError>
where
    F: FnMut(&Scenario) -> Result<ScenarioModel, BuildError>,
{
    let models = set
        .iter()
        .map(|s| creator(s))
        .collect::<Result<Vec<_>, _>>()?;
    aggregate(models)
}
