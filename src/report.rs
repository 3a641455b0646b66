//! Plain-text reporting for aggregated models and their solutions.

use tabled::{Style, Table, Tabled};

use crate::solve::Solution;
use crate::twostage::ExtensiveForm;

#[derive(Tabled)]
struct ScenarioRow {
    scenario: String,
    probability: f64,
    variables: usize,
    constraints: usize,
}

#[derive(Tabled)]
struct ValueRow {
    variable: String,
    value: f64,
}

/// One line per scenario block: probability and block sizes.
pub fn extensive_form_summary(ef: &ExtensiveForm) -> String {
    let rows: Vec<ScenarioRow> = ef
        .blocks()
        .iter()
        .map(|b| ScenarioRow {
            scenario: b.id().to_string(),
            probability: b.probability(),
            variables: b.num_vars(),
            constraints: b.constraints().len(),
        })
        .collect();

    let shared_vars: usize = ef.first_stage().iter().map(|g| g.len()).sum();
    format!(
        "extensive form: {} scenarios, {} shared variables, {} constraints\n{}",
        ef.num_scenarios(),
        shared_vars,
        ef.num_constraints(),
        Table::new(rows).with(Style::psql())
    )
}

/// The solved first-stage decisions, one row per shared variable.
pub fn first_stage_table(ef: &ExtensiveForm, sol: &Solution) -> String {
    let rows: Vec<ValueRow> = ef
        .first_stage()
        .iter()
        .flat_map(|g| g.iter())
        .map(|(_, var)| ValueRow {
            variable: var.name().to_string(),
            value: sol.var_value(var).unwrap_or(f64::NAN),
        })
        .collect();
    Table::new(rows).with(Style::psql()).to_string()
}

/// One scenario's solved recourse decisions.
pub fn scenario_table(ef: &ExtensiveForm, scenario_id: &str, sol: &Solution) -> String {
    let rows: Vec<ValueRow> = ef
        .block(scenario_id)
        .into_iter()
        .flat_map(|b| b.groups())
        .flat_map(|g| g.iter())
        .map(|(_, var)| ValueRow {
            variable: var.name().to_string(),
            value: sol.var_value(var).unwrap_or(f64::NAN),
        })
        .collect();
    Table::new(rows).with(Style::psql()).to_string()
}
