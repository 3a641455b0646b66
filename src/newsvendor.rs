//! The newsvendor problem: buy `x` papers before demand is known, sell up to
//! the realized demand at the cover price, return the rest for salvage.
//! Variables are integer; demand scenarios are typically sampled and
//! deduplicated into an empirical distribution.

use rand::Rng;
use rustc_hash::FxHashMap;

use crate::affine_expr::AffineExpression;
use crate::constraint::{Comp, Constraint};
use crate::error::BuildError;
use crate::group::{Stage, VariableGroup};
use crate::scenario::Scenario;
use crate::twostage::{ScenarioModel, StageObjective};
use crate::var::{Environment, VarType};

const QUANTITY_KEY: &str = "papers";
const DEMAND_KEY: &str = "demand";

/// Prices for one vendor. Salvage below cost below cover price, or the
/// problem degenerates.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsvendorTemplate {
    /// Wholesale cost per paper bought up front.
    pub purchase_cost: f64,
    /// Cover price per paper sold.
    pub selling_price: f64,
    /// Refund per unsold paper returned.
    pub salvage_price: f64,
    /// Cap on the up-front purchase, if the supplier imposes one.
    pub purchase_limit: Option<f64>,
}

impl NewsvendorTemplate {
    /// The textbook instance: buy at 10, sell at 25, salvage at 5.
    pub fn birge_louveaux() -> Self {
        Self {
            purchase_cost: 10.0,
            selling_price: 25.0,
            salvage_price: 5.0,
            purchase_limit: None,
        }
    }
}

/// Collapse raw demand draws into an empirical scenario set: draws are rounded
/// to whole papers, deduplicated, and weighted by their observed frequency.
/// Scenario ids are `demand_{value}` in increasing demand order.
pub fn demand_scenarios(draws: &[f64]) -> Result<Vec<Scenario>, BuildError> {
    if draws.is_empty() {
        return Err(BuildError::EmptyScenarioSet);
    }
    let mut counts: FxHashMap<i64, usize> = FxHashMap::default();
    for d in draws {
        if !d.is_finite() || *d < 0.0 {
            return Err(BuildError::InvalidScenario {
                id: format!("demand_{}", d),
                reason: "demand draws must be finite and non-negative".to_string(),
            });
        }
        *counts.entry(d.round() as i64).or_insert(0) += 1;
    }

    let n = draws.len() as f64;
    let mut demands: Vec<i64> = counts.keys().copied().collect();
    demands.sort_unstable();

    demands
        .into_iter()
        .map(|d| {
            let mut realizations = FxHashMap::default();
            realizations.insert(DEMAND_KEY.to_string(), d as f64);
            Scenario::new(format!("demand_{}", d), counts[&d] as f64 / n, realizations)
        })
        .collect()
}

/// `n` uniform demand draws on `[low, high]`.
pub fn sample_demands<R: Rng>(rng: &mut R, n: usize, low: f64, high: f64) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(low..=high)).collect()
}

/// Deterministic equivalent for one demand scenario. Maximizing profit is
/// expressed as minimizing cost minus revenue, matching the minimization
/// convention of the aggregate.
pub fn build_newsvendor_model(
    scenario: &Scenario,
    template: &NewsvendorTemplate,
) -> Result<ScenarioModel, BuildError> {
    let demand = scenario
        .value(DEMAND_KEY)
        .ok_or_else(|| BuildError::TemplateMismatch {
            scenario: scenario.id().to_string(),
            name: DEMAND_KEY.to_string(),
        })?;

    let mut env = Environment::new();
    let bought = VariableGroup::bounded(
        &mut env,
        "bought",
        Stage::First,
        VarType::Int,
        [QUANTITY_KEY],
        template.purchase_limit,
    );
    let sold = VariableGroup::integer(&mut env, "sold", Stage::Second, [QUANTITY_KEY]);
    let returned = VariableGroup::integer(&mut env, "returned", Stage::Second, [QUANTITY_KEY]);

    let missing = |name: &str| BuildError::TemplateMismatch {
        scenario: scenario.id().to_string(),
        name: name.to_string(),
    };
    let x = bought.var(QUANTITY_KEY).ok_or_else(|| missing("bought"))?.clone();
    let s = sold.var(QUANTITY_KEY).ok_or_else(|| missing("sold"))?.clone();
    let r = returned
        .var(QUANTITY_KEY)
        .ok_or_else(|| missing("returned"))?
        .clone();

    let objective = StageObjective {
        base_cost: &x * template.purchase_cost,
        revenue: &s * template.selling_price + &r * template.salvage_price,
        recourse_cost: AffineExpression::default(),
    };

    let recourse_constraints = vec![
        //cannot sell more than the realized demand
        Constraint::new("demand_cap", AffineExpression::from(&s), Comp::Le, demand),
        //papers sold or returned cannot exceed papers bought
        Constraint::new("stock_balance", &s + &r, Comp::Le, AffineExpression::from(&x)),
    ];

    Ok(ScenarioModel::new(
        scenario.clone(),
        vec![bought],
        vec![sold, returned],
        Vec::new(),
        recourse_constraints,
        objective,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twostage::{aggregate, build_extensive_form};
    use crate::scenario::ScenarioSet;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_draws_rejected() {
        assert_eq!(
            demand_scenarios(&[]).unwrap_err(),
            BuildError::EmptyScenarioSet
        );
    }

    #[test]
    fn negative_demand_rejected() {
        assert!(matches!(
            demand_scenarios(&[60.0, -1.0]).unwrap_err(),
            BuildError::InvalidScenario { .. }
        ));
    }

    #[test]
    fn duplicate_draws_merge_with_summed_probability() {
        let scenarios = demand_scenarios(&[60.2, 59.8, 100.0, 140.4]).unwrap();
        assert_eq!(scenarios.len(), 3);

        //sorted ascending by rounded demand
        assert_eq!(scenarios[0].id(), "demand_60");
        assert_eq!(scenarios[1].id(), "demand_100");
        assert_eq!(scenarios[2].id(), "demand_140");

        assert_relative_eq!(scenarios[0].probability(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(scenarios[1].probability(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(scenarios[0].value("demand").unwrap(), 60.0, epsilon = 1e-12);

        let total: f64 = scenarios.iter().map(|s| s.probability()).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sampled_demands_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(17);
        let draws = sample_demands(&mut rng, 200, 50.0, 150.0);
        assert_eq!(draws.len(), 200);
        assert!(draws.iter().all(|d| (50.0..=150.0).contains(d)));
    }

    #[test]
    fn deterministic_model_structure() {
        let template = NewsvendorTemplate::birge_louveaux();
        let scenario = demand_scenarios(&[80.0]).unwrap().remove(0);
        let mdl = build_newsvendor_model(&scenario, &template).unwrap();

        //all variables integer and non-negative
        for group in mdl.first_stage().iter().chain(mdl.second_stage()) {
            assert_eq!(group.ty(), VarType::Int);
            for (_, var) in group.iter() {
                assert_eq!(var.lb(), Some(0.0));
            }
        }

        let cost = mdl.objective().scenario_cost();
        let x = mdl.group("bought").unwrap().var("papers").unwrap();
        let s = mdl.group("sold").unwrap().var("papers").unwrap();
        let r = mdl.group("returned").unwrap().var("papers").unwrap();
        assert_relative_eq!(cost.coeff(x), 10.0, epsilon = 1e-12);
        assert_relative_eq!(cost.coeff(s), -25.0, epsilon = 1e-12);
        assert_relative_eq!(cost.coeff(r), -5.0, epsilon = 1e-12);

        assert!(mdl.first_stage_constraints().is_empty());
        assert_eq!(mdl.recourse_constraints().len(), 2);

        let (coeffs, comp, rhs) = mdl.recourse_constraints()[0].normalized();
        assert_eq!(comp, Comp::Le);
        assert_relative_eq!(rhs, 80.0, epsilon = 1e-12);
        assert_eq!(coeffs.len(), 1);
    }

    #[test]
    fn purchase_limit_bounds_first_stage() {
        let template = NewsvendorTemplate {
            purchase_limit: Some(120.0),
            ..NewsvendorTemplate::birge_louveaux()
        };
        let scenario = demand_scenarios(&[80.0]).unwrap().remove(0);
        let mdl = build_newsvendor_model(&scenario, &template).unwrap();
        let x = mdl.group("bought").unwrap().var("papers").unwrap();
        assert_eq!(x.ub(), Some(120.0));
    }

    #[test]
    fn extensive_form_shares_the_order_quantity() {
        let template = NewsvendorTemplate::birge_louveaux();
        let models = demand_scenarios(&[60.0, 100.0, 100.0, 140.0])
            .unwrap()
            .iter()
            .map(|s| build_newsvendor_model(s, &template).unwrap())
            .collect();
        let ef = aggregate(models).unwrap();

        assert_eq!(ef.num_scenarios(), 3);
        assert_eq!(ef.first_stage()[0].len(), 1);

        //expected purchase cost: 10 * (0.25 + 0.5 + 0.25)
        let x = ef.first_stage_var("bought", "papers").unwrap();
        assert_relative_eq!(ef.objective().coeff(x), 10.0, epsilon = 1e-12);

        //the frequent scenario's revenue carries half the weight
        let s_mid = ef.recourse_var("demand_100", "sold", "papers").unwrap();
        assert_relative_eq!(ef.objective().coeff(s_mid), -12.5, epsilon = 1e-12);

        //2 recourse constraints per scenario, no shared ones
        assert_eq!(ef.num_constraints(), 6);
        assert!(ef.shared_constraints().is_empty());

        //every stock balance is tied to the one shared order quantity
        for block in ef.blocks() {
            let balance = block
                .constraints()
                .iter()
                .find(|c| c.name().starts_with("stock_balance"))
                .unwrap();
            assert!(balance.contains_var(x));
        }
    }

    #[test]
    fn sampled_set_builds_end_to_end() {
        let template = NewsvendorTemplate::birge_louveaux();
        let mut rng = StdRng::seed_from_u64(42);
        let draws = sample_demands(&mut rng, 50, 50.0, 150.0);
        let set = ScenarioSet::new(demand_scenarios(&draws).unwrap()).unwrap();

        let ef = build_extensive_form(&set, |s| build_newsvendor_model(s, &template)).unwrap();
        assert_eq!(ef.num_scenarios(), set.len());
        //1 shared + 2 recourse per scenario
        assert_eq!(ef.to_model().variables().len(), 1 + 2 * set.len());
    }
}
