//! The classic farmer planting problem (Birge & Louveaux §1.1): decide
//! acreage per crop before the weather is known, then sell and purchase once
//! yields are realized. Minimum cattle-feed requirements force purchases in
//! bad years; a quota splits beet sales into a favorable and an unfavorable
//! price tier.

use rustc_hash::FxHashMap;

use crate::affine_expr::AffineExpression;
use crate::constraint::{Comp, Constraint};
use crate::error::BuildError;
use crate::group::{Stage, VariableGroup};
use crate::scenario::Scenario;
use crate::twostage::{ScenarioModel, StageObjective};
use crate::var::Environment;

/// Discrete weather outlook; scales every mean yield by a fixed multiplier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Weather {
    Good,
    Fair,
    Bad,
}

impl Weather {
    pub const ALL: [Weather; 3] = [Weather::Good, Weather::Fair, Weather::Bad];

    pub fn yield_multiplier(self) -> f64 {
        match self {
            Weather::Good => 1.2,
            Weather::Fair => 1.0,
            Weather::Bad => 0.8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weather::Good => "good",
            Weather::Fair => "fair",
            Weather::Bad => "bad",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, BuildError> {
        match label {
            "good" => Ok(Weather::Good),
            "fair" => Ok(Weather::Fair),
            "bad" => Ok(Weather::Bad),
            other => Err(BuildError::InvalidScenario {
                id: other.to_string(),
                reason: "unrecognized weather label (expected good/fair/bad)".to_string(),
            }),
        }
    }
}

/// Scenario-independent description of the farm: products, prices, limits.
/// Uncertainty enters only through the per-scenario realized yields.
#[derive(Debug, Clone, PartialEq)]
pub struct FarmTemplate {
    pub total_land: f64,
    /// Plantable crops; one `land` variable each.
    pub crops: Vec<String>,
    /// Expected yield per acre at fair weather, per crop.
    pub mean_yield: FxHashMap<String, f64>,
    pub planting_cost: FxHashMap<String, f64>,
    /// Sellable products, including the quota price tiers.
    pub sellable: Vec<String>,
    pub selling_price: FxHashMap<String, f64>,
    /// Crops with a minimum requirement (cattle feed); shortfalls are bought.
    pub required: Vec<String>,
    pub min_requirement: FxHashMap<String, f64>,
    pub purchasable: Vec<String>,
    pub purchase_price: FxHashMap<String, f64>,
    /// Quota-tiered crop and its two sale tiers.
    pub quota_crop: String,
    pub favorable_tier: String,
    pub unfavorable_tier: String,
    pub quota_limit: f64,
}

impl FarmTemplate {
    /// The worked example: 500 acres, wheat/corn/beets, 6000 T beet quota.
    pub fn birge_louveaux() -> Self {
        fn map(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect()
        }
        Self {
            total_land: 500.0,
            crops: vec!["wheat".into(), "corn".into(), "beets".into()],
            mean_yield: map(&[("wheat", 2.5), ("corn", 3.0), ("beets", 20.0)]),
            planting_cost: map(&[("wheat", 150.0), ("corn", 230.0), ("beets", 260.0)]),
            sellable: vec![
                "wheat".into(),
                "corn".into(),
                "beets_favorable".into(),
                "beets_unfavorable".into(),
            ],
            selling_price: map(&[
                ("wheat", 170.0),
                ("corn", 150.0),
                ("beets_favorable", 36.0),
                ("beets_unfavorable", 10.0),
            ]),
            required: vec!["wheat".into(), "corn".into()],
            min_requirement: map(&[("wheat", 200.0), ("corn", 240.0)]),
            purchasable: vec!["wheat".into(), "corn".into()],
            purchase_price: map(&[("wheat", 238.0), ("corn", 210.0)]),
            quota_crop: "beets".into(),
            favorable_tier: "beets_favorable".into(),
            unfavorable_tier: "beets_unfavorable".into(),
            quota_limit: 6000.0,
        }
    }

    /// Scenario from the fixed weather lookup: every mean yield scaled by the
    /// outlook's multiplier.
    pub fn weather_scenario(&self, weather: Weather, probability: f64) -> Result<Scenario, BuildError> {
        self.scaled_yield_scenario(weather.label(), weather.yield_multiplier(), probability)
    }

    /// Scenario from an arbitrary yield multiplier, e.g. a sampled one.
    pub fn scaled_yield_scenario<S: Into<String>>(
        &self,
        id: S,
        multiplier: f64,
        probability: f64,
    ) -> Result<Scenario, BuildError> {
        let realizations = self
            .mean_yield
            .iter()
            .map(|(crop, y)| (crop.clone(), y * multiplier))
            .collect();
        Scenario::new(id, probability, realizations)
    }
}

fn lookup(
    map: &FxHashMap<String, f64>,
    name: &str,
    scenario: &Scenario,
) -> Result<f64, BuildError> {
    map.get(name)
        .copied()
        .ok_or_else(|| BuildError::TemplateMismatch {
            scenario: scenario.id().to_string(),
            name: name.to_string(),
        })
}

fn realized_yield(scenario: &Scenario, crop: &str) -> Result<f64, BuildError> {
    scenario
        .value(crop)
        .ok_or_else(|| BuildError::TemplateMismatch {
            scenario: scenario.id().to_string(),
            name: crop.to_string(),
        })
}

/// Build the deterministic equivalent for one scenario. The result is
/// scenario-pure: no coefficient references another scenario's yields.
pub fn build_farm_model(
    scenario: &Scenario,
    template: &FarmTemplate,
) -> Result<ScenarioModel, BuildError> {
    let mut env = Environment::new();

    let land = VariableGroup::continuous(&mut env, "land", Stage::First, template.crops.clone());
    let sold = VariableGroup::continuous(&mut env, "sold", Stage::Second, template.sellable.clone());
    let purchased = VariableGroup::continuous(
        &mut env,
        "purchased",
        Stage::Second,
        template.purchasable.clone(),
    );

    let group_var = |group: &VariableGroup, key: &str| {
        group
            .var(key)
            .cloned()
            .ok_or_else(|| BuildError::TemplateMismatch {
                scenario: scenario.id().to_string(),
                name: key.to_string(),
            })
    };

    //objective terms
    let mut base_cost = AffineExpression::default();
    for crop in &template.crops {
        let cost = lookup(&template.planting_cost, crop, scenario)?;
        base_cost += &group_var(&land, crop)? * cost;
    }
    let mut revenue = AffineExpression::default();
    for product in &template.sellable {
        let price = lookup(&template.selling_price, product, scenario)?;
        revenue += &group_var(&sold, product)? * price;
    }
    let mut recourse_cost = AffineExpression::default();
    for product in &template.purchasable {
        let price = lookup(&template.purchase_price, product, scenario)?;
        recourse_cost += &group_var(&purchased, product)? * price;
    }

    //total acres allocated cannot exceed the land available
    let mut acreage = AffineExpression::default();
    for crop in &template.crops {
        acreage += &group_var(&land, crop)?;
    }
    let total_acreage = Constraint::new("total_acreage", acreage, Comp::Le, template.total_land);

    //production + purchases - sales must cover each minimum requirement
    let mut recourse_constraints = Vec::new();
    for crop in &template.required {
        let y = realized_yield(scenario, crop)?;
        let requirement = lookup(&template.min_requirement, crop, scenario)?;
        let lhs = &group_var(&land, crop)? * y + &group_var(&purchased, crop)?
            - &group_var(&sold, crop)?;
        recourse_constraints.push(Constraint::new(
            format!("min_requirement[{}]", crop),
            lhs,
            Comp::Ge,
            requirement,
        ));
    }

    //tiered sales cannot exceed what the quota crop produced
    let quota_yield = realized_yield(scenario, &template.quota_crop)?;
    let tier_sales = AffineExpression::from(&group_var(&sold, &template.favorable_tier)?)
        + &group_var(&sold, &template.unfavorable_tier)?;
    recourse_constraints.push(Constraint::new(
        format!("mass_balance[{}]", template.quota_crop),
        tier_sales,
        Comp::Le,
        &group_var(&land, &template.quota_crop)? * quota_yield,
    ));

    //favorably priced sales are capped by the quota
    recourse_constraints.push(Constraint::new(
        format!("quota[{}]", template.quota_crop),
        AffineExpression::from(&group_var(&sold, &template.favorable_tier)?),
        Comp::Le,
        template.quota_limit,
    ));

    Ok(ScenarioModel::new(
        scenario.clone(),
        vec![land],
        vec![sold, purchased],
        vec![total_acreage],
        recourse_constraints,
        StageObjective {
            base_cost,
            revenue,
            recourse_cost,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use approx::assert_relative_eq;

    fn fair_scenario() -> (FarmTemplate, Scenario) {
        let template = FarmTemplate::birge_louveaux();
        let scenario = template.weather_scenario(Weather::Fair, 1.0).unwrap();
        (template, scenario)
    }

    #[test]
    fn weather_label_round_trip() {
        for w in Weather::ALL {
            assert_eq!(Weather::from_label(w.label()).unwrap(), w);
        }
        assert!(matches!(
            Weather::from_label("apocalyptic").unwrap_err(),
            BuildError::InvalidScenario { .. }
        ));
    }

    #[test]
    fn weather_scales_mean_yields() {
        let template = FarmTemplate::birge_louveaux();
        let good = template.weather_scenario(Weather::Good, 0.5).unwrap();
        assert_relative_eq!(good.value("wheat").unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(good.value("beets").unwrap(), 24.0, epsilon = 1e-12);
    }

    #[test]
    fn builds_expected_structure() {
        let (template, scenario) = fair_scenario();
        let mdl = build_farm_model(&scenario, &template).unwrap();

        assert_eq!(mdl.first_stage().len(), 1);
        assert_eq!(mdl.first_stage()[0].len(), 3);
        assert_eq!(mdl.second_stage()[0].len(), 4);
        assert_eq!(mdl.second_stage()[1].len(), 2);
        assert_eq!(mdl.first_stage_constraints().len(), 1);
        //2 minimum requirements + mass balance + quota
        assert_eq!(mdl.recourse_constraints().len(), 4);
    }

    #[test]
    fn objective_terms_match_worked_example() {
        let (template, scenario) = fair_scenario();
        let mdl = build_farm_model(&scenario, &template).unwrap();
        let obj = mdl.objective();

        let base = obj.base_cost.coeffs_by_name();
        assert_relative_eq!(base["land[wheat]"], 150.0, epsilon = 1e-12);
        assert_relative_eq!(base["land[beets]"], 260.0, epsilon = 1e-12);

        let revenue = obj.revenue.coeffs_by_name();
        assert_relative_eq!(revenue["sold[beets_favorable]"], 36.0, epsilon = 1e-12);
        assert_relative_eq!(revenue["sold[beets_unfavorable]"], 10.0, epsilon = 1e-12);

        let recourse = obj.recourse_cost.coeffs_by_name();
        assert_relative_eq!(recourse["purchased[wheat]"], 238.0, epsilon = 1e-12);

        //minimize planting - revenue + purchasing
        let cost = obj.scenario_cost().coeffs_by_name();
        assert_relative_eq!(cost["sold[wheat]"], -170.0, epsilon = 1e-12);
        assert_relative_eq!(cost["land[corn]"], 230.0, epsilon = 1e-12);
    }

    #[test]
    fn constraints_use_realized_yield() {
        let template = FarmTemplate::birge_louveaux();
        let bad = template.weather_scenario(Weather::Bad, 1.0).unwrap();
        let mdl = build_farm_model(&bad, &template).unwrap();

        let min_wheat = mdl
            .recourse_constraints()
            .iter()
            .find(|c| c.name() == "min_requirement[wheat]")
            .unwrap();
        let (coeffs, comp, rhs) = min_wheat.normalized();
        assert_eq!(comp, Comp::Ge);
        assert_relative_eq!(rhs, 200.0, epsilon = 1e-12);
        let by_name: FxHashMap<String, f64> = coeffs
            .iter()
            .map(|(v, c)| (v.name().to_string(), *c))
            .collect();
        //2.5 * 0.8
        assert_relative_eq!(by_name["land[wheat]"], 2.0, epsilon = 1e-12);
        assert_relative_eq!(by_name["purchased[wheat]"], 1.0, epsilon = 1e-12);
        assert_relative_eq!(by_name["sold[wheat]"], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn builds_are_idempotent() {
        let (template, scenario) = fair_scenario();
        let a = build_farm_model(&scenario, &template).unwrap();
        let b = build_farm_model(&scenario, &template).unwrap();

        assert_eq!(
            a.objective().scenario_cost().coeffs_by_name(),
            b.objective().scenario_cost().coeffs_by_name()
        );
        for (ca, cb) in a
            .recourse_constraints()
            .iter()
            .zip(b.recourse_constraints())
        {
            assert_eq!(ca.name(), cb.name());
            let (coeffs_a, comp_a, rhs_a) = ca.normalized();
            let (coeffs_b, comp_b, rhs_b) = cb.normalized();
            assert_eq!(comp_a, comp_b);
            assert_eq!(rhs_a, rhs_b);
            let names_a: FxHashMap<String, f64> = coeffs_a
                .iter()
                .map(|(v, c)| (v.name().to_string(), *c))
                .collect();
            let names_b: FxHashMap<String, f64> = coeffs_b
                .iter()
                .map(|(v, c)| (v.name().to_string(), *c))
                .collect();
            assert_eq!(names_a, names_b);
        }
    }

    #[test]
    fn three_weather_extensive_form_structure() {
        let template = FarmTemplate::birge_louveaux();
        let set = crate::scenario::ScenarioSet::new(
            Weather::ALL
                .iter()
                .map(|w| template.weather_scenario(*w, 1.0 / 3.0).unwrap())
                .collect(),
        )
        .unwrap();

        let ef = crate::twostage::build_extensive_form(&set, |s| build_farm_model(s, &template))
            .unwrap();

        //one shared land variable per crop
        assert_eq!(ef.first_stage().len(), 1);
        assert_eq!(ef.first_stage()[0].len(), 3);

        //4 sold + 2 purchased recourse variables per scenario
        assert_eq!(ef.num_scenarios(), 3);
        for block in ef.blocks() {
            assert_eq!(block.num_vars(), 6);
        }

        //3 x (1 acreage + 2 requirements + balance + quota) tagged per
        //scenario, plus the single shared acreage copy
        let tagged: usize = ef.blocks().iter().map(|b| b.constraints().len()).sum();
        assert_eq!(tagged, 15);
        assert_eq!(ef.shared_constraints().len(), 1);
        assert_eq!(ef.num_constraints(), 16);

        //the full model sees 3 + 12 + 6 variables
        assert_eq!(ef.to_model().variables().len(), 21);

        //expected planting cost of wheat is just its cost (weights sum to 1)
        let land_wheat = ef.first_stage_var("land", "wheat").unwrap();
        assert_relative_eq!(ef.objective().coeff(land_wheat), 150.0, epsilon = 1e-9);

        //bad-weather purchases carry a third of their price
        let purchased = ef.recourse_var("bad", "purchased", "wheat").unwrap();
        assert_relative_eq!(
            ef.objective().coeff(purchased),
            238.0 / 3.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn missing_yield_is_a_template_mismatch() {
        let template = FarmTemplate::birge_louveaux();
        let mut incomplete = FxHashMap::default();
        incomplete.insert("wheat".to_string(), 2.5);
        incomplete.insert("corn".to_string(), 3.0);
        //no beets realization
        let scenario = Scenario::new("partial", 1.0, incomplete).unwrap();

        let err = build_farm_model(&scenario, &template).unwrap_err();
        assert_eq!(
            err,
            BuildError::TemplateMismatch {
                scenario: "partial".to_string(),
                name: "beets".to_string(),
            }
        );
    }

    #[test]
    fn zero_yield_still_builds() {
        let template = FarmTemplate::birge_louveaux();
        let ruined = template.scaled_yield_scenario("drought", 0.0, 1.0).unwrap();
        let mdl = build_farm_model(&ruined, &template).unwrap();

        //the yield term drops out; purchases alone must cover the requirement
        let min_corn = mdl
            .recourse_constraints()
            .iter()
            .find(|c| c.name() == "min_requirement[corn]")
            .unwrap();
        let (coeffs, _, rhs) = min_corn.normalized();
        let land_corn = mdl.group("land").unwrap().var("corn").unwrap();
        assert_eq!(coeffs.get(land_corn).copied().unwrap_or(0.0), 0.0);
        assert_relative_eq!(rhs, 240.0, epsilon = 1e-12);
    }
}
