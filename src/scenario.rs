use rustc_hash::FxHashMap;

use crate::error::BuildError;

/// Tolerance on |sum of probabilities - 1| before the normalization warning
/// fires.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One realization of the uncertain inputs: an id, an occurrence probability
/// and the realized value of every uncertain parameter (e.g. per-crop yield).
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    id: String,
    probability: f64,
    realizations: FxHashMap<String, f64>,
}

impl Scenario {
    pub fn new<S: Into<String>>(
        id: S,
        probability: f64,
        realizations: FxHashMap<String, f64>,
    ) -> Result<Self, BuildError> {
        let id = id.into();
        if !probability.is_finite() || probability <= 0.0 || probability > 1.0 {
            return Err(BuildError::InvalidScenario {
                id,
                reason: format!("probability {} not in (0, 1]", probability),
            });
        }
        Ok(Self {
            id,
            probability,
            realizations,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Realized value of one uncertain parameter.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.realizations.get(name).copied()
    }

    pub fn realizations(&self) -> &FxHashMap<String, f64> {
        &self.realizations
    }
}

/// An ordered, fixed collection of scenarios. Probabilities are used exactly
/// as given; when they do not sum to 1 within [`PROBABILITY_TOLERANCE`] a
/// warning is logged and the expectation in any aggregated objective is taken
/// over the unnormalized weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, BuildError> {
        if scenarios.is_empty() {
            return Err(BuildError::EmptyScenarioSet);
        }
        let set = Self { scenarios };
        let total = set.total_probability();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            log::warn!(
                "scenario probabilities sum to {} (expected 1); weights used as given",
                total
            );
        }
        Ok(set)
    }

    pub fn total_probability(&self) -> f64 {
        self.scenarios.iter().map(|s| s.probability()).sum()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn yields(mult: f64) -> FxHashMap<String, f64> {
        let mut map = FxHashMap::default();
        map.insert("wheat".to_string(), 2.5 * mult);
        map.insert("corn".to_string(), 3.0 * mult);
        map.insert("beets".to_string(), 20.0 * mult);
        map
    }

    #[test]
    fn rejects_bad_probability() {
        for p in [0.0, -0.5, 1.5, f64::NAN] {
            let err = Scenario::new("bad", p, yields(1.0)).unwrap_err();
            assert!(matches!(err, BuildError::InvalidScenario { .. }));
        }
    }

    #[test]
    fn lookup_realized_values() {
        let s = Scenario::new("fair", 1.0 / 3.0, yields(1.0)).unwrap();
        assert_eq!(s.value("corn"), Some(3.0));
        assert_eq!(s.value("rice"), None);
    }

    #[test]
    fn empty_set_is_an_error() {
        assert_eq!(
            ScenarioSet::new(Vec::new()).unwrap_err(),
            BuildError::EmptyScenarioSet
        );
    }

    #[test]
    fn total_probability_sums() {
        let set = ScenarioSet::new(vec![
            Scenario::new("good", 1.0 / 3.0, yields(1.2)).unwrap(),
            Scenario::new("fair", 1.0 / 3.0, yields(1.0)).unwrap(),
            Scenario::new("bad", 1.0 / 3.0, yields(0.8)).unwrap(),
        ])
        .unwrap();
        assert_relative_eq!(set.total_probability(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn skewed_probabilities_still_construct() {
        //non-fatal: the set is usable, the warning is logged
        let set = ScenarioSet::new(vec![
            Scenario::new("a", 0.5, yields(1.0)).unwrap(),
            Scenario::new("b", 0.2, yields(0.8)).unwrap(),
        ])
        .unwrap();
        assert_relative_eq!(set.total_probability(), 0.7, epsilon = 1e-12);
    }
}
