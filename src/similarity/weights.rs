use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ScoreError;
use crate::profile::Metric;

/// Per-metric weights of the aggregate score. A metric without a weight
/// contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<Metric, f64>")]
pub struct WeightConfig {
    weights: BTreeMap<Metric, f64>,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([(Metric::OneGramLengths, 1.0), (Metric::UniqueLengths, 0.25)]),
        }
    }
}

impl WeightConfig {
    pub fn new(weights: BTreeMap<Metric, f64>) -> Result<Self, ScoreError> {
        if let Some((metric, weight)) = weights
            .iter()
            .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
        {
            return Err(ScoreError::InvalidWeight {
                metric: *metric,
                weight: *weight,
            });
        }
        Ok(Self { weights })
    }

    /// Parse `{"<metric name>": weight, ...}`. Unknown metric names are rejected.
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        let raw: BTreeMap<String, f64> = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn weight(&self, metric: Metric) -> f64 {
        self.weights.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.weights.iter().map(|(metric, weight)| (*metric, *weight))
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightConfig {
    type Error = ScoreError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let weights = raw
            .into_iter()
            .map(|(name, weight)| -> Result<(Metric, f64), ScoreError> {
                Ok((name.parse::<Metric>()?, weight))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Self::new(weights)
    }
}

impl From<WeightConfig> for BTreeMap<Metric, f64> {
    fn from(config: WeightConfig) -> Self {
        config.weights
    }
}
