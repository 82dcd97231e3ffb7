// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::common::Result;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Max,
    Min,
    Mean,
    Final,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Max => "max",
            Statistic::Min => "min",
            Statistic::Mean => "mean",
            Statistic::Final => "final",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" => Ok(Statistic::Max),
            "min" => Ok(Statistic::Min),
            "mean" => Ok(Statistic::Mean),
            "final" => Ok(Statistic::Final),
            _ => Err(format!("unknown statistic '{s}'")),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    None,
    Minimize,
    Maximize,
}

/// A result metric or constraint computed from one output signal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricSpec {
    pub signal: String,
    pub statistic: Statistic,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub objective: Objective,
}

impl MetricSpec {
    pub fn new(signal: &str) -> Self {
        MetricSpec {
            signal: signal.to_owned(),
            statistic: Statistic::default(),
            lower: None,
            upper: None,
            objective: Objective::default(),
        }
    }

    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }
}

/// How a varied parameter is sampled between its bounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    #[default]
    Uniform,
    Normal,
}

impl FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(Distribution::Uniform),
            "normal" => Ok(Distribution::Normal),
            _ => Err(format!("unknown distribution '{s}'")),
        }
    }
}

/// How one selected parameter takes part in a study: held at a fixed value,
/// or varied over `lower..=upper` with the given distribution.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub fixed: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub distribution: Distribution,
}

impl ParameterSpec {
    pub fn fixed(value: f64) -> Self {
        ParameterSpec {
            fixed: Some(value),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoeMethod {
    #[default]
    MonteCarlo,
    LatinHypercube,
    FullFactorial,
}

pub const MIN_SAMPLES: u32 = 1;
pub const MAX_SAMPLES: u32 = 10_000;
pub const DEFAULT_SAMPLES: u32 = 100;
pub const MAX_SEED: u32 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DoeSettings {
    pub method: DoeMethod,
    /// Sample count for the random designs, levels per factor for full
    /// factorial designs.
    pub samples: u32,
    pub seed: u32,
}

impl Default for DoeSettings {
    fn default() -> Self {
        DoeSettings {
            method: DoeMethod::default(),
            samples: DEFAULT_SAMPLES,
            seed: 0,
        }
    }
}

impl DoeSettings {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLES..=MAX_SAMPLES).contains(&self.samples) {
            return study_err!(
                BadDoeSettings,
                format!(
                    "sample count {} outside {}..={}",
                    self.samples, MIN_SAMPLES, MAX_SAMPLES
                )
            );
        }
        if self.seed > MAX_SEED {
            return study_err!(
                BadDoeSettings,
                format!("random seed {} exceeds {}", self.seed, MAX_SEED)
            );
        }
        Ok(())
    }
}

/// Which parameters and inputs a study varies, what it measures, and how it
/// samples. Names are not checked here; the session validates them against
/// the loaded catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Study {
    parameters: BTreeMap<String, ParameterSpec>,
    inputs: BTreeSet<String>,
    metrics: Vec<MetricSpec>,
    doe: Option<DoeSettings>,
}

impl Study {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(|s| s.as_str())
    }

    pub fn parameter_spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|s| s.as_str())
    }

    pub fn metrics(&self) -> &[MetricSpec] {
        &self.metrics
    }

    pub fn doe_settings(&self) -> Option<&DoeSettings> {
        self.doe.as_ref()
    }

    pub fn includes_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn includes_input(&self, name: &str) -> bool {
        self.inputs.contains(name)
    }

    /// Returns true if the parameter wasn't already selected. A newly
    /// selected parameter starts with a default spec.
    pub fn include_parameter(&mut self, name: &str) -> bool {
        if self.parameters.contains_key(name) {
            return false;
        }
        self.parameters.insert(name.to_owned(), ParameterSpec::default());
        true
    }

    pub fn exclude_parameter(&mut self, name: &str) -> bool {
        self.parameters.remove(name).is_some()
    }

    /// Selects the parameter if needed and replaces its spec.
    pub fn set_parameter_spec(&mut self, name: &str, spec: ParameterSpec) -> Result<()> {
        if let (Some(lower), Some(upper)) = (spec.lower, spec.upper) {
            if lower > upper {
                return study_err!(
                    BadParameterRange,
                    format!(
                        "parameter '{}': lower bound {} exceeds upper bound {}",
                        name, lower, upper
                    )
                );
            }
        }
        self.parameters.insert(name.to_owned(), spec);
        Ok(())
    }

    /// Flips the parameter's membership and returns whether it is now selected.
    pub fn toggle_parameter(&mut self, name: &str) -> bool {
        if self.exclude_parameter(name) {
            false
        } else {
            self.include_parameter(name)
        }
    }

    pub fn include_input(&mut self, name: &str) -> bool {
        self.inputs.insert(name.to_owned())
    }

    pub fn exclude_input(&mut self, name: &str) -> bool {
        self.inputs.remove(name)
    }

    pub fn toggle_input(&mut self, name: &str) -> bool {
        if self.exclude_input(name) {
            false
        } else {
            self.include_input(name)
        }
    }

    /// Adds a metric, replacing (in place) any metric already defined for the
    /// same output so each output has at most one.
    pub fn add_metric(&mut self, metric: MetricSpec) -> Result<()> {
        if let (Some(lower), Some(upper)) = (metric.lower, metric.upper) {
            if lower > upper {
                return study_err!(
                    BadMetricBounds,
                    format!(
                        "metric on '{}': lower bound {} exceeds upper bound {}",
                        metric.signal, lower, upper
                    )
                );
            }
        }

        match self.metrics.iter_mut().find(|m| m.signal == metric.signal) {
            Some(existing) => *existing = metric,
            None => self.metrics.push(metric),
        }
        Ok(())
    }

    /// Removes every metric that references `signal`, returning how many
    /// were removed.
    pub fn remove_metrics_for(&mut self, signal: &str) -> usize {
        let before = self.metrics.len();
        self.metrics.retain(|m| m.signal != signal);
        before - self.metrics.len()
    }

    pub fn metric_for(&self, signal: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.signal == signal)
    }

    /// Out-of-range settings are rejected and the previous settings kept.
    pub fn set_doe_settings(&mut self, settings: Option<DoeSettings>) -> Result<()> {
        if let Some(ref settings) = settings {
            settings.validate()?;
        }
        self.doe = settings;
        Ok(())
    }

    /// A study needs at least one varied parameter and a sampling plan.
    pub fn has_study(&self) -> bool {
        !self.parameters.is_empty() && self.doe.is_some()
    }

    pub fn clear(&mut self) {
        *self = Study::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_selection_sets() {
        let mut study = Study::new();
        assert!(study.toggle_parameter("e"));
        assert!(study.includes_parameter("e"));
        assert!(!study.include_parameter("e"));
        assert!(!study.toggle_parameter("e"));
        assert!(!study.includes_parameter("e"));

        assert!(study.toggle_input("u"));
        assert_eq!(vec!["u"], study.inputs().collect::<Vec<_>>());
        assert!(study.exclude_input("u"));
        assert!(!study.exclude_input("u"));
    }

    #[test]
    fn metric_defaults() {
        let metric = MetricSpec::new("h");
        assert_eq!(Statistic::Max, metric.statistic);
        assert_eq!(Objective::None, metric.objective);
        assert!(metric.lower.is_none() && metric.upper.is_none());
    }

    #[test]
    fn one_metric_per_output() {
        let mut study = Study::new();
        study.add_metric(MetricSpec::new("h")).unwrap();
        study.add_metric(MetricSpec::new("v")).unwrap();
        study
            .add_metric(
                MetricSpec::new("h")
                    .with_statistic(Statistic::Mean)
                    .with_objective(Objective::Maximize),
            )
            .unwrap();

        assert_eq!(2, study.metrics().len());
        // the replacement keeps h's slot
        assert_eq!("h", study.metrics()[0].signal);
        assert_eq!(Statistic::Mean, study.metrics()[0].statistic);
        assert_eq!(
            Some(Objective::Maximize),
            study.metric_for("h").map(|m| m.objective)
        );

        assert_eq!(1, study.remove_metrics_for("h"));
        assert_eq!(0, study.remove_metrics_for("h"));
        assert!(study.metric_for("h").is_none());
        assert_eq!(1, study.metrics().len());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut study = Study::new();
        let err = study
            .add_metric(MetricSpec::new("h").with_bounds(Some(2.0), Some(1.0)))
            .unwrap_err();
        assert_eq!(crate::common::ErrorCode::BadMetricBounds, err.code);
        assert!(study.metrics().is_empty());

        study
            .add_metric(MetricSpec::new("h").with_bounds(Some(1.0), None))
            .unwrap();
        assert_eq!(Some(1.0), study.metric_for("h").and_then(|m| m.lower));
    }

    #[test]
    fn has_study_needs_parameters_and_doe() {
        let mut study = Study::new();
        assert!(!study.has_study());
        study.include_parameter("e");
        assert!(!study.has_study());
        study
            .set_doe_settings(Some(DoeSettings {
                method: DoeMethod::LatinHypercube,
                samples: 32,
                seed: 7,
            }))
            .unwrap();
        assert!(study.has_study());

        study.clear();
        assert!(!study.has_study());
        assert_eq!(0, study.parameters().count());
    }

    #[test]
    fn statistic_from_str() {
        assert_eq!(Ok(Statistic::Mean), "MEAN".parse::<Statistic>());
        assert!("median".parse::<Statistic>().is_err());
    }

    #[test]
    fn doe_defaults() {
        let settings = DoeSettings::default();
        assert_eq!(DoeMethod::MonteCarlo, settings.method);
        assert_eq!(100, settings.samples);
        assert_eq!(0, settings.seed);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_doe_settings() {
        let mut study = Study::new();
        study.include_parameter("e");
        study.set_doe_settings(Some(DoeSettings::default())).unwrap();

        let no_samples = DoeSettings {
            samples: 0,
            ..Default::default()
        };
        let err = study.set_doe_settings(Some(no_samples)).unwrap_err();
        assert_eq!(crate::common::ErrorCode::BadDoeSettings, err.code);
        // the earlier settings survive
        assert_eq!(Some(&DoeSettings::default()), study.doe_settings());
        assert!(study.has_study());

        let too_many = DoeSettings {
            samples: MAX_SAMPLES + 1,
            ..Default::default()
        };
        assert!(study.set_doe_settings(Some(too_many)).is_err());

        let big_seed = DoeSettings {
            seed: MAX_SEED + 1,
            ..Default::default()
        };
        assert!(study.set_doe_settings(Some(big_seed)).is_err());

        let edges = DoeSettings {
            method: DoeMethod::FullFactorial,
            samples: MAX_SAMPLES,
            seed: MAX_SEED,
        };
        study.set_doe_settings(Some(edges)).unwrap();
        study.set_doe_settings(None).unwrap();
        assert!(!study.has_study());
    }

    #[test]
    fn parameter_specs() {
        let mut study = Study::new();
        assert!(study.include_parameter("e"));
        assert_eq!(Some(&ParameterSpec::default()), study.parameter_spec("e"));

        let spec = ParameterSpec::default()
            .with_range(Some(0.5), Some(0.9))
            .with_distribution(Distribution::Normal);
        study.set_parameter_spec("e", spec.clone()).unwrap();
        assert_eq!(Some(&spec), study.parameter_spec("e"));
        // re-including keeps the spec
        assert!(!study.include_parameter("e"));
        assert_eq!(Some(&spec), study.parameter_spec("e"));

        study
            .set_parameter_spec("h0", ParameterSpec::fixed(2.0))
            .unwrap();
        assert!(study.includes_parameter("h0"));
        assert_eq!(vec!["e", "h0"], study.parameters().collect::<Vec<_>>());

        let err = study
            .set_parameter_spec("e", ParameterSpec::default().with_range(Some(1.0), Some(0.0)))
            .unwrap_err();
        assert_eq!(crate::common::ErrorCode::BadParameterRange, err.code);
        assert_eq!(Some(&spec), study.parameter_spec("e"));

        assert!(study.exclude_parameter("e"));
        assert!(study.parameter_spec("e").is_none());
    }

    #[test]
    fn distribution_from_str() {
        assert_eq!(Ok(Distribution::Normal), "Normal".parse::<Distribution>());
        assert!("beta".parse::<Distribution>().is_err());
    }
}
