// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::{Path, PathBuf};

use tracing::debug;

use insight_core::{catalog_err, study_err};
use insight_engine::{
    Catalog, DESCRIBE_PLACEHOLDER, DoeSettings, MetricSpec, ParameterSpec, Result, Role, Study,
};

use crate::archive::{Fmu, LoadOptions, open_fmu};

/// Everything derived from one successfully opened FMU.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    pub fmu: Fmu,
    pub catalog: Catalog,
    pub info: String,
}

/// Application state. Holds the loaded model together with the selected
/// variable and the study configured against it.
#[derive(Debug, Default)]
pub struct Session {
    options: LoadOptions,
    fmu_path: Option<PathBuf>,
    model: Option<LoadedModel>,
    selected: Option<String>,
    study: Study,
}

impl Session {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Session {
            options,
            ..Default::default()
        }
    }

    pub fn fmu_path(&self) -> Option<&Path> {
        self.fmu_path.as_deref()
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.model.as_ref().map(|m| &m.catalog)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn study(&self) -> &Study {
        &self.study
    }

    /// Opens `path` and makes it the current model. The previous model,
    /// selection and study survive a failed load.
    pub fn load_fmu<P: AsRef<Path>>(&mut self, path: P) -> Result<&LoadedModel> {
        let path = path.as_ref();
        let fmu = open_fmu(path)?;
        let catalog = fmu.build_catalog(self.options)?;
        let info = fmu.info();

        debug!(path = %path.display(), variables = catalog.len(), "loaded model");

        self.fmu_path = Some(path.to_owned());
        self.selected = None;
        self.study.clear();
        Ok(self.model.insert(LoadedModel { fmu, catalog, info }))
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        let catalog = self.require_catalog()?;
        if catalog.get(name).is_none() {
            return catalog_err!(NotFound, format!("no variable named '{name}'"));
        }
        self.selected = Some(name.to_owned());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn describe_selected(&self) -> String {
        match self.catalog() {
            Some(catalog) => catalog.describe(self.selected.as_deref()),
            None => DESCRIBE_PLACEHOLDER.to_owned(),
        }
    }

    /// Returns whether the parameter is part of the study afterwards.
    pub fn toggle_parameter(&mut self, name: &str) -> Result<bool> {
        self.require_role(name, Role::Parameter)?;
        Ok(self.study.toggle_parameter(name))
    }

    /// Sets how a parameter is varied, selecting it if it wasn't already.
    pub fn set_parameter_spec(&mut self, name: &str, spec: ParameterSpec) -> Result<()> {
        self.require_role(name, Role::Parameter)?;
        self.study.set_parameter_spec(name, spec)
    }

    pub fn toggle_input(&mut self, name: &str) -> Result<bool> {
        self.require_role(name, Role::Input)?;
        Ok(self.study.toggle_input(name))
    }

    pub fn add_metric(&mut self, metric: MetricSpec) -> Result<()> {
        self.require_role(&metric.signal, Role::Output)?;
        self.study.add_metric(metric)
    }

    pub fn remove_metrics_for(&mut self, signal: &str) -> Result<usize> {
        self.require_role(signal, Role::Output)?;
        Ok(self.study.remove_metrics_for(signal))
    }

    pub fn set_doe_settings(&mut self, settings: Option<DoeSettings>) -> Result<()> {
        self.require_catalog()?;
        self.study.set_doe_settings(settings)
    }

    pub fn has_study(&self) -> bool {
        self.model.is_some() && self.study.has_study()
    }

    fn require_catalog(&self) -> Result<&Catalog> {
        match self.catalog() {
            Some(catalog) => Ok(catalog),
            None => study_err!(NoModelLoaded),
        }
    }

    fn require_role(&self, name: &str, role: Role) -> Result<()> {
        let catalog = self.require_catalog()?;
        match catalog.category_of(name) {
            Some(actual) if actual == role => Ok(()),
            Some(actual) => catalog_err!(
                WrongRole,
                format!("'{name}' is a {actual}, not a {role}")
            ),
            None => catalog_err!(NotFound, format!("no variable named '{name}'")),
        }
    }
}
