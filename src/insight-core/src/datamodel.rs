// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::common::format_float;

/// A variable as the model description declares it, before classification.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RawVariable {
    pub name: String,
    pub causality: String,
    pub unit: String,
    pub value_type: String,
    pub start: Option<String>,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parameter,
    Input,
    Output,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Parameter, Role::Input, Role::Output];

    /// Maps a declared causality onto a role. Causalities the catalog doesn't
    /// surface (`local`, `calculatedParameter`, ...) map to `None`.
    pub fn from_causality(causality: &str) -> Option<Role> {
        match causality {
            "parameter" => Some(Role::Parameter),
            "input" => Some(Role::Input),
            "output" => Some(Role::Output),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parameter => "parameter",
            Role::Input => "input",
            Role::Output => "output",
        }
    }

    /// Plural heading used when listing a group of variables.
    pub fn heading(&self) -> &'static str {
        match self {
            Role::Parameter => "Parameters",
            Role::Input => "Inputs",
            Role::Output => "Outputs",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_causality(s.trim().to_lowercase().as_str())
            .ok_or_else(|| format!("unknown role '{s}' (expected parameter, input or output)"))
    }
}

/// Start value of a parameter. Models may declare non-numeric starts, which
/// are kept verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Number(f64),
    Text(String),
}

impl DefaultValue {
    pub fn parse(raw: &str) -> DefaultValue {
        match f64::from_str(raw.trim()) {
            Ok(n) => DefaultValue::Number(n),
            Err(_) => DefaultValue::Text(raw.to_owned()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            DefaultValue::Number(n) => Some(*n),
            DefaultValue::Text(_) => None,
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DefaultValue::Number(n) => write!(f, "{}", format_float(*n)),
            DefaultValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum VariableKind {
    Parameter { default_value: Option<DefaultValue> },
    Input,
    Output,
}

impl VariableKind {
    pub fn role(&self) -> Role {
        match self {
            VariableKind::Parameter { .. } => Role::Parameter,
            VariableKind::Input => Role::Input,
            VariableKind::Output => Role::Output,
        }
    }
}

/// A classified model variable. Every field a caller needs is copied out of
/// the raw descriptor, so nothing refers back to the parser's output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub unit: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: VariableKind,
}

impl Variable {
    /// Classifies a raw descriptor by its causality, returning `None` for
    /// causalities outside parameter/input/output.
    pub fn from_raw(raw: &RawVariable) -> Option<Variable> {
        let kind = match Role::from_causality(&raw.causality)? {
            Role::Parameter => VariableKind::Parameter {
                default_value: raw.start.as_deref().map(DefaultValue::parse),
            },
            Role::Input => VariableKind::Input,
            Role::Output => VariableKind::Output,
        };

        Some(Variable {
            name: raw.name.clone(),
            unit: raw.unit.clone(),
            value_type: raw.value_type.clone(),
            description: raw.description.clone(),
            kind,
        })
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        match &self.kind {
            VariableKind::Parameter { default_value } => default_value.as_ref(),
            _ => None,
        }
    }
}
