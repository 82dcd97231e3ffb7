// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Reader for the `modelDescription.xml` file at the root of an FMU.
//!
//! Only the parts FMU Insight surfaces are modeled: header attributes, the
//! supported interfaces, the default experiment, declared types (for unit
//! resolution), the variable list and enough of the model structure to count
//! continuous states and event indicators. FMI 2.0 and 3.0 descriptions are
//! read through the same types.

use std::collections::HashMap;
use std::io::BufRead;

use serde::Deserialize;
use tracing::debug;

use crate::common::Result;
use crate::datamodel::RawVariable;

pub mod variables;

pub use self::variables::{
    Fmi3TypeDefinition, Fmi3Variable, ModelVariable, ModelVariables, ScalarVariable, SimpleType,
    StartElement, TypeAttributes, TypeDefinition, TypeDefinitions,
};

const SUPPORTED_MAJOR_VERSIONS: &[&str] = &["2", "3"];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename = "fmiModelDescription")]
pub struct ModelDescription {
    #[serde(rename = "@fmiVersion")]
    pub fmi_version: String,
    #[serde(rename = "@modelName")]
    pub model_name: String,
    #[serde(rename = "@description")]
    pub description: Option<String>,
    #[serde(rename = "@guid")]
    pub guid: Option<String>,
    #[serde(rename = "@instantiationToken")]
    pub instantiation_token: Option<String>,
    #[serde(rename = "@generationTool")]
    pub generation_tool: Option<String>,
    #[serde(rename = "@generationDateAndTime")]
    pub generation_date_and_time: Option<String>,
    #[serde(rename = "@numberOfEventIndicators")]
    pub number_of_event_indicators: Option<u32>,
    #[serde(rename = "ModelExchange")]
    pub model_exchange: Option<Interface>,
    #[serde(rename = "CoSimulation")]
    pub co_simulation: Option<Interface>,
    #[serde(rename = "ScheduledExecution")]
    pub scheduled_execution: Option<Interface>,
    #[serde(rename = "DefaultExperiment")]
    pub default_experiment: Option<DefaultExperiment>,
    #[serde(rename = "TypeDefinitions")]
    pub type_definitions: Option<TypeDefinitions>,
    #[serde(rename = "ModelVariables", default)]
    pub model_variables: ModelVariables,
    #[serde(rename = "ModelStructure")]
    pub model_structure: Option<ModelStructure>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Interface {
    #[serde(rename = "@modelIdentifier")]
    pub model_identifier: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DefaultExperiment {
    #[serde(rename = "@startTime")]
    pub start_time: Option<f64>,
    #[serde(rename = "@stopTime")]
    pub stop_time: Option<f64>,
    #[serde(rename = "@tolerance")]
    pub tolerance: Option<f64>,
    #[serde(rename = "@stepSize")]
    pub step_size: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ModelStructure {
    // FMI 2.0
    #[serde(rename = "Derivatives")]
    pub derivatives: Option<Unknowns>,
    // FMI 3.0
    #[serde(rename = "ContinuousStateDerivative", default)]
    pub continuous_state_derivatives: Vec<StructureEntry>,
    #[serde(rename = "EventIndicator", default)]
    pub event_indicators: Vec<StructureEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Unknowns {
    #[serde(rename = "Unknown", default)]
    pub unknowns: Vec<StructureEntry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StructureEntry {
    #[serde(rename = "@index")]
    pub index: Option<u32>,
    #[serde(rename = "@valueReference")]
    pub value_reference: Option<u32>,
}

impl ModelDescription {
    pub fn major_version(&self) -> &str {
        self.fmi_version
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Names of the interfaces this FMU implements, in FMI order.
    pub fn fmi_types(&self) -> Vec<&'static str> {
        let mut types = vec![];
        if self.model_exchange.is_some() {
            types.push("Model Exchange");
        }
        if self.co_simulation.is_some() {
            types.push("Co-Simulation");
        }
        if self.scheduled_execution.is_some() {
            types.push("Scheduled Execution");
        }
        types
    }

    pub fn number_of_continuous_states(&self) -> usize {
        match self.model_structure {
            Some(ref structure) => {
                let fmi2 = structure
                    .derivatives
                    .as_ref()
                    .map(|d| d.unknowns.len())
                    .unwrap_or_default();
                fmi2 + structure.continuous_state_derivatives.len()
            }
            None => 0,
        }
    }

    pub fn number_of_event_indicators(&self) -> usize {
        if let Some(n) = self.number_of_event_indicators {
            return n as usize;
        }
        self.model_structure
            .as_ref()
            .map(|s| s.event_indicators.len())
            .unwrap_or_default()
    }

    /// Variables as the model declares them, skipping entries we don't model.
    pub fn variables(&self) -> impl Iterator<Item = &ModelVariable> {
        self.model_variables
            .variables
            .iter()
            .filter(|v| !matches!(v, ModelVariable::Unhandled))
    }

    pub fn variable_count(&self) -> usize {
        self.variables().count()
    }

    /// The ordered descriptor list the catalog is built from. A
    /// `ScalarVariable` without a type element has no type to report and is
    /// left out, although `variable_count` still counts it.
    pub fn raw_variables(&self) -> Vec<RawVariable> {
        let units: HashMap<&str, &str> = self
            .type_definitions
            .as_ref()
            .map(|t| t.units())
            .unwrap_or_default();

        self.variables()
            .filter_map(|v| {
                let raw = v.to_raw(&units);
                if raw.is_none() {
                    debug!(name = v.name().unwrap_or_default(), "skipping untyped variable");
                }
                raw
            })
            .collect()
    }
}

pub fn model_description_from_reader(reader: &mut dyn BufRead) -> Result<ModelDescription> {
    use quick_xml::de;
    let md: ModelDescription = match de::from_reader(reader) {
        Ok(md) => md,
        Err(err) => {
            return load_err!(XmlDeserialization, err.to_string());
        }
    };

    if !SUPPORTED_MAJOR_VERSIONS.contains(&md.major_version()) {
        return load_err!(
            UnsupportedFmiVersion,
            format!("fmiVersion '{}' is not supported", md.fmi_version)
        );
    }

    Ok(md)
}

pub fn model_description_from_str(input: &str) -> Result<ModelDescription> {
    let mut reader = input.as_bytes();
    model_description_from_reader(&mut reader)
}

#[cfg(test)]
pub(crate) const BOUNCING_BALL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription
  fmiVersion="2.0"
  modelName="FMITest.BouncingBall"
  guid="{8c4e810f-3df3-4a00-8276-176fa3c9f9e0}"
  description="The 'classic' bouncing ball model"
  generationTool="OpenModelica Compiler OpenModelica v1.23.1 (64-bit)"
  generationDateAndTime="2025-05-20T20:01:34Z"
  variableNamingConvention="structured"
  numberOfEventIndicators="1">
  <ModelExchange modelIdentifier="FMITest_BouncingBall" needsExecutionTool="false">
    <SourceFiles>
      <File name="FMITest_BouncingBall.c"/>
    </SourceFiles>
  </ModelExchange>
  <CoSimulation modelIdentifier="FMITest_BouncingBall" canHandleVariableCommunicationStepSize="true"/>
  <TypeDefinitions>
    <SimpleType name="Modelica.SIunits.Velocity">
      <Real quantity="Velocity" unit="m/s"/>
    </SimpleType>
  </TypeDefinitions>
  <DefaultExperiment startTime="0.0" stopTime="4.0" tolerance="1e-06" stepSize="0.008"/>
  <ModelVariables>
    <!-- Index of variable = "1" -->
    <ScalarVariable name="h" valueReference="0" description="Height" variability="continuous" causality="output">
      <Real unit="m"/>
    </ScalarVariable>
    <ScalarVariable name="v" valueReference="1" description="Velocity" variability="continuous" causality="output">
      <Real declaredType="Modelica.SIunits.Velocity"/>
    </ScalarVariable>
    <ScalarVariable name="der(h)" valueReference="2" variability="continuous" causality="local" initial="calculated">
      <Real derivative="1"/>
    </ScalarVariable>
    <ScalarVariable name="der(v)" valueReference="3" variability="continuous" causality="local" initial="calculated">
      <Real derivative="2"/>
    </ScalarVariable>
    <ScalarVariable name="e" valueReference="4" description="Coefficient of restitution" variability="fixed" causality="parameter">
      <Real start="0.8"/>
    </ScalarVariable>
    <ScalarVariable name="g" valueReference="5" description="Gravity acceleration" variability="fixed" causality="calculatedParameter" initial="calculated">
      <Real unit="m/s2"/>
    </ScalarVariable>
    <ScalarVariable name="h0" valueReference="6" description="Initial height" variability="fixed" causality="parameter">
      <Real start="1.0" unit="m"/>
    </ScalarVariable>
    <ScalarVariable name="flying" valueReference="0" variability="discrete" causality="local" initial="exact">
      <Boolean start="true"/>
    </ScalarVariable>
  </ModelVariables>
  <ModelStructure>
    <Outputs>
      <Unknown index="1" dependencies=""/>
      <Unknown index="2" dependencies=""/>
    </Outputs>
    <Derivatives>
      <Unknown index="3" dependencies="2"/>
      <Unknown index="4" dependencies=""/>
    </Derivatives>
  </ModelStructure>
</fmiModelDescription>
"#;

#[test]
fn test_bouncing_ball_description() {
    let md = model_description_from_str(BOUNCING_BALL_XML).unwrap();
    assert_eq!("2.0", md.fmi_version);
    assert_eq!("2", md.major_version());
    assert_eq!("FMITest.BouncingBall", md.model_name);
    assert_eq!(vec!["Model Exchange", "Co-Simulation"], md.fmi_types());
    assert_eq!(2, md.number_of_continuous_states());
    assert_eq!(1, md.number_of_event_indicators());
    assert_eq!(8, md.variable_count());

    let experiment = md.default_experiment.clone().unwrap();
    assert_eq!(Some(4.0), experiment.stop_time);
    assert_eq!(Some(1e-6), experiment.tolerance);

    let raw = md.raw_variables();
    let names: Vec<&str> = raw.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(
        vec!["h", "v", "der(h)", "der(v)", "e", "g", "h0", "flying"],
        names
    );
    // unit comes from the declared type
    assert_eq!("m/s", raw[1].unit);
    assert_eq!("calculatedParameter", raw[5].causality);
    assert_eq!("Boolean", raw[7].value_type);
}

#[test]
fn test_fmi3_description() {
    let input = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="3.0" modelName="Feedthrough" instantiationToken="{37B954F1}">
  <CoSimulation modelIdentifier="Feedthrough"/>
  <ScheduledExecution modelIdentifier="Feedthrough"/>
  <TypeDefinitions>
    <Float64Type name="Angle" unit="rad"/>
  </TypeDefinitions>
  <ModelVariables>
    <Float64 name="time" valueReference="0" causality="independent" variability="continuous"/>
    <Float64 name="theta" valueReference="1" causality="input" declaredType="Angle" start="0"/>
    <Int32 name="count" valueReference="2" causality="output"/>
    <String name="label" valueReference="3" causality="parameter" variability="fixed">
      <Start value="hello"/>
    </String>
    <Float64 name="x" valueReference="4"/>
    <Float64 name="der(x)" valueReference="5" derivative="4"/>
  </ModelVariables>
  <ModelStructure>
    <Output valueReference="2"/>
    <ContinuousStateDerivative valueReference="5"/>
    <EventIndicator valueReference="4"/>
  </ModelStructure>
</fmiModelDescription>"#;

    let md = model_description_from_str(input).unwrap();
    assert_eq!("3", md.major_version());
    assert_eq!(vec!["Co-Simulation", "Scheduled Execution"], md.fmi_types());
    assert_eq!(1, md.number_of_continuous_states());
    assert_eq!(1, md.number_of_event_indicators());

    let raw = md.raw_variables();
    assert_eq!(6, raw.len());
    assert_eq!("independent", raw[0].causality);
    assert_eq!("rad", raw[1].unit);
    assert_eq!("Int32", raw[2].value_type);
    assert_eq!(Some("hello".to_owned()), raw[3].start);
    assert_eq!("local", raw[4].causality);
}

#[test]
fn test_unsupported_version() {
    let input = r#"<fmiModelDescription fmiVersion="1.0" modelName="Old"></fmiModelDescription>"#;
    let err = model_description_from_str(input).unwrap_err();
    assert!(err.is_model_load());
    assert_eq!(crate::common::ErrorCode::UnsupportedFmiVersion, err.code);
}

#[test]
fn test_bad_xml() {
    let input = r#"<fmiModelDescription fmiVersion="2.0" modelName="Broken">
        <ModelVariables>
            <ScalarVariable name="h" causality="output">"#;
    let err = model_description_from_str(input).unwrap_err();
    assert!(err.is_model_load());
    assert_eq!(crate::common::ErrorCode::XmlDeserialization, err.code);
}

#[test]
fn test_missing_model_name() {
    let input = r#"<fmiModelDescription fmiVersion="2.0"><ModelVariables/></fmiModelDescription>"#;
    let err = model_description_from_str(input).unwrap_err();
    assert_eq!(crate::common::ErrorCode::XmlDeserialization, err.code);
}

#[test]
fn test_untyped_scalar_variable_skipped() {
    let input = r#"<fmiModelDescription fmiVersion="2.0" modelName="Untyped">
  <ModelVariables>
    <ScalarVariable name="k" valueReference="0" causality="parameter"/>
    <ScalarVariable name="y" valueReference="1" causality="output"><Real/></ScalarVariable>
  </ModelVariables>
</fmiModelDescription>"#;

    let md = model_description_from_str(input).unwrap();
    assert_eq!(2, md.variable_count());
    let raw = md.raw_variables();
    assert_eq!(1, raw.len());
    assert_eq!("y", raw[0].name);
}
