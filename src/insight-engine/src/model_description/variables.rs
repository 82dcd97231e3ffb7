// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;

use serde::Deserialize;

use crate::datamodel::RawVariable;

// absent causality attributes default to "local" in both FMI 2.0 and 3.0
const DEFAULT_CAUSALITY: &str = "local";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ModelVariables {
    #[serde(rename = "$value", default)]
    pub variables: Vec<ModelVariable>,
}

/// One entry of `<ModelVariables>`. FMI 2.0 wraps every variable in a
/// `ScalarVariable` with a typed child element; FMI 3.0 uses the type as the
/// element name.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub enum ModelVariable {
    ScalarVariable(ScalarVariable),
    Float32(Fmi3Variable),
    Float64(Fmi3Variable),
    Int8(Fmi3Variable),
    UInt8(Fmi3Variable),
    Int16(Fmi3Variable),
    UInt16(Fmi3Variable),
    Int32(Fmi3Variable),
    UInt32(Fmi3Variable),
    Int64(Fmi3Variable),
    UInt64(Fmi3Variable),
    Boolean(Fmi3Variable),
    String(Fmi3Variable),
    Binary(Fmi3Variable),
    Enumeration(Fmi3Variable),
    Clock(Fmi3Variable),
    // comments, vendor annotations and anything else we don't model
    #[serde(other)]
    Unhandled,
}

impl ModelVariable {
    pub fn name(&self) -> Option<&str> {
        match self {
            ModelVariable::ScalarVariable(v) => Some(v.name.as_str()),
            ModelVariable::Unhandled => None,
            _ => self.fmi3().map(|(_, v)| v.name.as_str()),
        }
    }

    fn fmi3(&self) -> Option<(&'static str, &Fmi3Variable)> {
        use ModelVariable::*;
        let typed = match self {
            Float32(v) => ("Float32", v),
            Float64(v) => ("Float64", v),
            Int8(v) => ("Int8", v),
            UInt8(v) => ("UInt8", v),
            Int16(v) => ("Int16", v),
            UInt16(v) => ("UInt16", v),
            Int32(v) => ("Int32", v),
            UInt32(v) => ("UInt32", v),
            Int64(v) => ("Int64", v),
            UInt64(v) => ("UInt64", v),
            Boolean(v) => ("Boolean", v),
            String(v) => ("String", v),
            Binary(v) => ("Binary", v),
            Enumeration(v) => ("Enumeration", v),
            Clock(v) => ("Clock", v),
            ScalarVariable(_) | Unhandled => return None,
        };
        Some(typed)
    }

    /// Flattens the variable into the descriptor the catalog consumes,
    /// resolving the unit through `declaredType` when the variable has none.
    pub fn to_raw(&self, declared_units: &HashMap<&str, &str>) -> Option<RawVariable> {
        let (value_type, name, causality, description, declared_type, unit, start) = match self {
            ModelVariable::ScalarVariable(v) => {
                let (value_type, attrs) = v.typed_attributes()?;
                (
                    value_type,
                    &v.name,
                    v.causality.as_deref(),
                    v.description.as_ref(),
                    attrs.declared_type.as_deref(),
                    attrs.unit.as_deref(),
                    attrs.start.clone(),
                )
            }
            ModelVariable::Unhandled => return None,
            _ => {
                let (value_type, v) = self.fmi3()?;
                (
                    value_type,
                    &v.name,
                    v.causality.as_deref(),
                    v.description.as_ref(),
                    v.declared_type.as_deref(),
                    v.unit.as_deref(),
                    v.start_value(),
                )
            }
        };

        let unit = match unit {
            Some(unit) if !unit.is_empty() => unit,
            _ => declared_type
                .and_then(|ty| declared_units.get(ty).copied())
                .unwrap_or_default(),
        };

        Some(RawVariable {
            name: name.clone(),
            causality: causality.unwrap_or(DEFAULT_CAUSALITY).to_owned(),
            unit: unit.to_owned(),
            value_type: value_type.to_owned(),
            start,
            description: description.cloned(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ScalarVariable {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@valueReference")]
    pub value_reference: Option<u32>,
    #[serde(rename = "@causality")]
    pub causality: Option<String>,
    #[serde(rename = "@variability")]
    pub variability: Option<String>,
    #[serde(rename = "@description")]
    pub description: Option<String>,
    #[serde(rename = "Real")]
    pub real: Option<TypeAttributes>,
    #[serde(rename = "Integer")]
    pub integer: Option<TypeAttributes>,
    #[serde(rename = "Boolean")]
    pub boolean: Option<TypeAttributes>,
    #[serde(rename = "String")]
    pub string: Option<TypeAttributes>,
    #[serde(rename = "Enumeration")]
    pub enumeration: Option<TypeAttributes>,
}

impl ScalarVariable {
    pub fn typed_attributes(&self) -> Option<(&'static str, &TypeAttributes)> {
        if let Some(ref attrs) = self.real {
            Some(("Real", attrs))
        } else if let Some(ref attrs) = self.integer {
            Some(("Integer", attrs))
        } else if let Some(ref attrs) = self.boolean {
            Some(("Boolean", attrs))
        } else if let Some(ref attrs) = self.string {
            Some(("String", attrs))
        } else {
            self.enumeration.as_ref().map(|attrs| ("Enumeration", attrs))
        }
    }
}

/// Attributes of the FMI 2.0 type element (`<Real .../>` and friends), also
/// used for the type elements inside a `SimpleType`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TypeAttributes {
    #[serde(rename = "@declaredType")]
    pub declared_type: Option<String>,
    #[serde(rename = "@unit")]
    pub unit: Option<String>,
    #[serde(rename = "@start")]
    pub start: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Fmi3Variable {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@valueReference")]
    pub value_reference: Option<u32>,
    #[serde(rename = "@causality")]
    pub causality: Option<String>,
    #[serde(rename = "@variability")]
    pub variability: Option<String>,
    #[serde(rename = "@description")]
    pub description: Option<String>,
    #[serde(rename = "@declaredType")]
    pub declared_type: Option<String>,
    #[serde(rename = "@unit")]
    pub unit: Option<String>,
    #[serde(rename = "@start")]
    pub start: Option<String>,
    // String and Binary variables carry their start values as child elements
    #[serde(rename = "Start", default)]
    pub start_elements: Vec<StartElement>,
}

impl Fmi3Variable {
    pub fn start_value(&self) -> Option<String> {
        if self.start.is_some() {
            return self.start.clone();
        }
        if self.start_elements.is_empty() {
            return None;
        }
        let values: Vec<&str> = self
            .start_elements
            .iter()
            .map(|s| s.value.as_str())
            .collect();
        Some(values.join(" "))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StartElement {
    #[serde(rename = "@value", default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TypeDefinitions {
    #[serde(rename = "$value", default)]
    pub types: Vec<TypeDefinition>,
}

impl TypeDefinitions {
    /// Units declared per type name, for variables that reference a
    /// declared type instead of naming a unit themselves.
    pub fn units(&self) -> HashMap<&str, &str> {
        self.types
            .iter()
            .filter_map(|ty| match ty {
                TypeDefinition::SimpleType(simple) => {
                    let unit = simple.real.as_ref()?.unit.as_deref()?;
                    Some((simple.name.as_str(), unit))
                }
                TypeDefinition::Float32Type(ty) | TypeDefinition::Float64Type(ty) => {
                    Some((ty.name.as_str(), ty.unit.as_deref()?))
                }
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub enum TypeDefinition {
    SimpleType(SimpleType),
    Float32Type(Fmi3TypeDefinition),
    Float64Type(Fmi3TypeDefinition),
    Int8Type(Fmi3TypeDefinition),
    UInt8Type(Fmi3TypeDefinition),
    Int16Type(Fmi3TypeDefinition),
    UInt16Type(Fmi3TypeDefinition),
    Int32Type(Fmi3TypeDefinition),
    UInt32Type(Fmi3TypeDefinition),
    Int64Type(Fmi3TypeDefinition),
    UInt64Type(Fmi3TypeDefinition),
    BooleanType(Fmi3TypeDefinition),
    StringType(Fmi3TypeDefinition),
    BinaryType(Fmi3TypeDefinition),
    EnumerationType(Fmi3TypeDefinition),
    ClockType(Fmi3TypeDefinition),
    #[serde(other)]
    Unhandled,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimpleType {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@description")]
    pub description: Option<String>,
    #[serde(rename = "Real")]
    pub real: Option<TypeAttributes>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Fmi3TypeDefinition {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@description")]
    pub description: Option<String>,
    #[serde(rename = "@unit")]
    pub unit: Option<String>,
}

#[test]
fn test_scalar_variable_parsing() {
    let input = r#"<ScalarVariable name="h" valueReference="0" causality="output" variability="continuous" description="Height">
        <Real start="1" unit="m"/>
    </ScalarVariable>"#;

    use quick_xml::de;
    let var: ScalarVariable = de::from_str(input).unwrap();
    assert_eq!("h", var.name);
    assert_eq!(Some(0), var.value_reference);
    assert_eq!(Some("output"), var.causality.as_deref());

    let (value_type, attrs) = var.typed_attributes().unwrap();
    assert_eq!("Real", value_type);
    assert_eq!(Some("m"), attrs.unit.as_deref());
    assert_eq!(Some("1"), attrs.start.as_deref());
}

#[test]
fn test_model_variables_mixed() {
    let input = r#"<ModelVariables>
        <ScalarVariable name="e" valueReference="4" causality="parameter" variability="fixed">
            <Real start="0.8"/>
        </ScalarVariable>
        <ScalarVariable name="der(h)" valueReference="1">
            <Real derivative="1"/>
        </ScalarVariable>
        <Float64 name="g" valueReference="5" causality="parameter" start="-9.81" unit="m/s2"/>
        <String name="label" valueReference="6" causality="parameter">
            <Start value="ball"/>
        </String>
    </ModelVariables>"#;

    use quick_xml::de;
    let vars: ModelVariables = de::from_str(input).unwrap();
    assert_eq!(4, vars.variables.len());

    let units = HashMap::new();
    let raw: Vec<RawVariable> = vars
        .variables
        .iter()
        .filter_map(|v| v.to_raw(&units))
        .collect();

    assert_eq!("e", raw[0].name);
    assert_eq!("Real", raw[0].value_type);
    assert_eq!(Some("0.8".to_owned()), raw[0].start);
    assert_eq!("", raw[0].unit);

    assert_eq!("der(h)", raw[1].name);
    assert_eq!("local", raw[1].causality);

    assert_eq!("Float64", raw[2].value_type);
    assert_eq!("m/s2", raw[2].unit);
    assert_eq!(Some("-9.81".to_owned()), raw[2].start);

    assert_eq!("String", raw[3].value_type);
    assert_eq!(Some("ball".to_owned()), raw[3].start);
}

#[test]
fn test_declared_type_units() {
    let input = r#"<TypeDefinitions>
        <SimpleType name="Modelica.SIunits.Height">
            <Real quantity="Length" unit="m"/>
        </SimpleType>
        <Float64Type name="Velocity" unit="m/s"/>
        <EnumerationType name="Mode">
            <Item name="on" value="1"/>
        </EnumerationType>
    </TypeDefinitions>"#;

    use quick_xml::de;
    let types: TypeDefinitions = de::from_str(input).unwrap();
    let units = types.units();
    assert_eq!(Some(&"m"), units.get("Modelica.SIunits.Height"));
    assert_eq!(Some(&"m/s"), units.get("Velocity"));
    assert!(!units.contains_key("Mode"));

    let var: ModelVariable = ModelVariable::ScalarVariable(ScalarVariable {
        name: "h".to_owned(),
        value_reference: Some(0),
        causality: Some("output".to_owned()),
        variability: None,
        description: None,
        real: Some(TypeAttributes {
            declared_type: Some("Modelica.SIunits.Height".to_owned()),
            unit: None,
            start: None,
        }),
        integer: None,
        boolean: None,
        string: None,
        enumeration: None,
    });
    assert_eq!("m", var.to_raw(&units).unwrap().unit);
}
