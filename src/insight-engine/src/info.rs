// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::format_float;
use crate::datamodel::Role;
use crate::model_description::ModelDescription;

const INFO_CAUSALITIES: [&str; 3] = ["input", "output", "parameter"];

/// Human-readable summary of a model description: header fields, the default
/// experiment and the input/output/parameter variables with their start
/// values. Lines are joined with `\n` and the text begins with an empty line.
pub fn model_info(md: &ModelDescription, platforms: &[String]) -> String {
    let mut lines: Vec<String> = vec![];

    lines.push(String::new());
    lines.push("Model Info".to_owned());
    lines.push(String::new());
    lines.push(field("FMI Version", &md.fmi_version));
    lines.push(field("FMI Type", &md.fmi_types().join(", ")));
    lines.push(field("Model Name", &md.model_name));
    lines.push(field(
        "Description",
        md.description.as_deref().unwrap_or_default(),
    ));
    lines.push(field("Platforms", &platforms.join(", ")));
    lines.push(field(
        "Continuous States",
        &md.number_of_continuous_states().to_string(),
    ));
    lines.push(field(
        "Event Indicators",
        &md.number_of_event_indicators().to_string(),
    ));
    lines.push(field("Variables", &md.variable_count().to_string()));
    lines.push(field(
        "Generation Tool",
        md.generation_tool.as_deref().unwrap_or_default(),
    ));
    lines.push(field(
        "Generation Date",
        md.generation_date_and_time.as_deref().unwrap_or_default(),
    ));

    if let Some(ref experiment) = md.default_experiment {
        lines.push(String::new());
        lines.push("Default Experiment".to_owned());
        lines.push(String::new());
        let settings = [
            ("Start Time", experiment.start_time),
            ("Stop Time", experiment.stop_time),
            ("Tolerance", experiment.tolerance),
            ("Step Size", experiment.step_size),
        ];
        // zero and absent values are both left out
        for (label, value) in settings {
            if let Some(value) = value.filter(|v| *v != 0.0) {
                lines.push(field(label, &format_float(value)));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("Variables ({})", INFO_CAUSALITIES.join(", ")));
    lines.push(String::new());
    lines.push(variable_row(
        "Name",
        "Causality",
        "Start Value",
        "Unit",
        "Description",
    ));
    for raw in md.raw_variables() {
        if Role::from_causality(&raw.causality).is_none() {
            continue;
        }
        lines.push(variable_row(
            &raw.name,
            &raw.causality,
            raw.start.as_deref().unwrap_or_default(),
            &raw.unit,
            raw.description.as_deref().unwrap_or_default(),
        ));
    }

    lines.join("\n")
}

fn field(label: &str, value: &str) -> String {
    format!("  {label:<18} {value}")
}

fn variable_row(name: &str, causality: &str, start: &str, unit: &str, description: &str) -> String {
    format!("  {name:<18} {causality:<10} {start:>23}  {unit:<8} {description}")
}
