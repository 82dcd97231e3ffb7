// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use insight_compat::{Fmu, LoadOptions, open_fmu};
use insight_engine::{Catalog, Role, Variable};

#[derive(Parser, Debug)]
#[command(
    name = "fmu-insight",
    version,
    about = "Inspect the variables of an FMU before setting up a study"
)]
struct Args {
    /// Fail when the model declares the same variable name more than once
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the model summary
    Info { model: PathBuf },
    /// List parameters, inputs and outputs
    List {
        model: PathBuf,
        /// Only list variables with this role
        #[arg(long)]
        role: Option<Role>,
        /// Case-insensitive substring to match against variable names
        #[arg(long, default_value = "")]
        filter: String,
        /// Print the matching variables as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the details of one variable
    Describe { model: PathBuf, name: Option<String> },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = LoadOptions {
        strict: args.strict,
    };

    match args.command {
        Command::Info { model } => {
            let fmu = load(&model)?;
            println!("{}", info_text(&fmu, options)?);
        }
        Command::List {
            model,
            role,
            filter,
            json,
        } => {
            let catalog = load_catalog(&model, options)?;
            let groups = matching_groups(&catalog, role, &filter);
            if json {
                println!("{}", list_json(&groups)?);
            } else {
                print!("{}", format_groups(&groups));
            }
        }
        Command::Describe { model, name } => {
            let catalog = load_catalog(&model, options)?;
            println!("{}", catalog.describe(name.as_deref()));
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Fmu> {
    open_fmu(path).with_context(|| format!("failed to load {}", path.display()))
}

fn load_catalog(path: &Path, options: LoadOptions) -> Result<Catalog> {
    let fmu = load(path)?;
    catalog_for(&fmu, options)
}

fn catalog_for(fmu: &Fmu, options: LoadOptions) -> Result<Catalog> {
    let catalog = fmu
        .build_catalog(options)
        .with_context(|| format!("failed to catalog {}", fmu.path.display()))?;
    debug!(variables = catalog.len(), "built catalog");
    Ok(catalog)
}

/// With `--strict` the catalog is built too, so duplicate names fail here
/// the same way they do for `list` and `describe`.
fn info_text(fmu: &Fmu, options: LoadOptions) -> Result<String> {
    if options.strict {
        catalog_for(fmu, options)?;
    }
    Ok(fmu.info())
}

fn list_json(groups: &[(Role, Vec<&Variable>)]) -> Result<String> {
    let vars: Vec<&Variable> = groups
        .iter()
        .flat_map(|(_, vars)| vars.iter().copied())
        .collect();
    Ok(serde_json::to_string_pretty(&vars)?)
}

/// Groups with no matching variable are left out.
fn matching_groups<'a>(
    catalog: &'a Catalog,
    role: Option<Role>,
    filter: &str,
) -> Vec<(Role, Vec<&'a Variable>)> {
    let search = catalog.search(filter);
    Role::ALL
        .into_iter()
        .filter(|r| role.is_none_or(|wanted| wanted == *r))
        .filter(|r| search.is_visible(*r))
        .map(|r| (r, search.matches(r).to_vec()))
        .collect()
}

fn format_groups(groups: &[(Role, Vec<&Variable>)]) -> String {
    let mut out = String::new();
    for (i, (role, vars)) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(role.heading());
        out.push('\n');
        for var in vars {
            let default = var
                .default_value()
                .map(|v| v.to_string())
                .unwrap_or_default();
            let line = format!("  {:<18} {:<8} {}", var.name, var.unit, default);
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_engine::{DESCRIBE_PLACEHOLDER, RawVariable};

    fn raw(name: &str, causality: &str, unit: &str, start: Option<&str>) -> RawVariable {
        RawVariable {
            name: name.to_owned(),
            causality: causality.to_owned(),
            unit: unit.to_owned(),
            value_type: "Real".to_owned(),
            start: start.map(|s| s.to_owned()),
            description: None,
        }
    }

    fn catalog() -> Catalog {
        Catalog::build(&[
            raw("e", "parameter", "", Some("0.8")),
            raw("h0", "parameter", "m", Some("1")),
            raw("h", "output", "m", None),
        ])
    }

    #[test]
    fn hides_empty_groups() {
        let catalog = catalog();
        let groups = matching_groups(&catalog, None, "");
        assert_eq!(
            vec![Role::Parameter, Role::Output],
            groups.iter().map(|(r, _)| *r).collect::<Vec<_>>()
        );

        let groups = matching_groups(&catalog, None, "H");
        assert_eq!(2, groups.len());
        assert_eq!("h0", groups[0].1[0].name);

        let groups = matching_groups(&catalog, Some(Role::Output), "");
        assert_eq!(1, groups.len());
    }

    #[test]
    fn grouped_listing() {
        let catalog = catalog();
        let text = format_groups(&matching_groups(&catalog, None, ""));
        assert_eq!(
            "Parameters\n  e                           0.8\n  h0                 m        1.0\n\nOutputs\n  h                  m\n",
            text
        );
    }

    #[test]
    fn json_listing_shape() {
        let catalog = catalog();
        let text = list_json(&matching_groups(&catalog, None, "h")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(
            serde_json::json!([
                {
                    "name": "h0",
                    "unit": "m",
                    "type": "Real",
                    "description": null,
                    "role": "parameter",
                    "default_value": 1.0
                },
                {
                    "name": "h",
                    "unit": "m",
                    "type": "Real",
                    "description": null,
                    "role": "output"
                }
            ]),
            value
        );
    }

    #[test]
    fn json_text_default() {
        let catalog = Catalog::build(&[raw("mode", "parameter", "", Some("fast"))]);
        let text = list_json(&matching_groups(&catalog, None, "")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(serde_json::json!("fast"), value[0]["default_value"]);
    }

    #[test]
    fn describe_without_name() {
        let catalog = catalog();
        assert_eq!(DESCRIBE_PLACEHOLDER, catalog.describe(None));
        assert_eq!(
            "Name: e\nDescription:\nUnit:\nType: Real\nDefault value: 0.8",
            catalog.describe(Some("e"))
        );
    }

    #[test]
    fn strict_info_reports_duplicates() {
        let input = r#"<fmiModelDescription fmiVersion="2.0" modelName="Dup">
            <ModelVariables>
                <ScalarVariable name="k" valueReference="0" causality="parameter"><Real start="1"/></ScalarVariable>
                <ScalarVariable name="k" valueReference="1" causality="output"><Real/></ScalarVariable>
            </ModelVariables>
        </fmiModelDescription>"#;
        let fmu = Fmu {
            path: PathBuf::from("Dup.fmu"),
            model_description: insight_engine::model_description_from_str(input).unwrap(),
            platforms: vec![],
        };

        let info = info_text(&fmu, LoadOptions::default()).unwrap();
        assert!(info.contains("  Model Name         Dup\n"));

        let err = info_text(&fmu, LoadOptions { strict: true }).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate_variable"));
    }

    #[test]
    fn parses_role_flag() {
        let args = Args::try_parse_from([
            "fmu-insight",
            "list",
            "BouncingBall.fmu",
            "--role",
            "output",
            "--strict",
        ])
        .unwrap();
        assert!(args.strict);
        match args.command {
            Command::List { role, json, .. } => {
                assert_eq!(Some(Role::Output), role);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
