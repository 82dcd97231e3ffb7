// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The classified, queryable set of a loaded model's variables.
//!
//! A [`Catalog`] is built once per loaded model from the ordered descriptor
//! list of the model description and is read-only afterwards. Loading another
//! model builds another catalog; nothing is merged.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::common::Result;
use crate::datamodel::{RawVariable, Role, Variable};

pub const DESCRIBE_PLACEHOLDER: &str = "Select a property to view more details";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    variables: Vec<Variable>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Classifies `raw_variables` by causality. Descriptors whose causality
    /// isn't parameter, input or output are dropped.
    ///
    /// Duplicate names are tolerated: the later descriptor replaces the
    /// earlier one entirely (role included) but keeps the earlier one's
    /// position in listings.
    pub fn build<'a, I>(raw_variables: I) -> Catalog
    where
        I: IntoIterator<Item = &'a RawVariable>,
    {
        let mut catalog = Catalog::default();
        for raw in raw_variables {
            let Some(var) = Variable::from_raw(raw) else {
                continue;
            };
            if let Some(&off) = catalog.by_name.get(&var.name) {
                warn!(
                    name = %var.name,
                    previous = %catalog.variables[off].role(),
                    replacement = %var.role(),
                    "duplicate variable name; keeping the later declaration"
                );
                catalog.variables[off] = var;
            } else {
                catalog.by_name.insert(var.name.clone(), catalog.variables.len());
                catalog.variables.push(var);
            }
        }

        debug!(
            parameters = catalog.count(Role::Parameter),
            inputs = catalog.count(Role::Input),
            outputs = catalog.count(Role::Output),
            "built catalog"
        );

        catalog
    }

    /// Like [`Catalog::build`], but a name declared twice (among the
    /// classified variables) is an error.
    pub fn build_strict<'a, I>(raw_variables: I) -> Result<Catalog>
    where
        I: IntoIterator<Item = &'a RawVariable>,
    {
        let raw_variables: Vec<&RawVariable> = raw_variables.into_iter().collect();
        let mut seen: HashSet<&str> = HashSet::new();
        for raw in raw_variables.iter() {
            if Role::from_causality(&raw.causality).is_none() {
                continue;
            }
            if !seen.insert(raw.name.as_str()) {
                return catalog_err!(
                    DuplicateVariable,
                    format!("variable '{}' is declared more than once", raw.name)
                );
            }
        }

        Ok(Catalog::build(raw_variables))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// All classified variables in ingestion order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.by_name.get(name).map(|&off| &self.variables[off])
    }

    /// `None` means the name isn't in the catalog, which is an ordinary
    /// answer rather than an error.
    pub fn category_of(&self, name: &str) -> Option<Role> {
        self.get(name).map(|var| var.role())
    }

    /// Variables of one role, in the order the model description lists them.
    pub fn all_in(&self, role: Role) -> Vec<&Variable> {
        self.variables.iter().filter(|v| v.role() == role).collect()
    }

    pub fn count(&self, role: Role) -> usize {
        self.variables.iter().filter(|v| v.role() == role).count()
    }

    /// Fixed-layout summary of one variable, or the placeholder text when
    /// nothing (or something unknown) is selected.
    pub fn describe(&self, name: Option<&str>) -> String {
        match name.and_then(|name| self.get(name)) {
            Some(var) => describe_variable(var),
            None => DESCRIBE_PLACEHOLDER.to_owned(),
        }
    }

    /// Applies [`text_filter`] to each role independently.
    pub fn search(&self, query: &str) -> CatalogSearch<'_> {
        let query = query.to_lowercase();
        let mut search = CatalogSearch::default();
        for role in Role::ALL {
            let hits: Vec<&Variable> = self
                .all_in(role)
                .into_iter()
                .filter(|var| name_matches(&var.name, &query))
                .collect();
            search.groups.push((role, hits));
        }
        search
    }
}

/// Result of filtering a catalog by name, grouped by role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogSearch<'a> {
    groups: Vec<(Role, Vec<&'a Variable>)>,
}

impl<'a> CatalogSearch<'a> {
    pub fn matches(&self, role: Role) -> &[&'a Variable] {
        self.groups
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, vars)| vars.as_slice())
            .unwrap_or_default()
    }

    /// A group with no matching members is hidden.
    pub fn is_visible(&self, role: Role) -> bool {
        !self.matches(role).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|role| !self.is_visible(*role))
    }

    /// Visible groups in display order.
    pub fn groups(&self) -> impl Iterator<Item = (Role, &[&'a Variable])> {
        self.groups
            .iter()
            .filter(|(_, vars)| !vars.is_empty())
            .map(|(role, vars)| (*role, vars.as_slice()))
    }
}

/// Names that contain `query`, compared case-insensitively. An empty query
/// matches everything. Input order is preserved.
pub fn text_filter<'a, S>(names: &'a [S], query: &str) -> Vec<&'a str>
where
    S: AsRef<str>,
{
    let query = query.to_lowercase();
    names
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| name_matches(name, &query))
        .collect()
}

fn name_matches(name: &str, lowered_query: &str) -> bool {
    lowered_query.is_empty() || name.to_lowercase().contains(lowered_query)
}

fn describe_variable(var: &Variable) -> String {
    let mut out = String::new();
    push_field(&mut out, "Name", &var.name);
    push_field(&mut out, "Description", var.description.as_deref().unwrap_or_default());
    push_field(&mut out, "Unit", &var.unit);
    push_field(&mut out, "Type", &var.value_type);
    if var.role() == Role::Parameter {
        let default = var
            .default_value()
            .map(|d| d.to_string())
            .unwrap_or_default();
        push_field(&mut out, "Default value", &default);
    }
    // drop the final newline
    out.pop();
    out
}

fn push_field(out: &mut String, label: &str, value: &str) {
    out.push_str(label);
    out.push(':');
    if !value.is_empty() {
        out.push(' ');
        out.push_str(value);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::datamodel::DefaultValue;

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

    fn bouncing_ball() -> Vec<RawVariable> {
        vec![
            raw("h", "output", "m", None),
            raw("v", "output", "m/s", None),
            raw("e", "parameter", "", Some("0.8")),
            raw("h0", "parameter", "m", Some("1.0")),
        ]
    }

    fn names(vars: &[&Variable]) -> Vec<String> {
        vars.iter().map(|v| v.name.clone()).collect()
    }

    #[test]
    fn builds_bouncing_ball() {
        let catalog = Catalog::build(&bouncing_ball());

        assert_eq!(vec!["h", "v"], names(&catalog.all_in(Role::Output)));
        assert_eq!(vec!["e", "h0"], names(&catalog.all_in(Role::Parameter)));
        assert!(catalog.all_in(Role::Input).is_empty());

        let e = catalog.get("e").unwrap();
        assert!(approx_eq!(
            f64,
            0.8,
            e.default_value().and_then(|d| d.as_number()).unwrap()
        ));
        let h0 = catalog.get("h0").unwrap();
        assert_eq!(Some(&DefaultValue::Number(1.0)), h0.default_value());
    }

    #[test]
    fn drops_unsupported_causalities() {
        let mut vars = bouncing_ball();
        vars.push(raw("flying", "local", "", Some("true")));
        vars.push(raw("g", "calculatedParameter", "m/s2", None));
        let catalog = Catalog::build(&vars);

        assert_eq!(4, catalog.len());
        assert_eq!(None, catalog.category_of("flying"));
        assert_eq!(None, catalog.category_of("g"));
        for role in Role::ALL {
            assert!(catalog.all_in(role).iter().all(|v| v.name != "flying"));
        }
    }

    #[test]
    fn non_numeric_default_kept_as_text() {
        let catalog = Catalog::build(&[raw("mode", "parameter", "", Some("abc"))]);
        let mode = catalog.get("mode").unwrap();
        assert_eq!(Some(&DefaultValue::Text("abc".to_owned())), mode.default_value());
    }

    #[test]
    fn category_of_lookup() {
        let mut vars = bouncing_ball();
        vars.push(raw("u", "input", "V", None));
        let catalog = Catalog::build(&vars);

        assert_eq!(Some(Role::Output), catalog.category_of("h"));
        assert_eq!(Some(Role::Parameter), catalog.category_of("h0"));
        assert_eq!(Some(Role::Input), catalog.category_of("u"));
        assert_eq!(None, catalog.category_of("H"));
        assert_eq!(catalog.category_of("u"), catalog.category_of("u"));
    }

    #[test]
    fn duplicate_names_last_wins() {
        let vars = vec![
            raw("x", "parameter", "", Some("1")),
            raw("y", "output", "", None),
            raw("x", "output", "m", None),
        ];
        let catalog = Catalog::build(&vars);

        assert_eq!(2, catalog.len());
        assert_eq!(Some(Role::Output), catalog.category_of("x"));
        assert_eq!("m", catalog.get("x").unwrap().unit);
        // no stale parameter entry, and x keeps its first position
        assert!(catalog.all_in(Role::Parameter).is_empty());
        assert_eq!(vec!["x", "y"], names(&catalog.all_in(Role::Output)));
    }

    #[test]
    fn listing_position_ignores_dropped_declarations() {
        // b is first declared as a local, so its listing slot comes from the
        // later parameter declaration
        let vars = vec![
            raw("b", "local", "", None),
            raw("c", "parameter", "", Some("1")),
            raw("b", "parameter", "", Some("2")),
        ];
        let catalog = Catalog::build(&vars);

        let listed: Vec<&str> = catalog.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(vec!["c", "b"], listed);
        assert_eq!(vec!["c", "b"], names(&catalog.all_in(Role::Parameter)));
        assert_eq!(
            Some(&DefaultValue::Number(2.0)),
            catalog.get("b").and_then(|v| v.default_value())
        );
    }

    #[test]
    fn strict_build_rejects_duplicates() {
        let vars = vec![
            raw("x", "parameter", "", Some("1")),
            raw("x", "output", "", None),
        ];
        let err = Catalog::build_strict(&vars).unwrap_err();
        assert_eq!(crate::common::ErrorCode::DuplicateVariable, err.code);

        // a dropped local sharing a name is not a duplicate
        let vars = vec![raw("x", "local", "", None), raw("x", "output", "", None)];
        let catalog = Catalog::build_strict(&vars).unwrap();
        assert_eq!(Some(Role::Output), catalog.category_of("x"));
    }

    #[test]
    fn describe_layout() {
        let mut vars = bouncing_ball();
        vars[3].description = Some("Initial height".to_owned());
        vars.push(raw("p", "parameter", "", None));
        let catalog = Catalog::build(&vars);

        assert_eq!(
            "Name: h0\nDescription: Initial height\nUnit: m\nType: Real\nDefault value: 1.0",
            catalog.describe(Some("h0"))
        );
        assert_eq!(
            "Name: h\nDescription:\nUnit: m\nType: Real",
            catalog.describe(Some("h"))
        );
        assert_eq!(
            "Name: p\nDescription:\nUnit:\nType: Real\nDefault value:",
            catalog.describe(Some("p"))
        );
    }

    #[test]
    fn describe_placeholder() {
        let catalog = Catalog::build(&bouncing_ball());
        assert_eq!(
            "Select a property to view more details",
            catalog.describe(None)
        );
        assert_eq!(
            "Select a property to view more details",
            catalog.describe(Some("nope"))
        );
        assert_eq!(
            DESCRIBE_PLACEHOLDER,
            Catalog::default().describe(Some("h"))
        );
    }

    #[test]
    fn text_filter_basics() {
        let names = ["Height", "velocity", "h0", "e"];
        assert_eq!(names.to_vec(), text_filter(&names, ""));
        assert_eq!(vec!["Height", "h0"], text_filter(&names, "H"));
        assert_eq!(vec!["velocity"], text_filter(&names, "VEL"));
        assert!(text_filter(&names, "zzz").is_empty());
    }

    #[test]
    fn search_hides_empty_groups() {
        let catalog = Catalog::build(&bouncing_ball());

        let search = catalog.search("h");
        assert!(search.is_visible(Role::Output));
        assert!(search.is_visible(Role::Parameter));
        assert!(!search.is_visible(Role::Input));
        assert_eq!(vec!["h"], names(search.matches(Role::Output)));
        assert_eq!(vec!["h0"], names(search.matches(Role::Parameter)));

        let search = catalog.search("v");
        assert!(search.is_visible(Role::Output));
        assert!(!search.is_visible(Role::Parameter));
        let visible: Vec<Role> = search.groups().map(|(role, _)| role).collect();
        assert_eq!(vec![Role::Output], visible);

        assert!(catalog.search("nothing").is_empty());
        assert_eq!(4, catalog.search("").groups().map(|(_, v)| v.len()).sum::<usize>());
    }

    fn arb_raw() -> impl Strategy<Value = RawVariable> {
        (
            "[a-e]{1,3}",
            prop_oneof![
                Just("parameter"),
                Just("input"),
                Just("output"),
                Just("local"),
                Just("calculatedParameter"),
                Just("independent"),
            ],
            proptest::option::of("[0-9a-z.]{1,4}"),
        )
            .prop_map(|(name, causality, start)| RawVariable {
                name,
                causality: causality.to_owned(),
                unit: String::new(),
                value_type: "Real".to_owned(),
                start,
                description: None,
            })
    }

    proptest! {
        #[test]
        fn partition_matches_causality(vars in proptest::collection::vec(arb_raw(), 0..24)) {
            let catalog = Catalog::build(&vars);

            // every classified name lands in exactly one bucket
            for var in catalog.iter() {
                let buckets = Role::ALL
                    .iter()
                    .filter(|role| catalog.all_in(**role).iter().any(|v| v.name == var.name))
                    .count();
                prop_assert_eq!(1, buckets);
            }

            // the last classified declaration of a name decides its role
            let mut expected: HashMap<&str, Role> = HashMap::new();
            for raw in vars.iter() {
                if let Some(role) = Role::from_causality(&raw.causality) {
                    expected.insert(raw.name.as_str(), role);
                }
            }
            prop_assert_eq!(expected.len(), catalog.len());
            for raw in vars.iter() {
                prop_assert_eq!(expected.get(raw.name.as_str()).copied(), catalog.category_of(&raw.name));
            }

            // listings follow first ingestion order with no repeats
            let mut first_seen: Vec<&str> = vec![];
            for raw in vars.iter() {
                let classified = Role::from_causality(&raw.causality).is_some();
                if classified && !first_seen.contains(&raw.name.as_str()) {
                    first_seen.push(raw.name.as_str());
                }
            }
            let listed: Vec<&str> = catalog.iter().map(|v| v.name.as_str()).collect();
            prop_assert_eq!(first_seen, listed);
        }

        #[test]
        fn text_filter_idempotent(names in proptest::collection::vec("[a-zA-Z]{0,6}", 0..16), query in "[a-zA-Z]{0,3}") {
            let once = text_filter(&names, &query);
            let twice = text_filter(&once, &query);
            prop_assert_eq!(&once, &twice);

            let all = text_filter(&names, "");
            let expected: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
            prop_assert_eq!(expected, all);
        }
    }
}
