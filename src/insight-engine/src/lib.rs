// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

#[macro_use]
extern crate insight_core;

pub mod catalog;
pub mod common;
pub mod info;
pub mod model_description;
pub mod study;

pub use insight_core::datamodel;

pub use self::catalog::{Catalog, CatalogSearch, DESCRIBE_PLACEHOLDER, text_filter};
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::datamodel::{DefaultValue, RawVariable, Role, Variable, VariableKind};
pub use self::info::model_info;
pub use self::model_description::{
    ModelDescription, model_description_from_reader, model_description_from_str,
};
pub use self::study::{
    Distribution, DoeMethod, DoeSettings, MetricSpec, Objective, ParameterSpec, Statistic, Study,
};
