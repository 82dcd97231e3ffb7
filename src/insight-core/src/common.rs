// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError,      // will never be produced
    DoesNotExist, // the file on disk doesn't exist
    ArchiveRead,
    MissingModelDescription,
    XmlDeserialization,
    UnsupportedFmiVersion,
    DuplicateVariable,
    NotFound, // the named variable isn't in the catalog
    WrongRole,
    NoModelLoaded,
    BadMetricBounds,
    BadParameterRange,
    BadDoeSettings,
    Generic,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            DoesNotExist => "does_not_exist",
            ArchiveRead => "archive_read",
            MissingModelDescription => "missing_model_description",
            XmlDeserialization => "xml_deserialization",
            UnsupportedFmiVersion => "unsupported_fmi_version",
            DuplicateVariable => "duplicate_variable",
            NotFound => "not_found",
            WrongRole => "wrong_role",
            NoModelLoaded => "no_model_loaded",
            BadMetricBounds => "bad_metric_bounds",
            BadParameterRange => "bad_parameter_range",
            BadDoeSettings => "bad_doe_settings",
            Generic => "generic",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading or parsing a model archive failed. No catalog was produced.
    ModelLoad,
    Catalog,
    Study,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }

    pub fn is_model_load(&self) -> bool {
        self.kind == ErrorKind::ModelLoad
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::ModelLoad => "ModelLoadError",
            ErrorKind::Catalog => "CatalogError",
            ErrorKind::Study => "StudyError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! load_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::ModelLoad, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::ModelLoad, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! catalog_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Catalog, ErrorCode::$code, Some($str)))
    }};
}

#[macro_export]
macro_rules! study_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Study, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Study, ErrorCode::$code, None))
    }};
}

/// Formats a float the way a float literal reads back: integral values keep
/// a trailing `.0`, and values below 1e-4 or at/above 1e16 switch to
/// exponent notation with a signed, two-digit exponent (`1e-06`, `2.5e+16`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_owned();
    }

    let magnitude = value.abs();
    if value != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let exp_form = format!("{value:e}");
        let (mantissa, exponent) = match exp_form.split_once('e') {
            Some(parts) => parts,
            None => return exp_form,
        };
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }

    let mut s = format!("{value}");
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

#[test]
fn test_format_float() {
    assert_eq!("4.0", format_float(4.0));
    assert_eq!("0.8", format_float(0.8));
    assert_eq!("0.008", format_float(0.008));
    assert_eq!("1e-06", format_float(1e-6));
    assert_eq!("-2.5e-07", format_float(-2.5e-7));
    assert_eq!("1e+16", format_float(1e16));
    assert_eq!("123456.0", format_float(123456.0));
    assert_eq!("0.0001", format_float(1e-4));
    assert_eq!("0.0", format_float(0.0));
    assert_eq!("-3.0", format_float(-3.0));
    assert_eq!("inf", format_float(f64::INFINITY));
    assert_eq!("nan", format_float(f64::NAN));
}

#[test]
fn test_error_display() {
    let err = Error::new(
        ErrorKind::ModelLoad,
        ErrorCode::MissingModelDescription,
        Some("model.fmu".to_owned()),
    );
    assert_eq!(
        "ModelLoadError{missing_model_description: model.fmu}",
        err.to_string()
    );
    assert!(err.is_model_load());

    let err = Error::new(ErrorKind::Study, ErrorCode::NoModelLoaded, None);
    assert_eq!("StudyError{no_model_loaded}", err.to_string());
    assert!(!err.is_model_load());
}
