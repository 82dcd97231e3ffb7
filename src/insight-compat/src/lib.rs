// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub use insight_engine::{self as engine, Result};

pub mod archive;
pub mod session;

pub use self::archive::{Fmu, LoadOptions, open_fmu, open_model_description};
pub use self::session::{LoadedModel, Session};
