// Copyright 2025 The FMU Insight Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use insight_core::load_err;
use insight_engine::{Catalog, ModelDescription, Result, model_description_from_reader, model_info};

const MODEL_DESCRIPTION: &str = "modelDescription.xml";
const SHARED_LIBRARY_EXTENSIONS: [&str; 3] = [".dll", ".so", ".dylib"];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reject models that declare the same variable name twice instead of
    /// keeping the last declaration.
    pub strict: bool,
}

/// An opened FMU: its parsed model description and the platforms it ships
/// code for.
#[derive(Clone, Debug)]
pub struct Fmu {
    pub path: PathBuf,
    pub model_description: ModelDescription,
    pub platforms: Vec<String>,
}

impl Fmu {
    pub fn build_catalog(&self, options: LoadOptions) -> Result<Catalog> {
        let raw = self.model_description.raw_variables();
        if options.strict {
            Catalog::build_strict(&raw)
        } else {
            Ok(Catalog::build(&raw))
        }
    }

    pub fn info(&self) -> String {
        model_info(&self.model_description, &self.platforms)
    }
}

pub fn open_fmu<P: AsRef<Path>>(path: P) -> Result<Fmu> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return load_err!(DoesNotExist, path.display().to_string());
        }
        Err(err) => {
            return load_err!(ArchiveRead, format!("{}: {}", path.display(), err));
        }
    };

    let (model_description, platforms) = read_archive(BufReader::new(file))
        .map_err(|err| with_path(err, path))?;

    debug!(
        path = %path.display(),
        model = %model_description.model_name,
        fmi_version = %model_description.fmi_version,
        platforms = ?platforms,
        "opened FMU"
    );

    Ok(Fmu {
        path: path.to_owned(),
        model_description,
        platforms,
    })
}

/// Parses a bare `modelDescription.xml` stream.
pub fn open_model_description(reader: &mut dyn BufRead) -> Result<ModelDescription> {
    model_description_from_reader(reader)
}

fn read_archive<R: Read + Seek>(reader: R) -> Result<(ModelDescription, Vec<String>)> {
    let mut archive = match ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(err) => return load_err!(ArchiveRead, err.to_string()),
    };

    let platforms = detect_platforms(archive.file_names());

    let entry = match archive.by_name(MODEL_DESCRIPTION) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return load_err!(MissingModelDescription),
        Err(err) => return load_err!(ArchiveRead, err.to_string()),
    };
    let mut reader = BufReader::new(entry);
    let model_description = open_model_description(&mut reader)?;

    Ok((model_description, platforms))
}

fn with_path(mut err: insight_engine::Error, path: &Path) -> insight_engine::Error {
    let details = match err.details.take() {
        Some(details) => format!("{}: {}", path.display(), details),
        None => path.display().to_string(),
    };
    err.details = Some(details);
    err
}

/// `c-code` when the archive carries C sources, followed by every
/// `binaries/<platform>/` directory that holds a shared library, in sorted
/// order.
fn detect_platforms<'a, I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut has_sources = false;
    let mut binaries: BTreeSet<String> = BTreeSet::new();

    for entry in entries {
        if let Some(rest) = entry.strip_prefix("sources/") {
            if rest.ends_with(".c") {
                has_sources = true;
            }
        } else if let Some(rest) = entry.strip_prefix("binaries/") {
            let Some((platform, file)) = rest.split_once('/') else {
                continue;
            };
            if platform.is_empty() {
                continue;
            }
            if SHARED_LIBRARY_EXTENSIONS.iter().any(|ext| file.ends_with(ext)) {
                binaries.insert(platform.to_owned());
            }
        }
    }

    let mut platforms = Vec::with_capacity(binaries.len() + 1);
    if has_sources {
        platforms.push("c-code".to_owned());
    }
    platforms.extend(binaries);
    platforms
}
