//! Directory-backed loader: registrations and resources read from disk.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::error::ConstructorError;

use super::scope::{erase, Constructor, Loader, LoaderError, ServiceKey};
use super::SERVICES_DIR;

/// Loader rooted at a deployment directory.
///
/// Registrations are line-oriented text files at
/// `<root>/services/<service-type-name>`, one implementation name per line
/// (`#` comments and blank lines skipped). Names resolve against this
/// loader's own constructor table, so a file entry naming a type never
/// defined here surfaces as a dangling registration. `resource(path)` reads
/// `<root>/<path>`.
pub struct DirLoader {
    name: String,
    root: PathBuf,
    constructors: DashMap<String, Constructor>,
}

impl DirLoader {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            constructors: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register the named constructor for an implementation of `S`.
    pub fn define<S, F>(&self, type_name: impl Into<String>, ctor: F)
    where
        S: ?Sized + Send + 'static,
        F: Fn() -> Box<S> + Send + Sync + 'static,
    {
        self.define_fallible::<S, _>(type_name, move || Ok(ctor()));
    }

    /// Register a named constructor whose construction may fail.
    pub fn define_fallible<S, F>(&self, type_name: impl Into<String>, ctor: F)
    where
        S: ?Sized + Send + 'static,
        F: Fn() -> Result<Box<S>, ConstructorError> + Send + Sync + 'static,
    {
        self.constructors.insert(type_name.into(), erase(ctor));
    }

    fn read(&self, path: &Path) -> Result<Option<String>, LoaderError> {
        if !path.is_file() {
            return Ok(None);
        }
        std::fs::read_to_string(path)
            .map(Some)
            .map_err(|source| LoaderError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Loader for DirLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn providers(&self, service: &ServiceKey) -> Result<Vec<Constructor>, LoaderError> {
        let path = self.root.join(SERVICES_DIR).join(service.type_name());
        let Some(content) = self.read(&path)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.constructor(line) {
                Some(ctor) => out.push(ctor),
                None => {
                    return Err(LoaderError::DanglingRegistration {
                        service: service.type_name().to_string(),
                        type_name: line.to_string(),
                    })
                }
            }
        }
        Ok(out)
    }

    fn constructor(&self, type_name: &str) -> Option<Constructor> {
        self.constructors.get(type_name).map(|c| c.value().clone())
    }

    fn resource(&self, path: &str) -> Result<Option<String>, LoaderError> {
        self.read(&self.root.join(path))
    }
}
