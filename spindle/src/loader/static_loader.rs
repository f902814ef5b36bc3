//! In-memory loader: programmatic registrations, no filesystem.

use dashmap::DashMap;

use crate::error::ConstructorError;

use super::scope::{erase, Constructor, Loader, LoaderError, ServiceKey};

enum Registration {
    Direct(Constructor),
    /// Resolved against the constructor table at enumeration time; a missing
    /// name is a dangling registration the chain must tolerate.
    Named(String),
}

/// Loader backed by in-memory tables.
///
/// This is the scope implementation crates register into (see
/// [`defining_loader`](super::defining_loader)) and the natural fake for
/// tests: providers per service, named constructors, and text resources are
/// all plain concurrent maps.
pub struct StaticLoader {
    name: String,
    providers: DashMap<ServiceKey, Vec<Registration>>,
    constructors: DashMap<String, Constructor>,
    resources: DashMap<String, String>,
}

impl StaticLoader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: DashMap::new(),
            constructors: DashMap::new(),
            resources: DashMap::new(),
        }
    }

    /// Register a provider of service `S`.
    pub fn provide<S, F>(&self, ctor: F)
    where
        S: ?Sized + Send + 'static,
        F: Fn() -> Box<S> + Send + Sync + 'static,
    {
        self.provide_fallible::<S, _>(move || Ok(ctor()));
    }

    /// Register a provider of `S` whose construction may fail.
    pub fn provide_fallible<S, F>(&self, ctor: F)
    where
        S: ?Sized + Send + 'static,
        F: Fn() -> Result<Box<S>, ConstructorError> + Send + Sync + 'static,
    {
        self.providers
            .entry(ServiceKey::of::<S>())
            .or_default()
            .push(Registration::Direct(erase(ctor)));
    }

    /// Register a provider of `S` by implementation name. The name is looked
    /// up in this loader's constructor table when providers are enumerated.
    pub fn register_name<S: ?Sized + Send + 'static>(&self, type_name: impl Into<String>) {
        self.providers
            .entry(ServiceKey::of::<S>())
            .or_default()
            .push(Registration::Named(type_name.into()));
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

    /// Store a text resource under `path`.
    pub fn put_resource(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.resources.insert(path.into(), contents.into());
    }
}

impl Loader for StaticLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn providers(&self, service: &ServiceKey) -> Result<Vec<Constructor>, LoaderError> {
        let Some(entries) = self.providers.get(service) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            match entry {
                Registration::Direct(ctor) => out.push(ctor.clone()),
                Registration::Named(type_name) => match self.constructor(type_name) {
                    Some(ctor) => out.push(ctor),
                    None => {
                        return Err(LoaderError::DanglingRegistration {
                            service: service.type_name().to_string(),
                            type_name: type_name.clone(),
                        })
                    }
                },
            }
        }
        Ok(out)
    }

    fn constructor(&self, type_name: &str) -> Option<Constructor> {
        self.constructors.get(type_name).map(|c| c.value().clone())
    }

    fn resource(&self, path: &str) -> Result<Option<String>, LoaderError> {
        Ok(self.resources.get(path).map(|r| r.value().clone()))
    }
}
