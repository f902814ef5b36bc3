//! Loader trait and the type-erased provider plumbing it trades in.

use std::any::{Any, TypeId};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::error::ConstructorError;

/// A constructed provider instance, type-erased.
///
/// Holds a `Box<S>` for the requested service type `S`; the finder downcasts
/// back to `Box<S>` at its typed exit.
pub type AnyInstance = Box<dyn Any + Send>;

/// Zero-argument provider constructor registered with a loader.
pub type Constructor = Arc<dyn Fn() -> Result<AnyInstance, ConstructorError> + Send + Sync>;

/// Runtime identity of an abstract service type.
///
/// Built with [`ServiceKey::of`] for the service trait (or struct) being
/// resolved; carries the type name for registry file naming and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceKey {
    /// Key for service type `S`.
    pub fn of<S: ?Sized + Send + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<Box<S>>(),
            type_name: std::any::type_name::<S>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Errors from loader operations. The finder treats all of them as
/// non-fatal: a failing scope abstains, the chain proceeds.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("registration for {service} names unknown type {type_name}")]
    DanglingRegistration { service: String, type_name: String },
}

/// A place to look up named types, registered providers, and text resources.
///
/// Two scopes matter to the finder: the calling thread's ambient
/// [context loader](crate::context) and the finder's defining loader.
pub trait Loader: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Enumerate registered providers of `service`, in registration order.
    fn providers(&self, service: &ServiceKey) -> Result<Vec<Constructor>, LoaderError>;

    /// Look up the constructor registered under `type_name`.
    fn constructor(&self, type_name: &str) -> Option<Constructor>;

    /// Read a named UTF-8 text resource from this scope; `Ok(None)` when absent.
    fn resource(&self, path: &str) -> Result<Option<String>, LoaderError>;
}

/// Erase a typed constructor into the [`Constructor`] shape loaders store.
pub(crate) fn erase<S, F>(ctor: F) -> Constructor
where
    S: ?Sized + Send + 'static,
    F: Fn() -> Result<Box<S>, ConstructorError> + Send + Sync + 'static,
{
    Arc::new(move || ctor().map(|boxed| Box::new(boxed) as AnyInstance))
}
