//! Resolution scopes: the [`Loader`] trait plus in-memory and
//! directory-backed implementations.

mod dir;
mod scope;
mod static_loader;

use std::sync::Arc;

use once_cell::sync::Lazy;

pub use dir::DirLoader;
pub use scope::{AnyInstance, Constructor, Loader, LoaderError, ServiceKey};
pub use static_loader::StaticLoader;

/// Directory under a loader's resource root that holds registration files
/// (`services/<service-type-name>`) and module resources
/// (`services/<factory-id>`).
pub const SERVICES_DIR: &str = "services";

static DEFINING: Lazy<Arc<StaticLoader>> = Lazy::new(|| Arc::new(StaticLoader::new("defining")));

/// The process-wide defining scope.
///
/// Implementation crates register their providers and named constructors here
/// at startup; it is the default defining loader of [`Finder::new`] and the
/// second attempt of every by-name instantiation.
///
/// [`Finder::new`]: crate::Finder::new
pub fn defining_loader() -> Arc<StaticLoader> {
    DEFINING.clone()
}
