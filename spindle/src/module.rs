//! Optional module-host collaborator.

use std::sync::Arc;

use crate::loader::Loader;

/// Module-aware deployments expose their service scope through this
/// capability.
///
/// `None` is the first-class "no module host in this deployment" outcome;
/// the finder handles it silently rather than as an error.
pub trait ModuleSystem: Send + Sync {
    /// The loader for the host's service modules, when the host is present.
    fn service_loader(&self) -> Option<Arc<dyn Loader>>;
}
