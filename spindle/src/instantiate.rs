//! By-name instantiation with the two-attempt loader policy.

use std::sync::Arc;

use thiserror::Error;

use crate::error::FindError;
use crate::loader::{AnyInstance, Constructor, Loader};

#[derive(Error, Debug)]
#[error("constructed instance is not a {expected}")]
struct ServiceTypeMismatch {
    expected: &'static str,
}

/// Resolve `type_name` against `primary` (when given), retrying in `default`,
/// then construct an instance.
///
/// The two attempts are ordered and both are tried before giving up:
/// deployments with mismatched packaging scopes rely on a name invisible to
/// the caller's loader still resolving in the defining scope. A miss in both
/// scopes is [`FindError::NotFound`]; a failing constructor is
/// [`FindError::Instantiation`] and is always surfaced.
pub(crate) fn instantiate(
    type_name: &str,
    primary: Option<&Arc<dyn Loader>>,
    default: &Arc<dyn Loader>,
) -> Result<AnyInstance, FindError> {
    let ctor = lookup(type_name, primary, default)
        .ok_or_else(|| FindError::NotFound(type_name.to_string()))?;
    ctor().map_err(|source| FindError::Instantiation {
        type_name: type_name.to_string(),
        source,
    })
}

fn lookup(
    type_name: &str,
    primary: Option<&Arc<dyn Loader>>,
    default: &Arc<dyn Loader>,
) -> Option<Constructor> {
    if let Some(loader) = primary {
        if let Some(ctor) = loader.constructor(type_name) {
            return Some(ctor);
        }
        tracing::debug!(
            "type {} not visible to loader {}, retrying with loader {}",
            type_name,
            loader.name(),
            default.name()
        );
    }
    default.constructor(type_name)
}

/// Unwrap a located instance into the requested service type.
pub(crate) fn downcast<S: ?Sized + Send + 'static>(
    instance: AnyInstance,
) -> Result<Box<S>, FindError> {
    instance
        .downcast::<Box<S>>()
        .map(|boxed| *boxed)
        .map_err(|_| FindError::Instantiation {
            type_name: std::any::type_name::<S>().to_string(),
            source: Box::new(ServiceTypeMismatch {
                expected: std::any::type_name::<S>(),
            }),
        })
}
