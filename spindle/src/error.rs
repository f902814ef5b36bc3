//! Resolution errors surfaced to callers.

use thiserror::Error;

/// Cause type carried by failed constructors.
pub type ConstructorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by [`Finder::find`](crate::Finder::find).
///
/// Callers see a single typed failure naming the factory id or implementation
/// type; which intermediate strategies were tried is never part of the result.
#[derive(Error, Debug)]
pub enum FindError {
    /// No discovery strategy produced a provider and no fallback was supplied,
    /// or a named implementation could not be located in any loader.
    #[error("provider for {0} cannot be found")]
    NotFound(String),

    /// A named implementation was located but could not be constructed.
    /// Never swallowed: a concrete candidate was found and is broken.
    #[error("provider {type_name} could not be instantiated")]
    Instantiation {
        type_name: String,
        #[source]
        source: ConstructorError,
    },
}
