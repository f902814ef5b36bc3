//! # Spindle
//!
//! Resolve one concrete provider of an abstract service at runtime. An
//! API-abstraction crate names a **factory id** (e.g. `"client.builder"`) and
//! a service type; Spindle walks a fixed, ordered chain of discovery
//! strategies — ambient registry, defining registry, installation file,
//! process configuration, module resource, caller fallback — and returns the
//! first provider that resolves.
//!
//! ## Design principles
//!
//! - **First success wins**: the chain halts at the first strategy that
//!   yields an instance; at most one instance per call.
//! - **Failure is abstention**: a broken or absent strategy never aborts the
//!   search. Only exhaustion with no fallback fails — and, deliberately, an
//!   implementation named by *explicit* configuration that does not resolve
//!   is surfaced rather than masked.
//! - **Capabilities, not globals**: ambient state (process configuration,
//!   the thread's context loader, an optional module host) is consumed
//!   through small injected traits, so tests swap in fakes and stay
//!   deterministic.
//! - **Fresh on every call**: no caching of resolved instances; callers own
//!   the instance and any memoization.
//!
//! ## Main modules
//!
//! - [`finder`]: [`Finder`] and the free [`find`] entry point — the ordered
//!   strategy chain.
//! - [`loader`]: [`Loader`] resolution scopes — [`StaticLoader`] (in-memory,
//!   incl. the process-wide [`defining_loader`]) and [`DirLoader`]
//!   (deployment directory).
//! - [`context`]: the thread-ambient context loader.
//! - [`config`]: [`ConfigSource`] capability, [`ProcessEnv`], [`MapSource`].
//! - [`module`]: optional [`ModuleSystem`] collaborator.
//! - [`error`]: [`FindError`] — `NotFound` or `Instantiation`, nothing else.
//!
//! ## Quick start
//!
//! ```rust
//! use spindle::{defining_loader, Finder};
//!
//! trait Greeter: Send {
//!     fn greet(&self) -> String;
//! }
//!
//! struct ConsoleGreeter;
//! impl Greeter for ConsoleGreeter {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! // An implementation crate registers itself at startup.
//! defining_loader().provide::<dyn Greeter, _>(|| Box::new(ConsoleGreeter));
//!
//! // The abstraction layer resolves by factory id, never naming the
//! // implementation at compile time.
//! let greeter = Finder::new()
//!     .find::<dyn Greeter>("greeter.factory", None)
//!     .unwrap();
//! assert_eq!(greeter.greet(), "hello");
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod finder;
mod instantiate;
pub mod loader;
pub mod module;

pub use config::{ConfigError, ConfigSource, MapSource, ProcessEnv, DEFAULT_HOME_KEY};
pub use context::{current_context_loader, set_context_loader, with_context_loader};
pub use error::{ConstructorError, FindError};
pub use finder::{find, Finder, DEFAULT_INSTALL_FILE};
pub use loader::{
    defining_loader, AnyInstance, Constructor, DirLoader, Loader, LoaderError, ServiceKey,
    StaticLoader, SERVICES_DIR,
};
pub use module::ModuleSystem;
