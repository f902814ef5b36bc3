//! Thread-ambient context loader.
//!
//! Each thread may carry a loader representing its caller's resolution scope;
//! the finder consults it before its own defining scope. Reading the slot is
//! a scoped capability acquisition: it degrades to "no ambient loader" on any
//! access failure and never panics.

use std::cell::RefCell;
use std::sync::Arc;

use crate::loader::Loader;

thread_local! {
    static CONTEXT_LOADER: RefCell<Option<Arc<dyn Loader>>> = const { RefCell::new(None) };
}

/// Install (or clear) the calling thread's ambient loader.
pub fn set_context_loader(loader: Option<Arc<dyn Loader>>) {
    CONTEXT_LOADER.with(|slot| *slot.borrow_mut() = loader);
}

/// Run `f` with `loader` as the thread's ambient loader, restoring the
/// previous value afterwards.
pub fn with_context_loader<R>(loader: Arc<dyn Loader>, f: impl FnOnce() -> R) -> R {
    let previous = CONTEXT_LOADER.with(|slot| slot.borrow_mut().replace(loader));
    let result = f();
    CONTEXT_LOADER.with(|slot| *slot.borrow_mut() = previous);
    result
}

/// Read the calling thread's ambient loader.
///
/// An access failure (the slot is already gone during thread teardown) is
/// logged at `warn` and yields `None`.
pub fn current_context_loader() -> Option<Arc<dyn Loader>> {
    match CONTEXT_LOADER.try_with(|slot| slot.borrow().clone()) {
        Ok(loader) => loader,
        Err(err) => {
            tracing::warn!("unable to read context loader: {}", err);
            None
        }
    }
}
