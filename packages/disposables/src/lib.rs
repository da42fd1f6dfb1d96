//! Composable one-shot cancellation capabilities.
//!
//! A disposable is an action that runs at most once, no matter how many times
//! or from how many threads [`Disposable::dispose`] is called. The package
//! provides the atomic building block and the compositions built on it:
//!
//! - [`AnyDisposable`] - a one-shot action behind a cloneable handle.
//! - [`CompositeDisposable`] - a group; disposing it disposes every member,
//!   and members added afterwards are disposed immediately.
//! - [`SerialDisposable`] - a rebindable slot holding at most one live inner
//!   disposable; replacing the occupant disposes the previous one.
//! - [`ScopedDisposable`] - disposes its inner disposable when dropped,
//!   tying cancellation to a scope.
//!
//! Together these let a cancellation cascade through an arbitrary tree of
//! derived work without the caller tracking every leaf.
//!
//! # Example
//!
//! ```rust
//! use disposables::{AnyDisposable, CompositeDisposable, Disposable};
//!
//! let mut group = CompositeDisposable::new();
//! group += AnyDisposable::new(|| println!("first teardown"));
//! group += AnyDisposable::new(|| println!("second teardown"));
//!
//! group.dispose();
//! assert!(group.is_disposed());
//! ```

mod any;
mod composite;
mod disposable;
mod scoped;
mod serial;

pub use any::*;
pub use composite::*;
pub use disposable::*;
pub use scoped::*;
pub use serial::*;

// A poisoned lock means a teardown action panicked mid-flight; we can no
// longer tell which resources were released.
pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - a disposal action panicked and teardown state is unknown";
