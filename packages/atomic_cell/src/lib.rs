//! A mutual-exclusion guarded container for a single value.
//!
//! [`AtomicCell<T>`] protects one value behind a lock and exposes compound
//! operations (`swap`, `modify`, `with_value`, `with_mut`) that execute under a
//! single lock acquisition, so no concurrent caller can observe an
//! intermediate state.
//!
//! # Example
//!
//! ```rust
//! use atomic_cell::AtomicCell;
//!
//! let cell = AtomicCell::new(10);
//!
//! let previous = cell.swap(20);
//! assert_eq!(previous, 10);
//! assert_eq!(cell.get(), 20);
//! ```

mod cell;

pub use cell::*;

// A poisoned lock means a previous critical section panicked; the protected
// value may be mid-mutation, so continued execution is not safe.
pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - the guarded value may be in an inconsistent state";
