//! An insertion-ordered collection with token-based removal.
//!
//! [`Bag<T>`] is the observer-holding workhorse of the signal packages: every
//! insertion returns a [`RemovalToken`] that the caller keeps, and removal by
//! token scans from the most recent entry backward, which makes the common
//! "unsubscribe shortly after subscribing" pattern amortized constant time.
//!
//! The bag itself is not thread-safe. Callers that share it across threads
//! wrap it in a lock, typically `atomic_cell::AtomicCell<Bag<T>>`.
//!
//! # Example
//!
//! ```rust
//! use token_bag::Bag;
//!
//! let mut bag = Bag::new();
//!
//! let first = bag.insert("a");
//! let second = bag.insert("b");
//!
//! bag.remove(&second);
//!
//! assert_eq!(bag.iter().copied().collect::<Vec<_>>(), vec!["a"]);
//!
//! // Removing the same token again is a no-op.
//! bag.remove(&second);
//! bag.remove(&first);
//! assert!(bag.is_empty());
//! ```

mod bag;

pub use bag::*;
