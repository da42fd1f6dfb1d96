use std::slice;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier stored in a token whose entry has been removed. Never assigned
/// to a live entry; the identifier counter reindexes before reaching it.
const TOMBSTONE: u64 = u64::MAX;

/// An opaque handle to one entry of a [`Bag`].
///
/// The token is returned by [`Bag::insert`] and owned by the caller; handing
/// it to [`Bag::remove`] removes the entry and permanently invalidates the
/// token. Removing with an invalidated token is a no-op.
///
/// Cloning a token does not duplicate the entry - all clones refer to the same
/// entry and the first removal wins.
#[derive(Clone, Debug)]
pub struct RemovalToken {
    // Shared with the bag entry so a reindex can rewrite the identifier of a
    // live token in place.
    identifier: Arc<AtomicU64>,
}

impl RemovalToken {
    fn new(identifier: u64) -> Self {
        Self {
            identifier: Arc::new(AtomicU64::new(identifier)),
        }
    }

    fn identifier(&self) -> u64 {
        self.identifier.load(Ordering::Relaxed)
    }

    fn reassign(&self, identifier: u64) {
        self.identifier.store(identifier, Ordering::Relaxed);
    }

    fn invalidate(&self) {
        self.reassign(TOMBSTONE);
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: T,

    /// Copy of the token's current identifier, compared during removal scans.
    identifier: u64,

    /// The caller-held token, kept so a reindex can update it in place and so
    /// mass teardown can invalidate it.
    token: RemovalToken,
}

/// An insertion-ordered, non-unique collection with token-based removal.
///
/// Insertion appends and returns a [`RemovalToken`] in amortized O(1).
/// Removal scans from the most recently inserted entry backward, so removing
/// entries in roughly reverse insertion order - the common pattern when
/// short-lived subscribers leave first - costs amortized O(1), with an O(len)
/// worst case.
///
/// Iteration yields the live entries in insertion order and is restartable.
///
/// The bag performs no internal locking; wrap it in a lock to share it across
/// threads.
#[derive(Debug)]
pub struct Bag<T> {
    entries: Vec<Entry<T>>,

    /// Next identifier to assign. Monotonically increasing until a reindex
    /// compacts the identifier space.
    next_identifier: u64,
}

impl<T> Bag<T> {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_identifier: 0,
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `value` and returns the token that removes it.
    pub fn insert(&mut self, value: T) -> RemovalToken {
        if self.next_identifier == TOMBSTONE {
            self.reindex();
        }

        let identifier = self.next_identifier;

        // Cannot overflow: reindex above compacts to at most `len`, and a Vec
        // of more than TOMBSTONE entries is not representable.
        self.next_identifier += 1;

        let token = RemovalToken::new(identifier);

        self.entries.push(Entry {
            value,
            identifier,
            token: token.clone(),
        });

        token
    }

    /// Removes the entry identified by `token`, invalidating the token.
    /// Returns whether an entry was removed.
    ///
    /// A token that was already used for removal (or that was invalidated by
    /// [`clear`][Self::clear]) identifies nothing; the call is a no-op and
    /// returns `false`.
    pub fn remove(&mut self, token: &RemovalToken) -> bool {
        let identifier = token.identifier();

        if identifier == TOMBSTONE {
            return false;
        }

        // Recent insertions are the most likely removals, so scan backward.
        match self
            .entries
            .iter()
            .rposition(|entry| entry.identifier == identifier)
        {
            Some(index) => {
                self.entries.remove(index);
                token.invalidate();
                true
            }
            None => false,
        }
    }

    /// Removes every entry, invalidating all outstanding tokens.
    pub fn clear(&mut self) {
        for entry in self.entries.drain(..) {
            entry.token.invalidate();
        }
    }

    /// Removes every entry, invalidating all outstanding tokens, and returns
    /// the values in insertion order.
    pub fn drain(&mut self) -> Vec<T> {
        self.entries
            .drain(..)
            .map(|entry| {
                entry.token.invalidate();
                entry.value
            })
            .collect()
    }

    /// Iterates over the live values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.value)
    }

    /// Reassigns dense identifiers `0..len` to the current entries in order,
    /// updating each live token in place.
    ///
    /// Triggered when the identifier counter would otherwise reach the
    /// reserved tombstone value. Iteration order and token validity are
    /// unchanged; only the identifiers move.
    fn reindex(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let identifier = index as u64;
            entry.identifier = identifier;
            entry.token.reassign(identifier);
        }

        self.next_identifier = self.entries.len() as u64;
    }

    #[cfg(test)]
    fn with_next_identifier(next_identifier: u64) -> Self {
        Self {
            entries: Vec::new(),
            next_identifier,
        }
    }
}

impl<T> Default for Bag<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'b, T> IntoIterator for &'b Bag<T> {
    type Item = &'b T;
    type IntoIter = Iter<'b, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.entries.iter(),
        }
    }
}

/// Iterator over the live values of a [`Bag`], in insertion order.
#[derive(Debug)]
pub struct Iter<'b, T> {
    inner: slice::Iter<'b, Entry<T>>,
}

impl<'b, T> Iterator for Iter<'b, T> {
    type Item = &'b T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| &entry.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
