use std::cmp::Ordering;
use std::time::{Duration, Instant};

use disposables::AnyDisposable;

use crate::{Action, RecurringAction};

/// What a scheduled job does when it comes due.
pub(crate) enum Work {
    /// Runs once and is gone.
    Once(Action),

    /// Runs, then reschedules itself at `date + interval`.
    Recurring {
        interval: Duration,
        /// Wakeup tolerance; an occurrence may fire up to this much early.
        leeway: Duration,
        action: RecurringAction,
    },
}

/// One pending entry in a deadline-ordered queue.
///
/// Ordered so that a max-heap pops the earliest date first, with ties broken
/// by submission order.
pub(crate) struct Job {
    pub(crate) date: Instant,

    /// Submission counter; preserves order between jobs with equal dates.
    pub(crate) seq: u64,

    pub(crate) work: Work,

    /// Checked before execution and before rescheduling; disposing it
    /// suppresses the job and all future occurrences.
    pub(crate) cancel: AnyDisposable,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.seq == other.seq
    }
}

impl Eq for Job {}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: the greatest job is the one with the earliest date, so
        // `BinaryHeap::pop` yields jobs in chronological order.
        other
            .date
            .cmp(&self.date)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    fn job(date: Instant, seq: u64) -> Job {
        Job {
            date,
            seq,
            work: Work::Once(Box::new(|| {})),
            cancel: AnyDisposable::empty(),
        }
    }

    #[test]
    fn heap_pops_earliest_date_first() {
        let base = Instant::now();
        let mut heap = BinaryHeap::new();

        heap.push(job(base + Duration::from_secs(3), 0));
        heap.push(job(base + Duration::from_secs(1), 1));
        heap.push(job(base + Duration::from_secs(2), 2));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|j| j.seq).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn equal_dates_pop_in_submission_order() {
        let date = Instant::now();
        let mut heap = BinaryHeap::new();

        for seq in 0..5 {
            heap.push(job(date, seq));
        }

        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|j| j.seq).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
