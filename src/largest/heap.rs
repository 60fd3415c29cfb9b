use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::record::Ranked;

/// Upper bound on the up-front allocation; larger capacities grow on demand.
const PREALLOC_LIMIT: usize = 4096;

/// Orders items by rank only, so the heap never needs `T: Ord`.
struct ByRank<T>(T);

impl<T: Ranked> PartialEq for ByRank<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.rank() == other.0.rank()
    }
}

impl<T: Ranked> Eq for ByRank<T> {}

impl<T: Ranked> PartialOrd for ByRank<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ranked> Ord for ByRank<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank().cmp(&other.0.rank())
    }
}

/// Keeps the `capacity` highest-ranked items seen so far.
///
/// Backed by a binary min-heap (`BinaryHeap<Reverse<_>>`) whose root is the
/// weakest retained item, so both the "is this worth keeping" test and the
/// replacement are O(log K). Memory is bounded by the capacity regardless of
/// how many items are offered.
pub struct BoundedTopK<T: Ranked> {
    heap: BinaryHeap<Reverse<ByRank<T>>>,
    capacity: usize,
}

impl<T: Ranked> BoundedTopK<T> {
    pub fn new(capacity: usize) -> Self {
        BoundedTopK {
            heap: BinaryHeap::with_capacity(capacity.min(PREALLOC_LIMIT)),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Rank of the weakest retained item.
    #[inline]
    pub fn min_rank(&self) -> Option<T::Key> {
        self.heap.peek().map(|Reverse(min)| min.0.rank())
    }

    /// Whether an item of this rank would be retained by [`insert`](Self::insert).
    /// Lets callers skip building items that would be discarded.
    #[inline]
    pub fn admits(&self, rank: T::Key) -> bool {
        if self.heap.len() < self.capacity {
            return true;
        }
        self.min_rank().is_some_and(|min| rank > min)
    }

    /// Offer an item. Below capacity it is always kept; at capacity it
    /// replaces the current minimum only if its rank is strictly greater.
    /// Returns whether the item was kept.
    pub fn insert(&mut self, item: T) -> bool {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(ByRank(item)));
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut min) if item.rank() > (min.0).0.rank() => {
                // PeekMut sifts the new root down on drop.
                *min = Reverse(ByRank(item));
                true
            }
            _ => false,
        }
    }

    /// All retained items, highest rank first.
    pub fn into_sorted_vec(self) -> Vec<T> {
        // Ascending order of Reverse<_> is descending order of rank.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(ByRank(item))| item)
            .collect()
    }
}
