//! Top-K selection over scores
//!
//! Ranking a score table by full sort is O(N log N); a bounded heap keeps
//! only the K best entries and runs in O(N log K).

use crate::Error;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Sort order for Top-K selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order (smallest K values)
    Ascending,
    /// Descending order (largest K values)
    #[default]
    Descending,
}

/// Select the indices of the top `k` scores, best first.
///
/// NaN compares equal to everything, so its placement is unspecified.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if `k` is zero.
///
/// # Examples
///
/// ```rust
/// use trainlog::topk::{select_top_k, SortOrder};
///
/// let scores = [1.0, 5.0, 3.0, 9.0, 2.0];
/// assert_eq!(select_top_k(&scores, 3, SortOrder::Descending)?, vec![3, 1, 2]);
/// assert_eq!(select_top_k(&scores, 2, SortOrder::Ascending)?, vec![0, 4]);
/// # Ok::<(), trainlog::Error>(())
/// ```
pub fn select_top_k(scores: &[f64], k: usize, order: SortOrder) -> crate::Result<Vec<usize>> {
    if k == 0 {
        return Err(Error::InvalidInput("k must be greater than 0".to_string()));
    }

    match order {
        SortOrder::Descending => {
            let mut heap: BinaryHeap<MinHeapItem> = BinaryHeap::with_capacity(k);
            for (index, &value) in scores.iter().enumerate() {
                if heap.len() < k {
                    heap.push(MinHeapItem { value, index });
                } else if let Some(top) = heap.peek() {
                    if value > top.value {
                        heap.pop();
                        heap.push(MinHeapItem { value, index });
                    }
                }
            }
            let mut result: Vec<_> = heap.into_vec();
            result.sort_by(|a, b| {
                b.value
                    .partial_cmp(&a.value)
                    .unwrap_or(Ordering::Equal)
                    .then(a.index.cmp(&b.index))
            });
            Ok(result.into_iter().map(|item| item.index).collect())
        }
        SortOrder::Ascending => {
            let mut heap: BinaryHeap<MaxHeapItem> = BinaryHeap::with_capacity(k);
            for (index, &value) in scores.iter().enumerate() {
                if heap.len() < k {
                    heap.push(MaxHeapItem { value, index });
                } else if let Some(top) = heap.peek() {
                    if value < top.value {
                        heap.pop();
                        heap.push(MaxHeapItem { value, index });
                    }
                }
            }
            let mut result: Vec<_> = heap.into_vec();
            result.sort_by(|a, b| {
                a.value
                    .partial_cmp(&b.value)
                    .unwrap_or(Ordering::Equal)
                    .then(a.index.cmp(&b.index))
            });
            Ok(result.into_iter().map(|item| item.index).collect())
        }
    }
}

// Heap item for descending order (min-heap: keep smallest at top, so we can find largest K)
#[derive(Debug)]
struct MinHeapItem {
    value: f64,
    index: usize,
}

impl PartialEq for MinHeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.value.partial_cmp(&other.value) == Some(Ordering::Equal)
    }
}

impl Eq for MinHeapItem {}

impl Ord for MinHeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison for min-heap (smallest at top)
        other
            .value
            .partial_cmp(&self.value)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for MinHeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Heap item for ascending order (max-heap: keep largest at top, so we can find smallest K)
#[derive(Debug)]
struct MaxHeapItem {
    value: f64,
    index: usize,
}

impl PartialEq for MaxHeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.value.partial_cmp(&other.value) == Some(Ordering::Equal)
    }
}

impl Eq for MaxHeapItem {}

impl Ord for MaxHeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for MaxHeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
