//! This module contains the heap structures used by the searches: a bounded
//! max-heap of the k best candidates, and the min-heap of pending branches
//! used by best-bin-first search.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use ordered_float::OrderedFloat; // For using f64 in BinaryHeap

use super::NodeId;

/// Represents an element in the KBestNeighbors heap, pairing a squared distance with data.
#[derive(Debug)]
pub struct HeapElement<P> {
    pub distance: OrderedFloat<f64>, // Max-heap stores by squared distance
    pub data: P,
}

impl<P: Ord> PartialEq for HeapElement<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl<P: Ord> Eq for HeapElement<P> {}

impl<P: Ord> PartialOrd for HeapElement<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Ord> Ord for HeapElement<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Largest (distance, data) at the top, so the current worst is evicted
        // first. Equal distances rank by data, so the larger index goes first.
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.data.cmp(&other.data))
    }
}

/// Keeps the `capacity` items with the smallest distances seen so far.
#[derive(Debug)]
pub struct KBestNeighbors<P> {
    capacity: usize,
    heap: BinaryHeap<HeapElement<P>>,
}

impl<P: Ord> KBestNeighbors<P> {
    /// The heap grows as candidates arrive; `capacity` is only an upper bound,
    /// so callers may pass any `k`.
    pub fn new(capacity: usize) -> Self {
        KBestNeighbors {
            capacity,
            heap: BinaryHeap::new(),
        }
    }

    /// Offers a candidate. It is kept if the heap is not full or it ranks below
    /// the current worst by `(distance, data)`, so on equal distances the
    /// smaller data wins regardless of the order candidates arrive in.
    pub fn add(&mut self, distance: f64, data: P) {
        if self.capacity == 0 {
            return;
        }
        let item = HeapElement { distance: OrderedFloat(distance), data };
        if self.heap.len() < self.capacity {
            self.heap.push(item);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if item < *worst {
                *worst = item;
            }
        }
    }

    /// Distance of the worst kept candidate once the heap is full.
    pub fn current_farthest_distance(&self) -> Option<f64> {
        if self.heap.len() == self.capacity {
            self.heap.peek().map(|heap_elem| heap_elem.distance.0)
        } else {
            None
        }
    }

    /// Pruning radius: the worst kept distance, or infinity while the heap has room.
    pub fn pruning_bound(&self) -> f64 {
        self.current_farthest_distance().unwrap_or(f64::INFINITY)
    }

    /// Consumes the heap, returning `(distance, data)` pairs closest first.
    pub fn into_sorted_vec(self) -> Vec<(f64, P)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|elem| (elem.distance.0, elem.data))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Pending subtrees ordered by the lower bound on their distance to the query,
/// smallest bound first. Equal bounds pop in node id order.
#[derive(Debug, Default)]
pub struct BranchQueue {
    heap: BinaryHeap<Reverse<(OrderedFloat<f64>, NodeId)>>,
}

impl BranchQueue {
    pub fn new() -> Self {
        BranchQueue { heap: BinaryHeap::new() }
    }

    pub fn push(&mut self, node: NodeId, bound: f64) {
        self.heap.push(Reverse((OrderedFloat(bound), node)));
    }

    /// Removes the branch with the smallest bound, returning `(node, bound)`.
    pub fn pop(&mut self) -> Option<(NodeId, f64)> {
        self.heap.pop().map(|Reverse((bound, node))| (node, bound.0))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
