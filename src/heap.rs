//! Max-heap of descriptors.
//!
//! The watcher only needs two things from the set of open descriptors: the
//! largest one (to size a `select(2)` call) and the ability to drop an
//! arbitrary one when a pin goes away. Pin counts are small, so removal is a
//! linear scan followed by a normal heap fix-up.

/// Binary max-heap over descriptor-like values.
#[derive(Debug, Clone)]
pub struct FdHeap<T> {
    items: Vec<T>,
}

impl<T> Default for FdHeap<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Ord + Copy> FdHeap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Largest value in the heap.
    pub fn max(&self) -> Option<T> {
        self.items.first().copied()
    }

    pub fn push(&mut self, value: T) {
        self.items.push(value);
        self.sift_up(self.items.len() - 1);
    }

    pub fn pop_max(&mut self) -> Option<T> {
        self.remove_at(0)
    }

    /// Remove one occurrence of `value`, returning whether it was present.
    pub fn remove(&mut self, value: T) -> bool {
        match self.items.iter().position(|it| *it == value) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.items.contains(&value)
    }

    /// Heap contents in arbitrary (storage) order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().copied()
    }

    /// Heap contents, largest first.
    pub fn descending(&self) -> Vec<T> {
        let mut out = self.items.clone();
        out.sort_unstable_by(|a, b| b.cmp(a));
        out
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }

        let removed = self.items.swap_remove(index);

        if index < self.items.len() {
            // The element moved into `index` may belong above or below it.
            let index = self.sift_up(index);
            self.sift_down(index);
        }

        Some(removed)
    }

    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;

            if self.items[index] <= self.items[parent] {
                break;
            }

            self.items.swap(index, parent);
            index = parent;
        }

        index
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();

        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;

            if left < len && self.items[left] > self.items[largest] {
                largest = left;
            }

            if right < len && self.items[right] > self.items[largest] {
                largest = right;
            }

            if largest == index {
                return;
            }

            self.items.swap(index, largest);
            index = largest;
        }
    }
}

impl<T: Ord + Copy> FromIterator<T> for FdHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut heap = FdHeap::new();

        for it in iter {
            heap.push(it);
        }

        heap
    }
}
