//! Indexed binary min-heap
//!
//! Items are dense `usize` ids (vertex slots). A side table maps each id to
//! its current heap position, which is what makes `decrease_key` O(log n)
//! instead of a linear remove-and-reinsert. Identity is the id alone; the
//! key is mutable state attached to it.

#[derive(Debug, Clone, Copy)]
struct Entry<K> {
    item: usize,
    key: K,
}

#[derive(Debug, Clone)]
pub struct IndexedMinHeap<K> {
    data: Vec<Entry<K>>,
    positions: Vec<Option<usize>>,
}

impl<K: Ord + Copy> IndexedMinHeap<K> {
    /// Heap able to track ids in `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, item: usize) -> bool {
        self.positions.get(item).is_some_and(|p| p.is_some())
    }

    /// Current key of a queued item.
    pub fn key(&self, item: usize) -> Option<K> {
        let pos = (*self.positions.get(item)?)?;
        Some(self.data[pos].key)
    }

    /// Insert `item`. Returns false (and changes nothing) if it is already
    /// queued or out of range.
    pub fn push(&mut self, item: usize, key: K) -> bool {
        if item >= self.positions.len() || self.contains(item) {
            return false;
        }
        self.data.push(Entry { item, key });
        let idx = self.data.len() - 1;
        self.positions[item] = Some(idx);
        self.sift_up(idx);
        true
    }

    /// Remove and return the entry with the smallest key.
    pub fn pop(&mut self) -> Option<(usize, K)> {
        if self.data.is_empty() {
            return None;
        }
        let last = self.data.len() - 1;
        self.swap(0, last);
        let top = self.data.pop()?;
        self.positions[top.item] = None;
        if !self.data.is_empty() {
            self.sift_down(0);
        }
        Some((top.item, top.key))
    }

    /// Lower the key of a queued item. Returns false if the item is not
    /// queued or `key` is not strictly smaller than its current key.
    pub fn decrease_key(&mut self, item: usize, key: K) -> bool {
        let Some(pos) = self.positions.get(item).copied().flatten() else {
            return false;
        };
        if key >= self.data[pos].key {
            return false;
        }
        self.data[pos].key = key;
        self.sift_up(pos);
        true
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.data[idx].key >= self.data[parent].key {
                break;
            }
            self.swap(idx, parent);
            idx = parent;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.data.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.data[left].key < self.data[smallest].key {
                smallest = left;
            }
            if right < len && self.data[right].key < self.data[smallest].key {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap(idx, smallest);
            idx = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
        self.positions[self.data[a].item] = Some(a);
        self.positions[self.data[b].item] = Some(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_in_key_order() {
        let mut heap = IndexedMinHeap::with_capacity(6);
        for (item, key) in [(0, 50), (1, 10), (2, 40), (3, 30), (4, 20), (5, 60)] {
            assert!(heap.push(item, key));
        }

        let mut keys = Vec::new();
        while let Some((_, key)) = heap.pop() {
            keys.push(key);
        }
        assert_eq!(keys, vec![10, 20, 30, 40, 50, 60]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_decrease_key_reorders() {
        let mut heap = IndexedMinHeap::with_capacity(4);
        heap.push(0, 5);
        heap.push(1, 9);
        heap.push(2, 7);

        assert!(heap.decrease_key(1, 1));
        assert_eq!(heap.key(1), Some(1));
        assert_eq!(heap.pop(), Some((1, 1)));
        assert_eq!(heap.pop(), Some((0, 5)));
    }

    #[test]
    fn test_decrease_key_rejects_increase_and_unknown_items() {
        let mut heap = IndexedMinHeap::with_capacity(3);
        heap.push(0, 5);

        assert!(!heap.decrease_key(0, 8));
        assert!(!heap.decrease_key(0, 5));
        assert!(!heap.decrease_key(2, 1));
        assert!(!heap.decrease_key(99, 1));
        assert_eq!(heap.key(0), Some(5));
    }

    #[test]
    fn test_identity_is_the_item() {
        let mut heap = IndexedMinHeap::with_capacity(2);
        assert!(heap.push(1, 3));
        assert!(!heap.push(1, 0));
        assert_eq!(heap.len(), 1);

        assert_eq!(heap.pop(), Some((1, 3)));
        assert!(!heap.contains(1));
        assert!(heap.push(1, 0));
    }

    #[test]
    fn test_positions_track_after_many_operations() {
        let n = 64;
        let mut heap = IndexedMinHeap::with_capacity(n);
        for item in 0..n {
            heap.push(item, (item as i64 * 37) % 101);
        }
        for item in (0..n).step_by(3) {
            heap.decrease_key(item, -(item as i64));
        }

        let mut last = i64::MIN;
        let mut seen = 0;
        while let Some((item, key)) = heap.pop() {
            assert!(key >= last);
            assert!(!heap.contains(item));
            last = key;
            seen += 1;
        }
        assert_eq!(seen, n);
    }
}
