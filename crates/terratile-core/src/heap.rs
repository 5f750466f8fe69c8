use std::cmp::Ordering;

/// Identifies one entry stored in a [`Heap`].
///
/// Handles stay valid for the lifetime of the heap, even after the entry has been removed from the queue with
/// [`Heap::remove_first`]. This lets callers keep links between entries (like parent pointers in a search tree) without
/// owning them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EntryId(usize);

impl EntryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A value that remembers its own slot in a [`Heap`].
pub trait HeapEntry {
    /// The slot this entry currently occupies in the heap order, or `None` if it is not queued.
    fn heap_index(&self) -> Option<usize>;

    fn set_heap_index(&mut self, index: Option<usize>);

    /// [`Ordering::Greater`] means `self` leaves the heap before `other`.
    fn compare_priority(&self, other: &Self) -> Ordering;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum HeapError {
    #[error("heap capacity of {capacity} entries exceeded")]
    CapacityExceeded { capacity: usize },
}

/// A fixed-capacity binary heap with intrusive slot indices.
///
/// Entries are stored in an append-only arena and the heap order is kept as a separate array of [`EntryId`]s.
/// Every queued entry records its own slot through [`HeapEntry::set_heap_index`], so [`Heap::update_item`] can
/// re-sift in `O(log n)` and [`Heap::contains`] is `O(1)` without a secondary index.
///
/// The capacity bounds the number of distinct entries ever added. Exceeding it is an error instead of an
/// out-of-bounds write.
pub struct Heap<T> {
    entries: Vec<T>,
    order: Vec<EntryId>,
    capacity: usize,
}

impl<T: HeapEntry> Heap<T> {
    const MAX_PREALLOCATED: usize = 4096;

    pub fn with_capacity(capacity: usize) -> Self {
        let prealloc = capacity.min(Self::MAX_PREALLOCATED);
        Self {
            entries: Vec::with_capacity(prealloc),
            order: Vec::with_capacity(prealloc),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of queued entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The number of entries ever added, queued or not.
    #[inline]
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn get(&self, id: EntryId) -> Option<&T> {
        self.entries.get(id.0)
    }

    /// Callers that change the priority of a queued entry must follow up with [`Heap::update_item`].
    #[inline]
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        self.entries.get_mut(id.0)
    }

    /// Stores `item` and queues it.
    pub fn add(&mut self, mut item: T) -> Result<EntryId, HeapError> {
        if self.entries.len() >= self.capacity {
            return Err(HeapError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let id = EntryId(self.entries.len());
        let slot = self.order.len();
        item.set_heap_index(Some(slot));
        self.entries.push(item);
        self.order.push(id);
        self.sort_up(slot);

        Ok(id)
    }

    /// Re-queues an entry that was previously removed. Does nothing if it is already queued.
    pub fn requeue(&mut self, id: EntryId) {
        if id.0 >= self.entries.len() || self.contains(id) {
            return;
        }
        let slot = self.order.len();
        self.entries[id.0].set_heap_index(Some(slot));
        self.order.push(id);
        self.sort_up(slot);
    }

    /// The highest priority entry, without dequeuing it.
    pub fn peek(&self) -> Option<EntryId> {
        self.order.first().copied()
    }

    /// Dequeues the highest priority entry. The entry itself stays accessible through its [`EntryId`].
    pub fn remove_first(&mut self) -> Option<EntryId> {
        if self.order.is_empty() {
            return None;
        }

        let first = self.order.swap_remove(0);
        self.entries[first.0].set_heap_index(None);

        if let Some(&moved) = self.order.first() {
            self.entries[moved.0].set_heap_index(Some(0));
            self.sort_down(0);
        }

        Some(first)
    }

    /// Restores the heap order after the priority of `id` changed in either direction.
    pub fn update_item(&mut self, id: EntryId) {
        if let Some(slot) = self.slot_of(id) {
            let slot = self.sort_up(slot);
            self.sort_down(slot);
        }
    }

    /// True if `id` is currently queued.
    ///
    /// The recorded slot is checked against the heap order, so a stale index can never report a false positive.
    #[inline]
    pub fn contains(&self, id: EntryId) -> bool {
        self.slot_of(id).is_some()
    }

    fn slot_of(&self, id: EntryId) -> Option<usize> {
        let slot = self.entries.get(id.0)?.heap_index()?;
        (self.order.get(slot) == Some(&id)).then(|| slot)
    }

    fn sort_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.outranks(slot, parent) {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
        slot
    }

    fn sort_down(&mut self, mut slot: usize) {
        loop {
            let left = slot * 2 + 1;
            let right = left + 1;
            if left >= self.order.len() {
                return;
            }

            let mut child = left;
            if right < self.order.len() && self.outranks(right, left) {
                child = right;
            }

            if self.outranks(child, slot) {
                self.swap(child, slot);
                slot = child;
            } else {
                return;
            }
        }
    }

    fn outranks(&self, a: usize, b: usize) -> bool {
        let entry_a = &self.entries[self.order[a].0];
        let entry_b = &self.entries[self.order[b].0];
        entry_a.compare_priority(entry_b) == Ordering::Greater
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.order.swap(a, b);
        let id_a = self.order[a];
        let id_b = self.order[b];
        self.entries[id_a.0].set_heap_index(Some(a));
        self.entries[id_b.0].set_heap_index(Some(b));
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
