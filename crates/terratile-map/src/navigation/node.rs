use crate::TilePosition;

use terratile_core::{EntryId, HeapEntry};

use std::cmp::Ordering;

/// One A* search node. Nodes live in the search's heap arena; `parent` points back into that arena.
#[derive(Clone, Copy, Debug)]
pub struct Node {
    pub position: TilePosition,
    pub cost_from_start: u32,
    /// Heuristic distance to the destination.
    pub cost_to_end: u32,
    pub parent: Option<EntryId>,
    heap_index: Option<usize>,
}

impl Node {
    pub fn new(position: TilePosition, cost_to_end: u32) -> Self {
        Self {
            position,
            cost_from_start: 0,
            cost_to_end,
            parent: None,
            heap_index: None,
        }
    }

    #[inline]
    pub fn total_cost(&self) -> u32 {
        self.cost_from_start.saturating_add(self.cost_to_end)
    }
}

impl HeapEntry for Node {
    #[inline]
    fn heap_index(&self) -> Option<usize> {
        self.heap_index
    }

    #[inline]
    fn set_heap_index(&mut self, index: Option<usize>) {
        self.heap_index = index;
    }

    /// Cheaper total cost first. Ties go to the node closer to the destination.
    fn compare_priority(&self, other: &Self) -> Ordering {
        other
            .total_cost()
            .cmp(&self.total_cost())
            .then_with(|| other.cost_to_end.cmp(&self.cost_to_end))
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
