//! Double-page pagination.
//!
//! # Responsibility
//! - Slice an ordered note sequence into left/right page sides.
//! - Own the current double-page cursor and its pin-to-newest policy.
//!
//! # Invariants
//! - `total_pages >= 1`, also for an empty collection.
//! - The effective page index is always inside `0..total_pages`.
//! - Capacity per side is at least 1.

/// One double page worth of items.
#[derive(Debug, PartialEq, Eq)]
pub struct PageLayout<'a, T> {
    pub left: &'a [T],
    pub right: &'a [T],
    pub page_index: usize,
    pub total_pages: usize,
}

/// Number of double pages needed for `item_count` items.
pub fn total_pages(item_count: usize, capacity_per_side: usize) -> usize {
    let per_double = capacity_per_side.max(1) * 2;
    item_count.div_ceil(per_double).max(1)
}

/// Lays out the double page at `requested_page`, clamped into range.
///
/// Either side may be shorter than the capacity at the tail; padding with
/// empty slots is left to the caller.
pub fn layout<T>(
    items: &[T],
    capacity_per_side: usize,
    requested_page: usize,
) -> PageLayout<'_, T> {
    let capacity = capacity_per_side.max(1);
    let total = total_pages(items.len(), capacity);
    let page_index = requested_page.min(total - 1);

    let left_start = (page_index * capacity * 2).min(items.len());
    let left_end = (left_start + capacity).min(items.len());
    let right_end = (left_end + capacity).min(items.len());

    PageLayout {
        left: &items[left_start..left_end],
        right: &items[left_end..right_end],
        page_index,
        total_pages: total,
    }
}

/// Current double-page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    index: usize,
    capacity_per_side: usize,
}

impl PageCursor {
    /// Creates a cursor on the first page; capacity is clamped to >= 1.
    pub fn new(capacity_per_side: usize) -> Self {
        Self {
            index: 0,
            capacity_per_side: capacity_per_side.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity_per_side(&self) -> usize {
        self.capacity_per_side
    }

    pub fn total_pages(&self, item_count: usize) -> usize {
        total_pages(item_count, self.capacity_per_side)
    }

    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self, item_count: usize) -> bool {
        self.index + 1 < self.total_pages(item_count)
    }

    /// Moves one page back. Returns `false` when already on the first page.
    pub fn prev(&mut self, item_count: usize) -> bool {
        self.move_to(self.index.saturating_sub(1), item_count)
    }

    /// Moves one page forward. Returns `false` when already on the last page.
    pub fn next(&mut self, item_count: usize) -> bool {
        self.move_to(self.index + 1, item_count)
    }

    /// Applies the pin-to-newest policy after the collection grew from
    /// `previous_count` to `item_count`.
    ///
    /// A viewer already on the last page follows the new last page; any
    /// other viewer keeps its index (re-clamped).
    pub fn on_grow(&mut self, previous_count: usize, item_count: usize) {
        let was_at_end = self.index + 1 >= self.total_pages(previous_count);
        if was_at_end {
            self.index = self.total_pages(item_count) - 1;
        } else {
            self.clamp(item_count);
        }
    }

    /// Re-clamps the index after any other structural change.
    pub fn clamp(&mut self, item_count: usize) {
        self.index = self.index.min(self.total_pages(item_count) - 1);
    }

    /// Lays out the current page of `items`.
    pub fn layout<'a, T>(&self, items: &'a [T]) -> PageLayout<'a, T> {
        layout(items, self.capacity_per_side, self.index)
    }

    fn move_to(&mut self, target: usize, item_count: usize) -> bool {
        let clamped = target.min(self.total_pages(item_count) - 1);
        if clamped == self.index {
            return false;
        }
        self.index = clamped;
        true
    }
}
