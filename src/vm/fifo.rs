use std::collections::VecDeque;

/// Resident pages in fault-in order, newest at the head.
///
/// A page is listed iff its page-table entry is present. Later accesses do
/// not reorder the list, so replacement is strict FIFO.
#[derive(Debug, Default, Clone)]
pub struct FifoResidency {
    pages: VecDeque<usize>,
}

impl FifoResidency {
    pub fn new() -> Self {
        FifoResidency {
            pages: VecDeque::new(),
        }
    }

    pub fn record_resident(&mut self, pgn: usize) {
        self.pages.push_front(pgn);
    }

    /// Remove and return the page resident the longest.
    pub fn select_victim(&mut self) -> Option<usize> {
        self.pages.pop_back()
    }

    /// Put a victim back as the oldest entry after an aborted eviction.
    pub fn restore_oldest(&mut self, pgn: usize) {
        self.pages.push_back(pgn);
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
