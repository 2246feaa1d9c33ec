/// State of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pte {
    #[default]
    Unmapped,
    /// Resident in the given RAM frame.
    Present(usize),
    /// Evicted to the given swap frame.
    Swapped(usize),
}

/// Flat page table indexed by page number.
#[derive(Debug, Clone)]
pub struct PageTable {
    entries: Vec<Pte>,
}

impl PageTable {
    pub fn new(max_pages: usize) -> Self {
        PageTable {
            entries: vec![Pte::Unmapped; max_pages],
        }
    }

    pub fn get(&self, pgn: usize) -> Option<Pte> {
        self.entries.get(pgn).copied()
    }

    /// Overwrite an entry. Callers have already bounds-checked `pgn`.
    pub fn set(&mut self, pgn: usize, pte: Pte) {
        if let Some(entry) = self.entries.get_mut(pgn) {
            *entry = pte;
        }
    }

    /// `(pgn, pte)` for every entry that is not unmapped.
    pub fn mapped(&self) -> impl Iterator<Item = (usize, Pte)> + '_ {
        self.entries
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, pte)| pte != Pte::Unmapped)
    }

    pub fn reset(&mut self) {
        self.entries.fill(Pte::Unmapped);
    }
}
