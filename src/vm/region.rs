use crate::error::{Result, SimError};
use std::collections::VecDeque;

/// Half-open virtual address range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn new(start: usize, end: usize) -> Self {
        Region { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end
    }
}

/// Free regions of one vm area, most recently enlisted first.
///
/// Adjacent regions are never merged, so a freed range stays split from its
/// neighbours until it is handed out again.
#[derive(Debug, Default, Clone)]
pub struct FreeList {
    regions: VecDeque<Region>,
}

impl FreeList {
    pub fn new() -> Self {
        FreeList {
            regions: VecDeque::new(),
        }
    }

    /// Put `region` at the head of the list. Empty ranges are rejected.
    pub fn enlist(&mut self, region: Region) -> bool {
        if region.is_empty() {
            return false;
        }
        self.regions.push_front(region);
        true
    }

    /// Carve `size` bytes off the front of the first region large enough.
    ///
    /// The donor shrinks in place, or leaves the list when consumed exactly.
    pub fn take_first_fit(&mut self, size: usize) -> Option<Region> {
        let idx = self.regions.iter().position(|rg| rg.len() >= size)?;
        let donor = &mut self.regions[idx];
        let carved = Region::new(donor.start, donor.start + size);
        donor.start = carved.end;
        if donor.is_empty() {
            self.regions.remove(idx);
        }
        Some(carved)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// A committed region and the vm area it was carved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub vma: usize,
    pub region: Region,
}

/// Fixed-size table mapping a region id (a process's variable slot) to its
/// committed range. An empty slot is unused.
#[derive(Debug, Clone)]
pub struct RegionTable {
    slots: Vec<Option<Symbol>>,
}

impl RegionTable {
    pub fn new(capacity: usize) -> Self {
        RegionTable {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_committed(&self, rgid: usize) -> bool {
        matches!(self.slots.get(rgid), Some(Some(_)))
    }

    pub fn get(&self, rgid: usize) -> Result<&Symbol> {
        self.slots
            .get(rgid)
            .and_then(Option::as_ref)
            .ok_or(SimError::InvalidRegion(rgid))
    }

    /// Bind a non-empty region to a vacant slot.
    pub fn commit(&mut self, rgid: usize, symbol: Symbol) -> Result<()> {
        let slot = self
            .slots
            .get_mut(rgid)
            .ok_or(SimError::InvalidRegion(rgid))?;
        if slot.is_some() || symbol.region.is_empty() {
            return Err(SimError::InvalidRegion(rgid));
        }
        *slot = Some(symbol);
        Ok(())
    }

    pub fn detach(&mut self, rgid: usize) -> Result<Symbol> {
        self.slots
            .get_mut(rgid)
            .and_then(Option::take)
            .ok_or(SimError::InvalidRegion(rgid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit_shrinks_donor() {
        let mut fl = FreeList::new();
        fl.enlist(Region::new(0, 100));
        assert_eq!(fl.take_first_fit(30), Some(Region::new(0, 30)));
        let left: Vec<_> = fl.iter().copied().collect();
        assert_eq!(left, vec![Region::new(30, 100)]);
    }

    #[test]
    fn test_exact_fit_removes_donor() {
        let mut fl = FreeList::new();
        fl.enlist(Region::new(200, 250));
        fl.enlist(Region::new(0, 10));
        assert_eq!(fl.take_first_fit(10), Some(Region::new(0, 10)));
        assert_eq!(fl.len(), 1);
        assert_eq!(fl.take_first_fit(60), None);
    }

    #[test]
    fn test_first_fit_skips_small_regions() {
        let mut fl = FreeList::new();
        fl.enlist(Region::new(500, 600));
        fl.enlist(Region::new(0, 8));
        assert_eq!(fl.take_first_fit(16), Some(Region::new(500, 516)));
        let left: Vec<_> = fl.iter().copied().collect();
        assert_eq!(left, vec![Region::new(0, 8), Region::new(516, 600)]);
    }

    #[test]
    fn test_enlist_rejects_empty() {
        let mut fl = FreeList::new();
        assert!(!fl.enlist(Region::new(5, 5)));
        assert!(fl.is_empty());
    }

    #[test]
    fn test_table_commit_and_detach() {
        let mut table = RegionTable::new(2);
        let sym = Symbol {
            vma: 0,
            region: Region::new(0, 4),
        };
        table.commit(1, sym).unwrap();
        assert_eq!(table.commit(1, sym), Err(SimError::InvalidRegion(1)));
        assert_eq!(table.commit(2, sym), Err(SimError::InvalidRegion(2)));
        assert_eq!(table.detach(1).unwrap(), sym);
        assert_eq!(table.detach(1), Err(SimError::InvalidRegion(1)));
        assert!(!table.is_committed(1));
    }
}
