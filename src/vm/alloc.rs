use crate::config::page_align;
use crate::error::{Result, SimError};
use crate::mem::machine::{MemOp, MemoryBus};
use crate::vm::mm::MmState;
use crate::vm::region::{Region, Symbol};
use tracing::{debug, info, warn};

impl MmState {
    /// Commit `size` bytes of vm area `vma` to region slot `rgid` and return
    /// the start address.
    ///
    /// Takes the first free region that fits. When none does, the area is
    /// grown by `size` rounded up to whole pages; the slack past `size` is
    /// enlisted as a free region.
    pub fn allocate(
        &mut self,
        bus: &dyn MemoryBus,
        vma: usize,
        rgid: usize,
        size: usize,
    ) -> Result<usize> {
        if size == 0 || rgid >= self.symtbl.capacity() || self.symtbl.is_committed(rgid) {
            return Err(SimError::InvalidRegion(rgid));
        }
        let area = self.space.get_mut(vma)?;
        if let Some(region) = area.free_list.take_first_fit(size) {
            self.symtbl.commit(rgid, Symbol { vma, region })?;
            debug!(vma, rgid, start = region.start, end = region.end, "region reused");
            return Ok(region.start);
        }

        let old_sbrk = area.sbrk;
        let increment = page_align(size, self.page_size())
            .ok_or(SimError::OutOfSpace { vma, increment: size })?;
        if let Err(e) = bus.memmap(&mut self.space, MemOp::IncreaseLimit { vma, increment }) {
            warn!(vma, increment, error = %e, "vm area growth refused");
            return Err(SimError::OutOfSpace { vma, increment });
        }
        let region = Region::new(old_sbrk, old_sbrk + size);
        self.space
            .get_mut(vma)?
            .free_list
            .enlist(Region::new(region.end, old_sbrk + increment));
        self.symtbl.commit(rgid, Symbol { vma, region })?;
        info!(vma, rgid, old_sbrk, increment, "vm area grown");
        Ok(region.start)
    }

    /// Detach region `rgid` and return it to the head of its area's free list.
    pub fn free(&mut self, rgid: usize) -> Result<Region> {
        let symbol = *self.symtbl.get(rgid)?;
        let area = self.space.get_mut(symbol.vma)?;
        area.free_list.enlist(symbol.region);
        self.symtbl.detach(rgid)?;
        debug!(
            rgid,
            start = symbol.region.start,
            end = symbol.region.end,
            "region freed"
        );
        Ok(symbol.region)
    }
}
