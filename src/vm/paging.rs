use crate::error::{Result, SimError};
use crate::mem::machine::{Device, FrameRef, MemOp, MemoryBus};
use crate::vm::mm::MmState;
use crate::vm::page_table::Pte;
use tracing::{debug, info, warn};

/// A victim whose RAM frame has been copied to swap but whose page-table
/// entry is still present.
struct Eviction {
    victim: usize,
    ram_fpn: usize,
    swap_fpn: usize,
}

impl MmState {
    /// Split a virtual address into page number and in-page offset.
    pub fn split(&self, addr: usize) -> (usize, usize) {
        (addr >> self.page_shift, addr & (self.page_size() - 1))
    }

    /// RAM frame holding page `pgn`, faulting it in when needed.
    pub fn translate(&mut self, bus: &dyn MemoryBus, pgn: usize) -> Result<usize> {
        let pte = self
            .page_table
            .get(pgn)
            .ok_or(SimError::InvalidAddress(pgn << self.page_shift))?;
        match pte {
            Pte::Present(fpn) => Ok(fpn),
            Pte::Swapped(swap_fpn) => self.fault_in(bus, pgn, swap_fpn),
            Pte::Unmapped => self.map_zeroed(bus, pgn),
        }
    }

    pub fn read_byte(&mut self, bus: &dyn MemoryBus, addr: usize) -> Result<u8> {
        let (pgn, off) = self.split(addr);
        let fpn = self.translate(bus, pgn)?;
        let phys = (fpn << self.page_shift) + off;
        let value = bus.memmap(&mut self.space, MemOp::Read { addr: phys })?;
        Ok(value as u8)
    }

    pub fn write_byte(&mut self, bus: &dyn MemoryBus, addr: usize, value: u8) -> Result<()> {
        let (pgn, off) = self.split(addr);
        let fpn = self.translate(bus, pgn)?;
        let phys = (fpn << self.page_shift) + off;
        bus.memmap(&mut self.space, MemOp::Write { addr: phys, value })?;
        Ok(())
    }

    /// Return every RAM and swap frame referenced by the page table to the
    /// machine and forget all mappings. Returns the number of frames released.
    pub fn release_frames(&mut self, bus: &dyn MemoryBus) -> usize {
        let mut released = 0;
        for (_, pte) in self.page_table.mapped() {
            match pte {
                Pte::Present(fpn) => bus.release_frame(Device::Ram, fpn),
                Pte::Swapped(fpn) => bus.release_frame(Device::Swap, fpn),
                Pte::Unmapped => continue,
            }
            released += 1;
        }
        self.page_table.reset();
        self.fifo.clear();
        released
    }

    /// Bring swapped-out page `pgn` back into the frame of a FIFO victim.
    ///
    /// Either both swaps succeed and both entries flip, or neither entry
    /// changes and the victim stays the oldest resident page.
    fn fault_in(&mut self, bus: &dyn MemoryBus, pgn: usize, swap_fpn: usize) -> Result<usize> {
        let ev = self.swap_out_victim(bus, pgn)?;
        let swap_in = MemOp::Swap {
            src: FrameRef::swap(swap_fpn),
            dst: FrameRef::ram(ev.ram_fpn),
        };
        if let Err(e) = bus.memmap(&mut self.space, swap_in) {
            warn!(pgn, victim = ev.victim, error = %e, "swap-in failed, eviction rolled back");
            self.undo_eviction(bus, ev);
            return Err(e);
        }
        self.page_table.set(ev.victim, Pte::Swapped(ev.swap_fpn));
        self.page_table.set(pgn, Pte::Present(ev.ram_fpn));
        bus.release_frame(Device::Swap, swap_fpn);
        self.fifo.record_resident(pgn);
        info!(pgn, victim = ev.victim, fpn = ev.ram_fpn, "page fault serviced");
        Ok(ev.ram_fpn)
    }

    /// First touch of a page inside a vm area: back it with a zeroed frame,
    /// evicting a victim when RAM is exhausted.
    fn map_zeroed(&mut self, bus: &dyn MemoryBus, pgn: usize) -> Result<usize> {
        let addr = pgn << self.page_shift;
        if self.space.find(addr).is_none() {
            return Err(SimError::InvalidAddress(addr));
        }
        let fpn = match bus.alloc_frame(Device::Ram) {
            Some(fpn) => fpn,
            None => {
                let ev = self.swap_out_victim(bus, pgn)?;
                if let Err(e) = bus.clear_frame(FrameRef::ram(ev.ram_fpn)) {
                    self.undo_eviction(bus, ev);
                    return Err(e);
                }
                self.page_table.set(ev.victim, Pte::Swapped(ev.swap_fpn));
                ev.ram_fpn
            }
        };
        self.page_table.set(pgn, Pte::Present(fpn));
        self.fifo.record_resident(pgn);
        debug!(pgn, fpn, "page mapped");
        Ok(fpn)
    }

    /// Copy the oldest resident page to a fresh swap frame. The victim's
    /// entry is left present; the caller commits or undoes.
    fn swap_out_victim(&mut self, bus: &dyn MemoryBus, pgn: usize) -> Result<Eviction> {
        let victim = self.fifo.select_victim().ok_or(SimError::NoVictim(pgn))?;
        let Some(Pte::Present(ram_fpn)) = self.page_table.get(victim) else {
            return Err(SimError::NoVictim(pgn));
        };
        let Some(swap_fpn) = bus.alloc_frame(Device::Swap) else {
            self.fifo.restore_oldest(victim);
            return Err(SimError::IoFailure("swap device has no free frame".into()));
        };
        let swap_out = MemOp::Swap {
            src: FrameRef::ram(ram_fpn),
            dst: FrameRef::swap(swap_fpn),
        };
        if let Err(e) = bus.memmap(&mut self.space, swap_out) {
            bus.release_frame(Device::Swap, swap_fpn);
            self.fifo.restore_oldest(victim);
            warn!(victim, error = %e, "swap-out failed");
            return Err(e);
        }
        debug!(victim, ram_fpn, swap_fpn, "victim swapped out");
        Ok(Eviction {
            victim,
            ram_fpn,
            swap_fpn,
        })
    }

    fn undo_eviction(&mut self, bus: &dyn MemoryBus, ev: Eviction) {
        bus.release_frame(Device::Swap, ev.swap_fpn);
        self.fifo.restore_oldest(ev.victim);
    }
}
