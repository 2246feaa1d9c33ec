use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::mem::machine::{MemoryBus, lock};
use crate::vm::{
    area::AddressSpace,
    fifo::FifoResidency,
    page_table::PageTable,
    region::{Region, RegionTable},
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Memory-management state of one process.
pub struct MmState {
    pub space: AddressSpace,
    pub symtbl: RegionTable,
    pub page_table: PageTable,
    pub fifo: FifoResidency,
    pub(crate) page_shift: u32,
}

impl MmState {
    pub fn new(config: &SimConfig) -> Self {
        MmState {
            space: AddressSpace::new(config),
            symtbl: RegionTable::new(config.symtbl_size),
            page_table: PageTable::new(config.max_pages),
            fifo: FifoResidency::new(),
            page_shift: config.page_shift,
        }
    }

    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Virtual address of byte `offset` inside committed region `rgid`.
    pub fn region_addr(&self, rgid: usize, offset: usize) -> Result<usize> {
        let region = self.symtbl.get(rgid)?.region;
        region
            .start
            .checked_add(offset)
            .filter(|&addr| region.contains(addr))
            .ok_or(SimError::InvalidAddress(region.start.saturating_add(offset)))
    }
}

/// Lock-guarded memory state bound to the machine it pages against.
///
/// One lock covers allocation, the region table, the page table and the
/// FIFO list, so allocation and fault handling never interleave within a
/// process.
pub struct Mm {
    inner: Mutex<MmState>,
    bus: Arc<dyn MemoryBus>,
}

impl Mm {
    pub fn new(config: &SimConfig, bus: Arc<dyn MemoryBus>) -> Self {
        Mm {
            inner: Mutex::new(MmState::new(config)),
            bus,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, MmState> {
        lock(&self.inner)
    }

    pub fn alloc(&self, vma: usize, rgid: usize, size: usize) -> Result<usize> {
        self.lock().allocate(&*self.bus, vma, rgid, size)
    }

    pub fn free(&self, rgid: usize) -> Result<Region> {
        self.lock().free(rgid)
    }

    /// Load byte `offset` of region `rgid`.
    pub fn read(&self, rgid: usize, offset: usize) -> Result<u8> {
        let mut state = self.lock();
        let addr = state.region_addr(rgid, offset)?;
        state.read_byte(&*self.bus, addr)
    }

    /// Store `value` at byte `offset` of region `rgid`.
    pub fn write(&self, rgid: usize, offset: usize, value: u8) -> Result<()> {
        let mut state = self.lock();
        let addr = state.region_addr(rgid, offset)?;
        state.write_byte(&*self.bus, addr, value)
    }

    pub fn read_addr(&self, addr: usize) -> Result<u8> {
        self.lock().read_byte(&*self.bus, addr)
    }

    pub fn write_addr(&self, addr: usize, value: u8) -> Result<()> {
        self.lock().write_byte(&*self.bus, addr, value)
    }

    /// Give every frame this process holds back to the machine.
    pub fn release_frames(&self) -> usize {
        self.lock().release_frames(&*self.bus)
    }
}
