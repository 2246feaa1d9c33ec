use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::vm::region::FreeList;

/// One vm area: `[vm_start, sbrk)` is allocated address space, and `sbrk`
/// may grow up to `vm_limit`.
#[derive(Debug, Clone)]
pub struct VmArea {
    pub id: usize,
    pub vm_start: usize,
    pub sbrk: usize,
    pub vm_limit: usize,
    pub free_list: FreeList,
}

impl VmArea {
    pub fn new(id: usize, vm_start: usize, vm_limit: usize) -> Self {
        VmArea {
            id,
            vm_start,
            sbrk: vm_start,
            vm_limit,
            free_list: FreeList::new(),
        }
    }

    pub fn contains(&self, addr: usize) -> bool {
        self.vm_start <= addr && addr < self.sbrk
    }
}

/// The vm areas of one process. Areas split the address space evenly on
/// page boundaries; area 0 starts at address 0.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    areas: Vec<VmArea>,
}

impl AddressSpace {
    pub fn new(config: &SimConfig) -> Self {
        let span = (config.max_pages / config.vma_count) << config.page_shift;
        let areas = (0..config.vma_count)
            .map(|id| VmArea::new(id, id * span, (id + 1) * span))
            .collect();
        AddressSpace { areas }
    }

    pub fn get(&self, vma: usize) -> Result<&VmArea> {
        self.areas.get(vma).ok_or(SimError::InvalidVma(vma))
    }

    pub fn get_mut(&mut self, vma: usize) -> Result<&mut VmArea> {
        self.areas.get_mut(vma).ok_or(SimError::InvalidVma(vma))
    }

    /// The area whose allocated range covers `addr`.
    pub fn find(&self, addr: usize) -> Option<&VmArea> {
        self.areas.iter().find(|area| area.contains(addr))
    }
}
