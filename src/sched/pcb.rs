use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::mem::machine::{MemoryBus, lock};
use crate::sched::queue::Prioritized;
use crate::vm::mm::Mm;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Vm area used by the process-level allocation calls.
const DEFAULT_VMA: usize = 0;

/// Process handle: the surface of a simulated process that the memory and
/// scheduling core touches.
pub struct Pcb {
    pub pid: u32,
    pub path: String,
    pub priority: u32,
    regs: Mutex<Vec<u32>>,
    pub mm: Mm,
}

impl Pcb {
    pub fn new(
        pid: u32,
        path: impl Into<String>,
        priority: u32,
        config: &SimConfig,
        bus: Arc<dyn MemoryBus>,
    ) -> Self {
        Pcb {
            pid,
            path: path.into(),
            priority,
            regs: Mutex::new(vec![0; config.reg_count]),
            mm: Mm::new(config, bus),
        }
    }

    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn reg(&self, index: usize) -> Option<u32> {
        lock(&self.regs).get(index).copied()
    }

    /// Allocate `size` bytes into region `reg` and load its address into the
    /// register of the same index.
    pub fn alloc(&self, size: usize, reg: usize) -> Result<usize> {
        let mut regs = lock(&self.regs);
        let slot = regs.get_mut(reg).ok_or(SimError::InvalidRegion(reg))?;
        let addr = self.mm.alloc(DEFAULT_VMA, reg, size)?;
        let Ok(value) = u32::try_from(addr) else {
            self.mm.free(reg)?;
            return Err(SimError::InvalidAddress(addr));
        };
        *slot = value;
        debug!(pid = self.pid, reg, addr, size, "alloc");
        Ok(addr)
    }

    pub fn free(&self, reg: usize) -> Result<()> {
        let mut regs = lock(&self.regs);
        let slot = regs.get_mut(reg).ok_or(SimError::InvalidRegion(reg))?;
        self.mm.free(reg)?;
        *slot = 0;
        debug!(pid = self.pid, reg, "free");
        Ok(())
    }

    /// Byte at `[source] + offset`.
    pub fn read(&self, source: usize, offset: usize) -> Result<u8> {
        let value = self.mm.read(source, offset)?;
        debug!(pid = self.pid, region = source, offset, value, "read");
        Ok(value)
    }

    /// Store `value` at `[destination] + offset`.
    pub fn write(&self, value: u8, destination: usize, offset: usize) -> Result<()> {
        self.mm.write(destination, offset, value)?;
        debug!(pid = self.pid, region = destination, offset, value, "write");
        Ok(())
    }
}

impl Prioritized for Pcb {
    fn priority(&self) -> u32 {
        self.priority
    }
}
