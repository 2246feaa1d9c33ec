use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::mem::memphy::MemPhy;
use crate::vm::area::AddressSpace;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Ram,
    Swap,
}

/// A frame number tagged with the device it lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef {
    pub device: Device,
    pub fpn: usize,
}

impl FrameRef {
    pub fn ram(fpn: usize) -> Self {
        FrameRef {
            device: Device::Ram,
            fpn,
        }
    }

    pub fn swap(fpn: usize) -> Self {
        FrameRef {
            device: Device::Swap,
            fpn,
        }
    }
}

/// Operations accepted by [`MemoryBus::memmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    /// Advance the break of vm area `vma` by `increment` bytes.
    IncreaseLimit { vma: usize, increment: usize },
    /// Copy the whole of frame `src` over frame `dst`.
    Swap { src: FrameRef, dst: FrameRef },
    /// Read one RAM byte; the value is returned as the call result.
    Read { addr: usize },
    Write { addr: usize, value: u8 },
}

/// The physical-memory side of the simulator as seen by a process.
///
/// `memmap` is the single operation-coded entry point; frame pools are
/// reached directly.
pub trait MemoryBus: Send + Sync {
    fn memmap(&self, space: &mut AddressSpace, op: MemOp) -> Result<u32>;

    /// Take a free frame. RAM frames come back zeroed.
    fn alloc_frame(&self, device: Device) -> Option<usize>;

    fn release_frame(&self, device: Device, fpn: usize);

    fn clear_frame(&self, frame: FrameRef) -> Result<()>;
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RAM plus one active swap device, shared by every process.
///
/// Each device has its own lock. Operations touching both take RAM first.
pub struct Machine {
    ram: Mutex<MemPhy>,
    swap: Mutex<MemPhy>,
}

impl Machine {
    pub fn new(config: &SimConfig) -> Self {
        Machine {
            ram: Mutex::new(MemPhy::new(config.ram_frames, config.page_size())),
            swap: Mutex::new(MemPhy::new(config.swap_frames, config.page_size())),
        }
    }

    pub fn free_frames(&self, device: Device) -> usize {
        self.device(device).free_count()
    }

    /// Non-zero RAM bytes, one `addr: value` line each.
    pub fn dump_ram(&self) -> String {
        lock(&self.ram).dump()
    }

    fn device(&self, device: Device) -> MutexGuard<'_, MemPhy> {
        match device {
            Device::Ram => lock(&self.ram),
            Device::Swap => lock(&self.swap),
        }
    }

    fn copy_frame(&self, src: FrameRef, dst: FrameRef) -> Result<()> {
        let mut ram = lock(&self.ram);
        let mut swap = lock(&self.swap);
        let data = {
            let dev = match src.device {
                Device::Ram => &*ram,
                Device::Swap => &*swap,
            };
            dev.frame(src.fpn)?.to_vec()
        };
        let dev = match dst.device {
            Device::Ram => &mut *ram,
            Device::Swap => &mut *swap,
        };
        dev.frame_mut(dst.fpn)?.copy_from_slice(&data);
        debug!(?src, ?dst, "frame copied");
        Ok(())
    }
}

impl MemoryBus for Machine {
    fn memmap(&self, space: &mut AddressSpace, op: MemOp) -> Result<u32> {
        match op {
            MemOp::IncreaseLimit { vma, increment } => {
                let area = space.get_mut(vma)?;
                let new_sbrk = area
                    .sbrk
                    .checked_add(increment)
                    .filter(|&end| end <= area.vm_limit)
                    .ok_or(SimError::OutOfSpace { vma, increment })?;
                debug!(vma, old = area.sbrk, new = new_sbrk, "vm area limit raised");
                area.sbrk = new_sbrk;
                Ok(0)
            }
            MemOp::Swap { src, dst } => self.copy_frame(src, dst).map(|_| 0),
            MemOp::Read { addr } => lock(&self.ram).read(addr).map(u32::from),
            MemOp::Write { addr, value } => lock(&self.ram).write(addr, value).map(|_| 0),
        }
    }

    fn alloc_frame(&self, device: Device) -> Option<usize> {
        let mut dev = self.device(device);
        let fpn = dev.get_free_frame()?;
        if device == Device::Ram {
            if let Ok(frame) = dev.frame_mut(fpn) {
                frame.fill(0);
            }
        }
        Some(fpn)
    }

    fn release_frame(&self, device: Device, fpn: usize) {
        self.device(device).put_free_frame(fpn);
    }

    fn clear_frame(&self, frame: FrameRef) -> Result<()> {
        self.device(frame.device).frame_mut(frame.fpn)?.fill(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SimConfig {
        SimConfig {
            ram_frames: 2,
            swap_frames: 2,
            max_pages: 4,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_swap_copies_between_devices() {
        let config = small();
        let machine = Machine::new(&config);
        let mut space = AddressSpace::new(&config);
        machine
            .memmap(&mut space, MemOp::Write { addr: 256 + 5, value: 9 })
            .unwrap();
        machine
            .memmap(
                &mut space,
                MemOp::Swap {
                    src: FrameRef::ram(1),
                    dst: FrameRef::swap(0),
                },
            )
            .unwrap();
        machine
            .memmap(
                &mut space,
                MemOp::Swap {
                    src: FrameRef::swap(0),
                    dst: FrameRef::ram(0),
                },
            )
            .unwrap();
        assert_eq!(machine.memmap(&mut space, MemOp::Read { addr: 5 }).unwrap(), 9);
    }

    #[test]
    fn test_swap_rejects_bad_frame() {
        let config = small();
        let machine = Machine::new(&config);
        let mut space = AddressSpace::new(&config);
        let op = MemOp::Swap {
            src: FrameRef::ram(0),
            dst: FrameRef::swap(5),
        };
        assert!(matches!(
            machine.memmap(&mut space, op),
            Err(SimError::IoFailure(_))
        ));
    }

    #[test]
    fn test_increase_limit_respects_vm_limit() {
        let config = small();
        let machine = Machine::new(&config);
        let mut space = AddressSpace::new(&config);
        let grow = |inc| MemOp::IncreaseLimit {
            vma: 0,
            increment: inc,
        };
        machine.memmap(&mut space, grow(512)).unwrap();
        assert_eq!(space.get(0).unwrap().sbrk, 512);
        assert_eq!(
            machine.memmap(&mut space, grow(1024)),
            Err(SimError::OutOfSpace {
                vma: 0,
                increment: 1024
            })
        );
        assert_eq!(space.get(0).unwrap().sbrk, 512);
        assert_eq!(
            machine.memmap(&mut space, MemOp::IncreaseLimit { vma: 3, increment: 1 }),
            Err(SimError::InvalidVma(3))
        );
    }

    #[test]
    fn test_ram_frames_come_back_zeroed() {
        let config = small();
        let machine = Machine::new(&config);
        let mut space = AddressSpace::new(&config);
        let fpn = machine.alloc_frame(Device::Ram).unwrap();
        machine
            .memmap(&mut space, MemOp::Write { addr: fpn << 8, value: 1 })
            .unwrap();
        machine.release_frame(Device::Ram, fpn);
        let _other = machine.alloc_frame(Device::Ram).unwrap();
        let again = machine.alloc_frame(Device::Ram).unwrap();
        assert_eq!(again, fpn);
        assert_eq!(
            machine.memmap(&mut space, MemOp::Read { addr: fpn << 8 }).unwrap(),
            0
        );
    }
}
