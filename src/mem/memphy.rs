use crate::error::{Result, SimError};
use std::collections::VecDeque;
use std::fmt::Write;

/// One simulated memory device (RAM or swap).
///
/// Flat byte storage cut into fixed-size frames plus a pool of free frame
/// numbers handed out in FIFO order.
pub struct MemPhy {
    storage: Vec<u8>,
    frame_size: usize,
    free_frames: VecDeque<usize>,
}

impl MemPhy {
    /// Create a zeroed device of `frames` frames, all of them free.
    pub fn new(frames: usize, frame_size: usize) -> Self {
        MemPhy {
            storage: vec![0u8; frames * frame_size],
            frame_size,
            free_frames: (0..frames).collect(),
        }
    }

    pub fn max_frames(&self) -> usize {
        self.storage.len() / self.frame_size
    }

    pub fn free_count(&self) -> usize {
        self.free_frames.len()
    }

    pub fn get_free_frame(&mut self) -> Option<usize> {
        self.free_frames.pop_front()
    }

    /// Return a frame to the pool. Out-of-range frame numbers are ignored.
    pub fn put_free_frame(&mut self, fpn: usize) {
        if fpn < self.max_frames() {
            self.free_frames.push_back(fpn);
        }
    }

    pub fn read(&self, addr: usize) -> Result<u8> {
        self.storage
            .get(addr)
            .copied()
            .ok_or_else(|| SimError::IoFailure(format!("read beyond device at {:#x}", addr)))
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        let cell = self
            .storage
            .get_mut(addr)
            .ok_or_else(|| SimError::IoFailure(format!("write beyond device at {:#x}", addr)))?;
        *cell = value;
        Ok(())
    }

    pub fn frame(&self, fpn: usize) -> Result<&[u8]> {
        let range = self.frame_range(fpn)?;
        Ok(&self.storage[range])
    }

    pub fn frame_mut(&mut self, fpn: usize) -> Result<&mut [u8]> {
        let range = self.frame_range(fpn)?;
        Ok(&mut self.storage[range])
    }

    fn frame_range(&self, fpn: usize) -> Result<std::ops::Range<usize>> {
        if fpn >= self.max_frames() {
            return Err(SimError::IoFailure(format!(
                "frame {} out of range ({} frames)",
                fpn,
                self.max_frames()
            )));
        }
        let start = fpn * self.frame_size;
        Ok(start..start + self.frame_size)
    }

    /// Render every non-zero byte as `addr: value`, one per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (addr, &byte) in self.storage.iter().enumerate() {
            if byte != 0 {
                let _ = writeln!(out, "{:#010x}: {:#04x}", addr, byte);
            }
        }
        out
    }
}
