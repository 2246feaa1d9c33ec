use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Sizing of the simulated machine and of every per-process table.
///
/// Fields missing from a config file fall back to [`SimConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// log2 of the page size. Frames on both devices have the same size.
    pub page_shift: u32,
    pub ram_frames: usize,
    pub swap_frames: usize,
    /// Page-table entries per process; bounds the break of every vm area.
    pub max_pages: usize,
    /// Region (symbol) table slots per process.
    pub symtbl_size: usize,
    pub reg_count: usize,
    pub queue_capacity: usize,
    pub vma_count: usize,
    /// Prepended to a process name to form its path.
    pub proc_dir: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            page_shift: 8,
            ram_frames: 4096,
            swap_frames: 16384,
            max_pages: 1 << 14,
            symtbl_size: 30,
            reg_count: 10,
            queue_capacity: 10,
            vma_count: 1,
            proc_dir: "input/proc/".to_string(),
        }
    }
}

impl SimConfig {
    /// Read a JSON config file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config at {:?}", path))?;
        let config: SimConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config at {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_shift == 0 || self.page_shift > 16 {
            bail!("page_shift must be in 1..=16, got {}", self.page_shift);
        }
        for (name, value) in [
            ("ram_frames", self.ram_frames),
            ("swap_frames", self.swap_frames),
            ("max_pages", self.max_pages),
            ("symtbl_size", self.symtbl_size),
            ("queue_capacity", self.queue_capacity),
            ("vma_count", self.vma_count),
        ] {
            if value == 0 {
                bail!("{} must be non-zero", name);
            }
        }
        if self.vma_count > self.max_pages {
            bail!(
                "vma_count {} exceeds max_pages {}",
                self.vma_count,
                self.max_pages
            );
        }
        // Registers hold 32-bit addresses.
        match self.va_limit() {
            Some(limit) if limit <= u64::from(u32::MAX) + 1 => {}
            _ => bail!(
                "address space of {} pages of {} bytes exceeds 4 GiB",
                self.max_pages,
                self.page_size()
            ),
        }
        Ok(())
    }

    pub fn page_size(&self) -> usize {
        1 << self.page_shift
    }

    /// Size of one process's virtual address space in bytes, `None` on
    /// overflow.
    pub fn va_limit(&self) -> Option<u64> {
        (self.max_pages as u64).checked_mul(self.page_size() as u64)
    }
}

/// Round `size` up to a multiple of `page_size` (a power of two).
pub fn page_align(size: usize, page_size: usize) -> Option<usize> {
    Some(size.checked_add(page_size - 1)? & !(page_size - 1))
}
