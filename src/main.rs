use anyhow::{Context, Result, anyhow, bail};
use ossim::{
    config::SimConfig,
    mem::machine::{Device, Machine},
    sched::{pcb::Pcb, queue::ReadyQueue},
};
use std::{sync::Arc, thread};
use tracing::{Level, debug, info};

/// Pages every demo process allocates and touches.
const WORKLOAD_PAGES: usize = 6;

fn main() -> Result<()> {
    let level = match std::env::var("OSSIM_LOG").as_deref() {
        Ok("debug") => Level::DEBUG,
        Ok("trace") => Level::TRACE,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig {
            ram_frames: 4,
            swap_frames: 64,
            ..SimConfig::default()
        },
    };
    let machine = Arc::new(Machine::new(&config));

    let mut queue = ReadyQueue::new(config.queue_capacity);
    for (pid, (name, priority)) in [("p0s", 3), ("p1s", 1), ("s0", 2)].into_iter().enumerate() {
        let path = format!("{}{}", config.proc_dir, name);
        let proc = Pcb::new(pid as u32, path, priority, &config, machine.clone());
        queue
            .enqueue(Arc::new(proc))
            .with_context(|| format!("queueing {}", name))?;
    }

    // One worker at a time: processes share RAM, and a process with no
    // resident page of its own cannot evict anything.
    while let Ok(proc) = queue.dequeue() {
        info!(pid = proc.pid, name = proc.name(), priority = proc.priority, "dispatch");
        let page_size = config.page_size();
        let worker = thread::spawn(move || run_workload(&proc, page_size));
        worker
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))??;
    }

    info!(
        ram_free = machine.free_frames(Device::Ram),
        swap_free = machine.free_frames(Device::Swap),
        "all processes finished"
    );
    debug!("ram contents:\n{}", machine.dump_ram());
    Ok(())
}

/// Fill several pages, forcing evictions, then read everything back.
fn run_workload(proc: &Pcb, page_size: usize) -> Result<()> {
    let size = WORKLOAD_PAGES * page_size;
    proc.alloc(size, 0)
        .with_context(|| format!("pid {} alloc", proc.pid))?;
    for page in 0..WORKLOAD_PAGES {
        proc.write(pattern(proc.pid, page), 0, page * page_size)
            .with_context(|| format!("pid {} write page {}", proc.pid, page))?;
    }
    for page in 0..WORKLOAD_PAGES {
        let got = proc
            .read(0, page * page_size)
            .with_context(|| format!("pid {} read page {}", proc.pid, page))?;
        if got != pattern(proc.pid, page) {
            bail!("pid {} page {}: read {} back", proc.pid, page, got);
        }
    }
    proc.free(0)?;
    let frames = proc.mm.release_frames();
    info!(pid = proc.pid, frames, "workload verified");
    Ok(())
}

fn pattern(pid: u32, page: usize) -> u8 {
    (pid as u8).wrapping_mul(31).wrapping_add(page as u8 + 1)
}
