use crate::error::{Result, SimError};
use crate::sched::pcb::Pcb;
use crate::sched::queue::ReadyQueue;
use std::sync::Arc;
use tracing::info;

/// Every process the scheduler knows about.
pub struct ProcTable {
    pub running: Vec<Arc<Pcb>>,
    pub ready: Vec<ReadyQueue<Arc<Pcb>>>,
}

impl ProcTable {
    /// `levels` ready queues of `capacity` slots each.
    pub fn new(levels: usize, capacity: usize) -> Self {
        ProcTable {
            running: Vec::new(),
            ready: (0..levels).map(|_| ReadyQueue::new(capacity)).collect(),
        }
    }
}

/// Read a NUL-terminated string from region `rgid` of `caller`. The end of
/// the region also terminates it.
pub fn read_name(caller: &Pcb, rgid: usize) -> Result<String> {
    let mut bytes = Vec::new();
    for offset in 0.. {
        match caller.read(rgid, offset) {
            Ok(0) | Err(SimError::InvalidAddress(_)) => break,
            Ok(byte) => bytes.push(byte),
            Err(e) => return Err(e),
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Terminate every process whose path is `proc_dir` followed by the name
/// stored in region `rgid` of `caller`.
///
/// Matching processes leave the running list and every ready queue and
/// give their frames back. The killed handles are returned.
pub fn kill_by_name(
    table: &mut ProcTable,
    caller: &Pcb,
    rgid: usize,
    proc_dir: &str,
) -> Result<Vec<Arc<Pcb>>> {
    let name = read_name(caller, rgid)?;
    let path = format!("{}{}", proc_dir, name);

    let mut killed = Vec::new();
    table.running.retain(|p| {
        if p.path == path {
            killed.push(Arc::clone(p));
            false
        } else {
            true
        }
    });
    for queue in table.ready.iter_mut() {
        killed.extend(queue.remove_where(|p| p.path == path));
    }

    for proc in &killed {
        let frames = proc.mm.release_frames();
        info!(pid = proc.pid, path = %proc.path, frames, "process killed");
    }
    Ok(killed)
}
