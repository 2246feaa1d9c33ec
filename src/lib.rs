pub mod config;
pub mod error;

pub mod mem {
    pub mod machine;
    pub mod memphy;
}

pub mod vm {
    pub mod alloc;
    pub mod area;
    pub mod fifo;
    pub mod mm;
    pub mod page_table;
    pub mod paging;
    pub mod region;
}

pub mod sched {
    pub mod killall;
    pub mod pcb;
    pub mod queue;
}

pub use error::{Result, SimError};
