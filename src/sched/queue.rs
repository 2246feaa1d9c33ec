use crate::error::{Result, SimError};
use std::sync::Arc;

/// Anything the ready queue can order. Lower values are scheduled sooner.
pub trait Prioritized {
    fn priority(&self) -> u32;
}

impl<T: Prioritized + ?Sized> Prioritized for Arc<T> {
    fn priority(&self) -> u32 {
        (**self).priority()
    }
}

/// Fixed-capacity binary min-heap of process handles keyed on priority.
///
/// Equal priorities come out in no particular order. The queue does no
/// locking of its own; share it behind a `Mutex`.
#[derive(Debug, Clone)]
pub struct ReadyQueue<T> {
    procs: Vec<T>,
    capacity: usize,
}

/// True for an absent queue or one holding nothing.
pub fn is_empty<T>(queue: Option<&ReadyQueue<T>>) -> bool {
    queue.is_none_or(|q| q.procs.is_empty())
}

impl<T: Prioritized> ReadyQueue<T> {
    pub fn new(capacity: usize) -> Self {
        ReadyQueue {
            procs: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Insert `proc`. A full queue refuses with `QueueFull` and is left as is.
    pub fn enqueue(&mut self, proc: T) -> Result<()> {
        if self.procs.len() >= self.capacity {
            return Err(SimError::QueueFull(self.capacity));
        }
        self.procs.push(proc);
        self.sift_up(self.procs.len() - 1);
        Ok(())
    }

    /// Remove the handle with the lowest priority value.
    pub fn dequeue(&mut self) -> Result<T> {
        if self.procs.is_empty() {
            return Err(SimError::QueueEmpty);
        }
        let root = self.procs.swap_remove(0);
        self.sift_down(0);
        Ok(root)
    }

    /// Take out every handle matching `pred` and rebuild the heap.
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let (removed, kept): (Vec<T>, Vec<T>) = self.procs.drain(..).partition(|p| pred(p));
        self.procs = kept;
        for pos in (0..self.procs.len() / 2).rev() {
            self.sift_down(pos);
        }
        removed
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.procs[pos].priority() >= self.procs[parent].priority() {
                break;
            }
            self.procs.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.procs.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.procs[right].priority() < self.procs[left].priority()
            {
                right
            } else {
                left
            };
            if self.procs[pos].priority() <= self.procs[child].priority() {
                break;
            }
            self.procs.swap(pos, child);
            pos = child;
        }
    }
}
