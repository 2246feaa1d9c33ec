use ossim::{
    SimError,
    config::SimConfig,
    mem::machine::Machine,
    sched::{
        pcb::Pcb,
        queue::{Prioritized, ReadyQueue, is_empty},
    },
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Task {
    id: usize,
    prio: u32,
}

impl Prioritized for Task {
    fn priority(&self) -> u32 {
        self.prio
    }
}

fn drain(queue: &mut ReadyQueue<Task>) -> Vec<u32> {
    let mut out = Vec::new();
    while let Ok(task) = queue.dequeue() {
        out.push(task.prio);
    }
    out
}

fn queue_of(prios: &[u32], capacity: usize) -> ReadyQueue<Task> {
    let mut queue = ReadyQueue::new(capacity);
    for (id, &prio) in prios.iter().enumerate() {
        let _ = queue.enqueue(Task { id, prio });
    }
    queue
}

#[test]
fn test_dequeue_lowest_priority_first() {
    let mut queue = queue_of(&[5, 1, 3], 10);
    assert_eq!(drain(&mut queue), vec![1, 3, 5]);
}

#[test]
fn test_is_empty() {
    assert!(is_empty::<Task>(None));
    let mut queue = ReadyQueue::new(10);
    assert!(is_empty(Some(&queue)));
    queue.enqueue(Task { id: 0, prio: 4 }).unwrap();
    assert!(!is_empty(Some(&queue)));
    assert!(!queue.is_empty());
}

#[test]
fn test_dequeue_empty() {
    let mut queue: ReadyQueue<Task> = ReadyQueue::new(10);
    assert_eq!(queue.dequeue(), Err(SimError::QueueEmpty));
}

#[test]
fn test_overflow_is_refused_without_corruption() {
    let mut queue = queue_of(&[9, 8, 7, 6, 5, 4, 3, 2, 1, 0], 10);
    assert_eq!(queue.len(), 10);
    assert_eq!(
        queue.enqueue(Task { id: 10, prio: 0 }),
        Err(SimError::QueueFull(10))
    );
    assert_eq!(queue.len(), 10);
    assert_eq!(queue.dequeue().unwrap().id, 9);
    queue.enqueue(Task { id: 11, prio: 100 }).unwrap();
    assert_eq!(drain(&mut queue), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 100]);
}

#[test]
fn test_remove_where_keeps_heap_order() {
    let mut queue = queue_of(&[4, 2, 8, 1, 6, 3], 10);
    let removed = queue.remove_where(|t| t.prio % 2 == 0 && t.prio != 8);
    let mut gone: Vec<_> = removed.iter().map(|t| t.prio).collect();
    gone.sort();
    assert_eq!(gone, vec![2, 4, 6]);
    assert_eq!(drain(&mut queue), vec![1, 3, 8]);
}

#[test]
fn test_capacity_comes_from_config() {
    let config = SimConfig {
        queue_capacity: 2,
        ..SimConfig::default()
    };
    let machine = Arc::new(Machine::new(&SimConfig {
        ram_frames: 1,
        swap_frames: 1,
        ..config.clone()
    }));
    let mut queue = ReadyQueue::new(config.queue_capacity);
    for (pid, prio) in [(1, 3), (2, 1), (3, 0)] {
        let proc = Arc::new(Pcb::new(pid, "input/proc/p", prio, &config, machine.clone()));
        let result = queue.enqueue(proc);
        assert_eq!(result.is_ok(), pid != 3);
    }
    assert_eq!(queue.dequeue().unwrap().pid, 2);
    assert_eq!(queue.dequeue().unwrap().pid, 1);
}

proptest! {
    #[test]
    fn prop_dequeue_order_is_sorted(prios in prop::collection::vec(0u32..64, 0..10)) {
        let mut queue = queue_of(&prios, 10);
        let mut expected = prios.clone();
        expected.sort();
        prop_assert_eq!(drain(&mut queue), expected);
    }

    #[test]
    fn prop_overflow_keeps_first_entries(prios in prop::collection::vec(0u32..64, 10..20)) {
        let mut queue = queue_of(&prios, 10);
        let mut expected = prios[..10].to_vec();
        expected.sort();
        prop_assert_eq!(drain(&mut queue), expected);
    }

    #[test]
    fn prop_interleaved_ops_stay_ordered(
        ops in prop::collection::vec(prop::option::of(0u32..64), 0..40)
    ) {
        let mut queue = ReadyQueue::new(10);
        let mut model: Vec<u32> = Vec::new();
        for (id, op) in ops.into_iter().enumerate() {
            match op {
                Some(prio) => {
                    let full = model.len() == 10;
                    let result = queue.enqueue(Task { id, prio });
                    prop_assert_eq!(result.is_err(), full);
                    if !full {
                        model.push(prio);
                    }
                }
                None => {
                    let got = queue.dequeue().ok().map(|t| t.prio);
                    model.sort();
                    let want = if model.is_empty() { None } else { Some(model.remove(0)) };
                    prop_assert_eq!(got, want);
                }
            }
        }
    }
}
