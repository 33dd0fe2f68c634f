use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

/*
Timer Scheduler
===============

A monotonic, revocable timer queue. The engine never sleeps on timers:
callers pump `pop_due(now)` from their own loop (the TUI does it every
frame, tests pass synthetic instants) and fire whatever has come due.

Revocation is what makes stop() airtight. Every schedule returns a
handle; revoking the handle guarantees the task will never pop, even if
its deadline has already passed by the time the queue is next pumped.
Revoked entries are lazily discarded when they reach the queue head.

Entries with equal deadlines fire in schedule order (sequence number
tiebreak), so the ordering is total and deterministic.
*/

/// Handle for revoking one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Entry<T> {
    due: Instant,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

pub struct Scheduler<T> {
    queue: BinaryHeap<Reverse<Entry<T>>>,
    revoked: HashSet<u64>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            revoked: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Queue a task for `due` and return its revocation handle.
    pub fn schedule(&mut self, due: Instant, task: T) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { due, seq, task }));
        TaskHandle(seq)
    }

    /// Prevent a queued task from ever firing. Revoking a handle that
    /// already fired (or was never queued) does nothing.
    pub fn revoke(&mut self, handle: TaskHandle) {
        if self.queue.iter().any(|Reverse(entry)| entry.seq == handle.0) {
            self.revoked.insert(handle.0);
        }
    }

    /// Drop every queued task.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.revoked.clear();
    }

    /// Pop the earliest task whose deadline is at or before `now`.
    /// Callers loop this until it returns `None`.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        loop {
            let (due, seq) = match self.queue.peek() {
                Some(Reverse(entry)) => (entry.due, entry.seq),
                None => return None,
            };

            if self.revoked.remove(&seq) {
                self.queue.pop();
                continue;
            }

            if due > now {
                return None;
            }

            match self.queue.pop() {
                Some(Reverse(entry)) => return Some(entry.task),
                None => return None,
            }
        }
    }

    /// Deadline of the earliest live task, if any.
    pub fn next_due(&self) -> Option<Instant> {
        self.queue
            .iter()
            .filter(|Reverse(entry)| !self.revoked.contains(&entry.seq))
            .map(|Reverse(entry)| entry.due)
            .min()
    }

    /// Number of live (non-revoked) tasks in the queue.
    pub fn pending(&self) -> usize {
        self.queue
            .iter()
            .filter(|Reverse(entry)| !self.revoked.contains(&entry.seq))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
