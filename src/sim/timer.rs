//! Virtual-clock timer queue
//!
//! Every delayed action in the game (the next spawn tick, each bug's expiry)
//! is a task in one ordered queue. Tasks fire in `(due_ms, seq)` order, so two
//! tasks due at the same millisecond fire in the order they were scheduled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::BugId;

/// Handle to one scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    due_ms: u64,
    seq: u64,
}

impl TimerHandle {
    /// Virtual time at which the task fires
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

/// Work carried by a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerTask {
    /// Spawner tick, stamped with the session epoch it was scheduled in
    SpawnTick { epoch: u32 },
    /// A bug's motion finished
    Expire(BugId),
}

/// Pending tasks ordered by due time
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: BTreeMap<(u64, u64), TimerTask>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire at `due_ms`
    pub fn schedule(&mut self, due_ms: u64, task: TimerTask) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((due_ms, seq), task);
        TimerHandle { due_ms, seq }
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&(handle.due_ms, handle.seq)).is_some()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&(handle.due_ms, handle.seq))
    }

    /// Due time of the earliest pending task
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(due, _)| due)
    }

    /// Remove and return the earliest task due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, TimerTask)> {
        let (&(due, seq), _) = self.pending.first_key_value()?;
        if due > now_ms {
            return None;
        }
        self.pending.remove(&(due, seq)).map(|task| (due, task))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
