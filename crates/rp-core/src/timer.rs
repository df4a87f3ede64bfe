//! `TimerQueue`: wall-clock task queue for the replay loop.
//!
//! # Why this exists
//!
//! The replay has two kinds of periodic work: the scheduler tick (every
//! `speed_ms`) and one interpolation timer per moving entity.  Instead of
//! spawning a timer per task, every task registers the wall time it needs
//! attention next, and the driver pops due tasks in time order.  This keeps
//! the whole replay single-threaded and deterministic: two runs with the
//! same inputs fire the same tasks in the same order.
//!
//! Tasks due at the same instant fire in scheduling order.  Every task
//! repeats: it is re-armed at `due + interval` as it is popped, so cancelling
//! it from inside its own handler works.  A task runs until cancelled.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::{EntityId, TaskId, WallTime};

/// What a fired task should drive.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TimerTarget {
    /// The scheduler's periodic clock tick.
    SchedulerTick,
    /// One interpolation sub-step of an entity's active move.
    Animation(EntityId),
}

#[derive(Debug)]
struct Task {
    target:   TimerTarget,
    due:      WallTime,
    interval: WallTime,
}

/// A sparse priority queue mapping wall times → tasks due at that time.
#[derive(Debug, Default)]
pub struct TimerQueue {
    due:     BTreeMap<WallTime, VecDeque<TaskId>>,
    tasks:   HashMap<TaskId, Task>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `target` at `first`, then every `interval` until cancelled.
    pub fn schedule_repeating(
        &mut self,
        first:    WallTime,
        interval: WallTime,
        target:   TimerTarget,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let interval = WallTime(interval.0.max(1));
        self.tasks.insert(id, Task { target, due: first, interval });
        self.due.entry(first).or_default().push_back(id);
        id
    }

    /// Cancel a task.  Returns `false` if it was cancelled before.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.remove(&id) else {
            return false;
        };
        if let Some(slot) = self.due.get_mut(&task.due) {
            slot.retain(|&queued| queued != id);
            if slot.is_empty() {
                self.due.remove(&task.due);
            }
        }
        true
    }

    /// Pop the earliest task due at or before `now`.
    ///
    /// Returns the time it was due (not `now`) so the caller can advance its
    /// wall clock to exactly that instant before running the task.
    pub fn pop_due(&mut self, now: WallTime) -> Option<(WallTime, TaskId, TimerTarget)> {
        let mut entry = self.due.first_entry()?;
        let at = *entry.key();
        if at > now {
            return None;
        }
        let id = entry.get_mut().pop_front()?;
        if entry.get().is_empty() {
            entry.remove();
        }

        let task = self.tasks.get_mut(&id)?;
        let next = at + task.interval;
        task.due = next;
        self.due.entry(next).or_default().push_back(id);
        Some((at, id, task.target))
    }

    /// The earliest wall time with a pending task, or `None` if empty.
    pub fn next_due(&self) -> Option<WallTime> {
        self.due.keys().next().copied()
    }

    /// `true` while `id` is still scheduled.
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
