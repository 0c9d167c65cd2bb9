use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: TaskId,
    due: f64,
    interval: f64,
}

/// Cooperative repeating tasks driven by the frame clock.
///
/// A task becomes due `interval` seconds after it was scheduled and, once
/// polled, is re-enqueued `interval` seconds after the poll time. Cancelling
/// removes it from the queue; a cancelled id is never reported again.
#[derive(Resource, Debug, Default)]
pub struct TaskQueue {
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

impl TaskQueue {
    pub fn schedule_repeating(&mut self, now: f64, interval: f64) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let interval = interval.max(0.0);
        self.tasks.push(ScheduledTask { id, due: now + interval, interval });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn next_due(&self, id: TaskId) -> Option<f64> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.due)
    }

    /// Ids of every task due at `now`, in scheduling order.
    pub fn poll(&mut self, now: f64) -> Vec<TaskId> {
        let mut due = Vec::new();
        for task in &mut self.tasks {
            if task.due <= now {
                due.push(task.id);
                task.due = now + task.interval;
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
