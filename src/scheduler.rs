//! Two-core cooperative task scheduler (C5).
//!
//! Four priority levels feed two drain points: `Critical` work is only
//! ever popped through [`Core1Handle`], everything else only through
//! [`Core0Handle`]. The split mirrors the RTIC `#[shared]`/`#[local]`
//! resource partitioning the rest of this firmware uses — Core 1 is
//! physically incapable of touching the `High`/`Normal`/`Low` queues
//! because [`Scheduler::split`] never hands it a reference to them.

use crate::config::SCHEDULER_QUEUE_DEPTH;
use crate::errors::errors::SchedulerError;
use heapless::spsc::Queue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum Priority {
    /// UART keep-alive and link-health work. Core 1 only.
    Critical,
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "debug"), derive(defmt::Format))]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    const fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Pending, TaskState::Running)
                | (TaskState::Pending, TaskState::Cancelled)
                | (TaskState::Running, TaskState::Completed)
                | (TaskState::Running, TaskState::Failed)
                | (TaskState::Running, TaskState::Cancelled)
        )
    }
}

/// A schedulable unit of work. `T` is whatever payload the caller wants
/// dispatched — for this firmware, `crate::protocol::router::RoutedEvent`.
#[derive(Debug, Clone, Copy)]
pub struct Task<T> {
    pub priority: Priority,
    pub payload: T,
    state: TaskState,
}

impl<T> Task<T> {
    pub const fn new(priority: Priority, payload: T) -> Self {
        Self {
            priority,
            payload,
            state: TaskState::Pending,
        }
    }

    #[inline]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Moves the task to `next`, rejecting transitions that skip states
    /// or resurrect a terminal task.
    pub fn transition(&mut self, next: TaskState) -> Result<(), SchedulerError> {
        if self.state.can_transition_to(next) {
            self.state = next;
            Ok(())
        } else {
            Err(SchedulerError::InvalidTransition)
        }
    }
}

/// Four priority queues of `Task<T>`. Use [`Scheduler::split`] to obtain
/// the per-core handles; the bare `Scheduler` has no way to dequeue.
pub struct Scheduler<T> {
    critical: Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
    high: Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
    normal: Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
    low: Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
}

impl<T> Scheduler<T> {
    pub const fn new() -> Self {
        Self {
            critical: Queue::new(),
            high: Queue::new(),
            normal: Queue::new(),
            low: Queue::new(),
        }
    }

    /// Enqueues `payload` at `priority`.
    ///
    /// # Errors
    /// Returns `SchedulerError::QueueFull` if that priority's queue is
    /// at `SCHEDULER_QUEUE_DEPTH`.
    pub fn submit(&mut self, priority: Priority, payload: T) -> Result<(), SchedulerError> {
        let task = Task::new(priority, payload);
        let queue = match priority {
            Priority::Critical => &mut self.critical,
            Priority::High => &mut self.high,
            Priority::Normal => &mut self.normal,
            Priority::Low => &mut self.low,
        };
        queue.enqueue(task).map_err(|_| SchedulerError::QueueFull)
    }

    /// Splits the scheduler into a Core-1 handle (Critical queue only)
    /// and a Core-0 handle (High/Normal/Low, drained in that order).
    pub fn split(&mut self) -> (Core1Handle<'_, T>, Core0Handle<'_, T>) {
        (
            Core1Handle {
                queue: &mut self.critical,
            },
            Core0Handle {
                high: &mut self.high,
                normal: &mut self.normal,
                low: &mut self.low,
            },
        )
    }

    /// Total number of queued tasks across all priorities, for
    /// diagnostics.
    pub fn pending_count(&self) -> usize {
        self.critical.len() + self.high.len() + self.normal.len() + self.low.len()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Core-1's only way to touch the scheduler: the Critical queue feeding
/// the UART interrupt-context work.
pub struct Core1Handle<'a, T> {
    queue: &'a mut Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
}

impl<T> Core1Handle<'_, T> {
    pub fn dequeue(&mut self) -> Option<Task<T>> {
        self.queue.dequeue()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Core-0's handle over the three cooperative queues, drained strictly
/// High, then Normal, then Low.
pub struct Core0Handle<'a, T> {
    high: &'a mut Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
    normal: &'a mut Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
    low: &'a mut Queue<Task<T>, SCHEDULER_QUEUE_DEPTH>,
}

impl<T> Core0Handle<'_, T> {
    /// Pops the highest-priority task available, or `None` if all three
    /// queues are empty.
    pub fn dequeue(&mut self) -> Option<Task<T>> {
        self.high
            .dequeue()
            .or_else(|| self.normal.dequeue())
            .or_else(|| self.low.dequeue())
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.normal.is_empty() && self.low.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core0_drains_in_priority_order() {
        let mut scheduler: Scheduler<u8> = Scheduler::new();
        scheduler.submit(Priority::Low, 1).unwrap();
        scheduler.submit(Priority::Normal, 2).unwrap();
        scheduler.submit(Priority::High, 3).unwrap();

        let (_core1, mut core0) = scheduler.split();
        assert_eq!(core0.dequeue().unwrap().payload, 3);
        assert_eq!(core0.dequeue().unwrap().payload, 2);
        assert_eq!(core0.dequeue().unwrap().payload, 1);
        assert!(core0.dequeue().is_none());
    }

    #[test]
    fn critical_queue_is_only_reachable_via_core1_handle() {
        let mut scheduler: Scheduler<u8> = Scheduler::new();
        scheduler.submit(Priority::Critical, 42).unwrap();
        scheduler.submit(Priority::High, 7).unwrap();

        let (mut core1, mut core0) = scheduler.split();
        // Core-0's handle never sees the Critical task, regardless of order.
        assert_eq!(core0.dequeue().unwrap().payload, 7);
        assert!(core0.dequeue().is_none());
        assert_eq!(core1.dequeue().unwrap().payload, 42);
    }

    #[test]
    fn queue_full_is_reported() {
        let mut scheduler: Scheduler<u8> = Scheduler::new();
        // heapless::spsc::Queue<_, N> holds at most N-1 elements, so drive
        // submissions until one is rejected rather than assuming the exact
        // count.
        let mut submitted = 0usize;
        while scheduler.submit(Priority::Low, 0).is_ok() {
            submitted += 1;
            assert!(submitted <= SCHEDULER_QUEUE_DEPTH, "queue never reported full");
        }
        assert_eq!(
            scheduler.submit(Priority::Low, 0xFF),
            Err(SchedulerError::QueueFull)
        );
    }

    #[test]
    fn task_state_transitions_are_validated() {
        let mut task = Task::new(Priority::Normal, ());
        assert_eq!(task.state(), TaskState::Pending);
        task.transition(TaskState::Running).unwrap();
        task.transition(TaskState::Completed).unwrap();
        assert_eq!(
            task.transition(TaskState::Running),
            Err(SchedulerError::InvalidTransition)
        );
    }
}
