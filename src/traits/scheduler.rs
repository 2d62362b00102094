//! Contract with the cooperative task scheduler.

use embassy_time::{Duration, Instant};

/// Identifier handed out by [`Scheduler::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(usize);

impl TaskId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(&self) -> usize {
        self.0
    }
}

/// A schedulable unit of work.
///
/// The id of the firing registration is passed back in, so a single object
/// may stand behind several registrations and dispatch on the id.
pub trait Task {
    fn run(&self, id: TaskId);
}

/// Cooperative, single-threaded scheduler.
///
/// Tasks never run concurrently with each other; a registered task stays
/// dormant until planned through one of the `schedule_*` calls.
pub trait Scheduler {
    /// Register a task. The task does not run until scheduled.
    fn register(&self, task: &'static dyn Task) -> TaskId;

    /// Plan a task for an absolute deadline. `None` parks it indefinitely.
    fn schedule_at(&self, id: TaskId, deadline: Option<Instant>);

    /// Plan a task to run `delay` from now.
    fn schedule_after(&self, id: TaskId, delay: Duration);

    /// Plan a task for the next dispatch opportunity.
    fn schedule_now(&self, id: TaskId);

    /// Replan the currently running task `delay` from now.
    ///
    /// Only callable from within a task dispatched by this scheduler.
    fn schedule_self_after(&self, delay: Duration);
}
