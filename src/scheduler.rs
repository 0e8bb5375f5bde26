//! Schedule-after-delay capability used for the deferred print step.
//!
//! The print task runs on the same single-threaded event loop as the setup,
//! so tasks are not required to be `Send`.

use log::debug;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// A deferred unit of work
pub type Task = Box<dyn FnOnce() + 'static>;

/// Runs a task once `delay` has elapsed.
///
/// There is no cancellation: once scheduled, a task will run.
pub trait Scheduler {
    fn schedule_after(&self, delay: Duration, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
    fn schedule_after(&self, delay: Duration, task: Task) {
        (**self).schedule_after(delay, task)
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule_after(&self, delay: Duration, task: Task) {
        (**self).schedule_after(delay, task)
    }
}

/// Runs every task synchronously, ignoring the delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        debug!("running task immediately (requested delay {:?})", delay);
        task();
    }
}

struct Pending {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: Vec<Pending>,
}

/// A scheduler driven by a virtual clock.
///
/// Tasks only run when the clock is advanced past their due time, in due
/// order (ties keep scheduling order).
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since creation
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Advance the clock by `by`, running every task that becomes due.
    /// Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.state.borrow_mut().now = target;
        ran
    }

    /// Advance until the queue is empty. Returns the number of tasks run.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let last_due = self.state.borrow().queue.iter().map(|p| p.due).max();
            match last_due {
                Some(due) => {
                    let by = due.saturating_sub(self.now());
                    ran += self.advance(by);
                }
                None => return ran,
            }
        }
    }

    // The borrow is released before the task runs, so tasks may schedule more.
    fn pop_due(&self, target: Duration) -> Option<Task> {
        let mut state = self.state.borrow_mut();
        let idx = state
            .queue
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= target)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        let pending = state.queue.swap_remove(idx);
        state.now = pending.due;
        Some(pending.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        let mut state = self.state.borrow_mut();
        state.seq += 1;
        let pending = Pending {
            due: state.now + delay,
            seq: state.seq,
            task,
        };
        state.queue.push(pending);
    }
}

/// Defers tasks on the current tokio `LocalSet`.
///
/// Must be used from within a `LocalSet` (for example
/// `LocalSet::run_until`); `spawn_local` panics otherwise.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn immediate_runs_synchronously() {
        let hit = Rc::new(Cell::new(false));
        let h = hit.clone();
        ImmediateScheduler.schedule_after(Duration::from_millis(500), Box::new(move || h.set(true)));
        assert!(hit.get());
    }

    #[test]
    fn manual_waits_for_due_time() {
        let s = ManualScheduler::new();
        let hit = Rc::new(Cell::new(0));
        let h = hit.clone();
        s.schedule_after(Duration::from_millis(500), Box::new(move || h.set(h.get() + 1)));
        assert_eq!(s.pending(), 1);

        assert_eq!(s.advance(Duration::from_millis(499)), 0);
        assert_eq!(hit.get(), 0);
        assert_eq!(s.advance(Duration::from_millis(1)), 1);
        assert_eq!(hit.get(), 1);
        assert_eq!(s.pending(), 0);
        assert_eq!(s.now(), Duration::from_millis(500));
    }

    #[test]
    fn manual_runs_in_due_order() {
        let s = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("late", 300u64), ("early", 100), ("tie", 100)] {
            let o = order.clone();
            s.schedule_after(Duration::from_millis(ms), Box::new(move || o.borrow_mut().push(name)));
        }
        assert_eq!(s.run_all(), 3);
        assert_eq!(*order.borrow(), vec!["early", "tie", "late"]);
    }

    #[test]
    fn tasks_may_schedule_more_tasks() {
        let s = Rc::new(ManualScheduler::new());
        let hit = Rc::new(Cell::new(false));
        let inner_s = s.clone();
        let h = hit.clone();
        s.schedule_after(
            Duration::from_millis(10),
            Box::new(move || {
                inner_s.schedule_after(Duration::from_millis(10), Box::new(move || h.set(true)));
            }),
        );
        assert_eq!(s.advance(Duration::from_millis(10)), 1);
        assert!(!hit.get());
        assert_eq!(s.run_all(), 1);
        assert!(hit.get());
        assert_eq!(s.now(), Duration::from_millis(20));
    }
}
