/// Main-thread task queue
///
/// Helper threads (file dialogs, asset loaders) hand work back to the render
/// thread through this queue. The renderer drains it once per frame, at the
/// top of `begin_render`, after the frame fence has been waited on.

use std::collections::VecDeque;
use std::sync::Mutex;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Producer/consumer queue of closures executed on the render thread
#[derive(Default)]
pub struct MainThreadQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl MainThreadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a task from any thread
    pub fn submit<F: FnOnce() + Send + 'static>(&self, task: F) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push_back(Box::new(task));
        }
    }

    /// Number of tasks waiting for the next drain
    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
    }

    /// Run every task queued so far, in submission order.
    ///
    /// Tasks submitted while draining run on the next call. The lock is not
    /// held while a task executes, so tasks may submit follow-up work.
    pub fn run_pending(&self) -> usize {
        let drained: Vec<Task> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => return 0,
        };
        let count = drained.len();
        for task in drained {
            task();
        }
        count
    }
}

#[cfg(test)]
#[path = "task_queue_tests.rs"]
mod tests;
