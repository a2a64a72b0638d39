//! Single background worker for a run.
//!
//! The interactive front end polls `is_done` instead of blocking; only one
//! worker runs at a time (the caller's contract) and there is no mid-run
//! cancellation.

use std::thread::JoinHandle;

use crate::error::QuotepressResult;

pub struct WorkerHandle<T> {
    thread: JoinHandle<T>,
}

impl<T> WorkerHandle<T> {
    /// True once the job function has returned or panicked.
    pub fn is_done(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and take its result.
    pub fn join(self) -> QuotepressResult<T> {
        self.thread
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked").into())
    }
}

/// Run `job` on a background thread.
pub fn spawn<T, F>(job: F) -> WorkerHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    WorkerHandle {
        thread: std::thread::spawn(job),
    }
}
