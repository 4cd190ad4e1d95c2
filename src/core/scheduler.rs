use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// A unit of work handed to a [`JobScheduler`]
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Background job runner used for asynchronous world steps
pub trait JobScheduler: Send + Sync {
    /// Queues a job; returns false if it was rejected (the job is dropped unrun)
    fn submit(&self, job: Job) -> bool;

    /// Whether the scheduler currently accepts work
    fn is_enabled(&self) -> bool;
}

/// A scheduler backed by a single worker thread fed through a channel.
///
/// Jobs run in submission order. Dropping the scheduler closes the channel
/// and joins the worker once queued jobs have finished.
pub struct ThreadScheduler {
    sender: Mutex<Option<Sender<Job>>>,
    worker: Option<Worker>,
}

impl ThreadScheduler {
    /// Spawns the worker thread
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Some(Worker::new(0, receiver)),
        }
    }

    /// Stops accepting jobs; already queued jobs still run
    pub fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler for ThreadScheduler {
    fn submit(&self, job: Job) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        }
    }

    fn is_enabled(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
    }
}

struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    fn new(id: usize, jobs: Receiver<Job>) -> Self {
        let thread = thread::spawn(move || {
            while let Ok(job) = jobs.recv() {
                if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                    tracing::warn!(worker = id, "scheduled job panicked");
                }
            }
        });

        Self { id, thread }
    }

    fn join(self) {
        if self.thread.join().is_err() {
            tracing::warn!(worker = self.id, "worker thread exited abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn jobs_run_in_order_before_drop_returns() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));
        {
            let scheduler = ThreadScheduler::new();
            for i in 0..4 {
                let counter = Arc::clone(&counter);
                let order = Arc::clone(&order);
                assert!(scheduler.submit(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    order.lock().unwrap().push(i);
                })));
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn shut_down_scheduler_rejects_jobs() {
        let scheduler = ThreadScheduler::new();
        scheduler.shutdown();
        assert!(!scheduler.is_enabled());
        assert!(!scheduler.submit(Box::new(|| {})));
    }

    #[test]
    fn panicking_job_does_not_kill_worker() {
        let scheduler = ThreadScheduler::new();
        let ran = Arc::new(AtomicUsize::new(0));
        assert!(scheduler.submit(Box::new(|| panic!("boom"))));
        let flag = Arc::clone(&ran);
        assert!(scheduler.submit(Box::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        })));
        drop(scheduler);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
