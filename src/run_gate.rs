use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::watch;

/// Single-flight gate for one transfer kind.
///
/// `try_acquire` is a check-and-set under one lock, so two requests can never
/// both see "not running". The returned [`GatePermit`] releases the gate when
/// dropped, which covers every way a runner can finish, panics included.
///
/// Every release bumps a generation counter under the same lock. A waiter
/// remembers the generation of the job it is waiting on and is woken by the
/// bump, so a new job starting right after the release cannot hold it.
#[derive(Debug)]
pub struct RunGate {
    running: StdMutex<bool>,
    finished: watch::Sender<u64>,
}

impl RunGate {
    pub fn new() -> Arc<Self> {
        let (finished, _) = watch::channel(0);
        Arc::new(RunGate {
            running: StdMutex::new(false),
            finished,
        })
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // The flag is a plain bool, a panic elsewhere cannot leave it torn.
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Caller holds the lock and the gate is running.
    fn completion_locked(&self) -> JobCompletion {
        let rx = self.finished.subscribe();
        let generation = *rx.borrow();
        JobCompletion { rx, generation }
    }

    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        let mut running = self.lock();
        if *running {
            return None;
        }
        *running = true;
        let completion = self.completion_locked();
        Some(GatePermit {
            gate: Arc::clone(self),
            completion,
        })
    }

    pub fn is_running(&self) -> bool {
        *self.lock()
    }

    /// Completion handle for the job running right now, if any.
    pub fn in_flight(&self) -> Option<JobCompletion> {
        let running = self.lock();
        running.then(|| self.completion_locked())
    }

    /// Resolves once the job running at call time has finished. Returns
    /// immediately when the gate is idle.
    pub async fn wait_idle(&self) {
        if let Some(job) = self.in_flight() {
            job.wait().await;
        }
    }

    fn release(&self) {
        let mut running = self.lock();
        *running = false;
        self.finished.send_modify(|generation| *generation += 1);
    }
}

/// Resolves when one particular job has released the gate, whatever has
/// happened to the gate since.
#[derive(Debug, Clone)]
pub struct JobCompletion {
    rx: watch::Receiver<u64>,
    generation: u64,
}

impl JobCompletion {
    pub async fn wait(mut self) {
        let generation = self.generation;
        // A dropped gate has no job left to wait for, so the error is ignored too.
        let _ = self.rx.wait_for(|current| *current != generation).await;
    }
}

/// Proof that the holder owns the gate. Dropping it releases the gate and
/// wakes every request waiting on this job.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<RunGate>,
    completion: JobCompletion,
}

impl GatePermit {
    pub fn completion(&self) -> JobCompletion {
        self.completion.clone()
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
