//! # Game-thread task queue
//!
//! Host callbacks may arrive on any thread, but script-side work has to run on
//! the game thread. [`GameThread`] remembers which thread that is; work raised
//! elsewhere is queued and run the next time the game thread pumps.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::thread::ThreadId;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the game thread's task queue. Cheap to clone.
#[derive(Clone)]
pub struct GameThread {
    id: ThreadId,
    tx: mpsc::UnboundedSender<Task>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Task>>>,
}

impl GameThread {
    /// Designates the calling thread as the game thread.
    pub fn current() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            id: std::thread::current().id(),
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn is_current(&self) -> bool {
        std::thread::current().id() == self.id
    }

    /// Queues `task` for the next [`pump`](GameThread::pump).
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        // the receiver lives as long as any clone of self, so this cannot fail
        let _ = self.tx.send(Box::new(task));
    }

    /// Runs `task` now if called on the game thread, otherwise queues it.
    pub fn run_or_post(&self, task: impl FnOnce() + Send + 'static) {
        if self.is_current() {
            task();
        } else {
            self.post(task);
        }
    }

    /// Runs every queued task. Tasks posted while pumping run in the same call.
    /// A panicking task is logged and does not stop the ones after it.
    ///
    /// Only the game thread may pump; elsewhere this is a no-op returning 0.
    pub fn pump(&self) -> usize {
        if !self.is_current() {
            tracing::warn!("game thread queue pumped from another thread, ignoring");
            return 0;
        }

        let mut ran = 0;
        loop {
            let batch = self.drain();
            if batch.is_empty() {
                return ran;
            }
            ran += batch.len();
            for task in batch {
                if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(task)) {
                    let message = payload
                        .downcast_ref::<&'static str>()
                        .copied()
                        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                        .unwrap_or("non-string panic payload");
                    tracing::error!(panic = message, "game thread task panicked");
                }
            }
        }
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.receiver().len()
    }

    // released before any task runs, so tasks may post or pump
    fn drain(&self) -> Vec<Task> {
        let mut rx = self.receiver();
        let mut batch = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(task) => batch.push(task),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return batch,
            }
        }
    }

    fn receiver(&self) -> std::sync::MutexGuard<'_, mpsc::UnboundedReceiver<Task>> {
        self.rx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for GameThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameThread")
            .field("id", &self.id)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn test_run_or_post_runs_inline_on_game_thread() {
        let game = GameThread::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        game.run_or_post(move || { h.fetch_add(1, Ordering::SeqCst); });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(game.pending(), 0);
    }

    #[test]
    fn test_other_threads_post_until_pumped() {
        let game = GameThread::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let remote = game.clone();
        let h = hits.clone();
        std::thread::spawn(move || {
            remote.run_or_post(move || { h.fetch_add(1, Ordering::SeqCst); });
            assert_eq!(remote.pump(), 0, "only the game thread may pump");
        })
        .join()
        .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(game.pending(), 1);
        assert_eq!(game.pump(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tasks_may_post_while_pumping() {
        let game = GameThread::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner = game.clone();
        let h = hits.clone();
        game.post(move || {
            let h2 = h.clone();
            inner.post(move || { h2.fetch_add(10, Ordering::SeqCst); });
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(game.pump(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_panicking_task_does_not_drop_the_rest() {
        let game = GameThread::current();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        game.post(move || { h.fetch_add(1, Ordering::SeqCst); });
        game.post(|| panic!("bad task"));
        let h = hits.clone();
        game.post(move || { h.fetch_add(1, Ordering::SeqCst); });

        assert_eq!(game.pump(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(game.pending(), 0);
    }
}
