use std::cell::RefCell;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use tracing::debug;

/// Hands background work to the single-threaded executor.
///
/// Spawned tasks are detached: there is no handle, no cancellation, and a
/// task's failure is its own to log.
pub trait Spawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// `tokio::task::spawn_local`. Must be called from inside a `LocalSet`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Copy, Clone)]
pub struct TokioSpawner;

#[cfg(not(target_arch = "wasm32"))]
impl Spawner for TokioSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }
}

/// The page's microtask queue.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Copy, Clone)]
pub struct BrowserSpawner;

#[cfg(target_arch = "wasm32")]
impl Spawner for BrowserSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Holds spawned tasks until the owner runs them, in spawn order.
///
/// Lets a caller observe the state between "work scheduled" and "work done".
/// Clones share one queue.
#[derive(Default, Clone)]
pub struct DeferredSpawner {
    pending: Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>,
}

impl DeferredSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run queued tasks to completion, including any they spawn in turn.
    pub async fn run_all(&self) {
        loop {
            let batch = std::mem::take(&mut *self.pending.borrow_mut());
            if batch.is_empty() {
                return;
            }
            debug!(tasks = batch.len(), "running deferred tasks");
            for task in batch {
                task.await;
            }
        }
    }
}

impl Spawner for DeferredSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.pending.borrow_mut().push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferredSpawner, Spawner};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test]
    async fn deferred_tasks_run_in_spawn_order() {
        let spawner = DeferredSpawner::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            spawner.spawn_local(Box::pin(async move { log.borrow_mut().push(i) }));
        }
        assert_eq!(spawner.pending(), 3);
        assert!(log.borrow().is_empty());

        spawner.run_all().await;
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(spawner.pending(), 0);
    }

    #[tokio::test]
    async fn nested_spawns_are_drained() {
        let spawner = DeferredSpawner::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_spawner = spawner.clone();
        let inner_log = log.clone();
        spawner.spawn_local(Box::pin(async move {
            inner_log.borrow_mut().push("outer");
            let log = inner_log.clone();
            inner_spawner.spawn_local(Box::pin(async move { log.borrow_mut().push("inner") }));
        }));

        spawner.run_all().await;
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn tokio_spawner_runs_inside_local_set() {
        use super::TokioSpawner;

        let local = tokio::task::LocalSet::new();
        let hit = Rc::new(RefCell::new(false));
        let flag = hit.clone();
        local
            .run_until(async move {
                TokioSpawner.spawn_local(Box::pin(async move { *flag.borrow_mut() = true }));
                tokio::task::yield_now().await;
            })
            .await;
        local.await;
        assert!(*hit.borrow());
    }
}
