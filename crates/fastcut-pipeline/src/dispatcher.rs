//! Bounded-concurrency work dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use fastcut_models::WorkItem;

/// Runs per-item async workers with at most `concurrency` in flight.
///
/// Every submitted item yields exactly one result, in completion order. A
/// panicking worker is converted into a per-item error instead of taking
/// down the batch.
#[derive(Debug, Clone)]
pub struct WorkDispatcher {
    concurrency: usize,
}

impl WorkDispatcher {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    /// Run `worker` over all items, returning `(item, result)` pairs in
    /// completion order.
    pub async fn dispatch<T, R, F, Fut>(
        &self,
        items: Vec<WorkItem<T>>,
        worker: F,
    ) -> Vec<(WorkItem<T>, Result<R, String>)>
    where
        T: Clone + Send + 'static,
        R: Send + 'static,
        F: Fn(WorkItem<T>) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::with_capacity(items.len());

        debug!(
            "Dispatching {} items across {} slots",
            items.len(),
            self.concurrency
        );

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            // The worker future is built eagerly but only polled once a
            // permit is held, so the bound applies to the work itself.
            let work = worker(item.clone());
            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("dispatcher semaphore closed");
                work.await
            });
            in_flight.insert(handle.id(), item);
        }

        let mut results = Vec::with_capacity(in_flight.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, value)) => {
                    if let Some(item) = in_flight.remove(&id) {
                        results.push((item, Ok(value)));
                    }
                }
                Err(join_err) => {
                    let id = join_err.id();
                    match in_flight.remove(&id) {
                        Some(item) => {
                            warn!("Worker for item {} failed: {}", item.index, join_err);
                            results.push((item, Err(format!("worker crashed: {join_err}"))));
                        }
                        None => warn!("Unknown worker task failed: {}", join_err),
                    }
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn items(n: usize) -> Vec<WorkItem<usize>> {
        (1..=n).map(|i| WorkItem::new(i, i, n)).collect()
    }

    #[tokio::test]
    async fn test_every_item_yields_one_result() {
        let dispatcher = WorkDispatcher::new(2);
        let results = dispatcher.dispatch(items(5), |item| async move { item.payload * 10 }).await;

        assert_eq!(results.len(), 5);
        let mut payloads: Vec<usize> = results
            .iter()
            .map(|(item, r)| {
                assert_eq!(*r.as_ref().unwrap(), item.payload * 10);
                item.payload
            })
            .collect();
        payloads.sort_unstable();
        assert_eq!(payloads, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_concurrency_bound_is_enforced() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let dispatcher = WorkDispatcher::new(2);
        let results = dispatcher
            .dispatch(items(8), {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                move |_item| {
                    let active = Arc::clone(&active);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                }
            })
            .await;

        assert_eq!(results.len(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_isolated() {
        let dispatcher = WorkDispatcher::new(3);
        let results = dispatcher
            .dispatch(items(4), |item| async move {
                if item.payload == 2 {
                    panic!("boom");
                }
                item.payload
            })
            .await;

        assert_eq!(results.len(), 4);
        let failed: Vec<_> = results.iter().filter(|(_, r)| r.is_err()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0.payload, 2);
        assert!(failed[0].1.as_ref().unwrap_err().contains("crashed"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_clamped_to_one() {
        let dispatcher = WorkDispatcher::new(0);
        let results = dispatcher.dispatch(items(2), |item| async move { item.payload }).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let dispatcher = WorkDispatcher::new(4);
        let results = dispatcher
            .dispatch(Vec::<WorkItem<usize>>::new(), |item| async move { item.payload })
            .await;
        assert!(results.is_empty());
    }
}
