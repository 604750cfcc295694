//! Bounded worker pool.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs one async task per item with at most `concurrency` in flight.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// A pool with the given cap. A cap of zero is raised to one.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Apply `f` to every item and collect the outputs in input order.
    ///
    /// A task that panics is logged and left out of the output.
    pub async fn run<T, F, Fut, R>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        F: Fn(usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let f = Arc::new(f);
        let mut set = JoinSet::new();

        for (idx, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let f = Arc::clone(&f);
            set.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                (idx, f(idx, item).await)
            });
        }

        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, output)) => slots[idx] = Some(output),
                Err(e) => tracing::error!(error = %e, "worker task failed"),
            }
        }

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_outputs_keep_input_order() {
        let pool = WorkerPool::new(3);
        let out = pool
            .run((0..10u64).collect(), |_, n| async move {
                // Later items finish first.
                tokio::time::sleep(Duration::from_millis(20 - n)).await;
                n * 2
            })
            .await;
        assert_eq!(out, (0..10u64).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let pool = WorkerPool::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        pool.run(vec![(); 8], move |_, ()| {
            let active = Arc::clone(&a);
            let peak = Arc::clone(&p);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_zero_concurrency_is_raised() {
        assert_eq!(WorkerPool::new(0).concurrency(), 1);
    }
}
