//! Per-job serialization.
//!
//! The orchestrator is logically single-threaded per job: two concurrent
//! completions for sibling variants of the same job must never race on the
//! "is the job done" check. [`JobLocks`] hands out one `tokio::Mutex` per
//! `job_id`, created lazily and kept alive only while held — there is no
//! unbounded growth because the map itself is guarded by a short-lived
//! `std::sync::Mutex`, not by the per-job lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use loc_core::ResourceId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default, Clone)]
pub struct JobLocks {
    inner: Arc<StdMutex<HashMap<ResourceId, Arc<Mutex<()>>>>>,
}

impl JobLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `job_id`, blocking out any other in-flight
    /// handler for the same job until the guard is dropped.
    pub async fn lock(&self, job_id: ResourceId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().expect("job lock map poisoned");
            map.entry(job_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_job_serializes_concurrent_lockers() {
        let locks = JobLocks::new();
        let job_id = ResourceId::new();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let l1 = locks.clone();
        let o1 = order.clone();
        let h1 = tokio::spawn(async move {
            let _guard = l1.lock(job_id).await;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            o1.lock().unwrap().push(1);
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let l2 = locks.clone();
        let o2 = order.clone();
        let h2 = tokio::spawn(async move {
            let _guard = l2.lock(job_id).await;
            o2.lock().unwrap().push(2);
        });

        h1.await.unwrap();
        h2.await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn different_jobs_do_not_block_each_other() {
        let locks = JobLocks::new();
        let a = locks.lock(ResourceId::new()).await;
        let b = tokio::time::timeout(std::time::Duration::from_millis(50), locks.lock(ResourceId::new())).await;
        assert!(b.is_ok());
        drop(a);
    }
}
