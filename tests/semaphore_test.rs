/*!
 * Named Semaphore Tests
 * Capacity bounds, blocking and suspending waits, free/close semantics
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;
use vstools_sync::core::errors::SyncError;
use vstools_sync::core::sync::{Concurrent, CriticalSection, SemaphoreRegistry, Synchronized};

#[test]
fn test_capacity_two_admits_two_of_three() {
    let registry = Arc::new(SemaphoreRegistry::new());
    registry.alloc("R", 2).unwrap();

    let start = Arc::new(Barrier::new(3));
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..3)
        .map(|worker| {
            let registry = registry.clone();
            let start = start.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                start.wait();
                let acquired = registry.get("R", None, 2).unwrap();
                tx.send(worker).unwrap();
                acquired
            })
        })
        .collect();
    drop(tx);

    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_ne!(first, second);

    // third caller is parked until a permit comes back
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(registry.available("R"), Some(0));

    registry.release("R").unwrap();
    rx.recv_timeout(Duration::from_secs(2)).unwrap();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
#[serial]
fn test_build_slot_scenario_on_global_registry() {
    let name = "semaphore-test/build-slot";
    Synchronized::alloc(name, 2).unwrap();

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let running = running.clone();
            let peak = peak.clone();
            thread::spawn(move || {
                assert!(Synchronized::get(name, None, 2).unwrap());
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(30));
                running.fetch_sub(1, Ordering::SeqCst);
                Synchronized::release(name).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(SemaphoreRegistry::global().available(name), Some(2));
    assert!(Synchronized::free(name));
}

#[test]
fn test_get_times_out() {
    let registry = SemaphoreRegistry::new();
    assert!(registry.get("slot", Some(Duration::from_millis(10)), 1).unwrap());
    assert!(!registry.get("slot", Some(Duration::from_millis(30)), 1).unwrap());
}

#[test]
fn test_get_allocates_on_first_use() {
    let registry = SemaphoreRegistry::new();
    assert!(!registry.contains("lazy"));

    assert!(registry.get("lazy", Some(Duration::ZERO), 3).unwrap());
    assert_eq!(registry.capacity("lazy"), Some(3));
    assert_eq!(registry.available("lazy"), Some(2));
}

#[test]
fn test_release_unknown_name() {
    let registry = SemaphoreRegistry::new();
    assert_eq!(
        registry.release("missing"),
        Err(SyncError::SemaphoreNotFound("missing".to_string()))
    );
}

#[test]
fn test_over_release_is_absorbed() {
    let registry = SemaphoreRegistry::new();
    registry.alloc("capped", 1).unwrap();
    registry.release("capped").unwrap();
    registry.release("capped").unwrap();
    assert_eq!(registry.available("capped"), Some(1));
}

#[test]
fn test_zero_capacity_rejected() {
    let registry = SemaphoreRegistry::new();
    assert_eq!(
        registry.alloc("empty", 0).map(|_| ()),
        Err(SyncError::InvalidCapacity(0))
    );
    assert!(registry.is_empty());
}

#[test]
fn test_free_wakes_blocked_waiter() {
    let registry = Arc::new(SemaphoreRegistry::new());
    registry.alloc("doomed", 1).unwrap();
    assert!(registry.get("doomed", None, 1).unwrap());

    let registry_clone = registry.clone();
    let waiter = thread::spawn(move || registry_clone.get("doomed", None, 1));

    thread::sleep(Duration::from_millis(50));
    assert!(registry.free("doomed"));

    assert_eq!(
        waiter.join().unwrap(),
        Err(SyncError::SemaphoreClosed("doomed".to_string()))
    );
    assert!(!registry.free("doomed"));
}

#[test]
fn test_lock_free_of_critical_sections() {
    // a held family lock must not block semaphore traffic
    struct Job {
        section: CriticalSection,
    }

    impl Concurrent for Job {
        type Family = Job;

        fn critical_section(&self) -> &CriticalSection {
            &self.section
        }
    }

    let name = "semaphore-test/independent";
    Job::static_thread_safe(|| {
        let acquired = thread::spawn(move || {
            let acquired = Job::get(name, Some(Duration::from_secs(1)), 1).unwrap();
            Job::release(name).unwrap();
            acquired
        })
        .join()
        .unwrap();
        assert!(acquired);
    });
    assert!(Job::free(name));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_async_suspends_until_release() {
    let registry = Arc::new(SemaphoreRegistry::new());
    registry.alloc("async-slot", 1).unwrap();
    assert!(registry.get_async("async-slot", None, 1).await.unwrap());

    let registry_clone = registry.clone();
    let waiter = tokio::spawn(async move {
        registry_clone
            .get_async("async-slot", Some(Duration::from_secs(2)), 1)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());
    registry.release("async-slot").unwrap();

    assert_eq!(waiter.await.unwrap(), Ok(true));
}

#[tokio::test]
async fn test_get_async_timeout() {
    let registry = SemaphoreRegistry::new();
    assert!(registry.get_async("busy", None, 1).await.unwrap());
    let acquired = registry
        .get_async("busy", Some(Duration::from_millis(20)), 1)
        .await
        .unwrap();
    assert!(!acquired);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_and_blocking_waiters_share_permits() {
    let registry = Arc::new(SemaphoreRegistry::new());
    registry.alloc("mixed", 2).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                assert!(registry.get_async("mixed", None, 2).await.unwrap());
                tokio::time::sleep(Duration::from_millis(5)).await;
                registry.release("mixed").unwrap();
            })
        })
        .collect();

    let registry_clone = registry.clone();
    let blocking = tokio::task::spawn_blocking(move || {
        assert!(registry_clone.get("mixed", None, 2).unwrap());
        registry_clone.release("mixed").unwrap();
    });

    futures::future::join_all(tasks)
        .await
        .into_iter()
        .for_each(|r| r.unwrap());
    blocking.await.unwrap();

    assert_eq!(registry.available("mixed"), Some(2));
}
