/*!
 * Dispose Lifecycle Tests
 * Idempotence under races, sink notification and mutual teardown
 */

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Weak};
use std::thread;
use vstools_sync::core::dispose::{
    Disposable, DisposeEventSink, DisposeLifecycle, DisposeState, Finalizable,
};

#[derive(Default)]
struct Counters {
    managed: AtomicUsize,
    unmanaged: AtomicUsize,
    finally: AtomicUsize,
}

struct Resource {
    lifecycle: DisposeLifecycle,
    counters: Arc<Counters>,
}

impl Resource {
    fn new(counters: Arc<Counters>) -> Self {
        Self {
            lifecycle: DisposeLifecycle::new(),
            counters,
        }
    }
}

impl Disposable for Resource {
    fn lifecycle(&self) -> &DisposeLifecycle {
        &self.lifecycle
    }

    fn dispose_managed(&self) {
        assert_eq!(self.dispose_state(), DisposeState::Disposing);
        self.counters.managed.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose_unmanaged(&self) {
        self.counters.unmanaged.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose_finally(&self) {
        assert_eq!(self.dispose_state(), DisposeState::Disposed);
        self.counters.finally.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every notification it receives
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<(&'static str, u64)>>,
}

impl Recorder {
    fn count(&self, kind: &str) -> usize {
        self.events.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl DisposeEventSink for Recorder {
    fn notify_disposing(&self, source: &dyn Disposable) {
        assert!(source.is_disposing());
        self.events.lock().push(("disposing", source.lifecycle().id()));
    }

    fn notify_disposed(&self, source: &dyn Disposable) {
        assert!(source.is_disposed());
        self.events.lock().push(("disposed", source.lifecycle().id()));
    }
}

#[test]
fn test_double_dispose_runs_hooks_once() {
    let counters = Arc::new(Counters::default());
    let resource = Resource::new(counters.clone());
    let recorder = Arc::new(Recorder::default());
    resource.advise_dispose(recorder.clone());

    assert!(resource.dispose());
    assert!(!resource.dispose());

    assert_eq!(counters.managed.load(Ordering::SeqCst), 1);
    assert_eq!(counters.unmanaged.load(Ordering::SeqCst), 1);
    assert_eq!(counters.finally.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count("disposing"), 1);
    assert_eq!(recorder.count("disposed"), 1);
}

#[test]
fn test_concurrent_dispose_from_two_threads() {
    for _ in 0..50 {
        let counters = Arc::new(Counters::default());
        let resource = Arc::new(Resource::new(counters.clone()));
        let recorder = Arc::new(Recorder::default());
        resource.advise_dispose(recorder.clone());

        let start = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let resource = resource.clone();
                let start = start.clone();
                thread::spawn(move || {
                    start.wait();
                    resource.dispose()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(counters.managed.load(Ordering::SeqCst), 1);
        assert_eq!(counters.unmanaged.load(Ordering::SeqCst), 1);
        assert_eq!(counters.finally.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.count("disposing"), 1);
        assert_eq!(recorder.count("disposed"), 1);
    }
}

#[test]
fn test_every_sink_notified_in_order() {
    let resource = Resource::new(Arc::new(Counters::default()));
    let recorders: Vec<_> = (0..3).map(|_| Arc::new(Recorder::default())).collect();
    for recorder in &recorders {
        resource.advise_dispose(recorder.clone());
    }

    resource.dispose();

    let id = resource.lifecycle().id();
    for recorder in &recorders {
        assert_eq!(
            *recorder.events.lock(),
            vec![("disposing", id), ("disposed", id)]
        );
    }
}

#[test]
fn test_unadvised_sink_not_notified() {
    let resource = Resource::new(Arc::new(Counters::default()));
    let recorder = Arc::new(Recorder::default());
    let sink: Arc<dyn DisposeEventSink> = recorder.clone();

    resource.advise_dispose(sink.clone());
    assert!(resource.unadvise_dispose(&sink));
    resource.dispose();

    assert!(recorder.events.lock().is_empty());
}

/// Unsubscribes itself from inside its first callback
struct OneShot {
    me: Weak<OneShot>,
    disposing: AtomicUsize,
    disposed: AtomicUsize,
}

impl DisposeEventSink for OneShot {
    fn notify_disposing(&self, source: &dyn Disposable) {
        self.disposing.fetch_add(1, Ordering::SeqCst);
        if let Some(me) = self.me.upgrade() {
            let me: Arc<dyn DisposeEventSink> = me;
            assert!(source.unadvise_dispose(&me));
        }
    }

    fn notify_disposed(&self, _: &dyn Disposable) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_sink_may_unadvise_itself_mid_callback() {
    let resource = Resource::new(Arc::new(Counters::default()));
    let one_shot = Arc::new_cyclic(|me| OneShot {
        me: me.clone(),
        disposing: AtomicUsize::new(0),
        disposed: AtomicUsize::new(0),
    });
    let recorder = Arc::new(Recorder::default());

    resource.advise_dispose(one_shot.clone());
    resource.advise_dispose(recorder.clone());
    resource.dispose();

    assert_eq!(one_shot.disposing.load(Ordering::SeqCst), 1);
    assert_eq!(one_shot.disposed.load(Ordering::SeqCst), 0);
    assert_eq!(recorder.count("disposing"), 1);
    assert_eq!(recorder.count("disposed"), 1);
    assert_eq!(resource.lifecycle().sink_count(), 1);
}

/// One end of a duplex channel; tearing down either end tears down both
struct ChannelEnd {
    lifecycle: DisposeLifecycle,
    closes: AtomicUsize,
}

impl Disposable for ChannelEnd {
    fn lifecycle(&self) -> &DisposeLifecycle {
        &self.lifecycle
    }

    fn dispose_unmanaged(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct PeerTeardown {
    peer: Weak<ChannelEnd>,
}

impl DisposeEventSink for PeerTeardown {
    fn notify_disposing(&self, _: &dyn Disposable) {
        if let Some(peer) = self.peer.upgrade() {
            peer.dispose();
        }
    }

    fn notify_disposed(&self, _: &dyn Disposable) {}
}

fn channel() -> (Arc<ChannelEnd>, Arc<ChannelEnd>) {
    let end = || {
        Arc::new(ChannelEnd {
            lifecycle: DisposeLifecycle::new(),
            closes: AtomicUsize::new(0),
        })
    };
    let (a, b) = (end(), end());
    a.advise_dispose(Arc::new(PeerTeardown {
        peer: Arc::downgrade(&b),
    }));
    b.advise_dispose(Arc::new(PeerTeardown {
        peer: Arc::downgrade(&a),
    }));
    (a, b)
}

#[test]
fn test_disposing_one_end_disposes_both() {
    let (a, b) = channel();

    assert!(a.dispose());

    assert!(a.is_disposed());
    assert!(b.is_disposed());
    assert_eq!(a.closes.load(Ordering::SeqCst), 1);
    assert_eq!(b.closes.load(Ordering::SeqCst), 1);
    assert!(!b.dispose());
}

#[test]
fn test_both_ends_disposed_concurrently() {
    for _ in 0..50 {
        let (a, b) = channel();
        let start = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [a.clone(), b.clone()]
            .into_iter()
            .map(|end| {
                let start = start.clone();
                thread::spawn(move || {
                    start.wait();
                    end.dispose();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(a.is_disposed());
        assert!(b.is_disposed());
        assert_eq!(a.closes.load(Ordering::SeqCst), 1);
        assert_eq!(b.closes.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_finalizable_drop_skips_managed() {
    let counters = Arc::new(Counters::default());
    let recorder = Arc::new(Recorder::default());

    {
        let resource = Finalizable::new(Resource::new(counters.clone()));
        resource.advise_dispose(recorder.clone());
    }

    assert_eq!(counters.managed.load(Ordering::SeqCst), 0);
    assert_eq!(counters.unmanaged.load(Ordering::SeqCst), 1);
    assert_eq!(counters.finally.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.count("disposed"), 1);
}

#[test]
fn test_finalizable_after_explicit_dispose() {
    let counters = Arc::new(Counters::default());
    let resource = Finalizable::new(Resource::new(counters.clone()));

    assert!(resource.dispose());
    drop(resource);

    assert_eq!(counters.managed.load(Ordering::SeqCst), 1);
    assert_eq!(counters.unmanaged.load(Ordering::SeqCst), 1);
}
