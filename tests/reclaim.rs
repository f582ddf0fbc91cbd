//! Retire list and collection tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use zincir::{collect, min_active_snapshot, pin, retire};

struct CountedNode {
    #[allow(dead_code)]
    value: usize,
    drops: Arc<AtomicUsize>,
}

impl CountedNode {
    fn new(value: usize, drops: Arc<AtomicUsize>) -> *mut Self {
        Box::into_raw(Box::new(Self { value, drops }))
    }
}

impl Drop for CountedNode {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

unsafe fn retire_counted(ptr: *mut CountedNode) {
    unsafe {
        retire(ptr, move || {
            drop(unsafe { Box::from_raw(ptr) });
        });
    }
}

#[test]
fn collect_frees_unprotected_nodes() {
    let drops = Arc::new(AtomicUsize::new(0));
    for i in 0..50 {
        unsafe { retire_counted(CountedNode::new(i, drops.clone())) };
    }
    collect();
    assert_eq!(drops.load(Ordering::SeqCst), 50);
}

#[test]
fn retire_lists_are_thread_local() {
    let drops = Arc::new(AtomicUsize::new(0));
    let drops_remote = drops.clone();

    thread::spawn(move || {
        for i in 0..10 {
            unsafe { retire_counted(CountedNode::new(i, drops_remote.clone())) };
        }
        // The spawning thread's collect below cannot reach these; this
        // thread frees its own on exit.
    })
    .join()
    .unwrap();

    collect();
    assert_eq!(
        drops.load(Ordering::SeqCst),
        10,
        "thread exit should have swept its own retire list"
    );
}

#[test]
fn threshold_triggers_automatic_collect() {
    let drops = Arc::new(AtomicUsize::new(0));
    // Past the collect threshold, retiring alone must start freeing.
    for i in 0..1000 {
        unsafe { retire_counted(CountedNode::new(i, drops.clone())) };
    }
    assert!(
        drops.load(Ordering::SeqCst) > 0,
        "automatic collect never fired"
    );
    collect();
    assert_eq!(drops.load(Ordering::SeqCst), 1000);
}

#[test]
fn min_active_snapshot_tracks_guards() {
    // Nothing published from this test yet.
    let a = pin();
    let b = pin();
    a.set_snapshot(9);
    b.set_snapshot(4);
    let min = min_active_snapshot();
    assert!(min <= 4, "published snapshots must bound the minimum");

    b.clear_snapshot();
    let min = min_active_snapshot();
    assert!(min <= 9);

    drop(a);
    drop(b);
}
