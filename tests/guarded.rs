use std::sync::Arc;
use std::thread;

use guarded_sync::{
    ConcurrentQueue, ExclusiveLock, Guarded, ReentrantLock, SerialQueue, Strategy, Synchronizer,
};
use rand::Rng;
use threadpool::ThreadPool;

#[cfg(test)]
#[ctor::ctor]
fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

#[test]
fn eight_callers_hundred_increments() {
    let counter = Guarded::new(0);
    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    counter.mutate(|n| n + 1);
                }
            });
        }
    });
    assert_eq!(counter.get(), 800);
}

fn thousand_increments<S>(sync: S)
where S: Synchronizer + Send + 'static {
    let counter = Arc::new(Guarded::with_synchronizer(0usize, sync));
    let pool = ThreadPool::new(8);
    for _ in 0..1000 {
        let counter = Arc::clone(&counter);
        pool.execute(move || counter.mutate(|n| n + 1));
    }
    pool.join();
    assert_eq!(counter.get(), 1000);
}

#[test]
fn mutate_is_atomic_for_every_strategy() {
    thousand_increments(ExclusiveLock::new());
    thousand_increments(ReentrantLock::new());
    thousand_increments(SerialQueue::new());
    thousand_increments(ConcurrentQueue::new());
}

/// Writers append `(writer, step)` with `mutate` and now and then start over
/// with `set`. Any serial history leaves each writer's steps strictly
/// increasing; lost or torn updates would not.
fn no_lost_or_torn_updates<S: Synchronizer>(sync: S) {
    let log = Guarded::with_synchronizer(Vec::<(usize, usize)>::new(), sync);
    thread::scope(|s| {
        for writer in 0..4 {
            let log = &log;
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                for step in 0..100 {
                    if rng.gen_ratio(1, 20) {
                        log.set(vec![(writer, step)]);
                    } else {
                        log.mutate(|entries| {
                            let mut next = entries.clone();
                            next.push((writer, step));
                            next
                        });
                    }
                }
            });
        }
    });
    let entries = log.get();
    for writer in 0..4 {
        let steps: Vec<usize> = entries.iter().filter(|(w, _)| *w == writer).map(|(_, s)| *s).collect();
        assert!(steps.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn writes_are_serializable_for_every_strategy() {
    no_lost_or_torn_updates(ExclusiveLock::new());
    no_lost_or_torn_updates(ReentrantLock::new());
    no_lost_or_torn_updates(SerialQueue::new());
    no_lost_or_torn_updates(ConcurrentQueue::new());
}

#[test]
fn shared_synchronizer_spans_values() {
    let sync = Arc::new(SerialQueue::new());
    let from = Guarded::with_synchronizer(100, Arc::clone(&sync));
    let to = Guarded::with_synchronizer(0, Arc::clone(&sync));
    // moving funds under one write keeps the sum stable for any reader of
    // the same synchronizer
    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..50 {
                sync.write(|| {
                    from.mutate(|n| n - 1);
                    to.mutate(|n| n + 1);
                });
            }
        });
        s.spawn(|| {
            for _ in 0..50 {
                let total = sync.read(|| from.get() + to.get());
                assert_eq!(total, 100);
            }
        });
    });
    assert_eq!((from.get(), to.get()), (50, 50));
}

#[test]
fn runtime_selected_strategy() {
    for strategy in [
        Strategy::from(ExclusiveLock::new()),
        Strategy::from(ReentrantLock::new()),
        Strategy::from(SerialQueue::new()),
        Strategy::from(ConcurrentQueue::new()),
    ] {
        let value = Guarded::with_synchronizer(String::new(), strategy);
        value.set("a".into());
        value.mutate(|s| format!("{}b", s));
        assert_eq!(value.with(|s| s.clone()), "ab");
    }
}

/// `get`, `set` and `mutate` called back from inside `mutate`; the outer
/// transform's result is stored last.
fn nested_access_inside_mutate<S: Synchronizer>(sync: S) {
    let value = Guarded::with_synchronizer(1, sync);
    value.mutate(|n| {
        assert_eq!(value.get(), 1);
        value.set(10);
        assert_eq!(value.get(), 10);
        value.mutate(|m| m + 5);
        assert_eq!(value.get(), 15);
        n + 1
    });
    assert_eq!(value.get(), 2);
}

#[test]
fn reentrant_lock_allows_nested_access() {
    nested_access_inside_mutate(ReentrantLock::new());
}

#[test]
fn serial_queue_allows_nested_access() {
    nested_access_inside_mutate(SerialQueue::new());
}

#[test]
fn concurrent_queue_allows_nested_access() {
    nested_access_inside_mutate(ConcurrentQueue::new());
}

#[test]
fn nested_get_inside_with() {
    let queue = ConcurrentQueue::new();
    let value = Guarded::with_synchronizer(vec![1, 2, 3], &queue);
    let total = value.with(|items| items.iter().sum::<i32>() + value.get().len() as i32);
    assert_eq!(total, 9);
}

#[test]
fn random_get_set_mix() {
    let value: Arc<Guarded<Option<Arc<u8>>, ConcurrentQueue>> = Arc::new(Guarded::default());
    let pool = ThreadPool::new(8);
    for _ in 0..1000 {
        let value = Arc::clone(&value);
        pool.execute(move || {
            if rand::random::<bool>() {
                value.set(Some(Arc::new(1)));
            } else {
                drop(value.get());
            }
        });
    }
    pool.join();
    assert_eq!(pool.panic_count(), 0);
}
