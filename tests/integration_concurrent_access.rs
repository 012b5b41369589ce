use scopewire::{Bindings, Container, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct ExpensiveService {
    id: usize,
}

#[test]
fn test_concurrent_singleton_creation() {
    const THREADS: usize = 16;

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let container = Container::new();
    container
        .register_singletons(Bindings::new().bind(move |_| {
            // Widen the race window
            thread::sleep(Duration::from_millis(20));
            Ok(ExpensiveService {
                id: counter.fetch_add(1, Ordering::SeqCst),
            })
        }))
        .unwrap();

    let barrier = Barrier::new(THREADS);
    let instances: Vec<Arc<ExpensiveService>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let container = &container;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    container.get::<ExpensiveService>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    for instance in &instances {
        assert!(Arc::ptr_eq(instance, &instances[0]));
        assert_eq!(instance.id, 0);
    }
}

#[test]
fn test_concurrent_scoped_creation_in_one_scope() {
    const THREADS: usize = 8;

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let container = Container::new();
    container
        .register_scoped(Bindings::new().bind(move |_| {
            thread::sleep(Duration::from_millis(10));
            Ok(ExpensiveService {
                id: counter.fetch_add(1, Ordering::SeqCst),
            })
        }))
        .unwrap();

    let scope = container.create_scope();
    let barrier = Barrier::new(THREADS);
    thread::scope(|s| {
        for _ in 0..THREADS {
            let scope = &scope;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                assert_eq!(scope.get::<ExpensiveService>().unwrap().id, 0);
            });
        }
    });

    assert_eq!(builds.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_singleton_build_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let container = Container::new();
    container
        .register_singletons(Bindings::new().bind_fallible(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("warming up")
            } else {
                Ok(ExpensiveService { id: 1 })
            }
        }))
        .unwrap();

    assert!(container.get::<ExpensiveService>().is_err());
    let first = container.get::<ExpensiveService>().unwrap();
    let second = container.get::<ExpensiveService>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_registration_while_resolving() {
    let container = Container::new();
    container.register_singletons(Bindings::new().bind_value(1u64)).unwrap();

    thread::scope(|s| {
        let reader = s.spawn(|| {
            for _ in 0..1_000 {
                assert!(container.get::<u64>().is_ok());
            }
        });
        let writer = s.spawn(|| {
            for i in 0..100u32 {
                container.register_transients(Bindings::new().bind(move |_| Ok(i))).unwrap();
            }
        });
        reader.join().unwrap();
        writer.join().unwrap();
    });

    assert_eq!(*container.get::<u32>().unwrap(), 99);
}

#[test]
fn test_fan_out_builds_shared_singleton_once() {
    struct Shared;
    struct Part(#[allow(dead_code)] Arc<Shared>);
    struct Assembly(Vec<Arc<Part>>);

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let container = Container::new();
    container
        .register_singletons(Bindings::new().bind(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            Ok(Shared)
        }))
        .unwrap();
    container
        .register_transients(
            Bindings::new()
                .bind(|r| Ok(Part(r.get()?)))
                .bind(|ctx| {
                    let parts = thread::scope(|s| {
                        let handles: Vec<_> = (0..4)
                            .map(|_| {
                                let branch = ctx.fork();
                                s.spawn(move || branch.get::<Part>())
                            })
                            .collect();
                        handles
                            .into_iter()
                            .map(|h| h.join().unwrap())
                            .collect::<Result<Vec<_>, _>>()
                    })?;
                    Ok(Assembly(parts))
                }),
        )
        .unwrap();

    let assembly = container.get::<Assembly>().unwrap();
    assert_eq!(assembly.0.len(), 4);
    assert_eq!(builds.load(Ordering::SeqCst), 1);
}
