use scopewire::{key_of_type, Bindings, Container, DiError, Lifetime, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Database {
    url: String,
}

struct Repository {
    db: Arc<Database>,
}

struct Handler {
    repo: Arc<Repository>,
}

fn container() -> Container {
    let container = Container::new();
    container
        .register_singletons(Bindings::new().bind_value(Database {
            url: "postgres://localhost".to_string(),
        }))
        .unwrap();
    container
        .register_transients(
            Bindings::new()
                .bind(|r| Ok(Repository { db: r.get()? }))
                .bind(|r| Ok(Handler { repo: r.get()? })),
        )
        .unwrap();
    container
}

#[test]
fn test_nested_resolution() {
    let container = container();
    let handler = container.get::<Handler>().unwrap();
    assert_eq!(handler.repo.db.url, "postgres://localhost");
}

#[test]
fn test_singleton_shared_by_transients() {
    let container = container();
    let a = container.get::<Handler>().unwrap();
    let b = container.get::<Handler>().unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a.repo, &b.repo));
    assert!(Arc::ptr_eq(&a.repo.db, &b.repo.db));
}

#[test]
fn test_transient_builder_runs_every_time() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let container = Container::new();
    container
        .register_transients(Bindings::new().bind(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42u32)
        }))
        .unwrap();

    for _ in 0..5 {
        assert_eq!(*container.get::<u32>().unwrap(), 42);
    }
    assert_eq!(builds.load(Ordering::SeqCst), 5);
}

#[test]
fn test_unregistered_type_is_unresolvable() {
    let container = Container::new();
    match container.get::<Database>() {
        Err(DiError::Unresolvable { owner, parameter, reason, .. }) => {
            assert!(owner.ends_with("Database"));
            assert_eq!(parameter, None);
            assert!(reason.contains("no registration"));
        }
        other => panic!("expected Unresolvable, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_try_get() {
    let container = container();
    assert!(container.try_get::<Database>().unwrap().is_some());
    assert!(container.try_get::<String>().unwrap().is_none());
}

#[test]
fn test_builder_error_keeps_its_cause() {
    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectError;

    let container = Container::new();
    container
        .register_singletons(
            Bindings::new().bind_fallible(|_| -> Result<Database, ConnectError> { Err(ConnectError) }),
        )
        .unwrap();

    let err = container.get::<Database>().err().unwrap();
    assert!(err.is_unresolvable());
    assert!(err.to_string().contains("Failed to create instance: connection refused"));

    let source = std::error::Error::source(&err).expect("cause preserved");
    assert_eq!(source.to_string(), "connection refused");
}

#[test]
fn test_failing_dependency_is_reported_to_dependent() {
    let container = Container::new();
    container
        .register_transients(Bindings::new().bind(|r| Ok(Repository { db: r.get()? })))
        .unwrap();

    // Database is missing: the error names it, not the repository
    let err = container.get::<Repository>().err().unwrap();
    match err {
        DiError::Unresolvable { owner, .. } => assert!(owner.ends_with("Database")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_introspection() {
    let container = container();
    let db = key_of_type::<Database>();

    assert_eq!(container.len(), 3);
    assert!(!container.is_empty());
    assert!(container.is_registered(&db));
    assert_eq!(container.lifetime_of(&db), Some(Lifetime::Singleton));
    assert_eq!(container.lifetime_of(&key_of_type::<Handler>()), Some(Lifetime::Transient));
    assert_eq!(container.lifetime_of(&key_of_type::<String>()), None);

    container.get::<Handler>().unwrap();
    container.get::<Handler>().unwrap();
    assert_eq!(container.resolution_count(&key_of_type::<Handler>()), 2);
    assert_eq!(container.resolution_count(&db), 2);
    assert_eq!(container.resolution_count(&key_of_type::<String>()), 0);
}

#[test]
fn test_clear_forces_fresh_build() {
    let builds = Arc::new(AtomicUsize::new(0));

    let register = |container: &Container| {
        let counter = builds.clone();
        container
            .register_singletons(Bindings::new().bind(move |_| {
                Ok(counter.fetch_add(1, Ordering::SeqCst))
            }))
            .unwrap();
    };

    let container = Container::new();
    register(&container);
    let first = container.get::<usize>().unwrap();

    container.clear();
    assert!(container.is_empty());
    assert!(container.get::<usize>().is_err());
    // Holders keep their instance
    assert_eq!(*first, 0);

    register(&container);
    let second = container.get::<usize>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_container_clones_share_state() {
    let container = Container::new();
    let clone = container.clone();
    clone.register_singletons(Bindings::new().bind_value(5u8)).unwrap();

    let a = container.get::<u8>().unwrap();
    let b = clone.get::<u8>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
