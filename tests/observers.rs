use scopewire::{Bindings, Container, DiError, DiObserver, Key, LoggingObserver, Resolver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl DiObserver for Recorder {
    fn resolving(&self, key: &Key) {
        self.events.lock().unwrap().push(format!("resolving {}", key.short_name()));
    }

    fn resolved(&self, key: &Key, _duration: Duration) {
        self.events.lock().unwrap().push(format!("resolved {}", key.short_name()));
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        let kind = if error.is_circular() { "circular" } else { "other" };
        self.events
            .lock()
            .unwrap()
            .push(format!("failed {} ({})", key.short_name(), kind));
    }
}

struct Database;
struct Repository(#[allow(dead_code)] Arc<Database>);

#[test]
fn test_nested_resolution_events() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container.add_observer(recorder.clone());
    container
        .register_transients(
            Bindings::new()
                .bind(|_| Ok(Database))
                .bind(|r| Ok(Repository(r.get()?))),
        )
        .unwrap();

    container.get::<Repository>().unwrap();
    assert_eq!(
        recorder.events(),
        vec![
            "resolving Repository",
            "resolving Database",
            "resolved Database",
            "resolved Repository",
        ]
    );
}

#[test]
fn test_failures_are_reported_at_every_level() {
    struct Ping(#[allow(dead_code)] Arc<Pong>);
    struct Pong(#[allow(dead_code)] Arc<Ping>);

    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container
        .register_transients(
            Bindings::new()
                .bind(|r| Ok(Ping(r.get()?)))
                .bind(|r| Ok(Pong(r.get()?))),
        )
        .unwrap();
    container.add_observer(recorder.clone());

    assert!(container.get::<Ping>().is_err());
    assert_eq!(
        recorder.events(),
        vec![
            "resolving Ping",
            "resolving Pong",
            "resolving Ping",
            "failed Ping (circular)",
            "failed Pong (circular)",
            "failed Ping (circular)",
        ]
    );
}

#[test]
fn test_scopes_report_to_root_observers() {
    let recorder = Arc::new(Recorder::default());
    let container = Container::new();
    container.register_scoped(Bindings::new().bind(|_| Ok(Database))).unwrap();
    container.add_observer(recorder.clone());

    let scope = container.create_scope();
    scope.get::<Database>().unwrap();
    assert!(container.get::<Database>().is_err());

    assert_eq!(
        recorder.events(),
        vec!["resolving Database", "resolved Database", "resolving Database", "failed Database (other)"]
    );
}

#[test]
fn test_multiple_observers_and_logging_observer() {
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());

    let container = Container::new();
    container.add_observer(first.clone());
    container.add_observer(Arc::new(LoggingObserver::with_prefix("checkout")));
    container.add_observer(second.clone());
    container.register_singletons(Bindings::new().bind_value(Database)).unwrap();

    container.get::<Database>().unwrap();
    assert_eq!(first.events(), second.events());
    assert_eq!(first.events().len(), 2);
}
