#![no_main]

use libfuzzer_sys::fuzz_target;
use scopewire::{key_of_type, Bindings, Container, Lifetime, Resolver};

struct First(u8);
struct Second(u8);
struct Third(u8);

fn lifetime(byte: u8) -> Lifetime {
    match byte % 3 {
        0 => Lifetime::Singleton,
        1 => Lifetime::Scoped,
        _ => Lifetime::Transient,
    }
}

fuzz_target!(|data: &[u8]| {
    let container = Container::new();

    // Each chunk is one batch: [lifetime, mask, value]
    for chunk in data.chunks_exact(3) {
        let (lifetime, mask, value) = (lifetime(chunk[0]), chunk[1], chunk[2]);
        let mut batch = Bindings::new();
        if mask & 1 != 0 {
            batch = batch.bind(move |_| Ok(First(value)));
        }
        if mask & 2 != 0 {
            batch = batch.bind(move |_| Ok(Second(value)));
        }
        if mask & 4 != 0 {
            batch = batch.bind(move |_| Ok(Third(value)));
        }

        let before = container.snapshot();
        if container.register(lifetime, batch).is_err() {
            // Failed batches leave no trace
            assert_eq!(container.snapshot(), before);
        }
    }

    let scope = container.create_scope();
    for (key, resolved) in [
        (key_of_type::<First>(), scope.get::<First>().map(|v| v.0)),
        (key_of_type::<Second>(), scope.get::<Second>().map(|v| v.0)),
        (key_of_type::<Third>(), scope.get::<Third>().map(|v| v.0)),
    ] {
        assert_eq!(container.is_registered(&key), resolved.is_ok());
    }
});
