/// Property-based tests for resolution
///
/// These tests check lifetime and cycle behavior over generated
/// configurations rather than hand-picked ones.

use proptest::prelude::*;
use scopewire::{Bindings, Container, Lifetime, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct ServiceA {
    value: String,
}

struct Counted(#[allow(dead_code)] usize);

fn lifetime_strategy() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Singleton),
        Just(Lifetime::Scoped),
        Just(Lifetime::Transient),
    ]
}

// Property: singletons resolve to the same instance from the root and every scope
proptest! {
    #[test]
    fn singleton_resolution_consistency(service_value in "\\PC{0,50}", scopes in 0usize..4) {
        let container = Container::new();
        container
            .register_singletons(Bindings::new().bind_value(ServiceA { value: service_value.clone() }))
            .unwrap();

        let root = container.get::<ServiceA>().unwrap();
        prop_assert_eq!(&root.value, &service_value);

        for _ in 0..scopes {
            let scope = container.create_scope();
            prop_assert!(Arc::ptr_eq(&root, &scope.get::<ServiceA>().unwrap()));
        }
    }
}

// Property: the number of builds follows from the lifetime alone
proptest! {
    #[test]
    fn build_count_matches_lifetime(
        lifetime in lifetime_strategy(),
        scope_count in 1usize..5,
        gets_per_scope in 1usize..5,
    ) {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();

        let container = Container::new();
        container
            .register(
                lifetime,
                Bindings::new().bind(move |_| Ok(Counted(counter.fetch_add(1, Ordering::SeqCst)))),
            )
            .unwrap();

        for _ in 0..scope_count {
            let scope = container.create_scope();
            for _ in 0..gets_per_scope {
                scope.get::<Counted>().unwrap();
            }
        }

        let expected = match lifetime {
            Lifetime::Singleton => 1,
            Lifetime::Scoped => scope_count,
            Lifetime::Transient => scope_count * gets_per_scope,
        };
        prop_assert_eq!(builds.load(Ordering::SeqCst), expected);
    }
}

// Property: re-registering under any other lifetime is rejected and changes nothing
proptest! {
    #[test]
    fn lifetime_conflicts_are_rejected(first in lifetime_strategy(), second in lifetime_strategy()) {
        let container = Container::new();
        container.register(first, Bindings::new().bind(|_| Ok(Counted(0)))).unwrap();

        let result = container.register(second, Bindings::new().bind(|_| Ok(Counted(1))));
        if first == second {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.unwrap_err().is_lifetime());
        }
        prop_assert_eq!(container.lifetime_of(&scopewire::key_of_type::<Counted>()), Some(first));
    }
}

// Property: a ring of any length is reported with the full chain
proptest! {
    #[test]
    fn ring_cycles_report_full_chain(len in 1usize..6, start in 0usize..6) {
        struct Node<const N: usize>;

        fn ring_bindings(len: usize) -> Bindings {
            macro_rules! link {
                ($b:expr, $n:literal) => {{
                    let next = ($n + 1) % len;
                    $b.bind(move |r| {
                        match next {
                            0 => { r.get::<Node<0>>()?; }
                            1 => { r.get::<Node<1>>()?; }
                            2 => { r.get::<Node<2>>()?; }
                            3 => { r.get::<Node<3>>()?; }
                            4 => { r.get::<Node<4>>()?; }
                            _ => { r.get::<Node<5>>()?; }
                        }
                        Ok(Node::<$n>)
                    })
                }};
            }
            let b = link!(Bindings::new(), 0);
            let b = link!(b, 1);
            let b = link!(b, 2);
            let b = link!(b, 3);
            let b = link!(b, 4);
            link!(b, 5)
        }

        let start = start % len;
        let container = Container::new();
        container.register_transients(ring_bindings(len)).unwrap();

        let err = match start {
            0 => container.get::<Node<0>>().map(|_| ()),
            1 => container.get::<Node<1>>().map(|_| ()),
            2 => container.get::<Node<2>>().map(|_| ()),
            3 => container.get::<Node<3>>().map(|_| ()),
            4 => container.get::<Node<4>>().map(|_| ()),
            _ => container.get::<Node<5>>().map(|_| ()),
        }
        .unwrap_err();

        let chain = err.chain().unwrap();
        prop_assert_eq!(chain.len(), len + 1);
        prop_assert_eq!(chain.first(), chain.last());
    }
}
