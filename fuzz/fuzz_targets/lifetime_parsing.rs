#![no_main]

use libfuzzer_sys::fuzz_target;
use scopewire::Lifetime;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    match input.parse::<Lifetime>() {
        Ok(lifetime) => {
            // Anything accepted must round-trip through its canonical name
            assert_eq!(lifetime.as_str(), input.trim().to_ascii_lowercase());
            assert_eq!(lifetime.to_string().parse::<Lifetime>().ok(), Some(lifetime));
        }
        Err(err) => assert!(err.is_lifetime()),
    }
});
