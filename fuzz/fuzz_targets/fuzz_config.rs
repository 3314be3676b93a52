#![no_main]

//! Config parser fuzzer.
//!
//! Arbitrary text must either fail to parse cleanly or yield a config that
//! passes validation and round-trips through JSON.

use libfuzzer_sys::fuzz_target;
use wealthscape::SimConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = SimConfig::from_json_str(text) else {
        return;
    };

    assert!(config.validate().is_ok(), "Parsed config failed validation");
    let json = serde_json::to_string(&config).expect("config serializes");
    let again = SimConfig::from_json_str(&json).expect("serialized config parses");
    assert_eq!(config, again);
});
