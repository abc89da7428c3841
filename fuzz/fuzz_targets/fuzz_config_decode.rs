//! Fuzz target: `SystemConfig::from_bytes`
//!
//! Arbitrary bytes must never panic the decoder.  Anything that decodes
//! and validates must survive a re-encode unchanged.
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use climatebox::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = SystemConfig::from_bytes(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }
    let bytes = config.to_bytes().expect("valid config must encode");
    let again = SystemConfig::from_bytes(&bytes).expect("own encoding must decode");
    assert_eq!(config, again);
});
