#![no_main]

use libfuzzer_sys::fuzz_target;
use portal_service::config::SigningKey;
use portal_service::crypto;
use std::sync::OnceLock;

static KEY: OnceLock<Option<SigningKey>> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let Some(key) = KEY.get_or_init(|| SigningKey::new(vec![0x5a; 32]).ok()) else {
        return;
    };

    // Arbitrary input must be rejected with an error, never a panic
    if let Ok(token) = std::str::from_utf8(data) {
        let _ = crypto::validate_token(token, key);
    }
});
