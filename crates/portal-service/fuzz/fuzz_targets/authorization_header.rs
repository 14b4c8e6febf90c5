#![no_main]

use axum::http::{header, HeaderMap, HeaderValue};
use libfuzzer_sys::fuzz_target;
use portal_service::config::{AuthConfig, SigningKey, MIN_BCRYPT_COST};
use portal_service::middleware::AccessGate;
use std::sync::{Arc, OnceLock};

static GATE: OnceLock<Option<AccessGate>> = OnceLock::new();

fn gate() -> Option<AccessGate> {
    let key = SigningKey::new(vec![0x5a; 32]).ok()?;
    let auth = AuthConfig::new(key, 3600, MIN_BCRYPT_COST).ok()?;
    Some(AccessGate::new(Arc::new(auth)))
}

fuzz_target!(|data: &[u8]| {
    let Some(gate) = GATE.get_or_init(gate) else {
        return;
    };
    let Ok(value) = HeaderValue::from_bytes(data) else {
        return;
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);

    // Random header values never get past the gate
    assert!(gate.authorize(&headers).is_err());
});
