#![allow(dead_code)]

//! Shared constructors for router integration tests.

use maskroute::{Params, RefUrl, RequestUrl, Value};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test subscriber so match/construct logging shows up in
/// failing runs. Filtering follows `RUST_LOG`; installation is
/// process-wide and idempotent.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Request on the canonical test host with the root base path.
pub fn request(path: &str) -> RequestUrl {
    RequestUrl::new("http", "example.com", path)
}

/// Request on an explicit host.
pub fn request_on(host: &str, path: &str) -> RequestUrl {
    RequestUrl::new("http", host, path)
}

/// The canonical reference URL for construction.
pub fn reference() -> RefUrl {
    RefUrl::new("http", "example.com", "/")
}

/// String-valued parameter mapping.
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), Value::String((*value).to_string())))
        .collect()
}
