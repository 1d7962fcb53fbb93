//! Fuzz testing for request-input handling.
//!
//! All three functions under test sit directly behind attacker-controlled
//! input (query strings, resolved paths, upstream bodies) and must:
//!
//! - Never panic on any input
//! - Always return a valid Result or outcome
//! - Handle empty strings, long strings, broken percent-encoding, and
//!   arbitrarily shaped JSON
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the target
//! cargo +nightly fuzz run fuzz_request_input
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_request_input -- -max_total_time=60
//! ```

#![no_main]

use cwa_proxy::filter::filter_location;
use cwa_proxy::routing::{forwarded_params, parse_query};
use cwa_proxy::validation::validate_upstream_path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Query parsing and reconstruction (shouldn't panic)
        let pairs = parse_query(Some(s));
        let _ = forwarded_params(&pairs);

        // Resolved-path validation (shouldn't panic)
        let _ = validate_upstream_path(s);

        // Filtering over arbitrary JSON shapes (shouldn't panic)
        if let Ok(payload) = serde_json::from_str::<serde_json::Value>(s) {
            let _ = filter_location(&payload, "向陽山");
            let _ = filter_location(&payload, s);
        }
    }
});
