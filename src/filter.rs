//! Location filtering over the CWA dataset payload.
//!
//! # Dataset Shape
//!
//! Successful upstream responses nest their location records along a fixed
//! path:
//!
//! ```text
//! cwaopendata -> Dataset -> Locations -> Location (array)
//! ```
//!
//! Each array element carries a `LocationName` field among others. The full
//! dataset holds dozens of stations and routinely exceeds hosting-platform
//! response-size limits, which is why the proxy reduces it to the single
//! requested record.
//!
//! # Fallback Semantics
//!
//! A payload without that nested path cannot be filtered safely, so it is
//! passed through untouched rather than rejected. A payload WITH the path
//! but without the requested record is a hard 404: returning the oversized
//! full dataset instead would likely fail downstream anyway.

use serde_json::Value;

/// Top-level container key of the CWA file API payload.
const CONTAINER_KEY: &str = "cwaopendata";
/// Dataset key under the container.
const DATASET_KEY: &str = "Dataset";
/// Locations wrapper key under the dataset.
const LOCATIONS_KEY: &str = "Locations";
/// The location record array key.
const LOCATION_KEY: &str = "Location";
/// Name field on each location record.
const LOCATION_NAME_KEY: &str = "LocationName";

/// Outcome of filtering a parsed payload for a single location.
#[derive(Debug)]
pub enum FilterOutcome {
    /// The record was found; holds the minimized payload with the location
    /// array reduced to that one record.
    Matched(Value),
    /// The dataset path exists but no record carries the requested name.
    NotFound,
    /// The payload does not have the expected nested shape; the caller
    /// should pass the original body through unchanged.
    Unfilterable,
}

/// Borrow the location record array, if the payload has the expected shape.
fn location_array(payload: &Value) -> Option<&Vec<Value>> {
    payload
        .get(CONTAINER_KEY)?
        .get(DATASET_KEY)?
        .get(LOCATIONS_KEY)?
        .get(LOCATION_KEY)?
        .as_array()
}

/// Filter a parsed payload down to the single record named `location_name`.
///
/// The scan is a linear first-match over the record array; names are
/// compared exactly and case-sensitively. On a match the minimized payload
/// keeps the original nesting and every sibling field (dataset metadata,
/// descriptions) - only the `Location` array shrinks to one element.
pub fn filter_location(payload: &Value, location_name: &str) -> FilterOutcome {
    let Some(records) = location_array(payload) else {
        return FilterOutcome::Unfilterable;
    };

    let matched = records.iter().find(|record| {
        record
            .get(LOCATION_NAME_KEY)
            .and_then(Value::as_str)
            .is_some_and(|name| name == location_name)
    });

    match matched {
        Some(record) => FilterOutcome::Matched(minimize(payload, record.clone())),
        None => FilterOutcome::NotFound,
    }
}

/// Rebuild the payload with the location array reduced to `record`.
///
/// Clones the original and swaps the array in place so sibling fields at
/// every nesting level survive.
fn minimize(payload: &Value, record: Value) -> Value {
    let mut minimized = payload.clone();

    if let Some(slot) = minimized
        .get_mut(CONTAINER_KEY)
        .and_then(|v| v.get_mut(DATASET_KEY))
        .and_then(|v| v.get_mut(LOCATIONS_KEY))
        .and_then(|v| v.get_mut(LOCATION_KEY))
    {
        *slot = Value::Array(vec![record]);
    }

    minimized
}
