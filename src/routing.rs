//! Route resolution and upstream query reconstruction.
//!
//! # Two-Tier Path Resolution
//!
//! The upstream resource path can arrive two ways:
//!
//! 1. As the `path` query parameter (the hosting platform's rewrite rule
//!    maps `/cwa-proxy/* -> ?path=:splat`)
//! 2. Embedded in the raw request path under a fixed prefix, when the
//!    request reaches the handler without being rewritten
//!
//! Resolution runs an ordered list of strategies and takes the first
//! non-empty result, so further routing sources can be added without
//! restructuring the handler.
//!
//! # Query Reconstruction
//!
//! The query string forwarded upstream contains every incoming pair except
//! the routing parameter, in document order. Pairs are parsed with
//! `form_urlencoded` into an ordered `Vec` rather than a map: the forwarded
//! order must be deterministic per input, and map iteration order is not.

use url::form_urlencoded;

use crate::config::{Config, PATH_PARAM};

/// An ordered query-parameter list, preserving document order and duplicates.
pub type QueryPairs = Vec<(String, String)>;

/// Parse a raw query string into ordered key/value pairs.
///
/// An absent or empty query yields an empty list.
pub fn parse_query(raw_query: Option<&str>) -> QueryPairs {
    match raw_query {
        Some(q) if !q.is_empty() => form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Look up the first value for a key in an ordered parameter list.
pub fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// A single route-resolution strategy.
///
/// Returns `Some(path)` only for a non-empty upstream path; strategies
/// that do not apply return `None` so the next one is consulted.
type Resolver = fn(&[(String, String)], &str, &Config) -> Option<String>;

/// Tier 1: the designated routing query parameter.
fn resolve_from_query(
    pairs: &[(String, String)],
    _raw_path: &str,
    _config: &Config,
) -> Option<String> {
    first_value(pairs, PATH_PARAM)
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
}

/// Tier 2: strip the fixed known prefix from the raw request path.
fn resolve_from_prefix(
    _pairs: &[(String, String)],
    raw_path: &str,
    config: &Config,
) -> Option<String> {
    raw_path
        .strip_prefix(&config.route_prefix)
        .filter(|rest| !rest.is_empty())
        .map(|rest| rest.to_string())
}

/// Strategies in priority order. First non-empty result wins.
const RESOLVERS: &[Resolver] = &[resolve_from_query, resolve_from_prefix];

/// Resolve the upstream resource path for a request.
///
/// Returns `None` when no strategy yields a usable path; the caller turns
/// that into a `MissingRoute` response.
pub fn resolve_upstream_path(
    pairs: &[(String, String)],
    raw_path: &str,
    config: &Config,
) -> Option<String> {
    RESOLVERS
        .iter()
        .find_map(|resolve| resolve(pairs, raw_path, config))
}

/// Build the parameter list forwarded upstream.
///
/// Every incoming pair except the routing parameter, original order kept.
/// The location filter parameter is intentionally retained: it is consumed
/// locally for filtering but still forwarded, matching the upstream API
/// which also accepts it.
pub fn forwarded_params(pairs: &[(String, String)]) -> QueryPairs {
    pairs
        .iter()
        .filter(|(k, _)| k != PATH_PARAM)
        .cloned()
        .collect()
}
