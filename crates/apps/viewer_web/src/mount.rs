use formats::FetchOptions;

pub const ATTR_ID: &str = "data-wof-id";
pub const ATTR_ALT_SOURCE: &str = "data-wof-alt-source";
pub const ATTR_ALT_FUNCTION: &str = "data-wof-alt-function";
pub const ATTR_ALT_EXTRA: &str = "data-wof-alt-extra";

/// Element revealed when the interactive map cannot be shown.
pub fn fallback_id(mount_id: &str) -> String {
    format!("{mount_id}-svg")
}

/// Fetch options from a mount element's alternate-geometry attributes.
///
/// A missing or blank source means the primary geometry.
pub fn fetch_options(
    source: Option<String>,
    function: Option<String>,
    extra: Option<String>,
) -> FetchOptions {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    match non_blank(source) {
        Some(source) => FetchOptions::alternate(source, non_blank(function), non_blank(extra)),
        None => FetchOptions::default(),
    }
}

/// The record id attribute, if it parses as an integer.
///
/// Sign is not checked here; the repository rejects non-positive ids.
pub fn record_id(raw: Option<String>) -> Option<i64> {
    raw?.trim().parse().ok()
}

/// A record id passed in from JavaScript as a number.
///
/// Non-finite, fractional, and out-of-range values are rejected rather than
/// truncated. Range is limited to integers a JS number represents exactly.
pub fn js_record_id(raw: f64) -> Option<i64> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    (raw.is_finite() && raw.fract() == 0.0 && raw.abs() <= MAX_SAFE).then_some(raw as i64)
}
