//! Cache hit classification
//!
//! The cache CLI does not report hits in a structured form, so a hit is
//! inferred from its exit code and the text it printed. The miss phrases
//! below track the CLI's current wording and must be updated with it.

/// Lowercase phrases that mark a restore as a miss
const MISS_PATTERNS: &[&str] = &["cache miss", "no cache entries", "found 0/"];

/// Decide whether a restore invocation hit the cache.
///
/// A non-zero exit is always a miss. A zero exit is a hit unless the
/// captured output contains one of the miss phrases (case-insensitive).
/// Empty output with a zero exit counts as a hit.
pub fn classify(exit_code: i32, output: &str) -> bool {
    if exit_code != 0 {
        return false;
    }

    if output.is_empty() {
        return true;
    }

    let lowered = output.to_lowercase();
    !MISS_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}
