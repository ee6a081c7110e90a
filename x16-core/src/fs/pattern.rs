//! Filename patterns and case conversion.
//!
//! Guest filenames are raw bytes and stay that way on the host. Matching maps
//! each byte to the `char` with the same code point, so `glob` sees a
//! one-to-one image of the name and every byte value matches itself.

use glob::{MatchOptions, Pattern};

/// Shell-glob matching: case-sensitive, `*` may match a leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Byte-for-char image of a name, for `glob`.
fn widen(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Whether `name` contains `*` or `?`.
pub fn has_wildcards(name: &[u8]) -> bool {
    name.iter().any(|&b| b == b'*' || b == b'?')
}

/// Match `name` against a shell-glob `pattern`.
///
/// A malformed pattern (such as an unclosed `[`) matches nothing.
pub fn matches(pattern: &[u8], name: &[u8]) -> bool {
    Pattern::new(&widen(pattern))
        .map(|p| p.matches_with(&widen(name), MATCH_OPTIONS))
        .unwrap_or(false)
}

/// First name in enumeration order matching `pattern`, skipping `.` and `..`.
pub fn first_match<I, S>(pattern: &[u8], names: I) -> Option<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let compiled = Pattern::new(&widen(pattern)).ok()?;
    names
        .into_iter()
        .map(|n| n.as_ref().to_vec())
        .filter(|n| n != b"." && n != b"..")
        .find(|n| compiled.matches_with(&widen(n), MATCH_OPTIONS))
}

/// Resolve a guest filename against directory entries.
///
/// Wildcard names resolve to the first matching entry; anything else, or a
/// pattern with no match, is returned unchanged.
pub fn resolve_name<I, S>(filename: &[u8], names: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    if has_wildcards(filename) {
        if let Some(found) = first_match(filename, names) {
            return found;
        }
    }
    filename.to_vec()
}

/// Swap ASCII upper and lower case. Other bytes pass through.
///
/// # Examples
/// ```
/// use x16_core::fs::swap_case;
/// assert_eq!(swap_case(b"Hello.PRG"), b"hELLO.prg".to_vec());
/// ```
pub fn swap_case(name: &[u8]) -> Vec<u8> {
    name.iter()
        .map(|&b| {
            if b.is_ascii_uppercase() {
                b.to_ascii_lowercase()
            } else if b.is_ascii_lowercase() {
                b.to_ascii_uppercase()
            } else {
                b
            }
        })
        .collect()
}
