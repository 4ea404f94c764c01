//! Small string helpers shared by the roster extractors.

/// Split run-together words at every lowercase → uppercase boundary.
///
/// `"AgricultureEducation and the Workforce"` becomes
/// `["Agriculture", "Education and the Workforce"]`. Acronyms stay intact
/// because an uppercase letter following another uppercase letter does not
/// start a new word.
pub fn camel_case_split(s: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut prev_lower = false;

    for c in s.chars() {
        match words.last_mut() {
            Some(word) if !(prev_lower && c.is_uppercase()) => word.push(c),
            _ => words.push(c.to_string()),
        }
        prev_lower = c.is_lowercase();
    }

    words
}

/// Collapse runs of whitespace into single spaces and trim.
pub(crate) fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
