//! Closest-name suggestion for geometry mismatches.

use rapidfuzz::distance::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Most similar candidate, if it reaches [`SUGGESTION_THRESHOLD`].
pub fn closest_name<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let needle = name.to_lowercase();
    let mut best: Option<(f64, &'a str)> = None;
    for candidate in candidates {
        let score = jaro_winkler::similarity(needle.chars(), candidate.to_lowercase().chars());
        if score >= SUGGESTION_THRESHOLD && best.is_none_or(|(top, _)| score > top) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_name() {
        let names = ["Bo, Badjia", "Bo, Bagbo", "Kenema, Dama"];
        assert_eq!(closest_name("Bo, Badja", names), Some("Bo, Badjia"));
        assert_eq!(closest_name("Port Loko", names), None);
    }
}
