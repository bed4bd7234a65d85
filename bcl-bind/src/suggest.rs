//! "Did you mean" suggestions for misspelled names.

/// Jaro-Winkler similarity below which a candidate is not suggested.
const SIMILARITY_THRESHOLD: f64 = 0.6;

/// The candidate most similar to `unknown`, if any is similar enough.
pub(crate) fn did_you_mean<'a>(
    unknown: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let mut best_match: Option<(&'a str, f64)> = None;

    for candidate in candidates {
        let similarity = strsim::jaro_winkler(unknown, candidate);
        if similarity >= SIMILARITY_THRESHOLD
            && best_match.is_none_or(|(_, best)| similarity > best)
        {
            best_match = Some((candidate, similarity));
        }
    }

    best_match.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_closest_candidate() {
        let candidates = ["name", "description", "tags", "tag"];
        assert_eq!(did_you_mean("tagz", candidates), Some("tag"));
        assert_eq!(did_you_mean("nmae", candidates), Some("name"));
    }

    #[test]
    fn ignores_distant_candidates() {
        assert_eq!(did_you_mean("zzz", ["name", "description"]), None);
        assert_eq!(did_you_mean("name", []), None);
    }
}
