//! Fuzzy title matching.
//!
//! Titles are normalized, then compared with a normalized Levenshtein
//! ratio: `1 - distance / max(len_a, len_b)` over characters.

use crate::error::MetricsError;

/// Lowercase, turn every non-alphanumeric character into a space, and
/// collapse runs of whitespace. Applying it twice changes nothing.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let mapped: String = title
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity in `[0, 1]` of two already-normalized strings.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let score = 1.0 - levenshtein(&a, &b) as f64 / longest as f64;
    score
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Matches reference titles against candidate titles above a threshold.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMatcher {
    threshold: f64,
}

impl SimilarityMatcher {
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidThreshold`] unless `0 < threshold <= 1`.
    pub fn new(threshold: f64) -> Result<Self, MetricsError> {
        if threshold > 0.0 && threshold <= 1.0 {
            Ok(Self { threshold })
        } else {
            Err(MetricsError::InvalidThreshold(threshold))
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// For each reference title, the best candidate scoring at least the
    /// threshold, as `(reference_index, candidate_index)`. Unmatched
    /// references are omitted. Ties go to the earliest candidate.
    #[must_use]
    pub fn match_titles<R, C>(&self, references: &[R], candidates: &[C]) -> Vec<(usize, usize)>
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        let references: Vec<String> = references
            .iter()
            .map(|r| normalize_title(r.as_ref()))
            .collect();
        let candidates: Vec<String> = candidates
            .iter()
            .map(|c| normalize_title(c.as_ref()))
            .collect();
        self.match_normalized(&references, &candidates)
    }

    /// [`Self::match_titles`] over titles already passed through
    /// [`normalize_title`].
    #[must_use]
    pub fn match_normalized(&self, references: &[String], candidates: &[String]) -> Vec<(usize, usize)> {
        references
            .iter()
            .enumerate()
            .filter_map(|(ref_idx, reference)| {
                self.best_candidate(reference, candidates)
                    .map(|cand_idx| (ref_idx, cand_idx))
            })
            .collect()
    }

    fn best_candidate(&self, reference: &str, candidates: &[String]) -> Option<usize> {
        let ref_len = reference.chars().count();
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if candidate == reference {
                return Some(idx);
            }
            // distance >= length difference, so the ratio is capped by the
            // shorter/longer length quotient
            let cand_len = candidate.chars().count();
            let longest = ref_len.max(cand_len);
            if longest > 0 {
                #[allow(clippy::cast_precision_loss)]
                let cap = ref_len.min(cand_len) as f64 / longest as f64;
                if cap < self.threshold {
                    continue;
                }
            }
            let score = ratio(reference, candidate);
            if score >= self.threshold && best.is_none_or(|(_, top)| score > top) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("  Flaky Tests:  A Survey ", "flaky tests a survey")]
    #[case("Model-based testing (MBT)", "model based testing mbt")]
    #[case("", "")]
    #[case("ÉTUDE", "étude")]
    fn normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_title(raw), expected);
        assert_eq!(normalize_title(&normalize_title(raw)), expected);
    }

    #[test]
    fn ratio_bounds() {
        assert!((ratio("abc", "abc") - 1.0).abs() < f64::EPSILON);
        assert!(ratio("abc", "xyz").abs() < f64::EPSILON);
        assert!((ratio("", "") - 1.0).abs() < f64::EPSILON);
        assert!((ratio("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn matches_across_case_and_punctuation() {
        let matcher = SimilarityMatcher::new(0.85).unwrap();
        let refs = ["Mutation Testing at Scale", "Something unrelated entirely"];
        let cands = ["A study of flaky tests", "mutation testing at scale."];
        assert_eq!(matcher.match_titles(&refs, &cands), vec![(0, 1)]);
    }

    #[test]
    fn near_miss_above_threshold_matches() {
        let matcher = SimilarityMatcher::new(0.85).unwrap();
        let refs = ["regression test selection for continuous integration"];
        let cands = ["regression test selection in continuous integration"];
        assert_eq!(matcher.match_titles(&refs, &cands), vec![(0, 0)]);
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let matcher = SimilarityMatcher::new(0.5).unwrap();
        let refs = ["abcd"];
        let cands = ["abcx", "abcy", "abcd"];
        // exact match wins over earlier equal-scoring near misses
        assert_eq!(matcher.match_titles(&refs, &cands), vec![(0, 2)]);
        let cands = ["abcx", "abcy"];
        assert_eq!(matcher.match_titles(&refs, &cands), vec![(0, 0)]);
    }

    #[test]
    fn empty_candidates_match_nothing() {
        let matcher = SimilarityMatcher::new(0.85).unwrap();
        let none: [&str; 0] = [];
        assert!(matcher.match_titles(&["title"], &none).is_empty());
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(1.01)]
    #[case(f64::NAN)]
    fn rejects_bad_thresholds(#[case] threshold: f64) {
        assert!(SimilarityMatcher::new(threshold).is_err());
    }
}
