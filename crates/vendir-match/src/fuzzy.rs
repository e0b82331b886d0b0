//! Fuzzy string matching primitives for the city cascade.

/// Minimum normalized similarity for a fuzzy candidate to be accepted.
/// The boundary is inclusive: exactly 0.70 passes.
pub const FUZZY_THRESHOLD: f64 = 0.70;

/// Minimum length for substring containment to count as a partial match;
/// shorter fragments collide with too many unrelated names.
const MIN_CONTAINMENT_LEN: usize = 4;

/// Classic Levenshtein edit distance over Unicode scalar values.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

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

/// Normalized similarity: `1 - distance / max(len(a), len(b))`.
///
/// Computed over character counts, so diacritics count as single symbols.
/// Two empty strings are fully similar.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = levenshtein(a, b) as f64 / longest as f64;
    1.0 - ratio
}

/// `true` when one lowercased string contains the other, with both long
/// enough to make containment meaningful.
#[must_use]
pub fn contains_either_way(a: &str, b: &str) -> bool {
    if a.chars().count() < MIN_CONTAINMENT_LEN || b.chars().count() < MIN_CONTAINMENT_LEN {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Best candidate by normalized similarity, if any clears [`FUZZY_THRESHOLD`].
///
/// Comparison is case-insensitive. Ties keep the earliest candidate, which
/// makes the outcome deterministic for a stable canonical list.
#[must_use]
pub fn best_fuzzy_match<'a>(query: &str, candidates: &'a [String]) -> Option<(&'a str, f64)> {
    let query = query.to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = similarity(&query, &candidate.to_lowercase());
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((candidate.as_str(), score));
        }
    }
    best.filter(|&(_, score)| score >= FUZZY_THRESHOLD)
}
