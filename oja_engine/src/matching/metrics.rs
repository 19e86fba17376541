//! String similarity metrics used by the catalog resolver.
//!
//! All metrics operate on `char` sequences, so multi-byte input (₦, accented names) never panics
//! or splits a code point.

/// Classic dynamic-programming Levenshtein edit distance.
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
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Levenshtein distance normalized to a similarity in `[0, 1]`.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Jaro similarity, the base metric for Jaro-Winkler.
fn jaro(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut b_matched = vec![false; b.len()];
    let mut matches = Vec::with_capacity(a.len());
    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && *ca == b[j] {
                b_matched[j] = true;
                matches.push((i, j));
                break;
            }
        }
    }
    if matches.is_empty() {
        return 0.0;
    }
    let m = matches.len() as f64;
    // Transpositions: matched characters out of order, counted pairwise.
    let b_order: Vec<usize> = matches.iter().map(|&(_, j)| j).collect();
    let transpositions = b_order.windows(2).filter(|w| w[0] > w[1]).count() as f64;
    (m / a.len() as f64 + m / b.len() as f64 + (m - transpositions) / m) / 3.0
}

/// Jaro-Winkler similarity: Jaro with a bonus for a shared prefix of up to 4 characters.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    const PREFIX_SCALE: f64 = 0.1;
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let jaro_score = jaro(&a, &b);
    let prefix_len = a.iter().zip(b.iter()).take(4).take_while(|(ca, cb)| ca == cb).count();
    jaro_score + prefix_len as f64 * PREFIX_SCALE * (1.0 - jaro_score)
}

/// Fraction of the smaller word set that also appears in the larger one.
pub fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let (smaller, larger) = if words_a.len() <= words_b.len() { (&words_a, &words_b) } else { (&words_b, &words_a) };
    let shared = smaller.iter().filter(|w| larger.contains(w)).count();
    shared as f64 / smaller.len() as f64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("rice", "rice"), 0);
        assert_eq!(levenshtein("ric", "rice"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "yam"), 3);
        assert_eq!(levenshtein("ugu", ""), 3);
    }

    #[test]
    fn levenshtein_similarity_is_normalized() {
        assert_eq!(levenshtein_similarity("rice", "rice"), 1.0);
        assert_eq!(levenshtein_similarity("", ""), 1.0);
        assert!((levenshtein_similarity("ric", "rice") - 0.75).abs() < 1e-9);
        assert_eq!(levenshtein_similarity("yam", "rice"), 0.0);
    }

    #[test]
    fn jaro_winkler_basics() {
        assert_eq!(jaro_winkler("rice", "rice"), 1.0);
        assert_eq!(jaro_winkler("yam", "xqz"), 0.0);
        // Shared prefixes score higher than the same edits elsewhere.
        assert!(jaro_winkler("rice", "rise") > jaro_winkler("rice", "dice"));
        let martha = jaro_winkler("martha", "marhta");
        assert!((martha - 0.9611).abs() < 1e-3);
    }

    #[test]
    fn jaro_winkler_handles_unicode() {
        assert_eq!(jaro_winkler("ẹ̀fọ́", "ẹ̀fọ́"), 1.0);
        assert!(jaro_winkler("ẹ̀fọ́ riro", "efo riro") > 0.5);
    }

    #[test]
    fn word_overlap_uses_the_smaller_set() {
        assert_eq!(word_overlap("fresh rice", "rice"), 1.0);
        assert_eq!(word_overlap("sweet yam", "yellow garri"), 0.0);
        assert!((word_overlap("big red beans", "red beans") - 1.0).abs() < 1e-9);
        assert_eq!(word_overlap("", "rice"), 0.0);
    }
}
