//! Fuzzy whole-word similarity and suffix overlap for the repetition scan.

use once_cell::sync::Lazy;
use regex::Regex;

static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{P}+").expect("valid punctuation regex"));

/// Words with fewer cleaned characters than this are never fuzzy-matched.
const MIN_FUZZY_LEN: usize = 4;

fn clean(word: &str) -> String {
    PUNCTUATION_RE
        .replace_all(word, "")
        .trim()
        .to_lowercase()
}

/// Ratcliff/Obershelp matching-character ratio over the cleaned forms,
/// in `[0, 1]`. Longest common runs are located leftmost-first and the
/// flanks decomposed recursively, matching the classic definition.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = clean(a).chars().collect();
    let b: Vec<char> = clean(b).chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (start_a, start_b, len) = longest_common_run(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + len..], &b[start_b + len..])
}

fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // row[j + 1] holds the run length ending at a[i] / b[j]
    let mut row = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb { diagonal + 1 } else { 0 };
            if row[j + 1] > best.2 {
                best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
            }
            diagonal = above;
        }
    }
    best
}

/// Whether two surface forms are close enough to count as the same word.
///
/// Exact matches after stripping punctuation and case always qualify, so
/// plurals and conjugations of a shared root collapse together via the
/// ratio test while short function words stay apart.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    let a = clean(a);
    let b = clean(b);
    if a == b {
        return true;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().min(b.len()) < MIN_FUZZY_LEN {
        return false;
    }
    let ratio = 2.0 * matching_chars(&a, &b) as f64 / (a.len() + b.len()) as f64;
    ratio >= threshold
}

/// Longest shared case-insensitive suffix of at least `min_len` characters,
/// or the empty string when the overlap is shorter.
pub fn common_suffix(a: &str, b: &str, min_len: usize) -> String {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let mut run = 0;
    while run < a.len() && run < b.len() && a[a.len() - 1 - run] == b[b.len() - 1 - run] {
        run += 1;
    }
    if run >= min_len {
        a[a.len() - run..].iter().collect()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.8;

    #[test]
    fn identical_words_are_similar() {
        assert!(is_similar("gato", "gato", THRESHOLD));
        assert!(is_similar("Gato,", "gato", THRESHOLD));
        assert!(is_similar("sí", "sí", THRESHOLD));
    }

    #[test]
    fn is_similar_is_symmetric() {
        for (a, b) in [("gato", "gatos"), ("correr", "corría"), ("perro", "gato")] {
            assert_eq!(
                is_similar(a, b, THRESHOLD),
                is_similar(b, a, THRESHOLD),
                "asymmetric for {a}/{b}"
            );
        }
    }

    #[test]
    fn plural_of_same_root_is_similar() {
        assert!(is_similar("gato", "gatos", THRESHOLD));
        assert!(is_similar("caminaba", "caminaban", THRESHOLD));
    }

    #[test]
    fn short_words_never_fuzzy_match() {
        // "sol"/"son" share 2 of 3 chars but stay below the length floor
        assert!(!is_similar("sol", "son", THRESHOLD));
        assert!(!is_similar("de", "del", THRESHOLD));
    }

    #[test]
    fn unrelated_words_are_not_similar() {
        assert!(!is_similar("perro", "gato", THRESHOLD));
        assert!(!is_similar("perro", "gatos", THRESHOLD));
    }

    #[test]
    fn ratio_matches_known_values() {
        // 2 * 4 shared chars / (4 + 5)
        let ratio = similarity_ratio("gato", "gatos");
        assert!((ratio - 8.0 / 9.0).abs() < 1e-9);
        assert!((similarity_ratio("abc", "abc") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn punctuation_is_stripped_before_comparison() {
        assert!(is_similar("¡gato!", "gato", THRESHOLD));
        assert!(is_similar("«gatos»", "gato,", THRESHOLD));
    }

    #[test]
    fn common_suffix_requires_min_len() {
        assert_eq!(common_suffix("perro", "gato", 3), "");
        assert_eq!(common_suffix("cantaba", "saltaba", 3), "taba");
        assert_eq!(common_suffix("Cantaba", "SALTABA", 3), "taba");
    }

    #[test]
    fn common_suffix_is_empty_when_last_chars_differ() {
        assert_eq!(common_suffix("gatos", "gato", 3), "");
        assert_eq!(common_suffix("camión", "melón", 2), "ón");
    }

    #[test]
    fn common_suffix_is_a_suffix_of_both_inputs() {
        let suffix = common_suffix("corriendo", "saltando", 3);
        assert_eq!(suffix, "ndo");
        assert!("corriendo".ends_with(&suffix));
        assert!("saltando".ends_with(&suffix));
    }
}
