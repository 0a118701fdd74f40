//! Fuzzy string similarity on a 0-100 scale.
//!
//! Similarity is the indel ratio `2 * lcs / (len_a + len_b)`, computed on
//! characters. `partial_ratio` slides the shorter string over the longer one
//! and keeps the best window, which tolerates OCR noise around a keyword.

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Shorter string in the inner loop.
    let (a, b) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Whole-string similarity, rounded to an integer score.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b).round()
}

/// Best similarity between the shorter string and any equally long window of
/// the longer one, rounded to an integer score. Empty input scores 0.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let (short, long, short_str, long_str) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars, a, b)
    } else {
        (b_chars, a_chars, b, a)
    };

    if short.is_empty() {
        return 0.0;
    }
    if long_str.contains(short_str) {
        return 100.0;
    }

    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(&short, window));
    }
    best.round()
}

/// Highest `partial_ratio` between `keyword` and any whitespace-separated word
/// of `text`, case-insensitive.
pub fn best_word_score(keyword: &str, text: &str) -> f64 {
    let keyword = keyword.to_lowercase();
    text.split_whitespace()
        .map(|word| partial_ratio(&keyword, &word.to_lowercase()))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(ratio("balance", "balance"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_ratio_is_symmetric() {
        assert_eq!(ratio("statement", "statment"), ratio("statment", "statement"));
        // lcs 8 of 17 chars
        assert_eq!(ratio("statement", "statment"), 94.0);
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_eq!(partial_ratio("net salary", "monthly net salary 5000"), 100.0);
        assert_eq!(partial_ratio("monthly net salary 5000", "net salary"), 100.0);
    }

    #[test]
    fn test_partial_ratio_tolerates_ocr_noise() {
        // "acc0unt" differs by one character in a 7-char window
        let score = partial_ratio("account", "your acc0unt number");
        assert_eq!(score, 86.0);
    }

    #[test]
    fn test_partial_ratio_empty() {
        assert_eq!(partial_ratio("", "anything"), 0.0);
        assert_eq!(partial_ratio("anything", ""), 0.0);
    }

    #[test]
    fn test_best_word_score() {
        assert_eq!(best_word_score("credit", "salary credit"), 100.0);
        assert_eq!(best_word_score("debit", "ATM DEBIT"), 100.0);
        // "debit" vs "credit": best window "redit" shares "eit"
        assert_eq!(best_word_score("credit", "atm debit"), 60.0);
        assert_eq!(best_word_score("credit", ""), 0.0);
    }
}
