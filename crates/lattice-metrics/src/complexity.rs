//! Lempel–Ziv style phrase complexity of binary patterns.

use std::collections::HashSet;

/// `1` where `value > threshold`, else `0`.
pub fn binarize(values: &[f64], threshold: f64) -> Vec<u8> {
    values.iter().map(|&v| u8::from(v > threshold)).collect()
}

/// Number of phrases in a left-to-right parse where each phrase is the
/// shortest substring starting at the cursor that has not been seen yet.
/// A trailing phrase that runs off the end is counted even if seen.
pub fn lz_phrase_count(bits: &[u8]) -> usize {
    let n = bits.len();
    let mut seen: HashSet<&[u8]> = HashSet::new();
    let mut i = 0;
    let mut phrases = 0;
    while i < n {
        let mut j = i + 1;
        while j <= n && seen.contains(&bits[i..j]) {
            j += 1;
        }
        seen.insert(&bits[i..j.min(n)]);
        phrases += 1;
        i = j;
    }
    phrases
}

/// Phrase count normalized by `n / ln(n + 1)`.
///
/// Sequences shorter than 2 return their length.
pub fn lz_complexity(bits: &[u8]) -> f64 {
    let n = bits.len();
    if n < 2 {
        return n as f64;
    }
    let c = lz_phrase_count(bits) as f64;
    c / (n as f64 / ((n + 1) as f64).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Concatenation of every binary word of length 1..=max_len in
    /// lexicographic order; each word parses as exactly one phrase.
    fn all_words(max_len: usize) -> (Vec<u8>, usize) {
        let mut seq = Vec::new();
        let mut words = 0;
        for len in 1..=max_len {
            for w in 0..(1usize << len) {
                for bit in (0..len).rev() {
                    seq.push(((w >> bit) & 1) as u8);
                }
                words += 1;
            }
        }
        (seq, words)
    }

    /// Smallest c with c(c+1)/2 >= n: the phrase count of a constant run.
    fn constant_run_phrases(n: usize) -> usize {
        let mut c = 0;
        while c * (c + 1) / 2 < n {
            c += 1;
        }
        c
    }

    #[test]
    fn test_binarize() {
        assert_eq!(binarize(&[0.1, 0.5, 0.51, 1.0], 0.5), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_phrase_count_zeros() {
        assert_eq!(lz_phrase_count(&[0; 10]), 4);
        assert_eq!(lz_phrase_count(&[]), 0);
    }

    #[test]
    fn test_constant_sequences_hit_minimum() {
        for n in [16, 100, 1000, 4096] {
            let zeros = vec![0u8; n];
            let ones = vec![1u8; n];
            assert_eq!(lz_phrase_count(&zeros), constant_run_phrases(n));
            assert_eq!(lz_complexity(&zeros), lz_complexity(&ones));
        }
    }

    #[test]
    fn test_exhaustive_words_hit_maximum() {
        let (seq, words) = all_words(8);
        assert_eq!(lz_phrase_count(&seq), words);

        let n = seq.len() as f64;
        let expected = words as f64 / (n / (n + 1.0).ln());
        assert!((lz_complexity(&seq) - expected).abs() < 1e-12);

        let flat = lz_complexity(&vec![0u8; seq.len()]);
        assert!(lz_complexity(&seq) > 5.0 * flat);
    }

    #[test]
    fn test_short_sequences() {
        assert_eq!(lz_complexity(&[]), 0.0);
        assert_eq!(lz_complexity(&[1]), 1.0);
    }
}
