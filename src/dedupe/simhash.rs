// src/dedupe/simhash.rs
// =============================================================================
// 64-bit SimHash fingerprints over a page's unique content.
//
// 1. Tokenize: lowercase, split on non-alphanumeric runs, drop tokens shorter
//    than 3 characters and stop words, keep at most 600 tokens
// 2. Hash every token with 64-bit FNV-1a
// 3. Each hash bit votes +1 (bit set) or -1 (bit clear) on its dimension
// 4. Output bit i is 1 iff dimension i ended with a positive vote
//
// Pages with overlapping vocabulary end up with fingerprints that differ in
// only a few bits, so Hamming distance approximates dissimilarity.
// =============================================================================

use std::collections::HashSet;
use std::sync::LazyLock;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub const MAX_TOKENS: usize = 600;
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was", "one", "our", "out",
    "has", "him", "his", "how", "its", "may", "new", "now", "see", "two", "way", "who", "did", "get", "let", "say",
    "she", "too", "use", "with", "that", "this", "from", "your", "have", "more", "will", "what", "when", "they",
    "them", "then", "than", "into", "also", "been", "were", "which", "their", "there", "about", "would", "these",
    "other", "some", "such", "only", "each", "just", "over", "very", "here", "where", "while", "should", "could",
];

static STOP_SET: LazyLock<HashSet<&'static str>> = LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// 64-bit FNV-1a. Multiplication wraps, so the result is always a full u64.
pub fn fnv1a64(token: &str) -> u64 {
    token
        .bytes()
        .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|token| !STOP_SET.contains(token))
        .take(MAX_TOKENS)
        .map(str::to_string)
        .collect()
}

/// SimHash of a token list, or None when there is nothing to fingerprint.
pub fn simhash<S: AsRef<str>>(tokens: &[S]) -> Option<u64> {
    if tokens.is_empty() {
        return None;
    }

    let mut votes = [0i64; 64];
    for token in tokens {
        let hash = fnv1a64(token.as_ref());
        for (bit, vote) in votes.iter_mut().enumerate() {
            if hash & (1u64 << bit) != 0 {
                *vote += 1;
            } else {
                *vote -= 1;
            }
        }
    }

    let fingerprint = votes
        .iter()
        .enumerate()
        .filter(|(_, vote)| **vote > 0)
        .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));
    Some(fingerprint)
}

/// Fingerprint of free text (tokenize + simhash).
pub fn fingerprint(text: &str) -> Option<u64> {
    simhash(&tokenize(text))
}

pub fn hamming(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// "0x" followed by 16 zero-padded hex digits.
pub fn to_hex(fingerprint: u64) -> String {
    format!("0x{:016x}", fingerprint)
}
