//! Weighted string similarity for club names.
//!
//! Scores are on a 0-100 scale and computed over Unicode scalar values with
//! no case folding or punctuation stripping: "Real Madrid" and "real madrid"
//! are different strings here.
//!
//! The building block is [`ratio`], the normalized InDel similarity
//! (`2 * LCS / (len_a + len_b)`) from `rapidfuzz`. [`weighted_ratio`]
//! combines it with substring alignment ([`partial_ratio`]) and word-order
//! insensitive variants ([`token_ratio`], [`partial_token_ratio`]), scaling the
//! secondary scores down so that a plain full-string match always wins ties.

use rapidfuzz::distance::indel;
use rapidfuzz::fuzz;
use std::collections::BTreeSet;

/// Weight applied to token-based scores.
const UNBASE_SCALE: f64 = 0.95;
/// Length ratio below which strings are compared whole.
const WHOLE_STRING_LEN_RATIO: f64 = 1.5;
/// Length ratio at which partial matches are discounted further.
const LONG_PARTIAL_LEN_RATIO: f64 = 8.0;

/// A candidate paired with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: f64,
}

fn indel_dist(a: &[char], b: &[char]) -> usize {
    indel::distance(a.iter().copied(), b.iter().copied())
}

/// Normalized similarity from an InDel distance over a combined length.
fn norm_sim(dist: usize, lensum: usize) -> f64 {
    if lensum == 0 {
        return 100.0;
    }
    100.0 * (1.0 - dist as f64 / lensum as f64)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    norm_sim(indel_dist(a, b), a.len() + b.len())
}

fn to_chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Full-string similarity. Two empty strings are identical (100).
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Best [`ratio`] of `short` against every alignment on `long`, including
/// windows that hang off either end.
fn partial_windows(short: &[char], long: &[char]) -> f64 {
    let m = short.len();
    let n = long.len();
    let mut best = 0.0f64;

    for end in 1..m {
        best = best.max(ratio_chars(short, &long[..end]));
    }
    for start in 0..=(n - m) {
        best = best.max(ratio_chars(short, &long[start..start + m]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    for start in (n - m + 1)..n {
        best = best.max(ratio_chars(short, &long[start..]));
    }
    best
}

/// Similarity of the shorter string to the best-matching substring of the
/// longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = to_chars(a);
    let b = to_chars(b);
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() { 100.0 } else { 0.0 };
    }

    if a.len() < b.len() {
        partial_windows(&a, &b)
    } else if a.len() > b.len() {
        partial_windows(&b, &a)
    } else {
        let best = partial_windows(&a, &b);
        if best >= 100.0 {
            best
        } else {
            best.max(partial_windows(&b, &a))
        }
    }
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Whitespace tokens of both strings, split into the shared set and each
/// side's remainder. All three are sorted.
struct TokenSplit<'a> {
    sorted_a: Vec<&'a str>,
    sorted_b: Vec<&'a str>,
    intersection: Vec<&'a str>,
    diff_ab: Vec<&'a str>,
    diff_ba: Vec<&'a str>,
}

impl<'a> TokenSplit<'a> {
    fn new(a: &'a str, b: &'a str) -> Self {
        let sorted_a = sorted_tokens(a);
        let sorted_b = sorted_tokens(b);
        let set_a: BTreeSet<&str> = sorted_a.iter().copied().collect();
        let set_b: BTreeSet<&str> = sorted_b.iter().copied().collect();
        Self {
            intersection: set_a.intersection(&set_b).copied().collect(),
            diff_ab: set_a.difference(&set_b).copied().collect(),
            diff_ba: set_b.difference(&set_a).copied().collect(),
            sorted_a,
            sorted_b,
        }
    }
}

/// Word-order insensitive similarity: the better of the token-sort ratio and
/// the token-set ratios.
pub fn token_ratio(a: &str, b: &str) -> f64 {
    let split = TokenSplit::new(a, b);
    if split.sorted_a.is_empty() || split.sorted_b.is_empty() {
        return 0.0;
    }

    let mut result = ratio(&split.sorted_a.join(" "), &split.sorted_b.join(" "));

    // one side's words are all contained in the other's
    if !split.intersection.is_empty() && (split.diff_ab.is_empty() || split.diff_ba.is_empty()) {
        return 100.0;
    }

    let diff_ab = to_chars(&split.diff_ab.join(" "));
    let diff_ba = to_chars(&split.diff_ba.join(" "));
    let ab_len = diff_ab.len();
    let ba_len = diff_ba.len();
    let sect_len = char_len(&split.intersection.join(" "));
    let sep = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    let dist = indel_dist(&diff_ab, &diff_ba);
    result = result.max(norm_sim(dist, sect_ab_len + sect_ba_len));

    if sect_len == 0 {
        return result;
    }

    // sect vs sect+ab differs only by the separator and the remainder
    let sect_ab_ratio = norm_sim(sep + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = norm_sim(sep + ba_len, sect_len + sect_ba_len);
    result.max(sect_ab_ratio).max(sect_ba_ratio)
}

/// Partial-ratio counterpart of [`token_ratio`]. Any shared word is a
/// perfect score.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let split = TokenSplit::new(a, b);
    if split.sorted_a.is_empty() || split.sorted_b.is_empty() {
        return 0.0;
    }
    if !split.intersection.is_empty() {
        return 100.0;
    }

    let result = partial_ratio(&split.sorted_a.join(" "), &split.sorted_b.join(" "));

    // without duplicate words the set differences are the same strings again
    if split.sorted_a.len() == split.diff_ab.len() && split.sorted_b.len() == split.diff_ba.len() {
        return result;
    }
    result.max(partial_ratio(
        &split.diff_ab.join(" "),
        &split.diff_ba.join(" "),
    ))
}

/// Weighted similarity used for club-name matching.
///
/// Similar-length strings are scored whole (plus a discounted word-order
/// insensitive score). When one string is at least 1.5x longer, substring
/// alignment is considered as well, discounted by 0.9, or by 0.6 once the
/// length ratio reaches 8.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let len_a = char_len(a);
    let len_b = char_len(b);
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let end_ratio = ratio(a, b);

    if len_ratio < WHOLE_STRING_LEN_RATIO {
        return end_ratio.max(token_ratio(a, b) * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < LONG_PARTIAL_LEN_RATIO {
        0.9
    } else {
        0.6
    };

    let end_ratio = end_ratio.max(partial_ratio(a, b) * partial_scale);
    end_ratio.max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

/// Pick the highest-scoring candidate by [`weighted_ratio`].
///
/// Ties keep the first candidate encountered. Returns `None` only when there
/// are no candidates at all; a best score of 0 is still returned.
pub fn extract_best<T, I, F>(query: &str, candidates: I, name_of: F) -> Option<Scored<T>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let mut best: Option<Scored<T>> = None;
    for item in candidates {
        let score = weighted_ratio(query, name_of(&item));
        match &best {
            Some(current) if score <= current.score => {}
            _ => best = Some(Scored { item, score }),
        }
    }
    best
}
