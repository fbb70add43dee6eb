//! Heuristic keyword extraction.
//!
//! Best effort only: words are normalised, stop words and short or numeric
//! tokens dropped, and the remainder ranked by frequency. Capitalised words
//! that do not start a sentence count double, as a cheap proper-noun signal.
//! Ties keep first-appearance order. Never fails; worst case is an empty list.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}][\p{L}\p{N}'’-]*|[.!?]").expect("valid word regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "around", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "even", "ever", "every", "few", "for", "from", "further", "get", "gets",
        "got", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
        "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it", "its", "itself",
        "just", "let", "like", "made", "make", "many", "may", "me", "might", "more", "most",
        "much", "must", "my", "myself", "never", "new", "no", "nor", "not", "now", "of", "off",
        "often", "on", "once", "one", "only", "or", "other", "our", "ours", "ourselves", "out",
        "over", "own", "per", "quite", "rather", "really", "said", "same", "say", "says", "see",
        "she", "should", "since", "so", "some", "still", "such", "than", "that", "the", "their",
        "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
        "through", "thus", "to", "too", "under", "until", "up", "upon", "us", "use", "used",
        "using", "very", "was", "way", "we", "well", "were", "what", "when", "where", "whether",
        "which", "while", "who", "whom", "whose", "why", "will", "with", "within", "without",
        "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

const MIN_KEYWORD_CHARS: usize = 3;

struct Candidate {
    score: usize,
    first_seen: usize,
}

/// Extract up to `max` keywords from `text`, most relevant first
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return Vec::new();
    }

    let mut candidates: HashMap<String, Candidate> = HashMap::new();
    let mut sentence_start = true;
    let mut position = 0;

    for token in WORD_PATTERN.find_iter(text).map(|m| m.as_str()) {
        if matches!(token, "." | "!" | "?") {
            sentence_start = true;
            continue;
        }

        let starts_upper = token.chars().next().is_some_and(char::is_uppercase);
        let proper_noun = starts_upper && !sentence_start;
        sentence_start = false;

        let Some(word) = normalize(token) else {
            continue;
        };

        let weight = if proper_noun { 2 } else { 1 };
        let entry = candidates.entry(word).or_insert(Candidate {
            score: 0,
            first_seen: position,
        });
        entry.score += weight;
        position += 1;
    }

    let mut ranked: Vec<(String, Candidate)> = candidates.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.score.cmp(&a.score).then(a.first_seen.cmp(&b.first_seen)));
    ranked.into_iter().take(max).map(|(word, _)| word).collect()
}

fn normalize(token: &str) -> Option<String> {
    let lower = token.to_lowercase();
    let word = lower
        .strip_suffix("'s")
        .or_else(|| lower.strip_suffix("’s"))
        .unwrap_or(&lower)
        .trim_matches(|c: char| c == '\'' || c == '’' || c == '-');

    if word.chars().count() < MIN_KEYWORD_CHARS || STOP_WORDS.contains(word) {
        return None;
    }
    Some(word.to_string())
}
