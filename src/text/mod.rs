// Shared text helpers: stopwords and word tokenization.
//
// Both the duplicate detector and the cluster namer need the same English
// stopword list, so it is loaded once from the `stop-words` crate (NLTK list)
// and shared. Words are Unicode `\w+` runs, so accented and non-Latin
// letters stay inside their word.

pub mod normalize;

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use stop_words::{get, LANGUAGE};

static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();
static WORD_RE: OnceLock<Regex> = OnceLock::new();

/// English stopwords, lowercased.
pub fn stop_words() -> &'static HashSet<String> {
    STOP_WORDS.get_or_init(|| {
        let words: Vec<String> = get(LANGUAGE::English);
        words.into_iter().map(|w| w.to_lowercase()).collect()
    })
}

pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Lowercase `\w+` words of a phrase, in order of appearance.
pub fn words(phrase: &str) -> Vec<String> {
    let re = WORD_RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("valid word regex"));
    let lower = phrase.to_lowercase();
    re.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}
