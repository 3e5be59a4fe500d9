//! Response-quality metrics.
//!
//! Scores an answer against the question and an optional reference answer:
//! word count, a BLEU-style n-gram precision, token-set similarity, and a
//! question-coverage relevance score. The stopword list is a disk resource
//! under the data directory, written from the embedded default on first run
//! and loaded once per process. When initialization fails the caller keeps
//! going with a warning and scores are computed over unfiltered token sets.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

static STOPWORDS: OnceLock<HashSet<String>> = OnceLock::new();

const STOPWORDS_FILE: &str = "stopwords.txt";

/// Embedded default stopword list, written to disk on first run.
fn default_stopwords() -> &'static str {
    include_str!("../assets/stopwords.txt")
}

/// Scores computed for a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseMetrics {
    /// Whitespace token count of the answer.
    pub word_count: usize,
    /// Modified 1-2 gram precision vs the reference, with brevity penalty.
    pub bleu_score: f64,
    /// Jaccard similarity of content-word sets (answer vs reference).
    pub similarity_score: f64,
    /// Share of the question's content words covered by the answer.
    pub relevance_score: f64,
}

/// Ensures the stopword resource exists and loads it.
///
/// Mirrors a download-on-first-run bootstrap: the resource lives on disk so
/// users can customize it, but a pristine install works offline from the
/// embedded default. Idempotent; later calls keep the first loaded set.
pub fn initialize(data_dir: &Path) -> Result<()> {
    let path = data_dir.join(STOPWORDS_FILE);

    if !path.exists() {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        fs::write(&path, default_stopwords())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "wrote default stopword list");
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let words = parse_stopwords(&contents);
    if words.is_empty() {
        anyhow::bail!("Stopword list at {} is empty", path.display());
    }

    let _ = STOPWORDS.set(words);
    Ok(())
}

fn parse_stopwords(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.get().is_some_and(|set| set.contains(word))
}

/// Evaluates an answer. Reference-based scores are 0.0 without a reference.
pub fn evaluate(question: &str, answer: &str, reference: Option<&str>) -> ResponseMetrics {
    let answer_tokens = tokenize(answer);
    let word_count = answer.split_whitespace().count();

    let (bleu_score, similarity_score) = match reference {
        Some(reference) => {
            let reference_tokens = tokenize(reference);
            (
                bleu(&answer_tokens, &reference_tokens),
                jaccard(&content_set(&answer_tokens), &content_set(&reference_tokens)),
            )
        }
        None => (0.0, 0.0),
    };

    let relevance_score = coverage(&content_set(&tokenize(question)), &content_set(&answer_tokens));

    ResponseMetrics {
        word_count,
        bleu_score: clamp01(bleu_score),
        similarity_score: clamp01(similarity_score),
        relevance_score: clamp01(relevance_score),
    }
}

/// Lowercase alphanumeric tokens, in order.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Token set with stopwords removed. Falls back to the full set when
/// filtering would leave nothing (short answers made only of stopwords).
fn content_set(tokens: &[String]) -> HashSet<String> {
    let filtered: HashSet<String> = tokens
        .iter()
        .filter(|t| !is_stopword(t))
        .cloned()
        .collect();
    if filtered.is_empty() {
        tokens.iter().cloned().collect()
    } else {
        filtered
    }
}

/// Geometric mean of modified 1-2 gram precision, with brevity penalty.
fn bleu(candidate: &[String], reference: &[String]) -> f64 {
    if candidate.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let p1 = modified_precision(candidate, reference, 1);
    let p2 = modified_precision(candidate, reference, 2);

    // Smooth the bigram term for one-token candidates.
    let geo_mean = if candidate.len() < 2 {
        p1
    } else if p1 == 0.0 || p2 == 0.0 {
        0.0
    } else {
        (p1 * p2).sqrt()
    };

    geo_mean * brevity_penalty(candidate.len(), reference.len())
}

/// Clipped n-gram precision as in BLEU.
fn modified_precision(candidate: &[String], reference: &[String], n: usize) -> f64 {
    let cand_counts = ngram_counts(candidate, n);
    if cand_counts.is_empty() {
        return 0.0;
    }
    let ref_counts = ngram_counts(reference, n);

    let mut matched = 0usize;
    let mut total = 0usize;
    for (gram, count) in &cand_counts {
        total += count;
        matched += ref_counts.get(gram).map_or(0, |r| (*r).min(*count));
    }
    matched as f64 / total as f64
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<Vec<&str>, usize> {
    let mut counts = HashMap::new();
    if tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        let gram: Vec<&str> = window.iter().map(String::as_str).collect();
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

fn brevity_penalty(candidate_len: usize, reference_len: usize) -> f64 {
    if candidate_len >= reference_len {
        1.0
    } else {
        (1.0 - reference_len as f64 / candidate_len as f64).exp()
    }
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Share of `wanted` covered by `given`.
fn coverage(wanted: &HashSet<String>, given: &HashSet<String>) -> f64 {
    if wanted.is_empty() {
        return 0.0;
    }
    wanted.intersection(given).count() as f64 / wanted.len() as f64
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_writes_and_loads_stopwords() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");

        initialize(&data_dir).unwrap();
        assert!(data_dir.join("stopwords.txt").exists());
        assert!(is_stopword("the"));
        assert!(!is_stopword("transformer"));
    }

    #[test]
    fn test_initialize_rejects_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("stopwords.txt"), "# only comments\n").unwrap();

        assert!(initialize(dir.path()).is_err());
    }

    #[test]
    fn test_word_count() {
        let metrics = evaluate("q", "three  plain words", None);
        assert_eq!(metrics.word_count, 3);
    }

    #[test]
    fn test_identical_answer_scores_one() {
        let text = "attention is all you need";
        let metrics = evaluate("what do you need", text, Some(text));
        assert!((metrics.bleu_score - 1.0).abs() < 1e-9);
        assert!((metrics.similarity_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_answer_scores_zero() {
        let metrics = evaluate(
            "what is rust",
            "bananas grow quickly",
            Some("rust is a systems language"),
        );
        assert_eq!(metrics.bleu_score, 0.0);
        assert_eq!(metrics.similarity_score, 0.0);
    }

    #[test]
    fn test_no_reference_zeroes_reference_scores() {
        let metrics = evaluate("what is rust", "rust is a language", None);
        assert_eq!(metrics.bleu_score, 0.0);
        assert_eq!(metrics.similarity_score, 0.0);
        assert!(metrics.relevance_score > 0.0);
    }

    #[test]
    fn test_relevance_covers_question_terms() {
        let metrics = evaluate(
            "transformer architecture",
            "the transformer architecture uses attention",
            None,
        );
        assert!((metrics.relevance_score - 1.0).abs() < 1e-9);

        let partial = evaluate("transformer architecture", "attention only", None);
        assert_eq!(partial.relevance_score, 0.0);
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        let cases = [
            ("", "", None),
            ("q", "", Some("reference text")),
            ("", "some answer", Some("")),
            ("short", "a", Some("a much longer reference answer here")),
        ];
        for (question, answer, reference) in cases {
            let m = evaluate(question, answer, reference);
            for score in [m.bleu_score, m.similarity_score, m.relevance_score] {
                assert!((0.0..=1.0).contains(&score), "{score} out of range");
            }
        }
    }

    #[test]
    fn test_brevity_penalty_shortens_score() {
        let full = evaluate(
            "q",
            "rust is a systems programming language",
            Some("rust is a systems programming language"),
        );
        let brief = evaluate("q", "rust is", Some("rust is a systems programming language"));
        assert!(brief.bleu_score < full.bleu_score);
        assert!(brief.bleu_score > 0.0);
    }

    #[test]
    fn test_repeated_tokens_are_clipped() {
        // "the the the" must not get credit for one "the" three times over.
        let metrics = evaluate("q", "rust rust rust", Some("rust is great"));
        assert!(metrics.bleu_score < 0.5);
    }
}
