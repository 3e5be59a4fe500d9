//! Built-in sample Q/A data.
//!
//! The sample pairs double as evaluation references: when a chat question
//! matches a sample question, the sample answer is used as the reference
//! for response metrics.

use anyhow::Result;
use tracing::info;

use super::Database;

/// Source tag for rows owned by the seeder.
pub const SEED_SOURCE: &str = "seed";

/// Built-in sample pairs, inserted when the sample table is empty.
const SEED_SAMPLES: &[(&str, &str)] = &[
    (
        "What is a large language model?",
        "A large language model is a neural network trained on large text \
         corpora to predict the next token, which lets it generate and \
         understand natural language.",
    ),
    (
        "What is attention in a transformer?",
        "Attention is a mechanism that weights how much each token in the \
         input should influence the representation of every other token.",
    ),
    (
        "What does fine-tuning mean?",
        "Fine-tuning continues training a pretrained model on a smaller, \
         task-specific dataset so it adapts to that task.",
    ),
    (
        "What is tokenization?",
        "Tokenization splits text into units such as words or subwords that \
         the model processes as discrete tokens.",
    ),
    (
        "What is a prompt?",
        "A prompt is the input text given to a language model to steer the \
         content and style of its output.",
    ),
    (
        "What is temperature in text generation?",
        "Temperature scales the output distribution before sampling; lower \
         values make generation more deterministic, higher values more \
         diverse.",
    ),
];

/// Seeds the sample table when it is empty.
///
/// Returns the number of rows inserted (0 when data already exists), so the
/// caller can report what happened. Errors are the caller's to downgrade:
/// seeding failure is a warning at startup, not a fatal condition.
pub fn ensure_seed_data(db: &Database) -> Result<usize> {
    if db.sample_count()? > 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    for (question, answer) in SEED_SAMPLES {
        db.add_sample(question, answer, SEED_SOURCE)?;
        inserted += 1;
    }
    info!(rows = inserted, "seeded sample data");
    Ok(inserted)
}

/// Replaces all samples with the built-in set.
pub fn reset_samples(db: &Database) -> Result<usize> {
    db.clear_samples()?;
    ensure_seed_data(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_fills_empty_table() {
        let db = Database::open_in_memory().unwrap();
        let inserted = ensure_seed_data(&db).unwrap();
        assert_eq!(inserted, SEED_SAMPLES.len());
        assert_eq!(db.sample_count().unwrap(), SEED_SAMPLES.len());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        ensure_seed_data(&db).unwrap();
        assert_eq!(ensure_seed_data(&db).unwrap(), 0);
        assert_eq!(db.sample_count().unwrap(), SEED_SAMPLES.len());
    }

    #[test]
    fn test_seed_skips_non_empty_table() {
        let db = Database::open_in_memory().unwrap();
        db.add_sample("custom q", "custom a", "user").unwrap();

        assert_eq!(ensure_seed_data(&db).unwrap(), 0);
        assert_eq!(db.sample_count().unwrap(), 1);
    }

    #[test]
    fn test_reset_restores_built_ins() {
        let db = Database::open_in_memory().unwrap();
        ensure_seed_data(&db).unwrap();
        db.add_sample("custom q", "custom a", "user").unwrap();

        reset_samples(&db).unwrap();
        let samples = db.list_samples().unwrap();
        assert_eq!(samples.len(), SEED_SAMPLES.len());
        assert!(samples.iter().all(|s| s.source == SEED_SOURCE));
    }

    #[test]
    fn test_seeded_answers_resolve_as_references() {
        let db = Database::open_in_memory().unwrap();
        ensure_seed_data(&db).unwrap();

        let reference = db
            .reference_answer_for("what is tokenization?")
            .unwrap()
            .unwrap();
        assert!(reference.contains("Tokenization"));
    }
}
