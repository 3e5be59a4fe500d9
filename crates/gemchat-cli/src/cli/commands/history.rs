//! History subcommands.

use anyhow::{Context, Result};
use gemchat_core::db::{Database, Feedback};

pub fn list(db: &Database, limit: usize, rated: bool) -> Result<()> {
    let rows = db.list_history(limit, rated)?;
    if rows.is_empty() {
        println!("No interactions recorded.");
        return Ok(());
    }

    for record in rows {
        let feedback = match record.feedback {
            Some(Feedback::Good) => "good   ",
            Some(Feedback::Bad) => "bad    ",
            None => "unrated",
        };
        println!(
            "#{:<5} {}  {}  {}",
            record.id,
            record.timestamp,
            feedback,
            record.question
        );
    }
    Ok(())
}

pub fn show(db: &Database, id: i64) -> Result<()> {
    let record = db
        .get_chat(id)?
        .with_context(|| format!("No chat record with id {id}"))?;

    println!("Record #{}", record.id);
    println!("Time:      {}", record.timestamp);
    println!("Question:  {}", record.question);
    println!("Answer:    {}", record.answer);
    println!("Response:  {:.2}s", record.response_time);
    println!(
        "Feedback:  {}",
        record.feedback.map_or("unrated", Feedback::label)
    );
    if let Some(correct) = &record.correct_answer {
        println!("Corrected: {correct}");
    }
    if let (Some(bleu), Some(similarity), Some(relevance)) = (
        record.bleu_score,
        record.similarity_score,
        record.relevance_score,
    ) {
        println!("Scores:    bleu {bleu:.2}  similarity {similarity:.2}  relevance {relevance:.2}");
    }
    Ok(())
}

pub fn clear(db: &Database, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("Refusing to delete history without --yes");
    }
    let deleted = db.clear_history()?;
    println!("Deleted {deleted} records.");
    Ok(())
}
