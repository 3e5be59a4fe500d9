//! Sample-data subcommands.

use anyhow::Result;
use gemchat_core::db::{Database, seed};

pub fn list(db: &Database) -> Result<()> {
    let samples = db.list_samples()?;
    if samples.is_empty() {
        println!("No samples.");
        return Ok(());
    }

    for sample in samples {
        println!(
            "#{:<4} [{}] {} => {}",
            sample.id, sample.source, sample.question, sample.answer
        );
    }
    Ok(())
}

pub fn add(db: &Database, question: &str, answer: &str) -> Result<()> {
    let id = db.add_sample(question.trim(), answer.trim(), "user")?;
    println!("Added sample #{id}");
    Ok(())
}

pub fn remove(db: &Database, id: i64) -> Result<()> {
    if db.delete_sample(id)? {
        println!("Deleted sample #{id}");
        Ok(())
    } else {
        anyhow::bail!("No sample with id {id}")
    }
}

pub fn reset(db: &Database) -> Result<()> {
    let count = seed::reset_samples(db)?;
    println!("Restored {count} built-in samples.");
    Ok(())
}
