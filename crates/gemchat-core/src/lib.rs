//! Core GemChat library (config, storage, model client, metrics, session).

pub mod config;
pub mod db;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod session;
