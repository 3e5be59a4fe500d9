//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use gemchat_core::config::Config;
use gemchat_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(version)]
#[command(about = "Terminal chatbot with feedback capture over a local model server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the model from config
    #[arg(short, long, global = true)]
    model: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Browse recorded interactions
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Manage sample Q/A data
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum HistoryCommands {
    /// Lists recorded interactions, newest first
    List {
        /// Maximum rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Only rows with feedback
        #[arg(long)]
        rated: bool,
    },
    /// Shows one interaction in full
    Show {
        /// The ID of the record to show
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Deletes all recorded interactions
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Subcommand)]
enum DataCommands {
    /// Lists sample Q/A pairs
    List,
    /// Adds a sample pair
    Add {
        #[arg(value_name = "QUESTION")]
        question: String,
        #[arg(value_name = "ANSWER")]
        answer: String,
    },
    /// Removes one sample pair
    Remove {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Replaces all samples with the built-in set
    Reset,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("load config")?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    // default to chat mode
    let Some(command) = cli.command else {
        return commands::chat::run(config).await;
    };

    logging::init_stderr_logging();

    match command {
        Commands::History { command } => {
            let db = commands::open_store()?;
            match command {
                HistoryCommands::List { limit, rated } => commands::history::list(&db, limit, rated),
                HistoryCommands::Show { id } => commands::history::show(&db, id),
                HistoryCommands::Clear { yes } => commands::history::clear(&db, yes),
            }
        }

        Commands::Data { command } => {
            let db = commands::open_store()?;
            match command {
                DataCommands::List => commands::data::list(&db),
                DataCommands::Add { question, answer } => commands::data::add(&db, &question, &answer),
                DataCommands::Remove { id } => commands::data::remove(&db, id),
                DataCommands::Reset => commands::data::reset(&db),
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
