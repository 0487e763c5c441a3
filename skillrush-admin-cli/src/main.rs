//! SkillRush Administration CLI
//!
//! Inspects and drives a local offline store. The `outbox`, `ack` and
//! `clear` commands are what a sync agent would call after flushing.

mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use skillrush_core::{GameResult, NewStudent, OfflineStore, StoreConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "skillrush-admin")]
#[command(author = "SkillRush Contributors")]
#[command(version = "0.1.0")]
#[command(about = "SkillRush offline store administration tool")]
struct Cli {
    /// Store configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the store database
    Init,

    /// Register a new student
    Register {
        id: String,
        name: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        class: Option<String>,
    },

    /// Verify credentials and record a login
    Login {
        id: String,
        #[arg(short, long)]
        password: String,
    },

    /// Show one student
    Show { id: String },

    /// List all students
    List,

    /// Apply a finished game to a student
    Play {
        id: String,
        game: String,
        #[arg(short, long)]
        score: u32,
        /// Points to add (defaults to the score)
        #[arg(long)]
        points: Option<u64>,
        #[arg(short, long)]
        questions: Option<u32>,
        #[arg(short, long)]
        badge: Vec<String>,
    },

    /// Print pending outbox events, one JSON object per line
    Outbox,

    /// Acknowledge outbox events up to and including a sequence id
    Ack { through: u64 },

    /// Remove every pending outbox event
    Clear,
}

fn init_tracing(debug: bool) {
    let env_filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => StoreConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let store = OfflineStore::open(&config).context("Failed to open offline store")?;

    match cli.command {
        Commands::Init => {
            println!("Store ready at {}", config.db_path().display());
        }

        Commands::Register { id, name, password, class } => {
            let mut new = NewStudent::new(id, name, password);
            new.class_name = class;
            let record = store.credentials().register_with(new).await?;
            println!("Registered {} ({})", record.id, record.name);
        }

        Commands::Login { id, password } => match store.login(&id, &password).await? {
            Some(record) => println!("{}", report::profile_json(&record)?),
            None => bail!("Invalid ID or password"),
        },

        Commands::Show { id } => match store.records().get(&id).await? {
            Some(record) => println!("{}", report::profile_json(&record)?),
            None => bail!("No student with ID {}", id),
        },

        Commands::List => {
            for record in store.records().list().await? {
                println!("{}", report::summary_line(&record));
            }
        }

        Commands::Play { id, game, score, points, questions, badge } => {
            let mut result = GameResult::new(game, score);
            if let Some(points) = points {
                result.points = points;
            }
            result.questions = questions;
            result.badges = badge;
            let record = store.progress().apply_result(&id, &result).await?;
            println!("{}", report::summary_line(&record));
        }

        Commands::Outbox => {
            for event in store.outbox().drain_all().await? {
                println!("{}", serde_json::to_string(&event)?);
            }
        }

        Commands::Ack { through } => {
            let removed = store.outbox().acknowledge(through).await?;
            println!("Acknowledged {} events", removed);
        }

        Commands::Clear => {
            let removed = store.outbox().clear().await?;
            println!("Cleared {} events", removed);
        }
    }

    Ok(())
}
