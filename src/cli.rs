//! Thin command-line caller around the engine.
//!
//! The CLI validates arguments, builds sources, invokes the engine, and
//! serializes its output; all ranking logic lives behind the engine API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::engine::{ContextEngine, EngineOptions};
use crate::git::{CliGitActivity, GitActivityProvider, NullGitActivity};
use crate::sources::{ConversationSource, JsonFileSource};
use crate::weights::{StaticWeights, WeightsProvider};

#[derive(Parser, Debug)]
#[command(
    name = "recall",
    version,
    about = "Relevance-ranked recall of coding agent chat histories and project files"
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human-readable output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Optional weights TOML; missing keys fall back to defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub weights: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank conversations from exported history files.
    Context {
        /// Project root the relevance vocabulary is derived from.
        #[arg(long)]
        project: PathBuf,
        /// Exported record files (.json or .jsonl); source tool is
        /// sniffed from the file name.
        #[arg(long = "records", value_name = "FILE", required = true)]
        records: Vec<PathBuf>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Serialized-size budget for the result, in bytes.
        #[arg(long)]
        budget: Option<usize>,
        /// Return id/title/source/timestamp/score only.
        #[arg(long)]
        lightweight: bool,
    },
    /// Score and tier project files.
    Files {
        #[arg(long)]
        project: PathBuf,
        /// Files currently open in the editor, for the import heuristic.
        #[arg(long, value_name = "FILE")]
        active: Vec<PathBuf>,
        /// Upper bound on files scanned.
        #[arg(long, default_value_t = 500)]
        max_files: usize,
    },
    /// Print the context keyword vocabulary for a project.
    Keywords {
        #[arg(long)]
        project: PathBuf,
    },
}

/// Default weights file, consulted when `--weights` is not given.
fn default_weights_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("agent-recall").join("weights.toml"))
}

fn build_engine(project: &PathBuf, weights_path: Option<&PathBuf>) -> Result<ContextEngine> {
    let weights: Arc<dyn WeightsProvider> = match weights_path {
        Some(path) => Arc::new(
            StaticWeights::load(path)
                .with_context(|| format!("loading weights from {}", path.display()))?,
        ),
        None => match default_weights_path().filter(|p| p.is_file()) {
            Some(path) => Arc::new(
                StaticWeights::load(&path)
                    .with_context(|| format!("loading weights from {}", path.display()))?,
            ),
            None => Arc::new(StaticWeights::default()),
        },
    };
    let git: Arc<dyn GitActivityProvider> = if project.join(".git").exists() {
        Arc::new(CliGitActivity::new(project))
    } else {
        Arc::new(NullGitActivity)
    };
    Ok(ContextEngine::with_providers(project.clone(), weights, git))
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Context {
            project,
            records,
            limit,
            budget,
            lightweight,
        } => {
            let engine = build_engine(&project, cli.weights.as_ref())?;
            let sources: Vec<Box<dyn ConversationSource>> = records
                .iter()
                .map(|path| Box::new(JsonFileSource::from_path(path)) as Box<dyn ConversationSource>)
                .collect();
            let options = EngineOptions {
                limit,
                lightweight,
                target_bytes: budget,
            };
            let result = engine.recall_conversations(&sources, &options);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} conversations scored, {} returned (keywords: {})",
                    result.total_scored,
                    result.items.len(),
                    result.context_keywords.join(", ")
                );
                for item in &result.items {
                    println!(
                        "  {:>6.3}  [{}] {} ({})",
                        item.relevance_score, item.conversation_type, item.title, item.source
                    );
                }
                if result.truncated {
                    println!("  (truncated to size budget)");
                }
            }
        }
        Commands::Files {
            project,
            active,
            max_files,
        } => {
            let engine = build_engine(&project, cli.weights.as_ref())?;
            let candidates = engine.collect_project_files(max_files);
            let ranked = engine.rank_project_files(&candidates, &active, &[]);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                println!(
                    "{} high / {} medium / {} low priority",
                    ranked.high_priority_files.len(),
                    ranked.medium_priority_files.len(),
                    ranked.low_priority_files.len()
                );
                for file in &ranked.high_priority_files {
                    println!("  {:>6.3}  {}", file.score, file.path.display());
                }
            }
        }
        Commands::Keywords { project } => {
            let engine = build_engine(&project, cli.weights.as_ref())?;
            let keywords = engine.context_keywords();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&keywords)?);
            } else {
                for keyword in &keywords {
                    println!("{keyword}");
                }
            }
        }
    }
    Ok(())
}
