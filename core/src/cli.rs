use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::parser::parse_edsl;
use crate::translator::Translator;
use crate::types::Sequence;
use crate::validator::validate_sequence;

#[derive(Parser)]
#[command(name = "seqedsl")]
#[command(about = "seqedsl - Translate SeqJson command sequences to and from the sequencing EDSL", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Command dictionary, JSON or TOML (overrides config file and env vars)
    #[arg(long, global = true)]
    pub dictionary: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate one SeqJson document to EDSL
    ToEdsl {
        /// SeqJson file, or `-` for stdin
        file: PathBuf,

        /// Fail when the output carries //ERROR: diagnostics
        #[arg(long)]
        strict: bool,
    },

    /// Translate a JSON array of SeqJson documents
    Bulk {
        /// JSON array file, or `-` for stdin
        file: PathBuf,
    },

    /// Parse an EDSL module back into SeqJson
    ToSeqjson {
        /// EDSL file, or `-` for stdin
        file: PathBuf,
    },

    /// Check a SeqJson document without translating it
    Validate {
        /// SeqJson file, or `-` for stdin
        file: PathBuf,
    },
}

/// One entry of `bulk` output, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BulkItem {
    Translated { edsl: String },
    Failed { error: String },
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with an explicit argument list
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load config before any command so errors show up first
    let config = Config::builder()
        .config_path(cli.config.clone())
        .dictionary_path(cli.dictionary.clone())
        .build()
        .context("Failed to load configuration")?;

    init_tracing(&config.logging.level);

    match cli.command {
        Commands::ToEdsl { file, strict } => {
            let translator = build_translator(&config)?;
            let source = read_input(&file)?;
            let sequence = Sequence::from_json(&source)
                .with_context(|| format!("Failed to decode {}", file.display()))?;
            let translation = translator.translate(&sequence)?;

            println!("{}", translation.edsl);
            if strict && !translation.diagnostics.is_empty() {
                bail!(
                    "{} unresolved symbol(s) in {}",
                    translation.diagnostics.len(),
                    sequence.id
                );
            }
        }

        Commands::Bulk { file } => {
            let translator = build_translator(&config)?;
            let source = read_input(&file)?;
            let values: Vec<JsonValue> = serde_json::from_str(&source)
                .with_context(|| format!("{} is not a JSON array", file.display()))?;

            let items = translate_bulk(translator, values).await;
            let failed = items
                .iter()
                .filter(|item| matches!(item, BulkItem::Failed { .. }))
                .count();
            tracing::info!(total = items.len(), failed, "Bulk translation finished");

            println!("{}", serde_json::to_string_pretty(&items)?);
        }

        Commands::ToSeqjson { file } => {
            let source = read_input(&file)?;
            let sequence = parse_edsl(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&sequence)?);
        }

        Commands::Validate { file } => {
            let source = read_input(&file)?;
            let sequence = Sequence::from_json(&source)
                .with_context(|| format!("Failed to decode {}", file.display()))?;

            let findings = validate_sequence(&sequence);
            if findings.is_empty() {
                println!("✓ {} is valid", sequence.id);
                return Ok(());
            }

            for finding in &findings {
                println!("{}", finding);
            }
            let errors = findings.iter().filter(|f| f.is_error()).count();
            if errors > 0 {
                bail!("{} error(s) in {}", errors, sequence.id);
            }
        }
    }

    Ok(())
}

/// Translate every value on the blocking pool; results keep input order.
pub async fn translate_bulk(translator: Translator, values: Vec<JsonValue>) -> Vec<BulkItem> {
    let total = values.len();
    let mut set = JoinSet::new();

    for (index, value) in values.into_iter().enumerate() {
        let translator = translator.clone();
        set.spawn_blocking(move || (index, translator.translate_one(value)));
    }

    let mut slots: Vec<Option<BulkItem>> = vec![None; total];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, Ok(edsl))) => slots[index] = Some(BulkItem::Translated { edsl }),
            Ok((index, Err(e))) => {
                tracing::warn!(index, "Bulk item failed: {}", e);
                slots[index] = Some(BulkItem::Failed {
                    error: e.to_string(),
                });
            }
            Err(e) => tracing::error!("Bulk translation task panicked: {}", e),
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| BulkItem::Failed {
                error: "translation task did not complete".to_string(),
            })
        })
        .collect()
}

fn build_translator(config: &Config) -> Result<Translator> {
    let dictionary = config
        .dictionary()
        .context("Failed to load command dictionary")?;
    Ok(Translator::new(dictionary, config.translate_options()))
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn init_tracing(default_level: &str) {
    // RUST_LOG wins over the configured level; a second init is a no-op
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn command_sequence(id: &str, stem: &str) -> JsonValue {
        json!({
            "id": id,
            "steps": [{ "type": "command", "stem": stem, "time": { "type": "COMMAND_COMPLETE" } }]
        })
    }

    #[tokio::test]
    async fn test_bulk_preserves_order() {
        let values = (0..20)
            .map(|i| command_sequence(&format!("seq_{}", i), "NOOP"))
            .collect();

        let items = translate_bulk(Translator::default(), values).await;
        assert_eq!(items.len(), 20);
        for (i, item) in items.iter().enumerate() {
            match item {
                BulkItem::Translated { edsl } => {
                    assert!(edsl.contains(&format!("seqId: 'seq_{}',", i)))
                }
                BulkItem::Failed { error } => panic!("item {} failed: {}", i, error),
            }
        }
    }

    #[tokio::test]
    async fn test_bulk_isolates_failures() {
        let values = vec![
            command_sequence("good_1", "NOOP"),
            json!({ "id": "bad", "steps": [{ "type": "command" }] }),
            command_sequence("good_2", "NOOP"),
        ];

        let items = translate_bulk(Translator::default(), values).await;
        assert!(matches!(items[0], BulkItem::Translated { .. }));
        assert!(matches!(items[1], BulkItem::Failed { .. }));
        assert!(matches!(items[2], BulkItem::Translated { .. }));
    }

    #[tokio::test]
    async fn test_bulk_output_shape() {
        let items = translate_bulk(
            Translator::default(),
            vec![json!({ "id": "bad", "steps": [{ "type": "command" }] })],
        )
        .await;

        let value = serde_json::to_value(&items).unwrap();
        assert!(value[0]["error"].as_str().unwrap().starts_with("malformed SeqJson"));
        assert!(value[0].get("edsl").is_none());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "seqedsl",
            "to-edsl",
            "seq.json",
            "--dictionary",
            "dict.toml",
            "--strict",
        ]);
        assert_eq!(cli.dictionary, Some(PathBuf::from("dict.toml")));
        assert!(matches!(cli.command, Commands::ToEdsl { strict: true, .. }));
    }
}
