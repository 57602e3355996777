use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docrank::{Index, ScoringFunction};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

const INDEXABLE_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "html", "htm"];

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, update and query a docrank index snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every text file under a path into a snapshot
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Snapshot file to write; an existing snapshot is extended
        #[arg(long)]
        output: PathBuf,
        /// Replace documents whose identifier is already indexed
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Index a single document
    Add {
        #[command(flatten)]
        index: IndexArg,
        /// Identifier returned in search results
        #[arg(long)]
        identifier: String,
        /// Document text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the document from a file
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Remove a document by identifier
    Remove {
        #[command(flatten)]
        index: IndexArg,
        #[arg(long)]
        identifier: String,
    },
    /// Run a ranked query
    Search {
        #[command(flatten)]
        index: IndexArg,
        #[arg(long, short)]
        query: String,
        /// bm25 or ql
        #[arg(long, default_value_t = ScoringFunction::Bm25)]
        scoring: ScoringFunction,
        /// Maximum number of hits to print
        #[arg(short, default_value_t = 10)]
        k: usize,
        /// Print hits as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print collection statistics
    Stats {
        #[command(flatten)]
        index: IndexArg,
    },
}

#[derive(Args)]
struct IndexArg {
    /// Snapshot file
    #[arg(long, default_value = "./index.json")]
    index: PathBuf,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, overwrite } => build_index(&input, &output, overwrite),
        Commands::Add { index, identifier, text, file, overwrite } => {
            let mut idx = open(&index.index)?;
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("reading {}", file.display()))?,
                (None, None) => bail!("either --text or --file is required"),
            };
            let doc_id = idx.index_string(&text, &identifier, overwrite)?;
            idx.commit()?;
            tracing::info!(%identifier, doc_id, "document added");
            Ok(())
        }
        Commands::Remove { index, identifier } => {
            let mut idx = open(&index.index)?;
            idx.remove_document(&identifier)?;
            idx.commit()?;
            tracing::info!(%identifier, "document removed");
            Ok(())
        }
        Commands::Search { index, query, scoring, k, json } => {
            let idx = open(&index.index)?;
            let hits = idx.search_top_k(&query, scoring, k);
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                for (rank, hit) in hits.iter().enumerate() {
                    println!("{:>3}. {:<40} {:.6}", rank + 1, hit.identifier, hit.score);
                }
            }
            Ok(())
        }
        Commands::Stats { index } => {
            let idx = open(&index.index)?;
            println!("{}", serde_json::to_string_pretty(&idx.stats())?);
            Ok(())
        }
    }
}

fn open(path: &Path) -> Result<Index> {
    Index::open(path).with_context(|| format!("opening index {}", path.display()))
}

fn build_index(input: &Path, output: &Path, overwrite: bool) -> Result<()> {
    let mut index = open(output)?;

    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && is_indexable(p) {
                files.push(p.to_path_buf());
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }

    let mut indexed = 0usize;
    let mut skipped = 0usize;
    for file in files {
        let Some(identifier) = identifier_for(&file) else {
            tracing::warn!(path = %file.display(), "no usable file stem, skipping");
            skipped += 1;
            continue;
        };
        let result = if !index.contains(&identifier) {
            index.index_file(&file, &identifier)
        } else if overwrite {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            index.index_string(&text, &identifier, true)
        } else {
            tracing::warn!(%identifier, path = %file.display(), "already indexed, skipping");
            skipped += 1;
            continue;
        };
        result.with_context(|| format!("indexing {}", file.display()))?;
        indexed += 1;
    }

    index.commit()?;
    let stats = index.stats();
    tracing::info!(
        indexed,
        skipped,
        num_docs = stats.num_docs,
        vocabulary = stats.vocabulary_size,
        output = %output.display(),
        "index build complete"
    );
    Ok(())
}

fn is_indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| INDEXABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Slug for a file: its stem, lowercased, with runs of non-alphanumerics
/// collapsed to a single dash.
fn identifier_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let mut slug = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    (!slug.is_empty()).then_some(slug)
}
