//! erg CLI: resolve an extracted knowledge graph from a JSON file.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use erg_resolve::config::ResolutionConfig;
use erg_resolve::diagram::DiagramOptions;
use erg_resolve::embedding::{EmbeddingProvider, NgramEmbedder};
use erg_resolve::erg::EntityResolutionGraph;
use erg_resolve::linker::RelationLinker;
use erg_resolve::model::KnowledgeGraph;

#[derive(Parser)]
#[command(name = "erg", version, about = "Entity resolution graph builder")]
struct Cli {
    /// TOML file with resolution settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the vector similarity threshold.
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Enable the vector signal with the local character n-gram embedder.
    #[arg(long, global = true)]
    ngram_embeddings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve mentions and print the resolution graph.
    Resolve {
        /// Path to a JSON knowledge graph (`entities` + `relations`).
        #[arg(long)]
        input: PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Resolve, then print the canonical, deduplicated relations as JSON.
    Link {
        #[arg(long)]
        input: PathBuf,
    },

    /// Resolve, then print a Mermaid diagram of the canonical entities.
    Diagram {
        #[arg(long)]
        input: PathBuf,

        /// Include one node per constituent mention.
        #[arg(long)]
        mentions: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ResolutionConfig::load(path)?,
        None => ResolutionConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config = config.with_similarity_threshold(threshold)?;
    }

    let ngram = NgramEmbedder::default();
    let embedder: Option<&dyn EmbeddingProvider> = if cli.ngram_embeddings {
        Some(&ngram)
    } else {
        None
    };

    match cli.command {
        Commands::Resolve { input, format } => {
            let graph = read_graph(&input)?;
            let erg = EntityResolutionGraph::build(&graph, &config, embedder)?;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&erg).into_diagnostic()?;
                    println!("{json}");
                }
                OutputFormat::Summary => print_summary(&erg),
            }
        }

        Commands::Link { input } => {
            let graph = read_graph(&input)?;
            let erg = EntityResolutionGraph::build(&graph, &config, embedder)?;
            let relations = RelationLinker::new(&erg).link_and_deduplicate(&graph.relations);
            let json = serde_json::to_string_pretty(&relations).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Diagram { input, mentions } => {
            let graph = read_graph(&input)?;
            let erg = EntityResolutionGraph::build(&graph, &config, embedder)?;
            let options = DiagramOptions {
                show_mentions: mentions,
                ..Default::default()
            };
            print!("{}", erg.to_diagram_with(&options));
        }
    }

    Ok(())
}

fn read_graph(path: &Path) -> Result<KnowledgeGraph> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    serde_json::from_str(&content).into_diagnostic()
}

fn print_summary(erg: &EntityResolutionGraph) {
    println!("{}", erg.stats());
    for canonical in erg.canonical_ids() {
        let mentions = erg.mentions_for_entity(canonical);
        let label = erg.canonical_text(canonical).unwrap_or(canonical);
        println!("  \"{label}\" / {canonical} ({} mentions)", mentions.len());
        for record in mentions {
            println!(
                "    - \"{}\" / {} [chunk {}]",
                record.text, record.mention_id, record.chunk_index
            );
        }
    }
}
