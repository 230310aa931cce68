//! kith CLI: knowledge graph store for personal memory records.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use kith::entity::{EntityId, EntityType};
use kith::pipeline::{IngestMode, Pipeline};
use kith::query::query_context;
use kith::store::{open_store, Backend, EntityFilter, StoreConfig, TripletFilter};
use kith::triplet::Predicate;

#[derive(Parser)]
#[command(name = "kith", version, about = "Knowledge graph store for personal memory records")]
struct Cli {
    /// Storage backend.
    #[arg(long, global = true, default_value = "json")]
    store: Backend,

    /// Graph location; the backend's extension is appended when missing.
    #[arg(long, global = true, default_value = "memory-graph")]
    store_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one memory file into the graph.
    Process {
        /// Markdown memory document or JSON record.
        file: PathBuf,

        /// Discard the existing graph before ingesting.
        #[arg(long)]
        replace: bool,
    },

    /// Ingest every recognized memory file in a directory.
    ProcessDirectory {
        /// Directory to scan (non-recursive).
        dir: PathBuf,

        /// Only ingest file names ending with this suffix.
        #[arg(long)]
        pattern: Option<String>,

        /// Discard the existing graph before ingesting.
        #[arg(long)]
        replace: bool,
    },

    /// Show graph statistics.
    Stats,

    /// Look up everything known about an entity.
    Query {
        /// Entity display name or canonical id.
        name: String,

        /// Output format: text or json.
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List entities, optionally filtered.
    ListEntities {
        /// Only entities of this type (person, place, event, ...).
        #[arg(long)]
        entity_type: Option<EntityType>,

        /// Case-insensitive substring of the display name.
        #[arg(long)]
        name_pattern: Option<String>,
    },

    /// List triplets, optionally filtered.
    ListTriplets {
        /// Subject display name or canonical id.
        #[arg(long)]
        subject: Option<String>,

        /// Predicate name, e.g. worksAt.
        #[arg(long)]
        predicate: Option<String>,

        /// Object display name or canonical id.
        #[arg(long)]
        object: Option<String>,
    },
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
        .init();

    let cli = Cli::parse();
    let config = StoreConfig::new(cli.store, cli.store_path);

    match cli.command {
        Commands::Process { file, replace } => {
            let store = open_store(&config)?;
            let mut pipeline = Pipeline::new(store);
            let report = pipeline.ingest_file(&file, mode(replace))?;
            print!("{report}");
            println!(
                "Graph: {} entities, {} triplets",
                pipeline.store().entity_count(),
                pipeline.store().triplet_count()
            );
        }

        Commands::ProcessDirectory {
            dir,
            pattern,
            replace,
        } => {
            let store = open_store(&config)?;
            let mut pipeline = Pipeline::new(store);
            let report = pipeline.ingest_directory(&dir, pattern.as_deref(), mode(replace))?;
            print!("{report}");
            println!(
                "Graph: {} entities, {} triplets",
                pipeline.store().entity_count(),
                pipeline.store().triplet_count()
            );
        }

        Commands::Stats => {
            let store = open_store(&config)?;
            print!("{}", store.statistics());
        }

        Commands::Query { name, format } => {
            let store = open_store(&config)?;
            let context = query_context(store.as_ref(), &name)?;
            match format.as_str() {
                "text" => print!("{context}"),
                "json" => {
                    let json = serde_json::to_string_pretty(&context).into_diagnostic()?;
                    println!("{json}");
                }
                other => miette::bail!("unknown output format {other:?}, expected text or json"),
            }
        }

        Commands::ListEntities {
            entity_type,
            name_pattern,
        } => {
            let store = open_store(&config)?;
            let mut filter = EntityFilter::any();
            if let Some(kind) = entity_type {
                filter = filter.with_kind(kind);
            }
            if let Some(pattern) = name_pattern {
                filter = filter.with_name_pattern(pattern);
            }
            let entities = store.find_entities(&filter);
            if entities.is_empty() {
                println!("No entities matched.");
            } else {
                println!("Entities ({}):", entities.len());
                for entity in &entities {
                    println!(
                        "  {} \"{}\" [{}] @{:.2}",
                        entity.id, entity.display_name, entity.kind, entity.confidence
                    );
                }
            }
        }

        Commands::ListTriplets {
            subject,
            predicate,
            object,
        } => {
            let store = open_store(&config)?;
            let mut filter = TripletFilter::any();
            if let Some(name) = subject.as_deref() {
                filter = filter.with_subject(EntityId::derive(name));
            }
            if let Some(name) = predicate {
                filter = filter.with_predicate(Predicate::from(name));
            }
            if let Some(name) = object.as_deref() {
                filter = filter.with_object(EntityId::derive(name));
            }
            let triplets = store.find_triplets(&filter);
            if triplets.is_empty() {
                println!("No triplets matched.");
            } else {
                println!("Triplets ({}):", triplets.len());
                for triplet in &triplets {
                    println!(
                        "  {} -> {} -> {} @{:.2}",
                        triplet.subject_id, triplet.predicate, triplet.object_id, triplet.confidence
                    );
                }
            }
        }
    }

    Ok(())
}

fn mode(replace: bool) -> IngestMode {
    if replace {
        IngestMode::Replace
    } else {
        IngestMode::Merge
    }
}
