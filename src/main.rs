//! Mindgraph CLI - Command-line interface for the mental-model relationship catalog

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use mindgraph::catalog::ModelCatalog;
use mindgraph::config;
use mindgraph::relationship::{RelationshipCandidate, ReviewStatus};
use mindgraph::seed;
use mindgraph::server::McpService;
use mindgraph::storage::SqliteStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mindgraph")]
#[command(version = "0.1.0")]
#[command(about = "Mental-model relationship catalog over a SQLite row store")]
#[command(long_about = r#"
Mindgraph maintains a catalog of mental models and the reviewed pairwise
relationships between them:
  • Validated relationship records with confidence and provenance
  • Idempotent seeding from JSON candidate lists
  • An MCP stdio server exposing the catalog as tools

Example usage:
  mindgraph seed
  mindgraph list --model inversion
  mindgraph serve
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default mindgraph.toml config
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Seed the store from a candidate list (built-in set by default)
    Seed {
        /// Path to a JSON array of relationship candidates
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Create a single relationship from a JSON candidate file
    Add {
        /// Path to a JSON candidate object
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show a persisted relationship by id
    Show {
        /// Relationship id
        #[arg(short, long)]
        id: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List relationships, optionally filtered
    List {
        /// Only relationships touching this model id
        #[arg(short, long)]
        model: Option<String>,

        /// Only relationships with this review status
        #[arg(short, long)]
        status: Option<String>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List the mental-model catalog
    Models {
        /// Only models in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Path to a catalog JSON file (built-in set by default)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show statistics about the relationship store
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Run the MCP stdio server
    Serve {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Path to a catalog JSON file (built-in set by default)
        #[arg(long)]
        models: Option<PathBuf>,
    },
}

/// Flag > config file > default path, in that order
fn resolve_database(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Some(cfg) = config::load_config(None)? {
        if let Some(db) = cfg.database {
            return Ok(PathBuf::from(db));
        }
    }
    Ok(config::default_database_path_in(Path::new(".")))
}

fn open_store(flag: Option<PathBuf>) -> anyhow::Result<SqliteStore> {
    let db_path = resolve_database(flag)?;
    config::ensure_db_dir(&db_path)?;
    Ok(SqliteStore::open(&db_path)?)
}

fn resolve_catalog(flag: Option<PathBuf>) -> anyhow::Result<ModelCatalog> {
    if let Some(path) = flag {
        return Ok(ModelCatalog::load(&path)?);
    }
    if let Some(cfg) = config::load_config(None)? {
        if let Some(models) = cfg.models {
            return Ok(ModelCatalog::load(Path::new(&models))?);
        }
    }
    Ok(ModelCatalog::builtin()?)
}

fn print_relationships(relationships: &[mindgraph::Relationship]) {
    for rel in relationships {
        println!(
            "- {} [{}] {} <-> {} (confidence: {:.2}, status: {})",
            rel.id, rel.relationship_type, rel.model_a, rel.model_b, rel.confidence, rel.review_status
        );
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let config_path = config::default_config_path();
            let db_path = config::default_database_path_in(Path::new("."));
            let cfg = config::MindgraphConfig {
                database: Some(db_path.to_string_lossy().to_string()),
                models: None,
            };
            config::write_config(&config_path, &cfg, force)?;
            config::ensure_db_dir(&db_path)?;
            println!("✅ Wrote {}", config_path.display());
        }

        Commands::Seed { file, database } => {
            let candidates = match &file {
                Some(path) => seed::load_candidates(path)?,
                None => seed::builtin_candidates()?,
            };

            let store = open_store(database)?;
            println!("🌱 Seeding {} candidates...", candidates.len());

            let summary = seed::seed_all(&store, &candidates);
            println!("{}", summary);
            for failure in &summary.failures {
                println!("   ❌ {}: {}", failure.id, failure.reason);
            }
        }

        Commands::Add { file, database } => {
            let contents = std::fs::read_to_string(&file)?;
            let candidate: RelationshipCandidate = serde_json::from_str(&contents)?;

            let store = open_store(database)?;
            match store.create_relationship(&candidate) {
                Ok(record) => {
                    println!("✅ Created relationship: {}", record.id);
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                Err(e) => {
                    println!("❌ Rejected: {}", e);
                }
            }
        }

        Commands::Show { id, database } => {
            let store = open_store(database)?;
            match store.get_relationship(&id)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("∅ No relationship with id '{}'.", id),
            }
        }

        Commands::List { model, status, database } => {
            let store = open_store(database)?;

            let relationships = if let Some(model) = model {
                println!("🔍 Relationships touching '{}':", model);
                store.find_for_model(&model)?
            } else if let Some(status) = status {
                use std::str::FromStr;
                let parsed = ReviewStatus::from_str(&status)?;
                println!("🔍 Relationships with status '{}':", parsed);
                store.find_by_status(parsed)?
            } else {
                store.list_relationships()?
            };

            if relationships.is_empty() {
                println!("∅ No relationships found.");
            } else {
                print_relationships(&relationships);
            }
        }

        Commands::Models { category, file } => {
            let catalog = resolve_catalog(file)?;
            let models: Vec<_> = match &category {
                Some(cat) => catalog.by_category(cat),
                None => catalog.all().iter().collect(),
            };

            if models.is_empty() {
                println!("∅ No models found.");
            } else {
                for model in models {
                    println!("- {} ({}): {}", model.id, model.category, model.name);
                    println!("  {}", model.description);
                }
            }
        }

        Commands::Stats { database } => {
            let db_path = resolve_database(database)?;
            let store = SqliteStore::open(&db_path)?;
            let stats = store.stats()?;

            println!("📊 Mindgraph Statistics ({:?})", db_path);
            println!("------------------------------------");
            println!("{}", stats);
        }

        Commands::Serve { database, models } => {
            let db_path = resolve_database(database)?;
            config::ensure_db_dir(&db_path)?;
            // Create the schema up front so the first tool call never races
            // schema initialization.
            SqliteStore::open(&db_path)?;

            let catalog = resolve_catalog(models)?;
            tracing::info!(database = %db_path.display(), "starting MCP stdio server");

            let service = McpService::new(db_path, catalog);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(service.run_stdio())?;
        }
    }

    Ok(())
}
