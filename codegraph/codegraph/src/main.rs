//! CodeGraph CLI - ingest parsed source facts and query the code graph.
//!
//! # Usage
//!
//! ```bash
//! # Run the end-to-end demo on the embedded store
//! codegraph --in-memory demo
//!
//! # Ingest parser payloads and print one file's subgraph in the same run
//! codegraph --in-memory ingest a.json b.json --then-snapshot /a.py
//!
//! # Query a running SurrealDB server
//! codegraph --endpoint ws://localhost:8000 nodes --type Function
//! codegraph connected F1 --edge CONTAINS
//! codegraph --format json snapshot /a.py
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codegraph::commands::{self, ConfigOverrides};
use codegraph::{create_service, output, EdgeKind, NodeKind, OutputFormat, ServiceBackend};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(about = "CodeGraph - code structure graph ingestion and queries", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Graph store endpoint (overrides configuration)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Use the embedded in-memory store
    #[arg(long, global = true)]
    in_memory: bool,

    /// Service implementation
    #[arg(long, global = true)]
    backend: Option<BackendArg>,

    /// Output format (human, json)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Surrealdb,
    Reference,
}

impl From<BackendArg> for ServiceBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Surrealdb => ServiceBackend::SurrealDb,
            BackendArg::Reference => ServiceBackend::Reference,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest parser payloads (JSON ParsedCodeModel files)
    Ingest {
        /// Payload files, ingested in order
        #[arg(required = true)]
        payloads: Vec<PathBuf>,

        /// Print the snapshot of this file path after ingesting
        #[arg(long)]
        then_snapshot: Option<String>,
    },

    /// List nodes
    Nodes {
        /// Only nodes of this type (File, Function, Class)
        #[arg(short = 't', long = "type")]
        node_type: Option<String>,
    },

    /// List nodes adjacent to a node
    Connected {
        /// Node id
        node_id: String,

        /// Only follow edges of this type (CONTAINS)
        #[arg(short, long)]
        edge: Option<String>,
    },

    /// Show the subgraph of one file
    Snapshot {
        /// File path as ingested
        file_path: String,
    },

    /// Show node and edge counts
    Stats,

    /// Remove all nodes and edges
    Clear,

    /// Ingest a sample file and run every query against it
    Demo {
        /// Leave the sample data in the graph
        #[arg(long)]
        keep: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::error(format!("{:#}", e));
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format);

    let overrides = ConfigOverrides {
        config: cli.config,
        endpoint: cli.endpoint,
        in_memory: cli.in_memory,
        backend: cli.backend.map(ServiceBackend::from),
        verbose: cli.verbose,
    };
    let config = commands::load_config(&overrides).await?;

    init_logging(&config.general.log_level, cli.verbose);

    let service = create_service(&config)
        .await
        .context("Failed to create graph service")?;

    let result = match cli.command {
        Commands::Ingest {
            payloads,
            then_snapshot,
        } => commands::ingest(service.as_ref(), &payloads, then_snapshot.as_deref(), format).await,

        Commands::Nodes { node_type } => {
            let node_type = node_type
                .map(|t| t.parse::<NodeKind>())
                .transpose()
                .context("Invalid --type")?;
            commands::nodes(service.as_ref(), node_type, format).await
        }

        Commands::Connected { node_id, edge } => {
            let edge = edge
                .map(|e| e.parse::<EdgeKind>())
                .transpose()
                .context("Invalid --edge")?;
            commands::connected(service.as_ref(), &node_id, edge, format).await
        }

        Commands::Snapshot { file_path } => {
            commands::snapshot(service.as_ref(), &file_path, format).await
        }

        Commands::Stats => commands::stats(service.as_ref(), format).await,

        Commands::Clear => commands::clear(service.as_ref(), format).await,

        Commands::Demo { keep } => commands::demo(service.as_ref(), keep, format).await,
    };

    service.close().await.context("Failed to close graph service")?;
    result
}

fn init_logging(log_level: &str, verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("codegraph=debug,codegraph_storage=debug,codegraph_core=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "codegraph={level},codegraph_storage={level},codegraph_core={level},warn",
                level = log_level
            ))
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
