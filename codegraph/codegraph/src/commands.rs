//! CLI command implementations.
//!
//! Every command receives the service built by `main` and prints its result
//! in the requested `OutputFormat`.

use crate::output::{self, edge_table, node_table, OutputFormat};
use anyhow::{Context, Result};
use codegraph_core::config::{CodeGraphConfig, ServiceBackend};
use codegraph_core::model::{
    EdgeKind, FileFact, GraphNodeData, GraphSnapshot, MemberFact, NodeKind, ParsedCodeModel,
};
use codegraph_core::traits::GraphQueryService;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration
// ============================================================================

/// Global CLI flags that override the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub in_memory: bool,
    pub backend: Option<ServiceBackend>,
    pub verbose: bool,
}

/// Resolve configuration: file (or defaults), then environment, then flags
pub async fn load_config(overrides: &ConfigOverrides) -> Result<CodeGraphConfig> {
    let mut config = match &overrides.config {
        Some(path) => CodeGraphConfig::load_from_path(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CodeGraphConfig::from_env().context("Invalid configuration in environment")?,
    };

    if let Some(endpoint) = &overrides.endpoint {
        config.store.endpoint = endpoint.clone();
        config.store.use_in_memory = false;
    }
    if overrides.in_memory {
        config.store.use_in_memory = true;
    }
    if let Some(backend) = overrides.backend {
        config.service.backend = backend;
    }
    if overrides.verbose {
        config.general.log_level = "debug".to_string();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ============================================================================
// Ingest Command
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestSummary {
    file_id: String,
    file_path: String,
    functions: usize,
    classes: usize,
}

#[derive(Debug, Serialize)]
struct IngestReport {
    ingested: Vec<IngestSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<GraphSnapshot>,
}

/// Ingest parser payloads, optionally printing one file's snapshot afterwards
pub async fn ingest(
    service: &dyn GraphQueryService,
    payloads: &[PathBuf],
    then_snapshot: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let mut ingested = Vec::with_capacity(payloads.len());

    for path in payloads {
        let parsed = read_payload(path).await?;
        service
            .ingest_parsed_code(&parsed)
            .await
            .with_context(|| format!("Failed to ingest {}", path.display()))?;

        let summary = IngestSummary {
            file_id: parsed.file.id.clone(),
            file_path: parsed.file.file_path.clone(),
            functions: parsed.functions.len(),
            classes: parsed.classes.len(),
        };
        if !format.is_json() {
            output::success(format!(
                "Ingested {} ({}): {} functions, {} classes",
                summary.file_id, summary.file_path, summary.functions, summary.classes
            ));
        }
        ingested.push(summary);
    }

    let snapshot = match then_snapshot {
        Some(file_path) => Some(
            service
                .get_code_graph_snapshot(file_path)
                .await
                .with_context(|| format!("Failed to build snapshot of {}", file_path))?,
        ),
        None => None,
    };

    match format {
        OutputFormat::Json => output::json(&IngestReport { ingested, snapshot })?,
        OutputFormat::Human => {
            if let (Some(file_path), Some(snapshot)) = (then_snapshot, &snapshot) {
                print_snapshot(file_path, snapshot);
            }
        }
    }

    Ok(())
}

async fn read_payload(path: &Path) -> Result<ParsedCodeModel> {
    ParsedCodeModel::from_path(path)
        .await
        .with_context(|| format!("Failed to load payload {}", path.display()))
}

// ============================================================================
// Query Commands
// ============================================================================

/// List nodes, optionally of one kind
pub async fn nodes(
    service: &dyn GraphQueryService,
    node_type: Option<NodeKind>,
    format: OutputFormat,
) -> Result<()> {
    let nodes = service
        .get_all_nodes(node_type)
        .await
        .context("Failed to list nodes")?;
    print_nodes(&nodes, format, "No nodes found")
}

/// List nodes adjacent to one node
pub async fn connected(
    service: &dyn GraphQueryService,
    node_id: &str,
    edge_type: Option<EdgeKind>,
    format: OutputFormat,
) -> Result<()> {
    let nodes = service
        .get_connected_nodes(node_id, edge_type)
        .await
        .with_context(|| format!("Failed to list nodes connected to {}", node_id))?;
    print_nodes(&nodes, format, &format!("No nodes connected to {}", node_id))
}

/// Print the subgraph of one file
pub async fn snapshot(
    service: &dyn GraphQueryService,
    file_path: &str,
    format: OutputFormat,
) -> Result<()> {
    let snapshot = service
        .get_code_graph_snapshot(file_path)
        .await
        .with_context(|| format!("Failed to build snapshot of {}", file_path))?;

    match format {
        OutputFormat::Json => output::json(&snapshot)?,
        OutputFormat::Human => print_snapshot(file_path, &snapshot),
    }
    Ok(())
}

/// Print node and edge totals
pub async fn stats(service: &dyn GraphQueryService, format: OutputFormat) -> Result<()> {
    let stats = service.stats().await.context("Failed to count graph")?;

    match format {
        OutputFormat::Json => output::json(&stats)?,
        OutputFormat::Human => {
            output::header("Graph statistics");
            output::kv("Backend", service.backend_name());
            output::kv("Nodes", stats.nodes);
            output::kv("Edges", stats.edges);
        }
    }
    Ok(())
}

/// Remove every node and edge
pub async fn clear(service: &dyn GraphQueryService, format: OutputFormat) -> Result<()> {
    service.clear().await.context("Failed to clear graph")?;
    if !format.is_json() {
        output::success("Graph cleared");
    }
    Ok(())
}

// ============================================================================
// Demo Command
// ============================================================================

/// The sample file used by `demo`: `/a.py` with two functions and a class
pub fn sample_model() -> ParsedCodeModel {
    ParsedCodeModel::new(FileFact::new("F1", "/a.py", "python"))
        .with_function(MemberFact::new("fn1", "foo", "F1", 1, 3))
        .with_function(MemberFact::new("fn2", "bar", "F1", 5, 8))
        .with_class(MemberFact::new("cl1", "Baz", "F1", 10, 20))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoReport {
    all_nodes: Vec<GraphNodeData>,
    functions: Vec<GraphNodeData>,
    connected: Vec<GraphNodeData>,
    snapshot: GraphSnapshot,
}

/// Clear the graph, ingest the sample model and run every query against it.
///
/// The graph is cleared again at the end unless `keep` is set.
pub async fn demo(service: &dyn GraphQueryService, keep: bool, format: OutputFormat) -> Result<()> {
    service
        .clear()
        .await
        .context("Failed to clear graph before demo")?;

    let model = sample_model();
    service
        .ingest_parsed_code(&model)
        .await
        .context("Failed to ingest sample model")?;

    let report = DemoReport {
        all_nodes: service.get_all_nodes(None).await?,
        functions: service.get_all_nodes(Some(NodeKind::Function)).await?,
        connected: service.get_connected_nodes(&model.file.id, None).await?,
        snapshot: service.get_code_graph_snapshot(&model.file.file_path).await?,
    };

    match format {
        OutputFormat::Json => output::json(&report)?,
        OutputFormat::Human => {
            output::success(format!(
                "Ingested {} ({}) using the {} backend",
                model.file.id,
                model.file.file_path,
                service.backend_name()
            ));
            output::header("All nodes");
            println!("{}", node_table(&report.all_nodes));
            output::header("Function nodes");
            println!("{}", node_table(&report.functions));
            output::header(format!("Nodes connected to {}", model.file.id));
            println!("{}", node_table(&report.connected));
            print_snapshot(&model.file.file_path, &report.snapshot);
        }
    }

    if !keep {
        service
            .clear()
            .await
            .context("Failed to clear graph after demo")?;
    }
    Ok(())
}

// ============================================================================
// Printing helpers
// ============================================================================

fn print_nodes(nodes: &[GraphNodeData], format: OutputFormat, empty_msg: &str) -> Result<()> {
    match format {
        OutputFormat::Json => output::json(&nodes)?,
        OutputFormat::Human => {
            if nodes.is_empty() {
                output::info(empty_msg);
            } else {
                println!("{}", node_table(nodes));
            }
        }
    }
    Ok(())
}

fn print_snapshot(file_path: &str, snapshot: &GraphSnapshot) {
    output::header(format!("Snapshot of {}", file_path));
    if snapshot.is_empty() {
        output::info(format!("No file node with path {}", file_path));
        return;
    }
    println!("{}", node_table(&snapshot.nodes));
    println!("{}", edge_table(&snapshot.edges));
}
