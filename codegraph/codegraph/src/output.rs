//! Output formatting utilities for the CodeGraph CLI.
//!
//! Human output uses styled status lines and tables; JSON output prints the
//! serialized result only, for scripting.

use anyhow::Result;
use codegraph_core::model::{GraphEdgeData, GraphNodeData};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;
use std::fmt::Display;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable formatted output
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Print a success message
pub fn success(msg: impl Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print an info message
pub fn info(msg: impl Display) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a section header
pub fn header(msg: impl Display) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: impl Display, value: impl Display) {
    println!("  {}: {}", style(key).cyan(), value);
}

/// Create a formatted table
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        Self { table }
    }

    pub fn header<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Display,
    {
        let row: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect();
        self.table.set_header(row);
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Display,
    {
        let row: Vec<Cell> = cells.into_iter().map(Cell::new).collect();
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> Table {
        self.table
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Table of nodes: id, type, name, file path, line span and properties
pub fn node_table(nodes: &[GraphNodeData]) -> Table {
    nodes
        .iter()
        .fold(
            TableBuilder::new().header(vec!["ID", "Type", "Name", "File", "Lines", "Properties"]),
            |table, node| {
                let properties = if node.properties.is_empty() {
                    String::new()
                } else {
                    serde_json::to_string(&node.properties).unwrap_or_default()
                };
                table.row(vec![
                    node.id.clone(),
                    node.node_type.to_string(),
                    node.name.clone(),
                    node.file_path.clone(),
                    format!("{}-{}", node.start_line, node.end_line),
                    properties,
                ])
            },
        )
        .build()
}

/// Table of edges: id, type, source and target
pub fn edge_table(edges: &[GraphEdgeData]) -> Table {
    edges
        .iter()
        .fold(
            TableBuilder::new().header(vec!["ID", "Type", "Source", "Target"]),
            |table, edge| {
                table.row(vec![
                    edge.id.clone(),
                    edge.edge_type.to_string(),
                    edge.source_id.clone(),
                    edge.target_id.clone(),
                ])
            },
        )
        .build()
}

/// Print data as pretty JSON
pub fn json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}
