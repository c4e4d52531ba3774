//! Code graph model: node/edge value objects, ingestion input and raw store records.

use crate::error::{CodeGraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Open, string-keyed attribute map carried by nodes and edges.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Stored property keys shared by every graph backend.
///
/// Keys other than the fixed node fields end up in `GraphNodeData::properties`
/// when a node is read back, so both backends must agree on these names.
pub mod keys {
    pub const NODE_ID: &str = "nodeId";
    pub const LABEL: &str = "label";
    pub const NAME: &str = "name";
    pub const FILE_PATH: &str = "filePath";
    pub const START_LINE: &str = "startLine";
    pub const END_LINE: &str = "endLine";
    pub const LANGUAGE: &str = "language";
    pub const FILE_ID: &str = "fileId";
    pub const PROPERTIES: &str = "properties";
    /// Owner file path(s) derived from the inbound CONTAINS edge.
    pub const OWNER_PATH: &str = "ownerPath";

    /// Keys read into fixed node fields; parser extras may not use them.
    pub const FIXED: [&str; 8] = [
        NODE_ID, LABEL, NAME, FILE_PATH, START_LINE, END_LINE, OWNER_PATH, PROPERTIES,
    ];
}

/// Kinds of nodes in the code graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    File,
    Function,
    Class,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::File, NodeKind::Function, NodeKind::Class];

    /// Wire label of this kind
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Function => "Function",
            NodeKind::Class => "Class",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NodeKind {
    type Err = CodeGraphError;

    fn from_str(s: &str) -> Result<Self> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodeGraphError::invalid_input(format!("Unknown node type '{}'", s)))
    }
}

/// Kinds of edges in the code graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    /// File -> Function/Class containment
    #[serde(rename = "CONTAINS")]
    Contains,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 1] = [EdgeKind::Contains];

    /// Wire label of this kind
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EdgeKind {
    type Err = CodeGraphError;

    fn from_str(s: &str) -> Result<Self> {
        EdgeKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| CodeGraphError::invalid_input(format!("Unknown edge type '{}'", s)))
    }
}

/// A node as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNodeData {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
    pub name: String,
    pub file_path: String,
    pub start_line: i64,
    pub end_line: i64,
    pub properties: Properties,
}

/// An edge as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdgeData {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeKind,
    pub properties: Properties,
}

impl GraphEdgeData {
    /// Build a CONTAINS edge; the id is derived from its endpoints
    pub fn contains(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self::new(source_id, target_id, EdgeKind::Contains)
    }

    /// Build an edge of any kind with the derived `source->target` id
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, edge_type: EdgeKind) -> Self {
        let source_id = source_id.into();
        let target_id = target_id.into();
        Self {
            id: edge_id(&source_id, &target_id),
            source_id,
            target_id,
            edge_type,
            properties: Properties::new(),
        }
    }
}

/// Edge id for the ordered pair (source, target)
pub fn edge_id(source_id: &str, target_id: &str) -> String {
    format!("{}->{}", source_id, target_id)
}

/// Induced subgraph of one file and its direct children.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNodeData>,
    pub edges: Vec<GraphEdgeData>,
}

impl GraphSnapshot {
    /// Snapshot with no nodes and no edges
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Node and edge totals of a graph.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: u64,
    pub edges: u64,
}

/// File fact produced by a parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileFact {
    pub id: String,
    pub file_path: String,
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl FileFact {
    pub fn new(id: impl Into<String>, file_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_path: file_path.into(),
            language: language.into(),
            properties: Properties::new(),
        }
    }
}

/// Function or class fact produced by a parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemberFact {
    pub id: String,
    pub name: String,
    pub file_id: String,
    pub start_line: i64,
    pub end_line: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl MemberFact {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        file_id: impl Into<String>,
        start_line: i64,
        end_line: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            file_id: file_id.into(),
            start_line,
            end_line,
            properties: Properties::new(),
        }
    }

    /// Attach an extra property
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

pub type FunctionFact = MemberFact;
pub type ClassFact = MemberFact;

/// Parsed facts for a single source file: the unit of ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedCodeModel {
    pub file: FileFact,
    #[serde(default)]
    pub functions: Vec<FunctionFact>,
    #[serde(default)]
    pub classes: Vec<ClassFact>,
}

impl ParsedCodeModel {
    pub fn new(file: FileFact) -> Self {
        Self {
            file,
            functions: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: FunctionFact) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_class(mut self, class: ClassFact) -> Self {
        self.classes.push(class);
        self
    }

    /// Parse the JSON payload emitted by a parser
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON payload from disk
    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Functions then classes, in ingestion order
    pub fn members(&self) -> impl Iterator<Item = (NodeKind, &MemberFact)> {
        self.functions
            .iter()
            .map(|f| (NodeKind::Function, f))
            .chain(self.classes.iter().map(|c| (NodeKind::Class, c)))
    }

    /// Number of nodes this payload describes (file included)
    pub fn node_count(&self) -> usize {
        1 + self.functions.len() + self.classes.len()
    }

    /// Validate the payload before any graph mutation
    pub fn validate(&self) -> Result<()> {
        if self.file.id.is_empty() {
            return Err(CodeGraphError::invalid_input("File id cannot be empty"));
        }
        if self.file.file_path.is_empty() {
            return Err(CodeGraphError::invalid_input(format!(
                "File {} has an empty file path",
                self.file.id
            )));
        }

        reject_fixed_keys(NodeKind::File, &self.file.id, &self.file.properties)?;

        let mut seen = HashSet::new();
        seen.insert(self.file.id.as_str());

        for (kind, member) in self.members() {
            if member.id.is_empty() {
                return Err(CodeGraphError::invalid_input(format!(
                    "{} '{}' has an empty id",
                    kind, member.name
                )));
            }
            if member.file_id != self.file.id {
                return Err(CodeGraphError::invalid_input(format!(
                    "{} {} belongs to file {} but was submitted with file {}",
                    kind, member.id, member.file_id, self.file.id
                )));
            }
            if member.start_line > member.end_line {
                return Err(CodeGraphError::invalid_input(format!(
                    "{} {} ends (line {}) before it starts (line {})",
                    kind, member.id, member.end_line, member.start_line
                )));
            }
            reject_fixed_keys(kind, &member.id, &member.properties)?;
            if !seen.insert(member.id.as_str()) {
                return Err(CodeGraphError::invalid_input(format!(
                    "Duplicate node id {} in payload",
                    member.id
                )));
            }
        }

        Ok(())
    }
}

fn reject_fixed_keys(kind: NodeKind, node_id: &str, properties: &Properties) -> Result<()> {
    match properties.keys().find(|key| keys::FIXED.contains(&key.as_str())) {
        Some(key) => Err(CodeGraphError::invalid_input(format!(
            "{} {} has an extra property '{}' that shadows a node field",
            kind, node_id, key
        ))),
        None => Ok(()),
    }
}

/// A single property value as returned by the store.
///
/// Stores may hand back every property as a list; `flatten` collapses
/// single-element lists to their scalar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyValue {
    Many(Vec<serde_json::Value>),
    One(serde_json::Value),
}

impl PropertyValue {
    pub fn flatten(self) -> serde_json::Value {
        match self {
            PropertyValue::Many(mut values) if values.len() == 1 => values.remove(0),
            PropertyValue::Many(values) => serde_json::Value::Array(values),
            PropertyValue::One(value) => value,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(values) => PropertyValue::Many(values),
            other => PropertyValue::One(other),
        }
    }
}

/// A raw store row keyed by property name.
pub type RawRecord = BTreeMap<String, PropertyValue>;
