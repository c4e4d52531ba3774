//! Traversal builder for graph reads and mutations.
//!
//! A `Traversal` is an ordered list of SurrealQL statements plus the bound
//! parameters they reference. User data is always bound (`$p0`, `$p1`, ...)
//! and never spliced into statement text; only table and field names, which
//! come from this crate and `codegraph_core::model::keys`, appear literally.

use crate::schema::{edge_table, NODE_TABLE};
use codegraph_core::model::{keys, EdgeKind, NodeKind};
use serde::Deserialize;

/// Bound parameter name/value pairs
pub type Params = Vec<(String, serde_json::Value)>;

/// A filter over vertices, rendered as a WHERE condition.
///
/// Conditions added with the builder methods are combined with AND;
/// `any_of` combines whole selections with OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexSelection {
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Label(NodeKind),
    Equals(&'static str, serde_json::Value),
    TargetOf { edge: EdgeKind, source_id: String },
    SourceOf { edge: EdgeKind, target_id: String },
    AnyOf(Vec<VertexSelection>),
}

impl VertexSelection {
    /// Every vertex
    pub fn all() -> Self {
        Self::default()
    }

    /// The vertex with this caller-supplied id
    pub fn id(node_id: impl Into<String>) -> Self {
        Self::all().has(keys::NODE_ID, node_id.into())
    }

    /// Vertices matching at least one of `selections`; none matches nothing
    pub fn any_of(selections: Vec<VertexSelection>) -> Self {
        Self {
            conditions: vec![Condition::AnyOf(selections)],
        }
    }

    /// Restrict to one label
    pub fn has_label(mut self, kind: NodeKind) -> Self {
        self.conditions.push(Condition::Label(kind));
        self
    }

    /// Restrict to vertices whose property `key` equals `value`
    pub fn has(mut self, key: &'static str, value: impl Into<serde_json::Value>) -> Self {
        self.conditions.push(Condition::Equals(key, value.into()));
        self
    }

    /// Restrict to targets of `edge` edges leaving `source_id` (one hop out)
    pub fn target_of(mut self, edge: EdgeKind, source_id: impl Into<String>) -> Self {
        self.conditions.push(Condition::TargetOf {
            edge,
            source_id: source_id.into(),
        });
        self
    }

    /// Restrict to sources of `edge` edges entering `target_id` (one hop in)
    pub fn source_of(mut self, edge: EdgeKind, target_id: impl Into<String>) -> Self {
        self.conditions.push(Condition::SourceOf {
            edge,
            target_id: target_id.into(),
        });
        self
    }

    /// Vertices adjacent to `node_id` in either direction over the given edge kinds
    pub fn adjacent(node_id: &str, edges: &[EdgeKind]) -> Self {
        Self::any_of(
            edges
                .iter()
                .flat_map(|&edge| {
                    [
                        Self::all().target_of(edge, node_id),
                        Self::all().source_of(edge, node_id),
                    ]
                })
                .collect(),
        )
    }

    fn render(&self, params: &mut Params) -> String {
        if self.conditions.is_empty() {
            return "true".to_string();
        }
        self.conditions
            .iter()
            .map(|condition| condition.render(params))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl Condition {
    fn render(&self, params: &mut Params) -> String {
        match self {
            Condition::Label(kind) => {
                format!("{} = {}", keys::LABEL, bind(params, kind.label()))
            }
            Condition::Equals(key, value) => format!("{} = {}", key, bind(params, value.clone())),
            Condition::TargetOf { edge, source_id } => format!(
                "id IN (SELECT VALUE out FROM {} WHERE in.{} = {})",
                edge_table(*edge),
                keys::NODE_ID,
                bind(params, source_id.as_str())
            ),
            Condition::SourceOf { edge, target_id } => format!(
                "id IN (SELECT VALUE in FROM {} WHERE out.{} = {})",
                edge_table(*edge),
                keys::NODE_ID,
                bind(params, target_id.as_str())
            ),
            Condition::AnyOf(selections) if selections.is_empty() => "false".to_string(),
            Condition::AnyOf(selections) => format!(
                "({})",
                selections
                    .iter()
                    .map(|selection| format!("({})", selection.render(params)))
                    .collect::<Vec<_>>()
                    .join(" OR ")
            ),
        }
    }
}

fn bind(params: &mut Params, value: impl Into<serde_json::Value>) -> String {
    let name = format!("p{}", params.len());
    params.push((name.clone(), value.into()));
    format!("${}", name)
}

/// Projected columns of a vertex read
const NODE_PROJECTION: [&str; 9] = [
    keys::NODE_ID,
    keys::LABEL,
    keys::NAME,
    keys::FILE_PATH,
    keys::START_LINE,
    keys::END_LINE,
    keys::LANGUAGE,
    keys::FILE_ID,
    keys::PROPERTIES,
];

/// Builder for a sequence of SurrealQL statements.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    statements: Vec<String>,
    params: Params,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete the selected vertices together with their incident edges
    pub fn drop_vertices(mut self, selection: &VertexSelection) -> Self {
        let condition = selection.render(&mut self.params);
        for edge in EdgeKind::ALL {
            self.statements.push(format!(
                "DELETE {table} WHERE in IN (SELECT VALUE id FROM {NODE_TABLE} WHERE {condition}) \
                 OR out IN (SELECT VALUE id FROM {NODE_TABLE} WHERE {condition})",
                table = edge_table(edge),
            ));
        }
        self.statements
            .push(format!("DELETE {} WHERE {}", NODE_TABLE, condition));
        self
    }

    /// Insert a vertex with the given label and stored properties
    pub fn add_vertex(
        mut self,
        kind: NodeKind,
        mut properties: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        properties.insert(keys::LABEL.to_string(), kind.label().into());
        let content = bind(&mut self.params, serde_json::Value::Object(properties));
        self.statements
            .push(format!("CREATE {} CONTENT {}", NODE_TABLE, content));
        self
    }

    /// Relate every vertex matching `from` to every vertex matching `to`.
    ///
    /// An empty side relates nothing, so no edge is ever left dangling.
    pub fn add_edge(mut self, edge: EdgeKind, from: &VertexSelection, to: &VertexSelection) -> Self {
        let from_condition = from.render(&mut self.params);
        let to_condition = to.render(&mut self.params);
        self.statements.push(format!(
            "FOR $src IN (SELECT VALUE id FROM {NODE_TABLE} WHERE {from_condition}) {{ \
             FOR $dst IN (SELECT VALUE id FROM {NODE_TABLE} WHERE {to_condition}) {{ \
             RELATE $src->{table}->$dst; \
             }}; }}",
            table = edge_table(edge),
        ));
        self
    }

    /// Project the selected vertices.
    ///
    /// Besides the stored columns each row carries `ownerPath`: the file
    /// path(s) of the File vertices containing it, as a list.
    pub fn select_vertices(mut self, selection: &VertexSelection) -> Self {
        let condition = selection.render(&mut self.params);
        self.statements.push(format!(
            "SELECT {columns}, <-{contains}<-{NODE_TABLE}.{path} AS {owner} FROM {NODE_TABLE} WHERE {condition}",
            columns = NODE_PROJECTION.join(", "),
            contains = edge_table(EdgeKind::Contains),
            path = keys::FILE_PATH,
            owner = keys::OWNER_PATH,
        ));
        self
    }

    /// Project one property of the selected vertices as bare values
    pub fn select_values(
        mut self,
        selection: &VertexSelection,
        key: &'static str,
        limit: Option<usize>,
    ) -> Self {
        let condition = selection.render(&mut self.params);
        let mut statement = format!("SELECT VALUE {} FROM {} WHERE {}", key, NODE_TABLE, condition);
        if let Some(limit) = limit {
            statement.push_str(&format!(" LIMIT {}", limit));
        }
        self.statements.push(statement);
        self
    }

    /// Project `edge` edges whose endpoints are both among `node_ids`
    pub fn select_edges_within(mut self, edge: EdgeKind, node_ids: Vec<String>) -> Self {
        let ids = bind(&mut self.params, node_ids);
        self.statements.push(format!(
            "SELECT in.{id} AS source, out.{id} AS target FROM {table} \
             WHERE in.{id} IN {ids} AND out.{id} IN {ids}",
            id = keys::NODE_ID,
            table = edge_table(edge),
        ));
        self
    }

    /// Count the selected vertices
    pub fn count_vertices(mut self, selection: &VertexSelection) -> Self {
        let condition = selection.render(&mut self.params);
        self.statements.push(format!(
            "SELECT count() AS count FROM {} WHERE {} GROUP ALL",
            NODE_TABLE, condition
        ));
        self
    }

    /// Count every edge of one kind
    pub fn count_edges(mut self, edge: EdgeKind) -> Self {
        self.statements.push(format!(
            "SELECT count() AS count FROM {} GROUP ALL",
            edge_table(edge)
        ));
        self
    }

    /// Delete every edge and vertex
    pub fn clear_all(mut self) -> Self {
        for edge in EdgeKind::ALL {
            self.statements.push(format!("DELETE {}", edge_table(edge)));
        }
        self.statements.push(format!("DELETE {}", NODE_TABLE));
        self
    }

    /// Full statement text, one statement per line
    pub fn text(&self) -> String {
        self.statements
            .iter()
            .map(|statement| format!("{};", statement))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Row returned by `Traversal::count_vertices` and `count_edges`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CountRow {
    pub count: u64,
}

/// Row returned by `Traversal::select_edges_within`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct EdgeEndpoints {
    pub source: String,
    pub target: String,
}
