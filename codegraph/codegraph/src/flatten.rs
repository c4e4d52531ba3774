//! Reshaping between ingested facts, stored records and `GraphNodeData`.
//!
//! Both services write the records built by `file_record`/`member_record`
//! and read every node back through `node_from_record`, so the rules live in
//! one place: single-element lists collapse to their scalar, nulls count as
//! absent, the fixed node fields are pulled out and whatever remains becomes
//! the node's `properties`.

use codegraph_core::error::{CodeGraphError, Result};
use codegraph_core::model::{
    keys, FileFact, GraphNodeData, MemberFact, NodeKind, Properties, RawRecord,
};
use serde_json::{Map, Value};

/// Stored record of a File: id, path, language and any extras
pub fn file_record(file: &FileFact) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(keys::NODE_ID.to_string(), file.id.clone().into());
    record.insert(keys::FILE_PATH.to_string(), file.file_path.clone().into());
    record.insert(keys::LANGUAGE.to_string(), file.language.clone().into());
    if !file.properties.is_empty() {
        record.insert(keys::PROPERTIES.to_string(), extras(&file.properties));
    }
    record
}

/// Stored record of a Function or Class
pub fn member_record(member: &MemberFact) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(keys::NODE_ID.to_string(), member.id.clone().into());
    record.insert(keys::NAME.to_string(), member.name.clone().into());
    record.insert(keys::FILE_ID.to_string(), member.file_id.clone().into());
    record.insert(keys::START_LINE.to_string(), member.start_line.into());
    record.insert(keys::END_LINE.to_string(), member.end_line.into());
    if !member.properties.is_empty() {
        record.insert(keys::PROPERTIES.to_string(), extras(&member.properties));
    }
    record
}

fn extras(properties: &Properties) -> Value {
    Value::Object(properties.clone().into_iter().collect())
}

/// Collapse single-element lists and drop null values
pub fn flatten_record(record: RawRecord) -> Properties {
    record
        .into_iter()
        .map(|(key, value)| (key, value.flatten()))
        .filter(|(_, value)| !value.is_null())
        .collect()
}

/// Build a node from a raw row.
///
/// A node without a stored `filePath` takes the path of its containing File.
/// Extra properties stored under `properties` are merged into the residual
/// map without overriding stored columns. Extras named like a fixed field
/// are ignored.
pub fn node_from_record(record: RawRecord) -> Result<GraphNodeData> {
    let mut properties = flatten_record(record);

    let id = take_string(&mut properties, keys::NODE_ID);
    let label = take_string(&mut properties, keys::LABEL);
    let node_type: NodeKind = label
        .parse()
        .map_err(|_| CodeGraphError::store(format!("Node {} has unknown label '{}'", id, label)))?;
    let name = take_string(&mut properties, keys::NAME);
    let owner_path = properties.remove(keys::OWNER_PATH).and_then(first_string);
    let file_path = properties
        .remove(keys::FILE_PATH)
        .and_then(first_string)
        .or(owner_path)
        .unwrap_or_default();
    let start_line = take_int(&mut properties, keys::START_LINE);
    let end_line = take_int(&mut properties, keys::END_LINE);

    if let Some(Value::Object(extras)) = properties.remove(keys::PROPERTIES) {
        for (key, value) in extras {
            if keys::FIXED.contains(&key.as_str()) {
                continue;
            }
            properties.entry(key).or_insert(value);
        }
    }

    Ok(GraphNodeData {
        id,
        node_type,
        name,
        file_path,
        start_line,
        end_line,
        properties,
    })
}

fn take_string(properties: &mut Properties, key: &str) -> String {
    properties
        .remove(key)
        .and_then(first_string)
        .unwrap_or_default()
}

fn take_int(properties: &mut Properties, key: &str) -> i64 {
    match properties.remove(key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        _ => 0,
    }
}

fn first_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Array(values) => values.into_iter().find_map(first_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_flatten_collapses_single_values() {
        let flat = flatten_record(record(json!({
            "name": ["foo"],
            "tags": ["a", "b"],
            "empty": [],
            "line": 4,
            "gone": null,
        })));

        assert_eq!(flat["name"], json!("foo"));
        assert_eq!(flat["tags"], json!(["a", "b"]));
        assert_eq!(flat["empty"], json!([]));
        assert_eq!(flat["line"], json!(4));
        assert!(!flat.contains_key("gone"));
    }

    #[test]
    fn test_function_node_from_record() {
        let node = node_from_record(record(json!({
            "nodeId": ["fn1"],
            "label": ["Function"],
            "name": ["foo"],
            "fileId": ["F1"],
            "startLine": [1],
            "endLine": [3],
            "ownerPath": ["/a.py"],
            "properties": {"async": true},
        })))
        .unwrap();

        assert_eq!(node.id, "fn1");
        assert_eq!(node.node_type, NodeKind::Function);
        assert_eq!(node.name, "foo");
        assert_eq!(node.file_path, "/a.py");
        assert_eq!((node.start_line, node.end_line), (1, 3));
        assert_eq!(node.properties.get("fileId"), Some(&json!("F1")));
        assert_eq!(node.properties.get("async"), Some(&json!(true)));
        assert!(!node.properties.contains_key("ownerPath"));
        assert!(!node.properties.contains_key("label"));
    }

    #[test]
    fn test_file_node_defaults() {
        let node = node_from_record(record(json!({
            "nodeId": "F1",
            "label": "File",
            "filePath": "/a.py",
            "language": "python",
            "ownerPath": [],
        })))
        .unwrap();

        assert_eq!(node.name, "");
        assert_eq!(node.file_path, "/a.py");
        assert_eq!((node.start_line, node.end_line), (0, 0));
        assert_eq!(node.properties.len(), 1);
        assert_eq!(node.properties["language"], json!("python"));
    }

    #[test]
    fn test_stored_columns_win_over_extras() {
        let node = node_from_record(record(json!({
            "nodeId": "fn1",
            "label": "Function",
            "fileId": "F1",
            "properties": {"fileId": "spoofed", "doc": "x"},
        })))
        .unwrap();

        assert_eq!(node.properties["fileId"], json!("F1"));
        assert_eq!(node.properties["doc"], json!("x"));
    }

    #[test]
    fn test_extras_cannot_shadow_fixed_fields() {
        let node = node_from_record(record(json!({
            "nodeId": "fx",
            "label": "Function",
            "name": "real",
            "fileId": "F1",
            "ownerPath": ["/a.py"],
            "properties": {"name": "spoof", "filePath": "/z", "startLine": 99, "doc": "x"},
        })))
        .unwrap();

        assert_eq!(node.name, "real");
        assert_eq!(node.file_path, "/a.py");
        assert_eq!(node.start_line, 0);
        let keys: Vec<&str> = node.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["doc", "fileId"]);
    }

    #[test]
    fn test_member_record_columns() {
        let record = member_record(
            &MemberFact::new("fn1", "foo", "F1", 1, 3).with_property("async", json!(true)),
        );
        assert_eq!(record[keys::FILE_ID], json!("F1"));
        assert_eq!(record[keys::START_LINE], json!(1));
        assert_eq!(record[keys::PROPERTIES]["async"], json!(true));

        let file = file_record(&FileFact::new("F1", "/a.py", "python"));
        assert!(!file.contains_key(keys::PROPERTIES));
        assert!(!file.contains_key(keys::NAME));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = node_from_record(record(json!({"nodeId": "m1", "label": "Module"}))).unwrap_err();
        assert!(err.is_store());
    }
}
