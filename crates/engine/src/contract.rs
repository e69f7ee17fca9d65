//! Contract compiler (spec C4) — statically validates edge type
//! compatibility and required fields, with content-addressed snapshot reuse.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{CatalogEntry, Edge, NodeCatalog, NodeDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Valid,
    Warning,
    Invalid,
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Valid => "valid",
            Self::Warning => "warning",
            Self::Invalid => "invalid",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub code: String,
    pub edge_id: String,
    pub message: String,
    pub severity: IssueSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeContract {
    pub edge_id: String,
    pub source_output_schema: serde_json::Value,
    pub target_input_schema: serde_json::Value,
    pub status: ContractStatus,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub workflow_id: Uuid,
    pub workflow_version_id: Option<Uuid>,
    pub graph_hash: String,
    pub status: ContractStatus,
    pub node_count: usize,
    pub edge_count: usize,
    pub edge_contracts: Vec<EdgeContract>,
    pub issues: Vec<Issue>,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object" })
}

fn schema_type(schema: &serde_json::Value) -> Option<&str> {
    schema.get("type").and_then(|v| v.as_str())
}

fn required_fields(schema: &serde_json::Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn source_properties(schema: &serde_json::Value) -> std::collections::HashSet<String> {
    schema
        .get("properties")
        .and_then(|v| v.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

/// Compile edge contracts for a workflow's nodes/edges. `strict` promotes
/// "missing required field" from a warning to an error.
pub fn compile_edges(nodes: &[NodeDefinition], edges: &[Edge], catalog: &NodeCatalog, strict: bool) -> Vec<EdgeContract> {
    let by_id: std::collections::HashMap<&str, &NodeDefinition> =
        nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    edges
        .iter()
        .map(|edge| compile_one_edge(edge, &by_id, catalog, strict))
        .collect()
}

fn compile_one_edge(
    edge: &Edge,
    by_id: &std::collections::HashMap<&str, &NodeDefinition>,
    catalog: &NodeCatalog,
    strict: bool,
) -> EdgeContract {
    let mut issues = Vec::new();

    let source_node = by_id.get(edge.source.as_str());
    let target_node = by_id.get(edge.target.as_str());

    if source_node.is_none() {
        issues.push(Issue {
            code: "UNKNOWN_SOURCE_PATH".to_string(),
            edge_id: edge.id.clone(),
            message: format!("source node '{}' not found", edge.source),
            severity: IssueSeverity::Warning,
        });
    }
    if target_node.is_none() {
        issues.push(Issue {
            code: "UNKNOWN_SOURCE_PATH".to_string(),
            edge_id: edge.id.clone(),
            message: format!("target node '{}' not found", edge.target),
            severity: IssueSeverity::Warning,
        });
    }

    let source_entry: Option<&CatalogEntry> = source_node.and_then(|n| catalog.get(&n.node_type));
    let target_entry: Option<&CatalogEntry> = target_node.and_then(|n| catalog.get(&n.node_type));

    let source_schema = source_entry.map(|e| e.output_schema.clone()).unwrap_or_else(default_schema);
    let target_schema = target_entry.map(|e| e.input_schema.clone()).unwrap_or_else(default_schema);

    let source_type = schema_type(&source_schema);
    let target_type = schema_type(&target_schema);

    if let (Some(st), Some(tt)) = (source_type, target_type) {
        if st != tt && st != "any" && tt != "any" {
            issues.push(Issue {
                code: "TYPE_MISMATCH".to_string(),
                edge_id: edge.id.clone(),
                message: format!("source type '{st}' incompatible with target type '{tt}'"),
                severity: IssueSeverity::Error,
            });
        }
    }

    let source_props = source_properties(&source_schema);
    for field in required_fields(&target_schema) {
        if !source_props.contains(&field) {
            issues.push(Issue {
                code: "MISSING_REQUIRED_FIELD".to_string(),
                edge_id: edge.id.clone(),
                message: format!("required field '{field}' not produced upstream"),
                severity: if strict { IssueSeverity::Error } else { IssueSeverity::Warning },
            });
        }
    }

    let status = rollup_status(&issues, strict);

    EdgeContract {
        edge_id: edge.id.clone(),
        source_output_schema: source_schema,
        target_input_schema: target_schema,
        status,
        issues,
    }
}

fn rollup_status(issues: &[Issue], strict: bool) -> ContractStatus {
    if issues.iter().any(|i| i.severity == IssueSeverity::Error) {
        return ContractStatus::Invalid;
    }
    if !issues.is_empty() {
        return if strict { ContractStatus::Invalid } else { ContractStatus::Warning };
    }
    ContractStatus::Valid
}

fn rollup_overall(edge_contracts: &[EdgeContract]) -> ContractStatus {
    if edge_contracts.iter().any(|c| c.status == ContractStatus::Invalid) {
        ContractStatus::Invalid
    } else if edge_contracts.iter().any(|c| c.status == ContractStatus::Warning) {
        ContractStatus::Warning
    } else {
        ContractStatus::Valid
    }
}

/// `sha256(canonical_json(nodes, edges))`, hex-encoded. Canonical form sorts
/// object keys so the hash is stable under field-reordering but sensitive to
/// any semantic change in the graph.
pub fn graph_hash(nodes: &[NodeDefinition], edges: &[Edge]) -> String {
    let canonical = canonical_json(nodes, edges);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

fn canonical_json(nodes: &[NodeDefinition], edges: &[Edge]) -> String {
    let nodes_value = serde_json::to_value(nodes).expect("NodeDefinition always serialises");
    let edges_value = serde_json::to_value(edges).expect("Edge always serialises");
    let sorted_nodes = sort_json_keys(nodes_value);
    let sorted_edges = sort_json_keys(edges_value);
    serde_json::json!({ "nodes": sorted_nodes, "edges": sorted_edges }).to_string()
}

/// Recursively re-serialise through a `BTreeMap` so object keys sort
/// deterministically regardless of struct field order.
fn sort_json_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> =
                map.into_iter().map(|(k, v)| (k, sort_json_keys(v))).collect();
            serde_json::to_value(sorted).expect("BTreeMap<String, Value> always serialises")
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_json_keys).collect())
        }
        other => other,
    }
}

/// Compile a full contract snapshot for a workflow graph.
pub fn compile(
    workflow_id: Uuid,
    workflow_version_id: Option<Uuid>,
    nodes: &[NodeDefinition],
    edges: &[Edge],
    catalog: &NodeCatalog,
    strict: bool,
) -> ContractSnapshot {
    let edge_contracts = compile_edges(nodes, edges, catalog, strict);
    let status = rollup_overall(&edge_contracts);
    let issues = edge_contracts.iter().flat_map(|c| c.issues.clone()).collect();

    ContractSnapshot {
        workflow_id,
        workflow_version_id,
        graph_hash: graph_hash(nodes, edges),
        status,
        node_count: nodes.len(),
        edge_count: edges.len(),
        edge_contracts,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeData, NodeKind};

    fn catalog_entry(node_type: &str, output: serde_json::Value, input: serde_json::Value) -> (String, CatalogEntry) {
        (
            node_type.to_string(),
            CatalogEntry {
                node_type: node_type.to_string(),
                node_kind: NodeKind::Action,
                input_schema: input,
                output_schema: output,
                config_schema: serde_json::Value::Null,
                credential_type: None,
                cost_hint_usd: 0.0,
                latency_hint_ms: 0,
            },
        )
    }

    fn node(id: &str, node_type: &str) -> NodeDefinition {
        NodeDefinition {
            id: id.into(),
            node_type: node_type.into(),
            node_kind: NodeKind::Action,
            position: None,
            data: NodeData { label: id.into(), config: serde_json::Value::Null },
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge { id: id.into(), source: source.into(), target: target.into(), source_handle: None, target_handle: None, condition: None }
    }

    #[test]
    fn missing_required_field_is_warning_unless_strict() {
        let catalog: NodeCatalog = [
            catalog_entry("source_t", serde_json::json!({"type":"object","properties":{}}), serde_json::json!({"type":"object"})),
            catalog_entry("target_t", serde_json::json!({"type":"object"}), serde_json::json!({"type":"object","required":["email"]})),
        ]
        .into_iter()
        .collect();

        let nodes = vec![node("a", "source_t"), node("b", "target_t")];
        let edges = vec![edge("e1", "a", "b")];

        let lenient = compile(Uuid::new_v4(), None, &nodes, &edges, &catalog, false);
        assert_eq!(lenient.status, ContractStatus::Warning);

        let strict = compile(Uuid::new_v4(), None, &nodes, &edges, &catalog, true);
        assert_eq!(strict.status, ContractStatus::Invalid);
    }

    #[test]
    fn type_mismatch_is_always_invalid() {
        let catalog: NodeCatalog = [
            catalog_entry("num", serde_json::json!({"type":"number"}), serde_json::json!({"type":"object"})),
            catalog_entry("str", serde_json::json!({"type":"object"}), serde_json::json!({"type":"string"})),
        ]
        .into_iter()
        .collect();

        let nodes = vec![node("a", "num"), node("b", "str")];
        let edges = vec![edge("e1", "a", "b")];
        let snap = compile(Uuid::new_v4(), None, &nodes, &edges, &catalog, false);
        assert_eq!(snap.status, ContractStatus::Invalid);
    }

    #[test]
    fn graph_hash_is_stable_and_idempotent() {
        let nodes = vec![node("a", "t"), node("b", "t")];
        let edges = vec![edge("e1", "a", "b")];
        assert_eq!(graph_hash(&nodes, &edges), graph_hash(&nodes, &edges));
    }

    #[test]
    fn empty_graph_has_no_issues() {
        let catalog = NodeCatalog::new();
        let snap = compile(Uuid::new_v4(), None, &[], &[], &catalog, false);
        assert_eq!(snap.status, ContractStatus::Valid);
        assert!(snap.issues.is_empty());
    }
}
