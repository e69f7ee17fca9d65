//! Built-in node catalog entries (ambient — concrete `NodeExecutor`
//! implementations live outside this crate; this only describes their
//! schemas for the contract compiler and policy engine).

use serde_json::json;

use crate::models::{CatalogEntry, NodeCatalog, NodeKind};

fn entry(
    node_type: &str,
    node_kind: NodeKind,
    input_schema: serde_json::Value,
    output_schema: serde_json::Value,
    credential_type: Option<&str>,
    cost_hint_usd: f64,
    latency_hint_ms: u64,
) -> (String, CatalogEntry) {
    (
        node_type.to_string(),
        CatalogEntry {
            node_type: node_type.to_string(),
            node_kind,
            input_schema,
            output_schema,
            config_schema: json!({ "type": "object" }),
            credential_type: credential_type.map(String::from),
            cost_hint_usd,
            latency_hint_ms,
        },
    )
}

/// The node types every deployment ships with out of the box. Workspaces
/// may register additional entries on top of this (not modeled here — see
/// spec Non-goals on concrete connector implementations).
pub fn default_catalog() -> NodeCatalog {
    [
        entry("manual_trigger", NodeKind::Trigger, json!({"type": "any"}), json!({"type": "object"}), None, 0.0, 0),
        entry("webhook_trigger", NodeKind::Trigger, json!({"type": "any"}), json!({"type": "object"}), None, 0.0, 0),
        entry("schedule_trigger", NodeKind::Trigger, json!({"type": "any"}), json!({"type": "object"}), None, 0.0, 0),
        entry(
            "http_request",
            NodeKind::Action,
            json!({"type": "object", "required": ["url"]}),
            json!({"type": "object", "properties": {"status": {}, "body": {}, "headers": {}}}),
            Some("http"),
            0.0005,
            200,
        ),
        entry(
            "database_query",
            NodeKind::Action,
            json!({"type": "object", "required": ["query"]}),
            json!({"type": "object", "properties": {"rows": {}}}),
            Some("database"),
            0.0002,
            50,
        ),
        entry(
            "ai_completion",
            NodeKind::Ai,
            json!({"type": "object", "required": ["prompt"]}),
            json!({"type": "object", "properties": {"text": {}, "tokens": {}}}),
            Some("ai"),
            0.02,
            1500,
        ),
        entry(
            "condition",
            NodeKind::Condition,
            json!({"type": "object"}),
            json!({"type": "object", "properties": {"output": {"type": "string"}}}),
            None,
            0.0001,
            5,
        ),
        entry(
            "transform",
            NodeKind::Action,
            json!({"type": "any"}),
            json!({"type": "any"}),
            None,
            0.0001,
            5,
        ),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_every_node_kind() {
        let catalog = default_catalog();
        let kinds: std::collections::HashSet<_> = catalog.values().map(|e| e.node_kind).collect();
        assert!(kinds.contains(&NodeKind::Trigger));
        assert!(kinds.contains(&NodeKind::Action));
        assert!(kinds.contains(&NodeKind::Condition));
        assert!(kinds.contains(&NodeKind::Ai));
    }
}
