//! Policy engine (spec C5) — a pure function over a workspace policy and a
//! workflow's nodes, producing violations. No I/O, no state.

use serde::{Deserialize, Serialize};

use crate::models::NodeDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspacePolicy {
    pub enabled: bool,
    pub allowed_node_types: Vec<String>,
    pub blocked_node_types: Vec<String>,
    pub allowed_ai_models: Vec<String>,
    pub blocked_ai_models: Vec<String>,
    pub max_execution_cost_usd: Option<f64>,
    pub max_ai_tokens: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    NodeTypeBlocked,
    AiModelBlocked,
    CostCapExceeded,
    TokenCapExceeded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub code: String,
    pub node_id: Option<String>,
    pub message: String,
}

fn node_type_allowed(policy: &WorkspacePolicy, node_type: &str) -> bool {
    if policy.blocked_node_types.iter().any(|t| t == node_type) {
        return false;
    }
    if policy.allowed_node_types.is_empty() {
        return true;
    }
    policy.allowed_node_types.iter().any(|t| t == node_type)
}

fn ai_model_allowed(policy: &WorkspacePolicy, model: &str) -> bool {
    if policy.blocked_ai_models.iter().any(|m| m == model) {
        return false;
    }
    if policy.allowed_ai_models.is_empty() {
        return true;
    }
    policy.allowed_ai_models.iter().any(|m| m == model)
}

fn node_estimated_cost(node: &NodeDefinition) -> f64 {
    node.data.config.get("estimated_cost_usd").and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn node_max_tokens(node: &NodeDefinition) -> i64 {
    node.data.config.get("max_tokens").and_then(|v| v.as_i64()).unwrap_or(0)
}

fn node_ai_model(node: &NodeDefinition) -> Option<&str> {
    node.data.config.get("model").and_then(|v| v.as_str())
}

/// Walk `nodes` against `policy` and return every violation found. Returns
/// an empty list when the policy is disabled or absent.
pub fn violations(policy: Option<&WorkspacePolicy>, nodes: &[NodeDefinition]) -> Vec<Violation> {
    let Some(policy) = policy else { return Vec::new() };
    if !policy.enabled {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut total_cost = 0.0;
    let mut total_tokens: i64 = 0;

    for node in nodes {
        if !node_type_allowed(policy, &node.node_type) {
            found.push(Violation {
                kind: ViolationKind::NodeTypeBlocked,
                code: "POLICY_NODE_BLOCKED".to_string(),
                node_id: Some(node.id.clone()),
                message: format!("node type '{}' is not permitted by workspace policy", node.node_type),
            });
        }

        if let Some(model) = node_ai_model(node) {
            if !ai_model_allowed(policy, model) {
                found.push(Violation {
                    kind: ViolationKind::AiModelBlocked,
                    code: "POLICY_AI_MODEL_BLOCKED".to_string(),
                    node_id: Some(node.id.clone()),
                    message: format!("AI model '{model}' is not permitted by workspace policy"),
                });
            }
        }

        total_cost += node_estimated_cost(node);
        total_tokens += node_max_tokens(node);
    }

    if let Some(cap) = policy.max_execution_cost_usd {
        if total_cost > cap {
            found.push(Violation {
                kind: ViolationKind::CostCapExceeded,
                code: "POLICY_COST_EXCEEDED".to_string(),
                node_id: None,
                message: format!("estimated cost {total_cost:.4} exceeds cap {cap:.4}"),
            });
        }
    }

    if let Some(cap) = policy.max_ai_tokens {
        if total_tokens > cap {
            found.push(Violation {
                kind: ViolationKind::TokenCapExceeded,
                code: "POLICY_TOKEN_EXCEEDED".to_string(),
                node_id: None,
                message: format!("estimated tokens {total_tokens} exceeds cap {cap}"),
            });
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeData, NodeKind};

    fn node(id: &str, node_type: &str, config: serde_json::Value) -> NodeDefinition {
        NodeDefinition {
            id: id.into(),
            node_type: node_type.into(),
            node_kind: NodeKind::Action,
            position: None,
            data: NodeData { label: id.into(), config },
        }
    }

    fn base_policy() -> WorkspacePolicy {
        WorkspacePolicy {
            enabled: true,
            allowed_node_types: vec![],
            blocked_node_types: vec![],
            allowed_ai_models: vec![],
            blocked_ai_models: vec![],
            max_execution_cost_usd: None,
            max_ai_tokens: None,
        }
    }

    #[test]
    fn disabled_policy_produces_no_violations() {
        let mut policy = base_policy();
        policy.enabled = false;
        policy.blocked_node_types = vec!["http".into()];
        let nodes = vec![node("a", "http", serde_json::Value::Null)];
        assert!(violations(Some(&policy), &nodes).is_empty());
    }

    #[test]
    fn blocked_node_type_is_reported() {
        let mut policy = base_policy();
        policy.blocked_node_types = vec!["http".into()];
        let nodes = vec![node("a", "http", serde_json::Value::Null)];
        let v = violations(Some(&policy), &nodes);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].kind, ViolationKind::NodeTypeBlocked);
    }

    #[test]
    fn cost_cap_exceeded_is_aggregate() {
        let mut policy = base_policy();
        policy.max_execution_cost_usd = Some(1.0);
        let nodes = vec![
            node("a", "ai", serde_json::json!({"estimated_cost_usd": 0.6})),
            node("b", "ai", serde_json::json!({"estimated_cost_usd": 0.6})),
        ];
        let v = violations(Some(&policy), &nodes);
        assert!(v.iter().any(|x| x.kind == ViolationKind::CostCapExceeded));
    }

    #[test]
    fn no_policy_produces_no_violations() {
        let nodes = vec![node("a", "http", serde_json::Value::Null)];
        assert!(violations(None, &nodes).is_empty());
    }
}
