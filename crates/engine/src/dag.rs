//! DAG model (spec C3) — parses a workflow's `{nodes[], edges[]}` into a
//! validated [`Dag`] with topological order and parallel-dispatch levels.
//!
//! Generalizes the teacher's `validate_dag` (a one-shot Kahn's-algorithm
//! function returning a `Vec<String>`) into a full graph structure that the
//! scheduler (C6) can query by node id during execution.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{EngineError, models::{Edge, NodeDefinition, NodeKind, Workflow}};

/// Per-edge metadata the scheduler consults during conditional gating.
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    pub edge_id: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub condition: Option<String>,
}

/// A validated, queryable directed graph over a workflow's nodes.
#[derive(Debug, Clone)]
pub struct Dag {
    pub nodes: HashMap<String, NodeDefinition>,
    /// `src -> [tgt]`
    pub edges: HashMap<String, Vec<String>>,
    /// `tgt -> [src]`
    pub reverse_edges: HashMap<String, Vec<String>>,
    /// `(src, tgt) -> EdgeInfo`
    pub edge_map: HashMap<(String, String), EdgeInfo>,
    pub entry_nodes: Vec<String>,
    pub exit_nodes: Vec<String>,
    /// Topological order.
    pub order: Vec<String>,
    /// `node_id -> level`, `level(entry) = 0`, `level(v) = 1 + max(level(u))`.
    pub levels: HashMap<String, usize>,
}

impl Dag {
    /// Build and validate a `Dag` from a workflow's raw node/edge lists.
    pub fn build(workflow: &Workflow) -> Result<Self, EngineError> {
        Self::from_parts(&workflow.nodes, &workflow.edges)
    }

    pub fn from_parts(nodes: &[NodeDefinition], edges: &[Edge]) -> Result<Self, EngineError> {
        let mut seen_ids: HashSet<&str> = HashSet::new();
        for node in nodes {
            if !seen_ids.insert(node.id.as_str()) {
                return Err(EngineError::DuplicateNodeId(node.id.clone()));
            }
        }

        let node_map: HashMap<String, NodeDefinition> =
            nodes.iter().cloned().map(|n| (n.id.clone(), n)).collect();

        for edge in edges {
            if !node_map.contains_key(edge.source.as_str()) {
                return Err(EngineError::InvalidEdge {
                    edge_id: edge.id.clone(),
                    node_id: edge.source.clone(),
                    side: "source",
                });
            }
            if !node_map.contains_key(edge.target.as_str()) {
                return Err(EngineError::InvalidEdge {
                    edge_id: edge.id.clone(),
                    node_id: edge.target.clone(),
                    side: "target",
                });
            }
        }

        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
        let mut edge_map: HashMap<(String, String), EdgeInfo> = HashMap::new();
        let mut in_degree: HashMap<String, usize> = HashMap::new();

        for node in nodes {
            adjacency.entry(node.id.clone()).or_default();
            reverse.entry(node.id.clone()).or_default();
            in_degree.entry(node.id.clone()).or_insert(0);
        }

        for edge in edges {
            adjacency.entry(edge.source.clone()).or_default().push(edge.target.clone());
            reverse.entry(edge.target.clone()).or_default().push(edge.source.clone());
            *in_degree.entry(edge.target.clone()).or_insert(0) += 1;
            edge_map.insert(
                (edge.source.clone(), edge.target.clone()),
                EdgeInfo {
                    edge_id: edge.id.clone(),
                    source_handle: edge.source_handle.clone(),
                    target_handle: edge.target_handle.clone(),
                    condition: edge.condition.clone(),
                },
            );
        }

        let entry_nodes: Vec<String> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(id, _)| id.clone())
            .collect();

        if entry_nodes.is_empty() {
            return Err(EngineError::NoEntry);
        }

        // Kahn's algorithm for topological order + cycle detection.
        let mut queue: VecDeque<String> = entry_nodes.iter().cloned().collect();
        let mut remaining_in_degree = in_degree.clone();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(node_id) = queue.pop_front() {
            order.push(node_id.clone());
            if let Some(neighbours) = adjacency.get(&node_id) {
                for neighbour in neighbours {
                    let deg = remaining_in_degree.entry(neighbour.clone()).or_insert(0);
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(neighbour.clone());
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            return Err(EngineError::CycleDetected);
        }

        let exit_nodes: Vec<String> = nodes
            .iter()
            .filter(|n| adjacency.get(n.id.as_str()).map(|v| v.is_empty()).unwrap_or(true))
            .map(|n| n.id.clone())
            .collect();

        let mut levels: HashMap<String, usize> = HashMap::new();
        for node_id in &order {
            let upstream = reverse.get(node_id).cloned().unwrap_or_default();
            let level = upstream
                .iter()
                .filter_map(|u| levels.get(u))
                .max()
                .map(|&m| m + 1)
                .unwrap_or(0);
            levels.insert(node_id.clone(), level);
        }

        Ok(Self {
            nodes: node_map,
            edges: adjacency,
            reverse_edges: reverse,
            edge_map,
            entry_nodes,
            exit_nodes,
            order,
            levels,
        })
    }

    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.get(id)
    }

    pub fn is_condition_node(&self, id: &str) -> bool {
        self.nodes.get(id).map(|n| n.node_kind == NodeKind::Condition).unwrap_or(false)
    }

    pub fn downstream_of(&self, id: &str) -> &[String] {
        self.edges.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn upstream_of(&self, id: &str) -> &[String] {
        self.reverse_edges.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeData, NodeKind};

    fn node(id: &str, kind: NodeKind) -> NodeDefinition {
        NodeDefinition {
            id: id.to_string(),
            node_type: "mock".into(),
            node_kind: kind,
            position: None,
            data: NodeData { label: id.to_string(), config: serde_json::Value::Null },
        }
    }

    fn action(id: &str) -> NodeDefinition {
        node(id, NodeKind::Action)
    }

    fn edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: None,
            target_handle: None,
            condition: None,
        }
    }

    #[test]
    fn linear_dag_orders_and_levels_correctly() {
        let nodes = vec![action("a"), action("b"), action("c")];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c")];
        let dag = Dag::from_parts(&nodes, &edges).unwrap();
        assert_eq!(dag.order, vec!["a", "b", "c"]);
        assert_eq!(dag.entry_nodes, vec!["a".to_string()]);
        assert_eq!(dag.exit_nodes, vec!["c".to_string()]);
        assert_eq!(dag.levels["a"], 0);
        assert_eq!(dag.levels["b"], 1);
        assert_eq!(dag.levels["c"], 2);
    }

    #[test]
    fn diamond_dag_has_matching_levels_on_both_branches() {
        let nodes = vec![action("a"), action("b"), action("c"), action("d")];
        let edges = vec![
            edge("e1", "a", "b"),
            edge("e2", "a", "c"),
            edge("e3", "b", "d"),
            edge("e4", "c", "d"),
        ];
        let dag = Dag::from_parts(&nodes, &edges).unwrap();
        assert_eq!(dag.levels["b"], dag.levels["c"]);
        assert_eq!(dag.levels["d"], dag.levels["b"] + 1);
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let nodes = vec![action("a"), action("a")];
        assert!(matches!(
            Dag::from_parts(&nodes, &[]),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));
    }

    #[test]
    fn edge_referencing_missing_node_is_rejected() {
        let nodes = vec![action("a")];
        let edges = vec![edge("e1", "a", "ghost")];
        assert!(matches!(
            Dag::from_parts(&nodes, &edges),
            Err(EngineError::InvalidEdge { node_id, .. }) if node_id == "ghost"
        ));
    }

    #[test]
    fn cycle_is_detected() {
        let nodes = vec![action("a"), action("b"), action("c")];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c"), edge("e3", "c", "a")];
        assert!(matches!(Dag::from_parts(&nodes, &edges), Err(EngineError::CycleDetected)));
    }

    #[test]
    fn no_entry_node_is_rejected() {
        let nodes = vec![action("a"), action("b")];
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "a")];
        assert!(matches!(Dag::from_parts(&nodes, &edges), Err(EngineError::CycleDetected) | Err(EngineError::NoEntry)));
    }

    #[test]
    fn condition_node_edges_carry_source_handle() {
        let nodes = vec![node("a", NodeKind::Condition), action("l"), action("r")];
        let edges = vec![
            Edge { id: "e1".into(), source: "a".into(), target: "l".into(), source_handle: Some("left".into()), target_handle: None, condition: None },
            Edge { id: "e2".into(), source: "a".into(), target: "r".into(), source_handle: Some("right".into()), target_handle: None, condition: None },
        ];
        let dag = Dag::from_parts(&nodes, &edges).unwrap();
        assert!(dag.is_condition_node("a"));
        assert_eq!(dag.edge_map[&("a".to_string(), "l".to_string())].source_handle.as_deref(), Some("left"));
    }
}
