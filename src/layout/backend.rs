//! Hierarchical path: the family graph is flattened into generic nodes/edges
//! with one zero-size synthetic node per partnership, handed to dagre, and the
//! placed scaffolding is translated back into regular connectors.

use std::collections::{HashMap, HashSet};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::graph::FamilyGraph;
use crate::ir::{GenericEdge, GenericInput, GenericNode, PartnerStatus, RelationshipKind, Shape};

use super::connectors::{family_connectors, partner_between, sibling_between};
use super::partnerships::Partnership;
use super::types::{Layout, Point, PositionedPerson};

const PARTNER: &str = "partner";
const PARENT_CHILD: &str = "parent-child";
const SIBLING: &str = "sibling";

fn dummy_id(partnership: &Partnership) -> String {
    format!("partnership:{}:{}", partnership.first, partnership.second)
}

fn edge(from: &str, to: &str, kind: &str, status: Option<PartnerStatus>) -> GenericEdge {
    GenericEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind: Some(kind.to_string()),
        status,
    }
}

/// Generic shape of a validated family graph. Children shared by a
/// partnership hang from its synthetic node; every other relationship
/// becomes a direct typed edge.
pub fn to_generic_input(graph: &FamilyGraph, partnerships: &[Partnership]) -> GenericInput {
    let mut nodes: Vec<GenericNode> = graph
        .people()
        .iter()
        .map(|person| GenericNode {
            id: person.id.clone(),
            label: person.name.clone(),
            shape: person.sex.shape().as_str().to_string(),
            width: None,
            height: None,
            is_ego: person.is_focal,
            is_dummy: false,
            is_deceased: person.is_deceased,
        })
        .collect();
    let mut edges = Vec::new();

    let mut paired: HashSet<(&str, &str)> = HashSet::new();
    let mut covered: HashSet<(&str, &str)> = HashSet::new();
    for partnership in partnerships {
        let dummy = dummy_id(partnership);
        nodes.push(GenericNode {
            id: dummy.clone(),
            label: String::new(),
            shape: String::new(),
            width: None,
            height: None,
            is_ego: false,
            is_dummy: true,
            is_deceased: false,
        });
        let status = Some(partnership.status.unwrap_or_default());
        edges.push(edge(&partnership.first, &dummy, PARTNER, status));
        edges.push(edge(&partnership.second, &dummy, PARTNER, status));
        for child in &partnership.children {
            edges.push(edge(&dummy, child, PARENT_CHILD, None));
            covered.insert((partnership.first.as_str(), child.as_str()));
            covered.insert((partnership.second.as_str(), child.as_str()));
        }
        paired.insert((partnership.first.as_str(), partnership.second.as_str()));
        paired.insert((partnership.second.as_str(), partnership.first.as_str()));
    }

    for rel in graph.relationships() {
        let (from, to) = (rel.from.as_str(), rel.to.as_str());
        match rel.kind {
            RelationshipKind::ParentChild if !covered.contains(&(from, to)) => {
                edges.push(edge(from, to, PARENT_CHILD, None));
            }
            RelationshipKind::Partner if !paired.contains(&(from, to)) => {
                edges.push(edge(from, to, PARTNER, rel.status));
            }
            RelationshipKind::Sibling if !graph.share_parent(from, to) => {
                edges.push(edge(from, to, SIBLING, None));
            }
            _ => {}
        }
    }

    GenericInput { nodes, edges }
}

fn validate(input: &GenericInput) -> Result<(), LayoutError> {
    let mut ids: HashSet<&str> = HashSet::with_capacity(input.nodes.len());
    for node in &input.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateId {
                id: node.id.clone(),
            });
        }
    }
    for edge in &input.edges {
        for endpoint in [&edge.from, &edge.to] {
            if !ids.contains(endpoint.as_str()) {
                return Err(LayoutError::DanglingReference {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Edges without a recognised `type` count as parent-child.
fn edge_kind(edge: &GenericEdge) -> RelationshipKind {
    edge.relationship_kind()
        .unwrap_or(RelationshipKind::ParentChild)
}

/// Person-to-person edges of one kind, in input order.
fn direct_edges<'a>(
    input: &'a GenericInput,
    dummies: &'a HashSet<&'a str>,
    kind: RelationshipKind,
) -> impl Iterator<Item = &'a GenericEdge> + 'a {
    input.edges.iter().filter(move |edge| {
        edge.from != edge.to
            && !dummies.contains(edge.from.as_str())
            && !dummies.contains(edge.to.as_str())
            && edge_kind(edge) == kind
    })
}

/// Runs dagre over the hierarchy edges and returns node centres.
fn place_nodes(
    input: &GenericInput,
    dummies: &HashSet<&str>,
    hierarchy: &[(String, String)],
    config: &LayoutConfig,
) -> HashMap<String, Point> {
    let backend = &config.backend;
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some("tb".to_string());
    graph_config.ranker = Some(backend.ranker.as_str().to_string());
    graph_config.nodesep = Some(backend.node_sep);
    graph_config.ranksep = Some(backend.rank_sep);
    graph_config.marginx = Some(backend.margin_x);
    graph_config.marginy = Some(backend.margin_y);
    dagre_graph.set_graph(graph_config);

    for node in &input.nodes {
        let mut dagre_node = DagreNode::default();
        if dummies.contains(node.id.as_str()) {
            dagre_node.width = backend.dummy_size;
            dagre_node.height = backend.dummy_size;
        } else {
            dagre_node.width = node.width.unwrap_or(backend.node_width);
            dagre_node.height = node.height.unwrap_or(backend.node_height);
        }
        dagre_graph.set_node(node.id.clone(), Some(dagre_node));
    }

    for (from, to) in hierarchy {
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(from, to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut positions = HashMap::with_capacity(input.nodes.len());
    for node in &input.nodes {
        let Some(dagre_node) = dagre_graph.node(&node.id) else {
            continue;
        };
        positions.insert(node.id.clone(), Point::new(dagre_node.x, dagre_node.y));
    }
    positions
}

/// Lays out a generic node/edge document. Synthetic partnership nodes steer
/// placement only; they never reach the returned people or connector ids.
pub fn layout_generic(input: &GenericInput, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    validate(input)?;
    if input.nodes.is_empty() {
        return Ok(Layout::default());
    }
    let dummies: HashSet<&str> = input
        .nodes
        .iter()
        .filter(|node| node.is_dummy)
        .map(|node| node.id.as_str())
        .collect();
    let is_dummy = |id: &String| dummies.contains(id.as_str());

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut hierarchy: Vec<(String, String)> = Vec::new();
    for edge in &input.edges {
        if edge.from == edge.to {
            continue;
        }
        let structural = is_dummy(&edge.from)
            || is_dummy(&edge.to)
            || edge_kind(edge) == RelationshipKind::ParentChild;
        if structural && seen.insert((edge.from.as_str(), edge.to.as_str())) {
            hierarchy.push((edge.from.clone(), edge.to.clone()));
        }
    }
    tracing::debug!(
        nodes = input.nodes.len(),
        dummies = dummies.len(),
        edges = hierarchy.len(),
        "running hierarchical backend"
    );

    let positions = place_nodes(input, &dummies, &hierarchy, config);

    let people: Vec<PositionedPerson> = input
        .nodes
        .iter()
        .filter(|node| !node.is_dummy)
        .filter_map(|node| {
            let point = positions.get(&node.id)?;
            Some(PositionedPerson {
                id: node.id.clone(),
                name: if node.label.is_empty() {
                    node.id.clone()
                } else {
                    node.label.clone()
                },
                shape: Shape::from_token(&node.shape),
                x: point.x,
                y: point.y,
                is_ego: node.is_ego,
                is_deceased: node.is_deceased,
            })
        })
        .collect();

    let mut connectors = Vec::new();
    for edge in direct_edges(input, &dummies, RelationshipKind::Partner) {
        let status = Some(edge.status.unwrap_or_default());
        connectors.extend(partner_between(&positions, &edge.from, &edge.to, status));
    }

    let mut families = Vec::new();
    for dummy in input.nodes.iter().filter(|node| node.is_dummy) {
        let mut partners: Vec<&str> = Vec::new();
        let mut status = None;
        let mut children: Vec<&str> = Vec::new();
        for edge in &input.edges {
            if edge.to == dummy.id && !is_dummy(&edge.from) {
                if !partners.contains(&edge.from.as_str()) {
                    partners.push(edge.from.as_str());
                }
                status = status.or(edge.status);
            } else if edge.from == dummy.id
                && !is_dummy(&edge.to)
                && !children.contains(&edge.to.as_str())
            {
                children.push(edge.to.as_str());
            }
        }

        let (key, origin) = match partners.as_slice() {
            [] => {
                tracing::warn!(node = %dummy.id, "synthetic node without partners, skipping its connectors");
                continue;
            }
            [single] => (single.to_string(), positions.get(*single).copied()),
            [first, second, ..] => {
                let status = Some(status.unwrap_or_default());
                connectors.extend(partner_between(&positions, first, second, status));
                let origin = positions
                    .get(*first)
                    .zip(positions.get(*second))
                    .map(|(a, b)| a.midpoint(*b));
                (format!("{first}+{second}"), origin)
            }
        };
        if let Some(origin) = origin {
            families.push((key, partners[0].to_string(), origin, children));
        }
    }

    let mut single_parents: Vec<(&str, Vec<&str>)> = Vec::new();
    for edge in direct_edges(input, &dummies, RelationshipKind::ParentChild) {
        match single_parents
            .iter_mut()
            .find(|(parent, _)| *parent == edge.from.as_str())
        {
            Some((_, children)) => {
                if !children.contains(&edge.to.as_str()) {
                    children.push(edge.to.as_str());
                }
            }
            None => single_parents.push((edge.from.as_str(), vec![edge.to.as_str()])),
        }
    }
    for (parent, children) in single_parents {
        if let Some(&origin) = positions.get(parent) {
            families.push((parent.to_string(), parent.to_string(), origin, children));
        }
    }

    for (key, source, origin, children) in families {
        let children: Vec<_> = children
            .into_iter()
            .filter_map(|child| positions.get(child).map(|p| (child.to_string(), *p)))
            .collect();
        connectors.extend(family_connectors(
            &key,
            &source,
            origin,
            &children,
            config.stub_width,
        ));
    }

    for edge in direct_edges(input, &dummies, RelationshipKind::Sibling) {
        connectors.extend(sibling_between(&positions, &edge.from, &edge.to));
    }

    tracing::debug!(
        people = people.len(),
        connectors = connectors.len(),
        "hierarchical layout done"
    );
    Ok(Layout { people, connectors })
}
