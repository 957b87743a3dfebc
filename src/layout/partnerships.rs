use std::collections::HashSet;

use crate::graph::FamilyGraph;
use crate::ir::{PartnerStatus, PersonId, RelationshipKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnershipOrigin {
    /// Backed by a partner relationship.
    Declared,
    /// Derived from a shared child only.
    Inferred,
}

/// A pairing used as one placement block and one connector family.
#[derive(Debug, Clone, PartialEq)]
pub struct Partnership {
    /// Partner that comes first in input order.
    pub first: PersonId,
    pub second: PersonId,
    pub children: Vec<PersonId>,
    pub status: Option<PartnerStatus>,
    pub origin: PartnershipOrigin,
}

impl Partnership {
    pub fn contains(&self, id: &str) -> bool {
        self.first == id || self.second == id
    }

    /// Stable key shared by the connector ids of this family.
    pub fn key(&self) -> String {
        format!("{}+{}", self.first, self.second)
    }
}

/// Declared partner edges claim people first (relationship input order), then
/// unclaimed parents are paired with the earliest unclaimed co-parent.
/// Nobody ends up in more than one partnership.
pub fn resolve_partnerships(graph: &FamilyGraph) -> Vec<Partnership> {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut partnerships = Vec::new();

    for rel in graph.relationships() {
        if rel.kind != RelationshipKind::Partner {
            continue;
        }
        if claimed.contains(rel.from.as_str()) || claimed.contains(rel.to.as_str()) {
            tracing::debug!(from = %rel.from, to = %rel.to, "partner already claimed, edge kept as connector only");
            continue;
        }
        claimed.insert(rel.from.as_str());
        claimed.insert(rel.to.as_str());
        partnerships.push(pair(graph, &rel.from, &rel.to, rel.status, PartnershipOrigin::Declared));
    }

    for person in graph.people() {
        let id = person.id.as_str();
        if claimed.contains(id) || graph.children_of(id).is_empty() {
            continue;
        }
        let candidate = graph
            .children_of(id)
            .iter()
            .flat_map(|child| graph.parents_of(child))
            .map(String::as_str)
            .filter(|other| *other != id && !claimed.contains(other))
            .min_by_key(|other| graph.order_of(other));
        let Some(other) = candidate else {
            continue;
        };
        claimed.insert(id);
        claimed.insert(other);
        partnerships.push(pair(graph, id, other, None, PartnershipOrigin::Inferred));
    }

    tracing::debug!(count = partnerships.len(), "partnerships resolved");
    partnerships
}

fn pair(
    graph: &FamilyGraph,
    a: &str,
    b: &str,
    status: Option<PartnerStatus>,
    origin: PartnershipOrigin,
) -> Partnership {
    let (first, second) = if graph.order_of(a) <= graph.order_of(b) {
        (a, b)
    } else {
        (b, a)
    };
    Partnership {
        first: first.to_string(),
        second: second.to_string(),
        children: graph.shared_children(first, second),
        status,
        origin,
    }
}
