//! Validated, deduplicated family graph with adjacency maps built once per
//! layout call.

use std::collections::{HashMap, HashSet};

use crate::error::LayoutError;
use crate::ir::{NativeInput, Person, PersonId, Relationship, RelationshipKind};

type RelationshipKey = (RelationshipKind, PersonId, PersonId);

#[derive(Debug, Clone)]
pub struct FamilyGraph {
    people: Vec<Person>,
    index: HashMap<PersonId, usize>,
    relationships: Vec<Relationship>,
    children: HashMap<PersonId, Vec<PersonId>>,
    parents: HashMap<PersonId, Vec<PersonId>>,
    partners: HashMap<PersonId, Vec<PersonId>>,
    siblings: HashMap<PersonId, Vec<PersonId>>,
}

impl FamilyGraph {
    pub fn from_input(input: &NativeInput) -> Result<Self, LayoutError> {
        let (people, relationships) = input.to_parts();
        Self::build(people, relationships)
    }

    /// Validates ids and endpoints, deduplicates relationships and builds the
    /// lookup maps. Input order is re-stamped from the slice positions.
    pub fn build(
        mut people: Vec<Person>,
        relationships: Vec<Relationship>,
    ) -> Result<Self, LayoutError> {
        let mut index: HashMap<PersonId, usize> = HashMap::with_capacity(people.len());
        let mut focal_seen = false;
        for (order, person) in people.iter_mut().enumerate() {
            if index.insert(person.id.clone(), order).is_some() {
                return Err(LayoutError::DuplicateId {
                    id: person.id.clone(),
                });
            }
            person.order = order;
            if person.is_focal {
                if focal_seen {
                    tracing::warn!(id = %person.id, "more than one focal person, clearing flag");
                    person.is_focal = false;
                }
                focal_seen = true;
            }
        }

        let mut deduped: Vec<Relationship> = Vec::with_capacity(relationships.len());
        let mut seen: HashMap<RelationshipKey, usize> = HashMap::new();
        for rel in relationships {
            for endpoint in [&rel.from, &rel.to] {
                if !index.contains_key(endpoint) {
                    return Err(LayoutError::DanglingReference {
                        from: rel.from.clone(),
                        to: rel.to.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            if rel.from == rel.to {
                tracing::warn!(id = %rel.from, kind = ?rel.kind, "dropping self-referencing relationship");
                continue;
            }

            let mut rel = canonicalize(rel);
            let key = (rel.kind, rel.from.clone(), rel.to.clone());
            if let Some(&existing) = seen.get(&key) {
                // Later duplicates only refresh the status; position stays first-seen.
                if rel.status.is_some() {
                    deduped[existing].status = rel.status;
                }
                continue;
            }
            rel.order = deduped.len();
            seen.insert(key, deduped.len());
            deduped.push(rel);
        }
        for rel in &mut deduped {
            rel.status = match rel.kind {
                RelationshipKind::Partner => Some(rel.status.unwrap_or_default()),
                _ => None,
            };
        }

        let mut children: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        let mut parents: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        let mut partners: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        let mut siblings: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        for rel in &deduped {
            match rel.kind {
                RelationshipKind::ParentChild => {
                    children
                        .entry(rel.from.clone())
                        .or_default()
                        .push(rel.to.clone());
                    parents
                        .entry(rel.to.clone())
                        .or_default()
                        .push(rel.from.clone());
                }
                RelationshipKind::Partner => link_both(&mut partners, &rel.from, &rel.to),
                RelationshipKind::Sibling => link_both(&mut siblings, &rel.from, &rel.to),
            }
        }

        tracing::debug!(
            people = people.len(),
            relationships = deduped.len(),
            "family graph built"
        );

        Ok(Self {
            people,
            index,
            relationships: deduped,
            children,
            parents,
            partners,
            siblings,
        })
    }

    /// People in input order.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.index.get(id).map(|&idx| &self.people[idx])
    }

    /// Input order of a person; unknown ids sort last.
    pub fn order_of(&self, id: &str) -> usize {
        self.index.get(id).copied().unwrap_or(usize::MAX)
    }

    /// Deduplicated relationships in first-seen input order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn children_of(&self, id: &str) -> &[PersonId] {
        lookup(&self.children, id)
    }

    pub fn parents_of(&self, id: &str) -> &[PersonId] {
        lookup(&self.parents, id)
    }

    pub fn partners_of(&self, id: &str) -> &[PersonId] {
        lookup(&self.partners, id)
    }

    pub fn siblings_of(&self, id: &str) -> &[PersonId] {
        lookup(&self.siblings, id)
    }

    /// Children of `a` that are also children of `b`, in `a`'s child order.
    pub fn shared_children(&self, a: &str, b: &str) -> Vec<PersonId> {
        let other: HashSet<&str> = self.children_of(b).iter().map(String::as_str).collect();
        self.children_of(a)
            .iter()
            .filter(|child| other.contains(child.as_str()))
            .cloned()
            .collect()
    }

    pub fn share_parent(&self, a: &str, b: &str) -> bool {
        let parents_a = self.parents_of(a);
        self.parents_of(b).iter().any(|p| parents_a.contains(p))
    }
}

/// Undirected kinds are stored with `from < to`.
fn canonicalize(mut rel: Relationship) -> Relationship {
    if !rel.kind.is_directed() && rel.to < rel.from {
        std::mem::swap(&mut rel.from, &mut rel.to);
    }
    rel
}

fn link_both(map: &mut HashMap<PersonId, Vec<PersonId>>, a: &str, b: &str) {
    map.entry(a.to_string()).or_default().push(b.to_string());
    map.entry(b.to_string()).or_default().push(a.to_string());
}

fn lookup<'a>(map: &'a HashMap<PersonId, Vec<PersonId>>, id: &str) -> &'a [PersonId] {
    map.get(id).map(Vec::as_slice).unwrap_or(&[])
}
