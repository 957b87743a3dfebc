use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::FamilyGraph;
use crate::ir::PersonId;

pub type Generations = HashMap<PersonId, usize>;

/// Breadth-first depth from every root at once. A child reachable through
/// several parents keeps the depth of the path that reached it first.
/// Always returns an entry for every person.
pub fn assign_generations(graph: &FamilyGraph) -> Generations {
    let people = graph.people();
    let mut generations: Generations = HashMap::with_capacity(people.len());
    let mut visited: HashSet<&str> = HashSet::with_capacity(people.len());
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    let mut roots: Vec<&str> = people
        .iter()
        .filter(|person| graph.parents_of(&person.id).is_empty())
        .map(|person| person.id.as_str())
        .collect();
    if roots.is_empty() {
        if let Some(first) = people.first() {
            tracing::warn!(id = %first.id, "no root ancestor found, using first person as root");
            roots.push(first.id.as_str());
        }
    }

    for root in roots {
        generations.insert(root.to_string(), 0);
        visited.insert(root);
        queue.push_back((root, 0));
    }

    while let Some((id, generation)) = queue.pop_front() {
        for child in graph.children_of(id) {
            if visited.insert(child.as_str()) {
                generations.insert(child.clone(), generation + 1);
                queue.push_back((child.as_str(), generation + 1));
            }
        }
    }

    for person in people {
        generations.entry(person.id.clone()).or_insert(0);
    }

    tracing::debug!(
        depth = generations.values().copied().max().unwrap_or(0),
        "generations assigned"
    );
    generations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Person, Relationship, Sex};

    fn graph(ids: &[&str], rels: Vec<Relationship>) -> FamilyGraph {
        let people = ids.iter().map(|id| Person::new(*id, *id, Sex::Female)).collect();
        FamilyGraph::build(people, rels).unwrap()
    }

    #[test]
    fn children_sit_one_below_parents() {
        let g = graph(
            &["a", "b", "c", "d"],
            vec![
                Relationship::parent_child("a", "c"),
                Relationship::parent_child("b", "c"),
                Relationship::parent_child("c", "d"),
            ],
        );
        let generations = assign_generations(&g);
        assert_eq!(generations["a"], 0);
        assert_eq!(generations["b"], 0);
        assert_eq!(generations["c"], 1);
        assert_eq!(generations["d"], 2);
    }

    #[test]
    fn first_discovered_depth_wins() {
        // r -> x -> y, and s -> m1 -> m2 -> y: y is first reached via x.
        let g = graph(
            &["r", "s", "x", "m1", "m2", "y"],
            vec![
                Relationship::parent_child("r", "x"),
                Relationship::parent_child("s", "m1"),
                Relationship::parent_child("m1", "m2"),
                Relationship::parent_child("x", "y"),
                Relationship::parent_child("m2", "y"),
            ],
        );
        let generations = assign_generations(&g);
        assert_eq!(generations["y"], 2);
        assert_eq!(generations["m2"], 2);
    }

    #[test]
    fn isolated_people_are_generation_zero() {
        let g = graph(&["a", "b"], Vec::new());
        let generations = assign_generations(&g);
        assert_eq!(generations.len(), 2);
        assert!(generations.values().all(|&depth| depth == 0));
    }

    #[test]
    fn cyclic_input_falls_back_to_first_person() {
        let g = graph(
            &["a", "b"],
            vec![
                Relationship::parent_child("a", "b"),
                Relationship::parent_child("b", "a"),
            ],
        );
        let generations = assign_generations(&g);
        assert_eq!(generations["a"], 0);
        assert_eq!(generations["b"], 1);
    }

    #[test]
    fn empty_graph_yields_empty_map() {
        let g = graph(&[], Vec::new());
        assert!(assign_generations(&g).is_empty());
    }
}
