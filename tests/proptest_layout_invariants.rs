//! Property-based invariants for the row planner.
//!
//! Families are generated as DAGs (a parent always precedes its child in
//! person order), mixed with arbitrary partner and sibling edges:
//!
//! 1. Same input gives byte-identical layout output.
//! 2. A child sits exactly one row below its shallowest parent.
//! 3. Nobody belongs to more than one partnership.
//! 4. Every person is placed, partners share a row, nobody overlaps in a row.
//! 5. Connector endpoints that name a person sit on that person's symbol.
//! 6. The hierarchical engine finishes, places everyone, and never exposes
//!    partnership dummies.

use std::collections::{HashMap, HashSet};

use genogram_layout::graph::FamilyGraph;
use genogram_layout::ir::{
    NativeInput, NativePerson, NativeRelationship, PartnerStatus, Person, Relationship, RelationshipKind, Sex,
};
use genogram_layout::layout::{
    ConnectorKind, assign_generations, compute_native_layout, layout_graph, resolve_partnerships,
};
use genogram_layout::{LayoutConfig, LayoutEngine};
use genogram_layout::layout_dump::to_json_string;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum EdgeSpec {
    Partner(usize, usize, u8),
    ParentChild(usize, usize),
    Sibling(usize, usize),
}

fn status(code: u8) -> PartnerStatus {
    match code % 4 {
        0 => PartnerStatus::Married,
        1 => PartnerStatus::Divorced,
        2 => PartnerStatus::Separated,
        _ => PartnerStatus::Conflicted,
    }
}

fn edge_strategy(people: usize) -> impl Strategy<Value = EdgeSpec> {
    prop_oneof![
        1 => (0..people, 0..people, any::<u8>()).prop_map(|(a, b, s)| EdgeSpec::Partner(a, b, s)),
        2 => (0..people, 0..people).prop_map(|(a, b)| EdgeSpec::ParentChild(a.min(b), a.max(b))),
        1 => (0..people, 0..people).prop_map(|(a, b)| EdgeSpec::Sibling(a, b)),
    ]
}

fn family_strategy() -> impl Strategy<Value = (Vec<bool>, Vec<EdgeSpec>)> {
    (1usize..12).prop_flat_map(|people| {
        (
            prop::collection::vec(any::<bool>(), people),
            prop::collection::vec(edge_strategy(people), 0..24),
        )
    })
}

fn id(index: usize) -> String {
    format!("p{index}")
}

fn build_graph(sexes: &[bool], edges: &[EdgeSpec]) -> FamilyGraph {
    let people = sexes
        .iter()
        .enumerate()
        .map(|(i, male)| {
            let sex = if *male { Sex::Male } else { Sex::Female };
            Person::new(id(i), id(i), sex)
        })
        .collect();
    let relationships = edges
        .iter()
        .filter_map(|edge| match *edge {
            EdgeSpec::Partner(a, b, s) => Some(Relationship::partner(id(a), id(b), status(s))),
            // Equal indices would be a self loop, not a generation step.
            EdgeSpec::ParentChild(a, b) if a == b => None,
            EdgeSpec::ParentChild(a, b) => Some(Relationship::parent_child(id(a), id(b))),
            EdgeSpec::Sibling(a, b) => Some(Relationship::sibling(id(a), id(b))),
        })
        .collect();
    FamilyGraph::build(people, relationships).expect("generated family is valid")
}

fn native_input(sexes: &[bool], edges: &[EdgeSpec]) -> NativeInput {
    let persons = sexes
        .iter()
        .enumerate()
        .map(|(i, male)| NativePerson {
            id: id(i),
            name: id(i),
            sex: if *male { Sex::Male } else { Sex::Female },
            is_ego: i == 0,
            is_deceased: false,
        })
        .collect();
    let relationships = edges
        .iter()
        .filter_map(|edge| {
            let (from, to, kind, status) = match *edge {
                EdgeSpec::Partner(a, b, s) => (a, b, RelationshipKind::Partner, Some(status(s))),
                EdgeSpec::ParentChild(a, b) if a == b => return None,
                EdgeSpec::ParentChild(a, b) => (a, b, RelationshipKind::ParentChild, None),
                EdgeSpec::Sibling(a, b) => (a, b, RelationshipKind::Sibling, None),
            };
            Some(NativeRelationship { from: id(from), to: id(to), kind, status })
        })
        .collect();
    NativeInput { persons, relationships }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_is_deterministic((sexes, edges) in family_strategy()) {
        let config = LayoutConfig::default();
        let first = to_json_string(&layout_graph(&build_graph(&sexes, &edges), &config)).unwrap();
        let second = to_json_string(&layout_graph(&build_graph(&sexes, &edges), &config)).unwrap();
        prop_assert_eq!(first, second);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Generation depth
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn child_is_one_below_shallowest_parent((sexes, edges) in family_strategy()) {
        let graph = build_graph(&sexes, &edges);
        let generations = assign_generations(&graph);
        prop_assert_eq!(generations.len(), graph.people().len());

        for person in graph.people() {
            let parents = graph.parents_of(&person.id);
            let depth = generations[&person.id];
            if parents.is_empty() {
                prop_assert_eq!(depth, 0, "root {} not on row 0", person.id);
                continue;
            }
            let shallowest = parents.iter().map(|p| generations[p]).min().unwrap();
            prop_assert_eq!(depth, shallowest + 1, "child {} misplaced", person.id);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Partnership exclusivity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nobody_is_in_two_partnerships((sexes, edges) in family_strategy()) {
        let graph = build_graph(&sexes, &edges);
        let mut seen = HashSet::new();
        for partnership in resolve_partnerships(&graph) {
            prop_assert_ne!(&partnership.first, &partnership.second);
            prop_assert!(seen.insert(partnership.first.clone()), "{} paired twice", partnership.first);
            prop_assert!(seen.insert(partnership.second.clone()), "{} paired twice", partnership.second);
            for child in &partnership.children {
                prop_assert!(graph.parents_of(child).contains(&partnership.first));
                prop_assert!(graph.parents_of(child).contains(&partnership.second));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Placement
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rows_hold_every_person_without_overlap((sexes, edges) in family_strategy()) {
        let graph = build_graph(&sexes, &edges);
        let config = LayoutConfig::default();
        let layout = layout_graph(&graph, &config);
        prop_assert_eq!(layout.people.len(), graph.people().len());

        for partnership in resolve_partnerships(&graph) {
            let a = layout.person(&partnership.first).unwrap();
            let b = layout.person(&partnership.second).unwrap();
            prop_assert_eq!(a.y, b.y);
            prop_assert!((b.x - a.x - config.partner_spacing).abs() < 1e-3);
        }

        let mut rows: HashMap<i64, Vec<f32>> = HashMap::new();
        for person in &layout.people {
            rows.entry(person.y.round() as i64).or_default().push(person.x);
        }
        let min_gap = config.partner_spacing.min(config.block_spacing) - 1e-3;
        for xs in rows.values_mut() {
            xs.sort_by(|a, b| a.total_cmp(b));
            for pair in xs.windows(2) {
                prop_assert!(pair[1] - pair[0] >= min_gap, "overlap in row: {:?}", xs);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Connectors stay attached
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn person_endpoints_touch_their_symbols((sexes, edges) in family_strategy()) {
        let graph = build_graph(&sexes, &edges);
        let layout = layout_graph(&graph, &LayoutConfig::default());
        for connector in &layout.connectors {
            if matches!(connector.kind, ConnectorKind::Partner | ConnectorKind::Sibling) {
                let from = layout.person(connector.from_id.as_deref().unwrap()).unwrap();
                let to = layout.person(connector.to_id.as_deref().unwrap()).unwrap();
                prop_assert_eq!((connector.from.x, connector.from.y), (from.x, from.y));
                prop_assert_eq!((connector.to.x, connector.to.y), (to.x, to.y));
            }
            if connector.kind == ConnectorKind::Drop {
                let child = layout.person(connector.to_id.as_deref().unwrap()).unwrap();
                prop_assert_eq!((connector.to.x, connector.to.y), (child.x, child.y));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Hierarchical engine
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn hierarchical_engine_places_everyone((sexes, edges) in family_strategy()) {
        let input = native_input(&sexes, &edges);
        let config = LayoutConfig { engine: LayoutEngine::Hierarchical, ..LayoutConfig::default() };
        let layout = compute_native_layout(&input, &config).unwrap();

        prop_assert_eq!(layout.people.len(), sexes.len());
        for i in 0..sexes.len() {
            prop_assert!(layout.person(&id(i)).is_some(), "{} not placed", id(i));
        }
        for person in &layout.people {
            prop_assert!(!person.id.starts_with("partnership:"), "dummy {} leaked", person.id);
        }
        for connector in &layout.connectors {
            for end in [&connector.from_id, &connector.to_id].into_iter().flatten() {
                prop_assert!(!end.starts_with("partnership:"), "dummy {} leaked into a connector", end);
            }
        }
    }
}
