use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::LayoutConfig;
use crate::ir::{Person, PersonId};

use super::generations::Generations;
use super::partnerships::Partnership;
use super::types::Point;

/// One unit of horizontal placement inside a generation row.
#[derive(Debug, Clone, PartialEq)]
enum Block<'a> {
    Single(&'a str),
    Pair(&'a str, &'a str),
}

impl Block<'_> {
    fn span(&self, config: &LayoutConfig) -> f32 {
        match self {
            Block::Single(_) => 0.0,
            Block::Pair(..) => config.partner_spacing,
        }
    }
}

/// Places every person: `y` from the generation row, `x` from block order
/// within the row, each row centred on the canvas midline.
///
/// Centering is row-local; children are not aligned under their own parents.
pub fn compute_positions(
    people: &[Person],
    generations: &Generations,
    partnerships: &[Partnership],
    config: &LayoutConfig,
) -> HashMap<PersonId, Point> {
    let partner_of: HashMap<&str, &Partnership> = partnerships
        .iter()
        .flat_map(|p| [(p.first.as_str(), p), (p.second.as_str(), p)])
        .collect();
    let generation = |id: &str| generations.get(id).copied().unwrap_or(0);

    let mut rows: BTreeMap<usize, Vec<Block>> = BTreeMap::new();
    let mut placed: HashSet<&str> = HashSet::with_capacity(people.len());
    for person in people {
        let id = person.id.as_str();
        if placed.contains(id) {
            continue;
        }
        match partner_of.get(id) {
            Some(p) => {
                // A pair whose partners differ in depth sits on the deeper row.
                let row = generation(p.first.as_str()).max(generation(p.second.as_str()));
                placed.insert(p.first.as_str());
                placed.insert(p.second.as_str());
                rows.entry(row)
                    .or_default()
                    .push(Block::Pair(p.first.as_str(), p.second.as_str()));
            }
            None => {
                placed.insert(id);
                rows.entry(generation(id)).or_default().push(Block::Single(id));
            }
        }
    }

    let mut positions = HashMap::with_capacity(people.len());
    for (row, blocks) in &rows {
        let y = *row as f32 * config.generation_spacing;
        let spans: f32 = blocks.iter().map(|b| b.span(config)).sum();
        let gaps = blocks.len().saturating_sub(1) as f32 * config.block_spacing;
        let mut x = config.canvas_midline - (spans + gaps) / 2.0;
        for block in blocks {
            match block {
                Block::Single(id) => {
                    positions.insert(id.to_string(), Point::new(x, y));
                }
                Block::Pair(first, second) => {
                    positions.insert(first.to_string(), Point::new(x, y));
                    positions.insert(second.to_string(), Point::new(x + config.partner_spacing, y));
                }
            }
            x += block.span(config) + config.block_spacing;
        }
    }

    tracing::debug!(rows = rows.len(), placed = positions.len(), "positions planned");
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FamilyGraph;
    use crate::ir::{PartnerStatus, Relationship, Sex};
    use crate::layout::generations::assign_generations;
    use crate::layout::partnerships::resolve_partnerships;

    fn plan(ids: &[&str], rels: Vec<Relationship>) -> HashMap<PersonId, Point> {
        let people = ids.iter().map(|id| Person::new(*id, *id, Sex::Male)).collect();
        let graph = FamilyGraph::build(people, rels).unwrap();
        let generations = assign_generations(&graph);
        let partnerships = resolve_partnerships(&graph);
        compute_positions(graph.people(), &generations, &partnerships, &LayoutConfig::default())
    }

    #[test]
    fn single_person_sits_on_midline() {
        let positions = plan(&["a"], Vec::new());
        assert_eq!(positions["a"], Point::new(400.0, 0.0));
    }

    #[test]
    fn partners_are_adjacent_and_centred() {
        let positions = plan(
            &["a", "b"],
            vec![Relationship::partner("a", "b", PartnerStatus::Married)],
        );
        assert_eq!(positions["a"], Point::new(340.0, 0.0));
        assert_eq!(positions["b"], Point::new(460.0, 0.0));
    }

    #[test]
    fn rows_follow_generations() {
        let positions = plan(
            &["a", "c", "d"],
            vec![
                Relationship::parent_child("a", "c"),
                Relationship::parent_child("a", "d"),
            ],
        );
        assert_eq!(positions["a"].y, 0.0);
        assert_eq!(positions["c"], Point::new(310.0, 150.0));
        assert_eq!(positions["d"], Point::new(490.0, 150.0));
    }

    #[test]
    fn blocks_follow_input_order() {
        // x comes before its partner y in input, and before the single z.
        let positions = plan(
            &["x", "z", "y"],
            vec![Relationship::partner("y", "x", PartnerStatus::Married)],
        );
        // Row: [x y] pair (span 120) then z, total 120 + 180 = 300.
        assert_eq!(positions["x"].x, 250.0);
        assert_eq!(positions["y"].x, 370.0);
        assert_eq!(positions["z"].x, 550.0);
    }

    #[test]
    fn partner_in_shallower_generation_moves_to_deeper_row() {
        let positions = plan(
            &["mom", "ego", "spouse"],
            vec![
                Relationship::parent_child("mom", "ego"),
                Relationship::partner("ego", "spouse", PartnerStatus::Married),
            ],
        );
        assert_eq!(positions["ego"].y, 150.0);
        assert_eq!(positions["spouse"].y, 150.0);
        assert_eq!(positions["mom"], Point::new(400.0, 0.0));
    }
}
