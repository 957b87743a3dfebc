mod backend;
mod connectors;
mod generations;
mod partnerships;
mod positions;
pub(crate) mod types;

pub use backend::{layout_generic, to_generic_input};
pub use connectors::{partner_connector, synthesize_connectors};
pub use generations::{Generations, assign_generations};
pub use partnerships::{Partnership, PartnershipOrigin, resolve_partnerships};
pub use positions::compute_positions;
pub use types::*;

use crate::config::{LayoutConfig, LayoutEngine};
use crate::error::LayoutError;
use crate::graph::FamilyGraph;
use crate::ir::{LayoutInput, NativeInput};

/// Layout entry point. The input shape is resolved once here: generic
/// documents always go through the hierarchical backend, native ones follow
/// `config.engine`.
pub fn compute_layout(input: &LayoutInput, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    match input {
        LayoutInput::Native(native) => compute_native_layout(native, config),
        LayoutInput::Generic(generic) => layout_generic(generic, config),
    }
}

pub fn compute_native_layout(input: &NativeInput, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    let graph = FamilyGraph::from_input(input)?;
    match config.engine {
        LayoutEngine::Planner => Ok(layout_graph(&graph, config)),
        LayoutEngine::Hierarchical => {
            let partnerships = resolve_partnerships(&graph);
            layout_generic(&to_generic_input(&graph, &partnerships), config)
        }
    }
}

/// Row planner over an already validated graph.
pub fn layout_graph(graph: &FamilyGraph, config: &LayoutConfig) -> Layout {
    let generations = assign_generations(graph);
    let partnerships = resolve_partnerships(graph);
    let positions = compute_positions(graph.people(), &generations, &partnerships, config);
    let connectors = synthesize_connectors(graph, &partnerships, &positions, config.stub_width);

    let people = graph
        .people()
        .iter()
        .filter_map(|person| {
            let point = positions.get(&person.id)?;
            Some(PositionedPerson {
                id: person.id.clone(),
                name: person.name.clone(),
                shape: person.sex.shape(),
                x: point.x,
                y: point.y,
                is_ego: person.is_focal,
                is_deceased: person.is_deceased,
            })
        })
        .collect();

    Layout { people, connectors }
}
