//! Connector geometry: partner lines, parent→children bus sets and sibling
//! fallback lines. Synthesis is best-effort; anything whose endpoint has no
//! position is skipped.

use std::collections::{HashMap, HashSet};

use crate::graph::FamilyGraph;
use crate::ir::{PartnerStatus, PersonId, RelationshipKind};

use super::partnerships::{Partnership, PartnershipOrigin};
use super::types::{Connector, ConnectorKind, Point, Segment, StrokePattern};

/// Geometry added on top of a partner line's base stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    None,
    /// Two parallel slashes across the midpoint.
    Slashes { length: f32, offset: f32 },
    /// The line itself becomes a zig-zag of `segments` equal steps.
    ZigZag { segments: usize, amplitude: f32 },
}

#[derive(Debug, Clone, Copy)]
struct StatusStroke {
    status: PartnerStatus,
    pattern: StrokePattern,
    mark: Mark,
}

/// The only place partner semantics turn into visual style.
const PARTNER_STROKES: [StatusStroke; 4] = [
    StatusStroke {
        status: PartnerStatus::Married,
        pattern: StrokePattern::Solid,
        mark: Mark::None,
    },
    StatusStroke {
        status: PartnerStatus::Divorced,
        pattern: StrokePattern::Solid,
        mark: Mark::Slashes {
            length: 16.0,
            offset: 4.0,
        },
    },
    StatusStroke {
        status: PartnerStatus::Conflicted,
        pattern: StrokePattern::Solid,
        mark: Mark::ZigZag {
            segments: 8,
            amplitude: 6.0,
        },
    },
    StatusStroke {
        status: PartnerStatus::Separated,
        pattern: StrokePattern::Dashed {
            dash: 15.0,
            gap: 10.0,
        },
        mark: Mark::None,
    },
];

const SIBLING_STROKE: StrokePattern = StrokePattern::Dashed { dash: 8.0, gap: 4.0 };

fn stroke_for(status: PartnerStatus) -> &'static StatusStroke {
    PARTNER_STROKES
        .iter()
        .find(|entry| entry.status == status)
        .unwrap_or(&PARTNER_STROKES[0])
}

/// Builds every connector for a planned layout: partner lines first, then one
/// bus set per family, then sibling fallbacks.
pub fn synthesize_connectors(
    graph: &FamilyGraph,
    partnerships: &[Partnership],
    positions: &HashMap<PersonId, Point>,
    stub_width: f32,
) -> Vec<Connector> {
    let mut connectors = Vec::new();

    for rel in graph.relationships() {
        if rel.kind != RelationshipKind::Partner {
            continue;
        }
        if let Some(connector) = partner_between(positions, &rel.from, &rel.to, rel.status) {
            connectors.push(connector);
        }
    }
    // Inferred partnerships have no partner relationship of their own and
    // draw as married.
    for partnership in partnerships {
        if partnership.origin == PartnershipOrigin::Declared {
            continue;
        }
        if let Some(connector) = partner_between(
            positions,
            &partnership.first,
            &partnership.second,
            Some(PartnerStatus::default()),
        ) {
            connectors.push(connector);
        }
    }

    let mut covered: HashSet<(&str, &str)> = HashSet::new();
    for partnership in partnerships {
        for child in &partnership.children {
            covered.insert((partnership.first.as_str(), child.as_str()));
            covered.insert((partnership.second.as_str(), child.as_str()));
        }
        if partnership.children.is_empty() {
            continue;
        }
        let (Some(&a), Some(&b)) = (
            positions.get(&partnership.first),
            positions.get(&partnership.second),
        ) else {
            tracing::trace!(key = %partnership.key(), "partnership without positions, skipping bus");
            continue;
        };
        let children = child_points(positions, &partnership.children);
        connectors.extend(family_connectors(
            &partnership.key(),
            &partnership.first,
            a.midpoint(b),
            &children,
            stub_width,
        ));
    }

    // Children a parent does not share with a layout partner hang from the
    // parent's own position.
    for person in graph.people() {
        let own: Vec<PersonId> = graph
            .children_of(&person.id)
            .iter()
            .filter(|child| !covered.contains(&(person.id.as_str(), child.as_str())))
            .cloned()
            .collect();
        if own.is_empty() {
            continue;
        }
        let Some(&origin) = positions.get(&person.id) else {
            continue;
        };
        let children = child_points(positions, &own);
        connectors.extend(family_connectors(
            &person.id,
            &person.id,
            origin,
            &children,
            stub_width,
        ));
    }

    for rel in graph.relationships() {
        if rel.kind != RelationshipKind::Sibling || graph.share_parent(&rel.from, &rel.to) {
            continue;
        }
        if let Some(connector) = sibling_between(positions, &rel.from, &rel.to) {
            connectors.push(connector);
        }
    }

    tracing::debug!(count = connectors.len(), "connectors synthesized");
    connectors
}

fn child_points(positions: &HashMap<PersonId, Point>, children: &[PersonId]) -> Vec<(PersonId, Point)> {
    children
        .iter()
        .filter_map(|child| match positions.get(child) {
            Some(&point) => Some((child.clone(), point)),
            None => {
                tracing::trace!(child = %child, "child without position, skipping drop");
                None
            }
        })
        .collect()
}

pub(crate) fn partner_between(
    positions: &HashMap<PersonId, Point>,
    from_id: &str,
    to_id: &str,
    status: Option<PartnerStatus>,
) -> Option<Connector> {
    let (Some(&from), Some(&to)) = (positions.get(from_id), positions.get(to_id)) else {
        tracing::trace!(from = from_id, to = to_id, "partner endpoint without position");
        return None;
    };
    Some(
        partner_connector(from, to, status)
            .with_id(format!("{from_id}-{to_id}"))
            .with_endpoints(from_id, to_id),
    )
}

pub(crate) fn sibling_between(
    positions: &HashMap<PersonId, Point>,
    from_id: &str,
    to_id: &str,
) -> Option<Connector> {
    let (Some(&from), Some(&to)) = (positions.get(from_id), positions.get(to_id)) else {
        tracing::trace!(from = from_id, to = to_id, "sibling endpoint without position");
        return None;
    };
    let mut connector = Connector::new(ConnectorKind::Sibling, from, to)
        .with_id(format!("sibling-{from_id}-{to_id}"))
        .with_endpoints(from_id, to_id);
    connector.stroke = SIBLING_STROKE;
    Some(connector)
}

/// Straight partner segment styled from the status table. `None` status draws
/// like a marriage but carries no status.
pub fn partner_connector(from: Point, to: Point, status: Option<PartnerStatus>) -> Connector {
    let style = stroke_for(status.unwrap_or_default());
    let mut connector = Connector::new(ConnectorKind::Partner, from, to);
    connector.status = status;
    connector.stroke = style.pattern;

    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length = dx.hypot(dy);
    let (ux, uy) = if length > f32::EPSILON {
        (dx / length, dy / length)
    } else {
        (1.0, 0.0)
    };
    // Normal pointing "up" for a left-to-right line in y-down coordinates.
    let (nx, ny) = (uy, -ux);

    match style.mark {
        Mark::None => {}
        Mark::Slashes { length: mark, offset } => {
            let mid = from.midpoint(to);
            let (sx, sy) = normalize(ux * 0.5 + nx, uy * 0.5 + ny);
            let half = mark / 2.0;
            for side in [-1.0f32, 1.0] {
                let cx = mid.x + ux * offset * side;
                let cy = mid.y + uy * offset * side;
                connector.decorations.push(Segment {
                    from: Point::new(cx - sx * half, cy - sy * half),
                    to: Point::new(cx + sx * half, cy + sy * half),
                });
            }
        }
        Mark::ZigZag {
            segments,
            amplitude,
        } => {
            for step in 1..segments {
                let t = step as f32 / segments as f32;
                let side = if step % 2 == 1 { amplitude } else { -amplitude };
                connector.waypoints.push(Point::new(
                    from.x + dx * t + nx * side,
                    from.y + dy * t + ny * side,
                ));
            }
        }
    }
    connector
}

fn normalize(x: f32, y: f32) -> (f32, f32) {
    let length = x.hypot(y);
    if length > f32::EPSILON {
        (x / length, y / length)
    } else {
        (0.0, 0.0)
    }
}

/// Descent + bus (or single-child stub) + one drop per child, all orthogonal.
///
/// `key` names the family in connector ids, `source_id` is the person reported
/// as `from_id` on the drops.
pub(crate) fn family_connectors(
    key: &str,
    source_id: &str,
    origin: Point,
    children: &[(PersonId, Point)],
    stub_width: f32,
) -> Vec<Connector> {
    let Some(top) = children.iter().map(|(_, p)| p.y).reduce(f32::min) else {
        return Vec::new();
    };
    let bus_y = origin.y + (top - origin.y) / 2.0;

    let (left, right) = if children.len() > 1 {
        let left = children.iter().map(|(_, p)| p.x).fold(f32::INFINITY, f32::min);
        let right = children
            .iter()
            .map(|(_, p)| p.x)
            .fold(f32::NEG_INFINITY, f32::max);
        (left, right)
    } else {
        let x = children[0].1.x;
        (x - stub_width / 2.0, x + stub_width / 2.0)
    };

    let mut connectors = Vec::with_capacity(children.len() + 2);

    let landing_x = origin.x.clamp(left, right);
    let mut descent = Connector::new(
        ConnectorKind::Descent,
        origin,
        Point::new(landing_x, bus_y),
    )
    .with_id(format!("vertical-{key}"));
    if landing_x != origin.x {
        descent.waypoints.push(Point::new(origin.x, bus_y));
    }
    connectors.push(descent);

    connectors.push(
        Connector::new(
            ConnectorKind::Bus,
            Point::new(left, bus_y),
            Point::new(right, bus_y),
        )
        .with_id(format!("horizontal-{key}")),
    );

    for (index, (child_id, point)) in children.iter().enumerate() {
        connectors.push(
            Connector::new(
                ConnectorKind::Drop,
                Point::new(point.x, bus_y),
                *point,
            )
            .with_id(format!("child-{key}-{index}"))
            .with_endpoints(source_id, child_id.as_str()),
        );
    }

    connectors
}
