use crate::ir::{PartnerStatus, PersonId, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    /// Line between two partners.
    Partner,
    /// Vertical drop from a partnership midpoint (or single parent) to the bus.
    Descent,
    /// Horizontal line the children hang from.
    Bus,
    /// Vertical segment from the bus down to one child.
    Drop,
    /// Fallback line between siblings without resolvable shared parents.
    Sibling,
}

impl ConnectorKind {
    /// Wire name consumed by the renderer and interaction layer.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Partner => "partner",
            Self::Descent => "generation-connector",
            Self::Bus => "sibling-connector",
            Self::Drop => "parent-child",
            Self::Sibling => "sibling",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokePattern {
    #[default]
    Solid,
    Dashed {
        dash: f32,
        gap: f32,
    },
}

impl StrokePattern {
    pub fn dash_array(self) -> Option<String> {
        match self {
            Self::Solid => None,
            Self::Dashed { dash, gap } => Some(format!("{dash},{gap}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub from: Point,
    pub to: Point,
    pub kind: ConnectorKind,
    pub status: Option<PartnerStatus>,
    /// Interior polyline vertices between `from` and `to`.
    pub waypoints: Vec<Point>,
    /// Extra marks drawn on top of the base line (divorce slashes).
    pub decorations: Vec<Segment>,
    pub stroke: StrokePattern,
    pub id: Option<String>,
    pub from_id: Option<PersonId>,
    pub to_id: Option<PersonId>,
}

impl Connector {
    pub fn new(kind: ConnectorKind, from: Point, to: Point) -> Self {
        Self {
            from,
            to,
            kind,
            status: None,
            waypoints: Vec::new(),
            decorations: Vec::new(),
            stroke: StrokePattern::Solid,
            id: None,
            from_id: None,
            to_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_endpoints(mut self, from_id: impl Into<PersonId>, to_id: impl Into<PersonId>) -> Self {
        self.from_id = Some(from_id.into());
        self.to_id = Some(to_id.into());
        self
    }

    /// Full polyline: `from`, the waypoints, then `to`.
    pub fn points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.waypoints.len() + 2);
        points.push(self.from);
        points.extend(self.waypoints.iter().copied());
        points.push(self.to);
        points
    }

    pub fn length(&self) -> f32 {
        self.points()
            .windows(2)
            .map(|pair| (pair[1].x - pair[0].x).hypot(pair[1].y - pair[0].y))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedPerson {
    pub id: PersonId,
    pub name: String,
    pub shape: Shape,
    pub x: f32,
    pub y: f32,
    pub is_ego: bool,
    pub is_deceased: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub people: Vec<PositionedPerson>,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    fn include(&mut self, point: Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }
}

impl Layout {
    pub fn person(&self, id: &str) -> Option<&PositionedPerson> {
        self.people.iter().find(|person| person.id == id)
    }

    pub fn connectors_of(&self, kind: ConnectorKind) -> impl Iterator<Item = &Connector> {
        self.connectors.iter().filter(move |c| c.kind == kind)
    }

    /// Extent of every person centre and connector vertex; `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .people
            .iter()
            .map(|p| Point::new(p.x, p.y))
            .chain(self.connectors.iter().flat_map(|c| {
                c.points()
                    .into_iter()
                    .chain(c.decorations.iter().flat_map(|s| [s.from, s.to]))
            }));
        let first = points.next()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in points {
            bounds.include(point);
        }
        Some(bounds)
    }
}
