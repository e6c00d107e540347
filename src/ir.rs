use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Rhombus,
    Cylinder,
    Hexagon,
    Cloud,
    Step,
    Parallelogram,
    Trapezoid,
    Triangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 10] = [
        ShapeKind::Rectangle,
        ShapeKind::Ellipse,
        ShapeKind::Rhombus,
        ShapeKind::Cylinder,
        ShapeKind::Hexagon,
        ShapeKind::Cloud,
        ShapeKind::Step,
        ShapeKind::Parallelogram,
        ShapeKind::Trapezoid,
        ShapeKind::Triangle,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Some(Self::Rectangle),
            "ellipse" | "circle" | "oval" => Some(Self::Ellipse),
            "rhombus" | "diamond" => Some(Self::Rhombus),
            "cylinder" => Some(Self::Cylinder),
            "hexagon" => Some(Self::Hexagon),
            "cloud" => Some(Self::Cloud),
            "step" => Some(Self::Step),
            "parallelogram" => Some(Self::Parallelogram),
            "trapezoid" => Some(Self::Trapezoid),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    /// Lenient lookup used by authoring surfaces: unknown names behave like a rectangle.
    pub fn from_name(name: &str) -> Self {
        Self::from_token(name).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Rhombus => "rhombus",
            Self::Cylinder => "cylinder",
            Self::Hexagon => "hexagon",
            Self::Cloud => "cloud",
            Self::Step => "step",
            Self::Parallelogram => "parallelogram",
            Self::Trapezoid => "trapezoid",
            Self::Triangle => "triangle",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    pub id: String,
    pub text: String,
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

// Adjacency only mentions shapes present in `shapes`. Connectors with missing
// endpoints stay in `edges` for reporting.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub shapes: BTreeMap<String, Shape>,
    pub edges: Vec<Edge>,
    outgoing: BTreeMap<String, Vec<String>>,
    incoming: BTreeMap<String, Vec<String>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a shape unless one with the same id exists. Returns whether it was added.
    pub fn add_shape(&mut self, shape: Shape) -> bool {
        if self.shapes.contains_key(&shape.id) {
            return false;
        }
        self.shapes.insert(shape.id.clone(), shape);
        true
    }

    /// Appends a connector. Shapes must be added first for the connector to
    /// show up in the adjacency indices.
    pub fn add_edge(&mut self, edge: Edge) {
        let source_known = self.shapes.contains_key(&edge.source);
        let target_known = self.shapes.contains_key(&edge.target);
        if source_known && target_known {
            self.outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
            self.incoming
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }
        self.edges.push(edge);
    }

    pub fn outgoing(&self, id: &str) -> &[String] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, id: &str) -> &[String] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|edge| {
            !self.shapes.contains_key(&edge.source) || !self.shapes.contains_key(&edge.target)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }
}
