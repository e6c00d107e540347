use crate::ir::ShapeKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    entries: Vec<(String, String)>,
}

impl Style {
    pub fn parse(descriptor: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for part in descriptor.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = match part.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (part, ""),
            };
            if key.is_empty() {
                continue;
            }
            // Later occurrences override earlier ones, as in draw.io.
            if let Some(existing) = entries.iter_mut().find(|(k, _)| k == key) {
                existing.1 = value.to_string();
            } else {
                entries.push((key.to_string(), value.to_string()));
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True for a bare token such as `ellipse` (no `=value`).
    pub fn has_token(&self, token: &str) -> bool {
        self.entries.iter().any(|(k, v)| k == token && v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `shape=<value>` discriminators. Checked before any bare token.
const SHAPE_VALUES: &[(&str, ShapeKind)] = &[
    ("cloud", ShapeKind::Cloud),
    ("cylinder", ShapeKind::Cylinder),
    ("cylinder2", ShapeKind::Cylinder),
    ("cylinder3", ShapeKind::Cylinder),
    ("datastore", ShapeKind::Cylinder),
    ("hexagon", ShapeKind::Hexagon),
    ("step", ShapeKind::Step),
    ("parallelogram", ShapeKind::Parallelogram),
    ("trapezoid", ShapeKind::Trapezoid),
    ("triangle", ShapeKind::Triangle),
    ("rhombus", ShapeKind::Rhombus),
    ("ellipse", ShapeKind::Ellipse),
    ("doubleEllipse", ShapeKind::Ellipse),
];

/// Bare-token discriminators, most area-constrained first.
const BARE_TOKENS: &[(&str, ShapeKind)] = &[
    ("rhombus", ShapeKind::Rhombus),
    ("triangle", ShapeKind::Triangle),
    ("ellipse", ShapeKind::Ellipse),
    ("doubleEllipse", ShapeKind::Ellipse),
];

pub fn classify(style: &Style) -> ShapeKind {
    if let Some(value) = style.get("shape") {
        if let Some((_, kind)) = SHAPE_VALUES.iter().find(|(name, _)| *name == value) {
            return *kind;
        }
    }
    BARE_TOKENS
        .iter()
        .find(|(token, _)| style.has_token(token))
        .map(|(_, kind)| *kind)
        .unwrap_or_default()
}

pub fn classify_descriptor(descriptor: &str) -> ShapeKind {
    classify(&Style::parse(descriptor))
}

/// Style written for newly authored shapes of each kind.
pub fn descriptor_for(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Rectangle => "rounded=0;whiteSpace=wrap;html=1;",
        ShapeKind::Ellipse => "ellipse;whiteSpace=wrap;html=1;",
        ShapeKind::Rhombus => "rhombus;whiteSpace=wrap;html=1;",
        ShapeKind::Cylinder => {
            "shape=cylinder3;whiteSpace=wrap;html=1;boundedLbl=1;backgroundOutline=1;size=15;"
        }
        ShapeKind::Hexagon => {
            "shape=hexagon;perimeter=hexagonPerimeter2;whiteSpace=wrap;html=1;fixedSize=1;"
        }
        ShapeKind::Cloud => "ellipse;shape=cloud;whiteSpace=wrap;html=1;",
        ShapeKind::Step => "shape=step;perimeter=stepPerimeter;whiteSpace=wrap;html=1;fixedSize=1;",
        ShapeKind::Parallelogram => {
            "shape=parallelogram;perimeter=parallelogramPerimeter;whiteSpace=wrap;html=1;fixedSize=1;"
        }
        ShapeKind::Trapezoid => {
            "shape=trapezoid;perimeter=trapezoidPerimeter;whiteSpace=wrap;html=1;fixedSize=1;"
        }
        ShapeKind::Triangle => "triangle;whiteSpace=wrap;html=1;",
    }
}

pub const CONNECTOR_STYLE: &str =
    "edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;";
