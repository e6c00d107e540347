use log::debug;

use crate::document::{Cell, Document};
use crate::ir::{Edge, Graph, Shape};
use crate::style::{Style, classify};

/// Builds the layout graph from a parsed document, skipping malformed records.
pub fn extract(document: &Document) -> Graph {
    let mut graph = Graph::new();
    let mut connectors = Vec::new();

    for cell in document.cells() {
        if cell.attr("source").is_some() || cell.attr("target").is_some() || cell.is_edge() {
            match edge_from_cell(&cell) {
                Some(edge) => connectors.push(edge),
                None => debug!("skipping connector without both endpoints: {:?}", cell.id()),
            }
            continue;
        }
        let Some(shape) = shape_from_cell(&cell) else {
            continue;
        };
        let id = shape.id.clone();
        if !graph.add_shape(shape) {
            debug!("skipping duplicate shape id '{id}'");
        }
    }

    // Connectors go in after every shape so forward references resolve.
    for edge in connectors {
        graph.add_edge(edge);
    }
    graph
}

/// Parses and extracts in one go. Text that is not a document yields an empty graph.
pub fn extract_str(text: &str) -> Graph {
    match Document::parse(text) {
        Ok(document) => extract(&document),
        Err(err) => {
            debug!("document did not parse, treating as empty: {err}");
            Graph::new()
        }
    }
}

fn shape_from_cell(cell: &Cell<'_>) -> Option<Shape> {
    let id = cell.id()?;
    let descriptor = cell.attr("style")?;
    let geometry = cell.geometry()?;
    let width = number(geometry.attr("width"))?;
    let height = number(geometry.attr("height"))?;
    let x = optional_number(geometry.attr("x"))?;
    let y = optional_number(geometry.attr("y"))?;

    Some(Shape {
        id: id.to_string(),
        text: cell.label().unwrap_or_default().to_string(),
        kind: classify(&Style::parse(descriptor)),
        x,
        y,
        width,
        height,
    })
}

fn edge_from_cell(cell: &Cell<'_>) -> Option<Edge> {
    let id = cell.id()?;
    let source = cell.attr("source")?;
    let target = cell.attr("target")?;
    let label = cell
        .label()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string);
    Some(Edge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        label,
    })
}

fn number(raw: Option<&str>) -> Option<f32> {
    raw?.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// draw.io omits zero coordinates, so an absent value is 0 but a garbled one is malformed.
fn optional_number(raw: Option<&str>) -> Option<f32> {
    match raw {
        None => Some(0.0),
        Some(_) => number(raw),
    }
}
