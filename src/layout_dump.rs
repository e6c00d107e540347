use crate::ir::Graph;
use crate::layout::{LayoutKind, PositionResult};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct GraphDump {
    pub shapes: Vec<ShapeDump>,
    pub edges: Vec<EdgeDump>,
    pub dangling_edges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<LayoutKind>,
}

#[derive(Debug, Serialize)]
pub struct ShapeDump {
    pub id: String,
    pub text: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub successors: Vec<String>,
    pub predecessors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed: Option<PlacedDump>,
}

/// Geometry written back for a shape. Size falls back to the shape's own when
/// the layout left it alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedDump {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphDump {
    pub fn from_graph(graph: &Graph) -> Self {
        let shapes = graph
            .shapes
            .values()
            .map(|shape| ShapeDump {
                id: shape.id.clone(),
                text: shape.text.clone(),
                kind: shape.kind.to_string(),
                x: shape.x,
                y: shape.y,
                width: shape.width,
                height: shape.height,
                successors: graph.outgoing(&shape.id).to_vec(),
                predecessors: graph.incoming(&shape.id).to_vec(),
                placed: None,
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
            })
            .collect();

        GraphDump {
            shapes,
            edges,
            dangling_edges: graph.dangling_edges().map(|e| e.id.clone()).collect(),
            strategy: None,
        }
    }

    /// Same dump, with each shape's computed position alongside its current one.
    pub fn with_layout(graph: &Graph, kind: LayoutKind, positions: &PositionResult) -> Self {
        let mut dump = Self::from_graph(graph);
        for shape in &mut dump.shapes {
            shape.placed = positions.get(&shape.id).map(|p| PlacedDump {
                x: p.x,
                y: p.y,
                width: p.width.unwrap_or(shape.width),
                height: p.height.unwrap_or(shape.height),
            });
        }
        dump.strategy = Some(kind);
        dump
    }
}

pub fn write_graph_dump(path: &Path, dump: &GraphDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}
