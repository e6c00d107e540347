mod flowchart;
mod grid;
pub(crate) mod ranking;

pub use flowchart::compute_flowchart_layout;
pub use grid::compute_grid_layout;

pub use crate::config::LayoutOptions;
use crate::error::LayoutError;
use crate::ir::Graph;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Grid,
    FlowchartVertical,
    FlowchartHorizontal,
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 3] = [
        LayoutKind::Grid,
        LayoutKind::FlowchartVertical,
        LayoutKind::FlowchartHorizontal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::FlowchartVertical => "flowchart-vertical",
            Self::FlowchartHorizontal => "flowchart-horizontal",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "flowchart-vertical" | "flowchart" | "vertical" => Ok(Self::FlowchartVertical),
            "flowchart-horizontal" | "horizontal" => Ok(Self::FlowchartHorizontal),
            _ => Err(LayoutError::UnknownLayoutKind(s.to_string())),
        }
    }
}

/// New placement for one shape. Sizes are only set when the strategy
/// resized the shape's cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

impl Position {
    pub fn sized(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: Some(width),
            height: Some(height),
        }
    }
}

pub type PositionResult = BTreeMap<String, Position>;

pub fn compute_layout(graph: &Graph, kind: LayoutKind, options: &LayoutOptions) -> PositionResult {
    match kind {
        LayoutKind::Grid => compute_grid_layout(graph, options),
        LayoutKind::FlowchartVertical => compute_flowchart_layout(graph, options, Axis::Vertical),
        LayoutKind::FlowchartHorizontal => {
            compute_flowchart_layout(graph, options, Axis::Horizontal)
        }
    }
}

/// Shifts everything right/down so nothing starts before the configured origin.
pub(crate) fn normalize_to_start(positions: &mut PositionResult, options: &LayoutOptions) {
    let min_x = positions.values().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let min_y = positions.values().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let dx = if min_x < options.start_x {
        options.start_x - min_x
    } else {
        0.0
    };
    let dy = if min_y < options.start_y {
        options.start_y - min_y
    } else {
        0.0
    };
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    for pos in positions.values_mut() {
        pos.x += dx;
        pos.y += dy;
    }
}

/// Sort key for position hints that treats NaN as equal instead of panicking.
pub(crate) fn cmp_f32(a: f32, b: f32) -> std::cmp::Ordering {
    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
}
