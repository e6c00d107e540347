use crate::ir::{Graph, Shape};

use super::{LayoutOptions, Position, PositionResult, cmp_f32};

/// Shapes whose tops are closer than this are read as one row.
const ROW_TOLERANCE: f32 = 50.0;

pub fn compute_grid_layout(graph: &Graph, options: &LayoutOptions) -> PositionResult {
    let mut positions = PositionResult::new();
    let ordered = reading_order(graph.shapes.values().collect());
    if ordered.is_empty() {
        return positions;
    }

    let count = ordered.len();
    let columns = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);

    let mut column_widths = vec![0.0f32; columns];
    let mut row_heights = vec![0.0f32; rows];
    for (idx, shape) in ordered.iter().enumerate() {
        let (row, col) = (idx / columns, idx % columns);
        column_widths[col] = column_widths[col].max(shape.width);
        row_heights[row] = row_heights[row].max(shape.height);
    }

    let column_x = offsets(&column_widths, options.spacing, options.start_x);
    let row_y = offsets(&row_heights, options.spacing, options.start_y);

    for (idx, shape) in ordered.iter().enumerate() {
        let (row, col) = (idx / columns, idx % columns);
        positions.insert(
            shape.id.clone(),
            Position::sized(column_x[col], row_y[row], column_widths[col], row_heights[row]),
        );
    }
    positions
}

fn offsets(sizes: &[f32], spacing: f32, start: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(sizes.len());
    let mut cursor = start;
    for size in sizes {
        out.push(cursor);
        cursor += size + spacing;
    }
    out
}

/// Top-to-bottom, left-to-right, with shapes less than [`ROW_TOLERANCE`]
/// below the first shape of a row joining that row.
fn reading_order(mut shapes: Vec<&Shape>) -> Vec<&Shape> {
    shapes.sort_by(|a, b| {
        cmp_f32(a.y, b.y)
            .then_with(|| cmp_f32(a.x, b.x))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut rows: Vec<Vec<&Shape>> = Vec::new();
    let mut row_top = f32::NEG_INFINITY;
    for shape in shapes {
        match rows.last_mut() {
            Some(row) if shape.y - row_top < ROW_TOLERANCE => row.push(shape),
            _ => {
                row_top = shape.y;
                rows.push(vec![shape]);
            }
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|a, b| {
                cmp_f32(a.x, b.x)
                    .then_with(|| cmp_f32(a.y, b.y))
                    .then_with(|| a.id.cmp(&b.id))
            });
            row
        })
        .collect()
}
