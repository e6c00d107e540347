use std::collections::BTreeMap;

use log::debug;

use crate::ir::{Graph, Shape};

use super::ranking::{cross_hint, rank_shapes};
use super::{Axis, LayoutOptions, Position, PositionResult, cmp_f32, normalize_to_start};

/// A level with more shapes than this gets extra routing clearance.
const WIDE_LEVEL: usize = 2;
const MAIN_CLEARANCE: f32 = 1.3;
const CROSS_CLEARANCE: f32 = 1.5;

fn main_size(shape: &Shape, axis: Axis) -> f32 {
    match axis {
        Axis::Vertical => shape.height,
        Axis::Horizontal => shape.width,
    }
}

fn cross_size(shape: &Shape, axis: Axis) -> f32 {
    match axis {
        Axis::Vertical => shape.width,
        Axis::Horizontal => shape.height,
    }
}

pub fn compute_flowchart_layout(
    graph: &Graph,
    options: &LayoutOptions,
    axis: Axis,
) -> PositionResult {
    let mut positions = PositionResult::new();
    if graph.is_empty() {
        return positions;
    }

    let ranking = rank_shapes(graph, axis);
    let mut levels: BTreeMap<usize, Vec<&Shape>> = BTreeMap::new();
    for shape in graph.shapes.values() {
        let level = ranking.levels.get(&shape.id).copied().unwrap_or(0);
        levels.entry(level).or_default().push(shape);
    }
    for shapes in levels.values_mut() {
        shapes.sort_by(|a, b| {
            let lane_a = ranking.lanes.get(&a.id).copied().unwrap_or(0);
            let lane_b = ranking.lanes.get(&b.id).copied().unwrap_or(0);
            lane_a
                .cmp(&lane_b)
                .then_with(|| cmp_f32(cross_hint(a, axis), cross_hint(b, axis)))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let wide = levels.values().any(|shapes| shapes.len() > WIDE_LEVEL);
    let (main_gap, cross_gap) = if wide {
        (
            options.spacing * MAIN_CLEARANCE,
            options.spacing * CROSS_CLEARANCE,
        )
    } else {
        (options.spacing, options.spacing)
    };
    debug!(
        "flowchart {:?}: {} levels, wide={wide}, gaps main={main_gap} cross={cross_gap}",
        axis,
        levels.len()
    );

    let (start_main, start_cross) = match axis {
        Axis::Vertical => (options.start_y, options.start_x),
        Axis::Horizontal => (options.start_x, options.start_y),
    };

    let mut main_cursor = start_main;
    for shapes in levels.values() {
        let band = shapes
            .iter()
            .map(|s| main_size(s, axis))
            .fold(0.0f32, f32::max);
        let slot = shapes
            .iter()
            .map(|s| cross_size(s, axis))
            .fold(0.0f32, f32::max);
        let count = shapes.len() as f32;
        let span = count * slot + (count - 1.0).max(0.0) * cross_gap;
        let first_slot = start_cross - span / 2.0;

        for (idx, shape) in shapes.iter().enumerate() {
            let own = cross_size(shape, axis);
            let cross = first_slot + idx as f32 * (slot + cross_gap) + (slot - own) / 2.0;
            let position = match axis {
                Axis::Vertical => Position::sized(cross, main_cursor, own, band),
                Axis::Horizontal => Position::sized(main_cursor, cross, band, own),
            };
            positions.insert(shape.id.clone(), position);
        }
        main_cursor += band + main_gap;
    }

    normalize_to_start(&mut positions, options);
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Edge, ShapeKind};

    fn build(shapes: &[(&str, f32, f32, f32, f32)], edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (id, x, y, w, h) in shapes {
            graph.add_shape(Shape {
                id: id.to_string(),
                text: String::new(),
                kind: ShapeKind::Rectangle,
                x: *x,
                y: *y,
                width: *w,
                height: *h,
            });
        }
        for (idx, (from, to)) in edges.iter().enumerate() {
            graph.add_edge(Edge {
                id: format!("e{idx}"),
                source: from.to_string(),
                target: to.to_string(),
                label: None,
            });
        }
        graph
    }

    fn overlaps(a: &Position, b: &Position) -> bool {
        let (aw, ah) = (a.width.unwrap_or(0.0), a.height.unwrap_or(0.0));
        let (bw, bh) = (b.width.unwrap_or(0.0), b.height.unwrap_or(0.0));
        a.x < b.x + bw && b.x < a.x + aw && a.y < b.y + bh && b.y < a.y + ah
    }

    #[test]
    fn fan_out_is_centered_under_its_parent() {
        let g = build(
            &[
                ("A", 0.0, 0.0, 100.0, 60.0),
                ("B", 0.0, 100.0, 100.0, 60.0),
                ("C", 200.0, 100.0, 100.0, 60.0),
            ],
            &[("A", "B"), ("A", "C")],
        );
        let positions =
            compute_flowchart_layout(&g, &LayoutOptions::new(50.0, 50.0, 50.0), Axis::Vertical);
        let (a, b, c) = (positions["A"], positions["B"], positions["C"]);
        assert_eq!(a.y, 50.0);
        assert_eq!(b.y, 50.0 + 60.0 + 50.0);
        assert_eq!(c.y, b.y);
        assert_eq!(b.x, 50.0);
        assert_eq!(c.x, 200.0);
        assert_eq!(a.x - b.x, c.x - a.x);
        assert_eq!(b.width, Some(100.0));
    }

    #[test]
    fn diamond_puts_the_join_below_both_branches() {
        let g = build(
            &[
                ("A", 0.0, 0.0, 100.0, 60.0),
                ("B", 0.0, 100.0, 100.0, 60.0),
                ("C", 200.0, 100.0, 100.0, 60.0),
                ("D", 100.0, 200.0, 100.0, 60.0),
            ],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        let positions =
            compute_flowchart_layout(&g, &LayoutOptions::new(50.0, 50.0, 50.0), Axis::Vertical);
        let d = positions["D"];
        for above in ["B", "C"] {
            let p = positions[above];
            assert!(d.y >= p.y + p.height.unwrap_or(0.0), "D must sit below {above}");
        }
    }

    #[test]
    fn wide_levels_get_clearance() {
        let g = build(
            &[
                ("root", 0.0, 0.0, 100.0, 60.0),
                ("a", 0.0, 100.0, 100.0, 60.0),
                ("b", 150.0, 100.0, 100.0, 60.0),
                ("c", 300.0, 100.0, 100.0, 60.0),
            ],
            &[("root", "a"), ("root", "b"), ("root", "c")],
        );
        let positions =
            compute_flowchart_layout(&g, &LayoutOptions::new(100.0, 0.0, 0.0), Axis::Vertical);
        assert_eq!(positions["a"].y, 60.0 + 130.0);
        assert_eq!(positions["b"].x - positions["a"].x, 100.0 + 150.0);
    }

    #[test]
    fn level_shares_main_axis_size_and_centers_narrow_shapes() {
        let g = build(
            &[
                ("top", 0.0, 0.0, 100.0, 40.0),
                ("wide", 0.0, 100.0, 200.0, 90.0),
                ("narrow", 300.0, 100.0, 100.0, 30.0),
            ],
            &[("top", "wide"), ("top", "narrow")],
        );
        let positions =
            compute_flowchart_layout(&g, &LayoutOptions::new(50.0, 50.0, 50.0), Axis::Vertical);
        assert_eq!(positions["wide"].height, Some(90.0));
        assert_eq!(positions["narrow"].height, Some(90.0));
        assert_eq!(positions["narrow"].width, Some(100.0));
        // 200-wide slots: the narrow shape sits 50 in from its slot edge.
        assert_eq!(positions["narrow"].x - positions["wide"].x, 200.0 + 50.0 + 50.0);
    }

    #[test]
    fn horizontal_flow_advances_along_x() {
        let g = build(
            &[
                ("A", 0.0, 0.0, 120.0, 60.0),
                ("B", 100.0, 0.0, 80.0, 60.0),
                ("C", 100.0, 200.0, 80.0, 60.0),
            ],
            &[("A", "B"), ("A", "C")],
        );
        let positions =
            compute_flowchart_layout(&g, &LayoutOptions::new(40.0, 10.0, 10.0), Axis::Horizontal);
        assert_eq!(positions["A"].x, 10.0);
        assert_eq!(positions["B"].x, 10.0 + 120.0 + 40.0);
        assert_eq!(positions["B"].width, Some(80.0));
        assert!(positions["B"].y < positions["C"].y);
        assert_eq!(positions["B"].y, 10.0);
    }

    #[test]
    fn disconnected_shapes_go_last_without_overlap() {
        let g = build(
            &[
                ("a", 0.0, 0.0, 100.0, 60.0),
                ("b", 0.0, 100.0, 100.0, 60.0),
                ("x", 0.0, 0.0, 100.0, 60.0),
                ("y", 0.0, 0.0, 100.0, 60.0),
            ],
            &[("a", "b"), ("x", "y"), ("y", "x")],
        );
        let positions =
            compute_flowchart_layout(&g, &LayoutOptions::new(50.0, 50.0, 50.0), Axis::Vertical);
        assert_eq!(positions.len(), 4);
        assert!(positions["x"].y > positions["b"].y);
        let all: Vec<&Position> = positions.values().collect();
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert!(!overlaps(all[i], all[j]));
            }
        }
    }

    #[test]
    fn nothing_lands_before_the_start() {
        let g = build(
            &[
                ("r", 0.0, 0.0, 60.0, 60.0),
                ("a", 0.0, 0.0, 300.0, 60.0),
                ("b", 10.0, 0.0, 300.0, 60.0),
            ],
            &[("r", "a"), ("r", "b")],
        );
        let options = LayoutOptions::new(30.0, 25.0, 75.0);
        let positions = compute_flowchart_layout(&g, &options, Axis::Vertical);
        let min_x = positions.values().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let min_y = positions.values().map(|p| p.y).fold(f32::INFINITY, f32::min);
        assert_eq!(min_x, 25.0);
        assert_eq!(min_y, 75.0);
    }
}
