use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, VecDeque};

use log::trace;

use crate::ir::{Graph, Shape};

use super::{Axis, cmp_f32};

/// Level (rank along the flow) and lane (parallel branch slot) per shape.
#[derive(Debug, Clone, Default)]
pub(crate) struct Ranking {
    pub levels: BTreeMap<String, usize>,
    pub lanes: BTreeMap<String, usize>,
}

/// Position hint across the flow: x for vertical flow, y for horizontal.
pub(crate) fn cross_hint(shape: &Shape, axis: Axis) -> f32 {
    match axis {
        Axis::Vertical => shape.x,
        Axis::Horizontal => shape.y,
    }
}

pub(crate) fn main_hint(shape: &Shape, axis: Axis) -> f32 {
    match axis {
        Axis::Vertical => shape.y,
        Axis::Horizontal => shape.x,
    }
}

fn cross_order(graph: &Graph, axis: Axis, a: &str, b: &str) -> std::cmp::Ordering {
    let (sa, sb) = (&graph.shapes[a], &graph.shapes[b]);
    cmp_f32(cross_hint(sa, axis), cross_hint(sb, axis))
        .then_with(|| cmp_f32(main_hint(sa, axis), main_hint(sb, axis)))
        .then_with(|| a.cmp(b))
}

/// Deduplicated successors without self-loops.
fn successors(graph: &Graph) -> BTreeMap<&str, Vec<&str>> {
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for id in graph.shapes.keys() {
        let mut seen = BTreeSet::new();
        let next: Vec<&str> = graph
            .outgoing(id)
            .iter()
            .map(String::as_str)
            .filter(|target| *target != id.as_str() && seen.insert(*target))
            .collect();
        adj.insert(id.as_str(), next);
    }
    adj
}

/// Shapes without incoming connectors (self-loops ignored), ordered across
/// the flow. Falls back to the first shape along the flow when every shape
/// has a predecessor.
pub(crate) fn select_roots<'a>(graph: &'a Graph, axis: Axis) -> Vec<&'a str> {
    let mut roots: Vec<&str> = graph
        .shapes
        .keys()
        .map(String::as_str)
        .filter(|id| graph.incoming(id).iter().all(|source| source.as_str() == *id))
        .collect();
    if roots.is_empty() {
        let fallback = graph.shapes.values().min_by(|a, b| {
            cmp_f32(main_hint(a, axis), main_hint(b, axis))
                .then_with(|| cmp_f32(cross_hint(a, axis), cross_hint(b, axis)))
                .then_with(|| a.id.cmp(&b.id))
        });
        return fallback.map(|s| vec![s.id.as_str()]).unwrap_or_default();
    }
    roots.sort_by(|a, b| cross_order(graph, axis, a, b));
    roots
}

/// Breadth-first lanes from the roots, then longest-path levels. Shapes no
/// root reaches share the level after the last one, in lane 0.
pub(crate) fn rank_shapes(graph: &Graph, axis: Axis) -> Ranking {
    let mut ranking = Ranking::default();
    if graph.is_empty() {
        return ranking;
    }
    let adj = successors(graph);
    let roots = select_roots(graph, axis);

    let mut queue: VecDeque<(&str, usize, usize)> = VecDeque::new();
    for (lane, root) in roots.into_iter().enumerate() {
        queue.push_back((root, 0, lane));
    }
    let mut discovered: Vec<&str> = Vec::new();
    let mut bfs_levels: HashMap<&str, usize> = HashMap::new();
    while let Some((id, level, lane)) = queue.pop_front() {
        if let Some(existing) = bfs_levels.get_mut(id) {
            *existing = (*existing).max(level);
            continue;
        }
        bfs_levels.insert(id, level);
        ranking.lanes.insert(id.to_string(), lane);
        discovered.push(id);

        let mut children: Vec<&str> = adj.get(id).cloned().unwrap_or_default();
        children.sort_by(|a, b| cross_order(graph, axis, a, b));
        for (offset, child) in children.into_iter().enumerate() {
            if !bfs_levels.contains_key(child) {
                queue.push_back((child, level + 1, lane + offset));
            }
        }
    }

    let levels = longest_path_levels(&discovered, &adj, &bfs_levels);
    let max_level = levels.values().copied().max().unwrap_or(0);
    for (id, level) in levels {
        ranking.levels.insert(id.to_string(), level);
    }

    for id in graph.shapes.keys() {
        if !ranking.levels.contains_key(id) {
            trace!("shape '{id}' is unreachable, parking it after level {max_level}");
            ranking.levels.insert(id.clone(), max_level + 1);
            ranking.lanes.insert(id.clone(), 0);
        }
    }
    ranking
}

// Cycles are broken at the earliest-discovered remaining node and the edges
// that close them are skipped.
fn longest_path_levels<'a>(
    nodes: &[&'a str],
    adj: &BTreeMap<&'a str, Vec<&'a str>>,
    initial: &HashMap<&'a str, usize>,
) -> HashMap<&'a str, usize> {
    let order_key: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, id)| (*id, idx))
        .collect();

    let mut indeg: HashMap<&str, usize> = nodes.iter().map(|id| (*id, 0)).collect();
    for id in nodes {
        for next in adj.get(id).into_iter().flatten() {
            if let Some(deg) = indeg.get_mut(next) {
                *deg += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in nodes {
        if indeg[id] == 0 {
            ready.push(Reverse((order_key[id], *id)));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(nodes.len());
    let mut processed: BTreeSet<&str> = BTreeSet::new();
    let mut cursor = 0usize;
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            for next in adj.get(id).into_iter().flatten() {
                if processed.contains(next) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((order_key[next], *next)));
                    }
                }
            }
        }

        if processed.len() >= nodes.len() {
            break;
        }

        // Cycle: restart from the remaining node discovered first. Processed
        // nodes stay processed, so the cursor only moves forward.
        while cursor < nodes.len() && processed.contains(nodes[cursor]) {
            cursor += 1;
        }
        match nodes.get(cursor) {
            Some(id) => ready.push(Reverse((order_key[id], *id))),
            None => break,
        }
    }

    let position: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (*id, idx))
        .collect();

    let mut levels: HashMap<&str, usize> = nodes
        .iter()
        .map(|id| (*id, initial.get(id).copied().unwrap_or(0)))
        .collect();
    for node in &order {
        let level = levels[node];
        let from = position[node];
        for next in adj.get(node).into_iter().flatten() {
            let Some(&to) = position.get(next) else {
                continue;
            };
            if to <= from {
                continue;
            }
            if let Some(entry) = levels.get_mut(next) {
                *entry = (*entry).max(level + 1);
            }
        }
    }
    levels
}
