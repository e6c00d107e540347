use log::warn;

use crate::document::Document;
use crate::layout::PositionResult;

/// Writes positions (and resized cells) into the matching `mxGeometry`
/// elements. Returns how many cells were updated.
pub fn apply_positions(document: &mut Document, positions: &PositionResult) -> usize {
    let mut applied = 0;
    for (id, pos) in positions {
        if !document.set_geometry_attr(id, "x", format_coord(pos.x)) {
            warn!("no geometry for shape '{id}', position dropped");
            continue;
        }
        document.set_geometry_attr(id, "y", format_coord(pos.y));
        if let Some(width) = pos.width {
            document.set_geometry_attr(id, "width", format_coord(width));
        }
        if let Some(height) = pos.height {
            document.set_geometry_attr(id, "height", format_coord(height));
        }
        applied += 1;
    }
    applied
}

/// Integers print bare, everything else with at most two decimals.
pub fn format_coord(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        let text = format!("{rounded:.2}");
        text.trim_end_matches('0').to_string()
    }
}
