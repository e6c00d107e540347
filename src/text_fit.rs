use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::TextFitConfig;
use crate::ir::ShapeKind;

static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\\n|\r\n|\r|<br\s*/?>").expect("valid line break regex"));

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

pub fn shape_multiplier(kind: Option<ShapeKind>) -> f32 {
    match kind {
        Some(ShapeKind::Rectangle)
        | Some(ShapeKind::Step)
        | Some(ShapeKind::Parallelogram)
        | Some(ShapeKind::Trapezoid)
        | None => 1.0,
        Some(ShapeKind::Cylinder) => 1.15,
        Some(ShapeKind::Hexagon) | Some(ShapeKind::Triangle) => 1.25,
        Some(ShapeKind::Ellipse) | Some(ShapeKind::Cloud) => 1.4,
        Some(ShapeKind::Rhombus) => 1.6,
    }
}

/// Splits a label into lines. Literal `\n`, real line breaks and `<br>` tags
/// all count as one break. Blank labels have no lines at all.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    LINE_BREAK_RE
        .replace_all(text, "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn estimated_width(line: &str, config: &TextFitConfig) -> f32 {
    line.chars().count() as f32 * config.avg_char_width
}

/// Size needed for `text` when wrapped at `max_width` (the configured default if `None`).
pub fn fit(
    text: &str,
    max_width: Option<f32>,
    kind: Option<ShapeKind>,
    config: &TextFitConfig,
) -> Dimensions {
    let max_width = max_width.unwrap_or(config.max_width);
    let wrap_width = max_width - config.padding_x;

    let mut total_lines = 0usize;
    let mut longest = 0.0f32;
    for line in split_lines(text) {
        let width = estimated_width(&line, config);
        if wrap_width > 0.0 && width > wrap_width {
            total_lines += (width / wrap_width).ceil() as usize;
        } else {
            total_lines += 1;
        }
        longest = longest.max(width);
    }

    let width = config.min_width.max(longest + config.padding_x);
    let raw_height = (total_lines as f32 * config.line_height + config.padding_y)
        * shape_multiplier(kind);
    let height = config.min_height.max(raw_height.ceil());
    Dimensions { width, height }
}

/// Explicit dimensions win; missing ones are computed from the text while the
/// given one is held fixed.
pub fn fit_to_provided(
    text: &str,
    width: Option<f32>,
    height: Option<f32>,
    kind: Option<ShapeKind>,
    config: &TextFitConfig,
) -> Dimensions {
    match (width, height) {
        (Some(width), Some(height)) => Dimensions { width, height },
        // Wrapping at the caller's width changes how many lines the label needs.
        (Some(width), None) => Dimensions {
            width,
            height: fit(text, Some(width), kind, config).height,
        },
        (None, Some(height)) => Dimensions {
            width: fit(text, None, kind, config).width,
            height,
        },
        (None, None) => fit(text, None, kind, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TextFitConfig {
        TextFitConfig::default()
    }

    #[test]
    fn split_lines_handles_every_break_form() {
        assert_eq!(split_lines("a\\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb\r\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a<br>b<br/>c<BR />d"), vec!["a", "b", "c", "d"]);
        assert!(split_lines("").is_empty());
        assert!(split_lines("   ").is_empty());
    }

    #[test]
    fn empty_text_is_exactly_the_minimum_for_every_kind() {
        let config = cfg();
        for kind in ShapeKind::ALL {
            let dims = fit("", None, Some(kind), &config);
            assert_eq!(
                dims,
                Dimensions {
                    width: config.min_width,
                    height: config.min_height
                },
                "{kind}"
            );
        }
        let dims = fit("", Some(500.0), None, &config);
        assert_eq!((dims.width, dims.height), (config.min_width, config.min_height));
    }

    #[test]
    fn rhombus_needs_more_height_than_rectangle() {
        let config = cfg();
        for text in ["Decision", "Is the order\nvalid?", "a much longer label that wraps"] {
            let rect = fit(text, None, Some(ShapeKind::Rectangle), &config);
            let rhombus = fit(text, None, Some(ShapeKind::Rhombus), &config);
            assert!(rhombus.height > rect.height, "{text}");
        }
    }

    #[test]
    fn multipliers_follow_lost_area() {
        let m = |k| shape_multiplier(Some(k));
        for kind in [
            ShapeKind::Rectangle,
            ShapeKind::Step,
            ShapeKind::Parallelogram,
            ShapeKind::Trapezoid,
        ] {
            assert_eq!(m(kind), 1.0);
        }
        assert!(m(ShapeKind::Cylinder) > 1.0);
        assert!(m(ShapeKind::Cylinder) < m(ShapeKind::Hexagon));
        assert_eq!(m(ShapeKind::Hexagon), m(ShapeKind::Triangle));
        assert!(m(ShapeKind::Hexagon) < m(ShapeKind::Ellipse));
        assert_eq!(m(ShapeKind::Ellipse), m(ShapeKind::Cloud));
        assert!(m(ShapeKind::Ellipse) < m(ShapeKind::Rhombus));
        assert_eq!(shape_multiplier(None), 1.0);
    }

    #[test]
    fn long_lines_wrap_into_more_height() {
        let config = cfg();
        // 45 chars * 8 = 360px against a 180px wrap width: two sub-lines.
        let text = "x".repeat(45);
        let dims = fit(&text, None, None, &config);
        assert_eq!(dims.height, 2.0 * config.line_height + config.padding_y);
        assert_eq!(dims.width, 360.0 + config.padding_x);
    }

    #[test]
    fn wrap_width_inside_the_padding_keeps_one_line() {
        let config = cfg();
        let text = "x".repeat(45);
        let one_line = config
            .min_height
            .max(config.line_height + config.padding_y);
        for max_width in [10.0, config.padding_x] {
            let dims = fit(&text, Some(max_width), None, &config);
            assert_eq!(dims.height, one_line, "max width {max_width}");
            assert_eq!(dims.width, 360.0 + config.padding_x);
        }
    }

    #[test]
    fn grows_with_characters_and_lines() {
        let config = cfg();
        let mut previous = fit("a", None, None, &config);
        for n in 2..80 {
            let next = fit(&"a".repeat(n), None, None, &config);
            assert!(next.width >= previous.width);
            assert!(next.height >= previous.height);
            previous = next;
        }
        let one = fit("a", None, None, &config);
        let three = fit("a\nb\nc", None, None, &config);
        assert!(three.height > one.height);
    }

    #[test]
    fn provided_dimensions_pass_through() {
        let config = cfg();
        let dims = fit_to_provided("whatever", Some(10.0), Some(20.0), Some(ShapeKind::Cloud), &config);
        assert_eq!(dims, Dimensions { width: 10.0, height: 20.0 });
    }

    #[test]
    fn single_provided_dimension_is_held() {
        let config = cfg();
        let text = "a label long enough to wrap in a narrow box";
        let narrow = fit_to_provided(text, Some(140.0), None, None, &config);
        assert_eq!(narrow.width, 140.0);
        let wide = fit_to_provided(text, Some(600.0), None, None, &config);
        assert!(narrow.height > wide.height);

        let tall = fit_to_provided(text, None, Some(300.0), None, &config);
        assert_eq!(tall.height, 300.0);
        assert_eq!(tall.width, fit(text, None, None, &config).width);

        assert_eq!(
            fit_to_provided(text, None, None, Some(ShapeKind::Hexagon), &config),
            fit(text, None, Some(ShapeKind::Hexagon), &config)
        );
    }
}
