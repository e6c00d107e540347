use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::apply::format_coord;
use crate::config::TextFitConfig;
use crate::document::Document;
use crate::error::AuthoringError;
use crate::ir::ShapeKind;
use crate::style::{CONNECTOR_STYLE, descriptor_for};
use crate::text_fit::{Dimensions, fit_to_provided};

static TRAILING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("valid trailing number regex"));

const FALLBACK_PARENT: &str = "1";

#[derive(Debug, Clone, PartialEq)]
pub struct NewShape {
    pub text: String,
    pub kind: ShapeKind,
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl NewShape {
    pub fn new(text: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            text: text.into(),
            kind,
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: Option<f32>, height: Option<f32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Size for a shape about to be authored; explicit dimensions win.
pub fn compute_dimensions(
    text: &str,
    width: Option<f32>,
    height: Option<f32>,
    kind: ShapeKind,
    config: &TextFitConfig,
) -> Dimensions {
    fit_to_provided(text, width, height, Some(kind), config)
}

/// One past the largest trailing integer of any cell id, skipping ids in use.
pub fn next_id(document: &Document) -> String {
    let max = document
        .cell_ids()
        .filter_map(|id| TRAILING_NUMBER_RE.captures(id))
        .filter_map(|caps| caps[1].parse::<u128>().ok())
        .max();
    let mut candidate = match max {
        None => 2,
        Some(max) => max.checked_add(1).unwrap_or_else(|| {
            // No room above the largest id: search the low range instead. At most
            // `count` candidates from `count` upward can be taken.
            (document.cell_ids().count() as u128).max(2)
        }),
    };
    while document.contains_cell(&candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

pub fn add_shape(
    document: &mut Document,
    shape: &NewShape,
    config: &TextFitConfig,
) -> Result<String, AuthoringError> {
    let id = next_id(document);
    let parent = document
        .default_parent()
        .unwrap_or_else(|| FALLBACK_PARENT.to_string());
    let dims = compute_dimensions(&shape.text, shape.width, shape.height, shape.kind, config);
    debug!(
        "adding {} '{}' as {id} ({}x{})",
        shape.kind, shape.text, dims.width, dims.height
    );

    document.append_cell(
        vec![
            ("id".to_string(), id.clone()),
            ("value".to_string(), shape.text.clone()),
            ("style".to_string(), descriptor_for(shape.kind).to_string()),
            ("vertex".to_string(), "1".to_string()),
            ("parent".to_string(), parent),
        ],
        vec![
            ("x".to_string(), format_coord(shape.x)),
            ("y".to_string(), format_coord(shape.y)),
            ("width".to_string(), format_coord(dims.width)),
            ("height".to_string(), format_coord(dims.height)),
            ("as".to_string(), "geometry".to_string()),
        ],
    )?;
    Ok(id)
}

pub fn add_connector(
    document: &mut Document,
    source: &str,
    target: &str,
    label: Option<&str>,
) -> Result<String, AuthoringError> {
    for endpoint in [source, target] {
        if !document.contains_cell(endpoint) {
            return Err(AuthoringError::UnknownEndpoint(endpoint.to_string()));
        }
    }
    let id = next_id(document);
    let parent = document
        .default_parent()
        .unwrap_or_else(|| FALLBACK_PARENT.to_string());

    document.append_cell(
        vec![
            ("id".to_string(), id.clone()),
            ("value".to_string(), label.unwrap_or_default().to_string()),
            ("style".to_string(), CONNECTOR_STYLE.to_string()),
            ("edge".to_string(), "1".to_string()),
            ("parent".to_string(), parent),
            ("source".to_string(), source.to_string()),
            ("target".to_string(), target.to_string()),
        ],
        vec![
            ("relative".to_string(), "1".to_string()),
            ("as".to_string(), "geometry".to_string()),
        ],
    )?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    const EMPTY_PAGE: &str = r#"<mxfile><diagram name="Page-1"><mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel></diagram></mxfile>"#;

    #[test]
    fn next_id_follows_the_largest_trailing_number() {
        let doc = Document::parse(EMPTY_PAGE).unwrap();
        assert_eq!(next_id(&doc), "2");

        let doc = Document::parse(
            r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="node-17" parent="1"/><mxCell id="abc" parent="1"/></root></mxGraphModel>"#,
        )
        .unwrap();
        assert_eq!(next_id(&doc), "18");
    }

    #[test]
    fn next_id_steps_past_the_largest_u64() {
        let doc = Document::parse(
            r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="18446744073709551615" parent="0"/></root></mxGraphModel>"#,
        )
        .unwrap();
        assert_eq!(next_id(&doc), "18446744073709551616");
    }

    #[test]
    fn next_id_falls_back_to_a_free_low_id_when_the_largest_cannot_grow() {
        // count = 4, so the search starts at 4, which is taken.
        let doc = Document::parse(
            r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/><mxCell id="4" parent="1"/><mxCell id="340282366920938463463463463374607431768211455" parent="1"/></root></mxGraphModel>"#,
        )
        .unwrap();
        assert_eq!(next_id(&doc), "5");
    }

    #[test]
    fn next_id_ignores_prefixes_when_comparing_numbers() {
        let doc = Document::parse(
            r#"<mxGraphModel><root><mxCell id="node-5"/><mxCell id="6"/></root></mxGraphModel>"#,
        )
        .unwrap();
        assert_eq!(next_id(&doc), "7");
    }

    #[test]
    fn next_id_is_rederived_after_each_insert() {
        let mut doc = Document::parse(EMPTY_PAGE).unwrap();
        let config = TextFitConfig::default();
        let first = add_shape(&mut doc, &NewShape::new("A", ShapeKind::Rectangle), &config).unwrap();
        let second = add_shape(&mut doc, &NewShape::new("B", ShapeKind::Rectangle), &config).unwrap();
        assert_eq!(first, "2");
        assert_eq!(second, "3");
    }

    #[test]
    fn added_shape_is_sized_and_classified() {
        let mut doc = Document::parse(EMPTY_PAGE).unwrap();
        let config = TextFitConfig::default();
        let id = add_shape(
            &mut doc,
            &NewShape::new("Approve?", ShapeKind::Rhombus).at(40.0, 80.0),
            &config,
        )
        .unwrap();

        let reread = Document::parse(&doc.to_xml().unwrap()).unwrap();
        let graph = extract(&reread);
        let shape = &graph.shapes[&id];
        let expected = compute_dimensions("Approve?", None, None, ShapeKind::Rhombus, &config);
        assert_eq!(shape.kind, ShapeKind::Rhombus);
        assert_eq!((shape.x, shape.y), (40.0, 80.0));
        assert_eq!((shape.width, shape.height), (expected.width, expected.height));
        assert_eq!(reread.cell(&id).unwrap().attr("parent"), Some("1"));
    }

    #[test]
    fn explicit_size_is_kept() {
        let mut doc = Document::parse(EMPTY_PAGE).unwrap();
        let id = add_shape(
            &mut doc,
            &NewShape::new("x", ShapeKind::Cloud).with_size(Some(300.0), Some(10.0)),
            &TextFitConfig::default(),
        )
        .unwrap();
        let geometry = doc.cell(&id).unwrap().geometry().unwrap();
        assert_eq!(geometry.attr("width"), Some("300"));
        assert_eq!(geometry.attr("height"), Some("10"));
    }

    #[test]
    fn connector_links_existing_shapes() {
        let mut doc = Document::parse(EMPTY_PAGE).unwrap();
        let config = TextFitConfig::default();
        let a = add_shape(&mut doc, &NewShape::new("A", ShapeKind::Rectangle), &config).unwrap();
        let b = add_shape(&mut doc, &NewShape::new("B", ShapeKind::Ellipse), &config).unwrap();
        let e = add_connector(&mut doc, &a, &b, Some("next")).unwrap();
        assert_eq!(e, "4");
        let graph = extract(&doc);
        assert_eq!(graph.outgoing(&a), [b.clone()]);
        assert_eq!(graph.edges[0].label.as_deref(), Some("next"));
    }

    #[test]
    fn connector_to_unknown_shape_is_rejected() {
        let mut doc = Document::parse(EMPTY_PAGE).unwrap();
        let err = add_connector(&mut doc, "1", "nope", None).unwrap_err();
        assert!(matches!(err, AuthoringError::UnknownEndpoint(ref id) if id == "nope"));
    }
}
