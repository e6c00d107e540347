use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::apply::apply_positions;
use crate::document::Document;
use crate::error::LayoutError;
use crate::extract::extract;
use crate::ir::Graph;
use crate::layout::{LayoutKind, LayoutOptions, PositionResult, compute_layout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub shapes: usize,
    pub connectors: usize,
    pub dangling_connectors: usize,
    pub strategy: LayoutKind,
}

impl LayoutSummary {
    fn of(graph: &Graph, strategy: LayoutKind) -> Self {
        Self {
            shapes: graph.len(),
            connectors: graph.edges.len(),
            dangling_connectors: graph.dangling_edges().count(),
            strategy,
        }
    }
}

impl fmt::Display for LayoutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} layout: {} shapes, {} connectors",
            self.strategy, self.shapes, self.connectors
        )?;
        if self.dangling_connectors > 0 {
            write!(f, " ({} dangling)", self.dangling_connectors)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum LayoutOutcome {
    Applied {
        document: String,
        summary: LayoutSummary,
        positions: PositionResult,
    },
    /// The document had no shapes; it is handed back as given.
    NothingToDo {
        document: String,
        summary: LayoutSummary,
    },
}

impl LayoutOutcome {
    pub fn document(&self) -> &str {
        match self {
            Self::Applied { document, .. } | Self::NothingToDo { document, .. } => document,
        }
    }

    pub fn summary(&self) -> &LayoutSummary {
        match self {
            Self::Applied { summary, .. } | Self::NothingToDo { summary, .. } => summary,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Lays out every shape in `document` with the strategy named by `kind`.
pub fn layout_document(
    document: &str,
    kind: &str,
    options: &LayoutOptions,
) -> Result<LayoutOutcome, LayoutError> {
    let kind: LayoutKind = kind.parse()?;
    layout_document_with(document, kind, options)
}

pub fn layout_document_with(
    document: &str,
    kind: LayoutKind,
    options: &LayoutOptions,
) -> Result<LayoutOutcome, LayoutError> {
    if !options.spacing.is_finite() || options.spacing <= 0.0 {
        return Err(LayoutError::InvalidSpacing(options.spacing));
    }

    let mut parsed = match Document::parse(document) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("document did not parse, nothing to lay out: {err}");
            return Ok(LayoutOutcome::NothingToDo {
                document: document.to_string(),
                summary: LayoutSummary::of(&Graph::new(), kind),
            });
        }
    };

    let graph = extract(&parsed);
    let summary = LayoutSummary::of(&graph, kind);
    if graph.is_empty() {
        return Ok(LayoutOutcome::NothingToDo {
            document: document.to_string(),
            summary,
        });
    }

    let positions = compute_layout(&graph, kind, options);
    let applied = apply_positions(&mut parsed, &positions);
    info!("{summary}; {applied} cells moved");

    Ok(LayoutOutcome::Applied {
        document: parsed.to_xml()?,
        summary,
        positions,
    })
}
