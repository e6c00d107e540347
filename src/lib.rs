pub mod api;
pub mod apply;
pub mod authoring;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod style;
pub mod text_fit;

pub use api::{LayoutOutcome, LayoutSummary, layout_document, layout_document_with};
pub use authoring::{NewShape, add_connector, add_shape, compute_dimensions, next_id};
pub use document::Document;
pub use error::{AuthoringError, DocumentError, LayoutError};
pub use extract::{extract, extract_str};
pub use ir::{Edge, Graph, Shape, ShapeKind};
pub use layout::{LayoutKind, LayoutOptions, Position, PositionResult, compute_layout};
pub use text_fit::{Dimensions, fit};

#[cfg(feature = "cli")]
pub use cli::run;
