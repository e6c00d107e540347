use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse diagram document: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("failed to write diagram document: {0}")]
    Write(#[from] quick_xml::Error),
    #[error("written document is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("document has no <root> element to hold new cells")]
    MissingCellRoot,
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(
        "unknown layout kind '{0}' (expected one of: grid, flowchart-vertical, flowchart-horizontal)"
    )]
    UnknownLayoutKind(String),
    #[error("spacing must be a positive number, got {0}")]
    InvalidSpacing(f32),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("cannot connect: no shape with id '{0}'")]
    UnknownEndpoint(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}
