use thiserror::Error;

mod model;
pub use model::*;
mod viewport;
pub use viewport::*;
mod drag;
pub use drag::*;
mod layout;
pub use layout::*;
mod commands;
pub use commands::*;
mod store;
pub use store::*;
pub mod cache;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("invalid operation: {0}")]
    InvalidOp(String),
    #[error("zoom must be a positive finite number, got {0}")]
    InvalidZoom(f64),
    #[error("pointer coordinates must be finite, got ({0}, {1})")]
    InvalidPointer(f64, f64),
    #[error("section duration must be positive and finite, got {0}")]
    InvalidDuration(Seconds),
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),
    #[error("section already exists: {0}")]
    SectionExists(SectionId),
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("element already exists: {0}")]
    ElementExists(ElementId),
    #[error("malformed drag payload: {0}")]
    MalformedPayload(String),
    #[error("unknown element type: {0}")]
    UnknownElementType(String),
    #[error("palette item already registered: {0}")]
    DuplicatePaletteItem(String),
    #[error("history empty: {0}")]
    HistoryEmpty(&'static str),
}

pub type Seconds = f64; // template time, seconds from the start of the template
