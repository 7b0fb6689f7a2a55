//! Data models: detection input, reconstructed document, configuration.

pub mod config;
pub mod document;
pub mod input;

pub use config::YomiConfig;
pub use document::{Block, Cell, Direction, Document, Element, ElementKind, Figure, Paragraph, Table, Word};
pub use input::{ElementRecord, PageDetections, TableDetection};
