//! Core library for document structure and reading-order reconstruction.
//!
//! This crate provides:
//! - Box geometry predicates (containment, projection overlap)
//! - Layout detection filtering with union-find clustering
//! - Table grid reconstruction from row, column and span boxes
//! - Assignment of OCR words to table cells and paragraphs
//! - Reading order for horizontal and vertical (Japanese) pages
//! - HTML and Markdown rendering of the analyzed page

pub mod analyzer;
pub mod error;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod models;

pub use analyzer::{DocumentAnalyzer, DocumentAnalyzerBuilder};
pub use error::{InputError, Result, YomiError};
pub use export::{to_html, to_markdown};
pub use geometry::{BoundingBox, Quad};
pub use layout::Policy;
pub use models::{Document, PageDetections, YomiConfig};
