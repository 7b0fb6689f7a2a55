//! Detection records consumed from the upstream detectors.
//!
//! These are plain data: the OCR word list and the layout/table detections
//! of one page. Shape violations (a quad without four points, a non-numeric
//! coordinate) are rejected here, at deserialization time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::models::document::{Element, ElementKind, Word};

fn default_score() -> f32 {
    1.0
}

/// A detected box with its confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default = "default_score")]
    pub score: f32,
}

impl ElementRecord {
    pub fn new(bbox: BoundingBox, score: f32) -> Self {
        Self { bbox, score }
    }

    /// Tag the record with its category.
    pub fn into_element(self, kind: ElementKind) -> Element {
        Element::new(kind, self.bbox, self.score)
    }
}

/// Table structure detections for one table region.
///
/// Row, column and span boxes are relative to the table crop; `offset` is the
/// crop's top-left corner in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default = "default_score")]
    pub score: f32,
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default)]
    pub rows: Vec<ElementRecord>,
    #[serde(default)]
    pub cols: Vec<ElementRecord>,
    #[serde(default)]
    pub spans: Vec<ElementRecord>,
}

impl TableDetection {
    /// Create a table detection whose sub-boxes are already in page coordinates.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            score: 1.0,
            offset: [0.0, 0.0],
            rows: Vec::new(),
            cols: Vec::new(),
            spans: Vec::new(),
        }
    }

    pub fn with_offset(mut self, dx: f32, dy: f32) -> Self {
        self.offset = [dx, dy];
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = BoundingBox>) -> Self {
        self.rows = rows.into_iter().map(|b| ElementRecord::new(b, 1.0)).collect();
        self
    }

    pub fn with_cols(mut self, cols: impl IntoIterator<Item = BoundingBox>) -> Self {
        self.cols = cols.into_iter().map(|b| ElementRecord::new(b, 1.0)).collect();
        self
    }

    pub fn with_spans(mut self, spans: impl IntoIterator<Item = BoundingBox>) -> Self {
        self.spans = spans.into_iter().map(|b| ElementRecord::new(b, 1.0)).collect();
        self
    }

    /// Sub-elements of one kind, translated into page coordinates.
    pub fn parts(&self, kind: ElementKind) -> Vec<Element> {
        let records = match kind {
            ElementKind::Row => &self.rows,
            ElementKind::Column => &self.cols,
            ElementKind::Span => &self.spans,
            ElementKind::Paragraph | ElementKind::Table | ElementKind::Figure => return Vec::new(),
        };
        let [dx, dy] = self.offset;

        records
            .iter()
            .map(|r| Element::new(kind, r.bbox.translate(dx, dy), r.score))
            .collect()
    }
}

/// Everything the detectors produced for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDetections {
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub paragraphs: Vec<ElementRecord>,
    #[serde(default)]
    pub tables: Vec<TableDetection>,
    #[serde(default)]
    pub figures: Vec<ElementRecord>,
}

impl PageDetections {
    /// Parse detections from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load detections from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn paragraph_elements(&self) -> Vec<Element> {
        self.paragraphs.iter().map(|r| r.into_element(ElementKind::Paragraph)).collect()
    }

    pub fn figure_elements(&self) -> Vec<Element> {
        self.figures.iter().map(|r| r.into_element(ElementKind::Figure)).collect()
    }

    pub fn table_elements(&self) -> Vec<Element> {
        self.tables
            .iter()
            .map(|t| Element::new(ElementKind::Table, t.bbox, t.score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InputError, YomiError};

    #[test]
    fn test_parse_page_detections() {
        let json = r#"{
            "words": [{"points": [[0,0],[30,0],[30,10],[0,10]], "content": "hello", "det_score": 0.9, "rec_score": 0.8}],
            "paragraphs": [{"box": [0, 0, 100, 20], "score": 0.95}],
            "tables": [{"box": [0, 50, 100, 150], "offset": [0, 50],
                        "rows": [{"box": [0, 0, 100, 50]}], "cols": [{"box": [0, 0, 50, 100], "score": 0.7}]}]
        }"#;

        let page = PageDetections::from_json(json).unwrap();
        assert_eq!(page.words.len(), 1);
        assert_eq!(page.paragraphs[0].score, 0.95);
        assert!(page.figures.is_empty());

        let table = &page.tables[0];
        assert_eq!(table.rows[0].score, 1.0);
        let rows = table.parts(ElementKind::Row);
        assert_eq!(rows[0].bbox, BoundingBox::new(0.0, 50.0, 100.0, 100.0));
        assert_eq!(rows[0].kind, ElementKind::Row);
        assert!(table.parts(ElementKind::Span).is_empty());
    }

    #[test]
    fn test_reject_bad_quad() {
        let json = r#"{"words": [{"points": [[0,0],[30,0],[30,10]], "content": "x"}]}"#;
        match PageDetections::from_json(json) {
            Err(YomiError::Json(e)) => {
                assert!(e.to_string().contains(&InputError::InvalidQuad { points: 3 }.to_string()))
            }
            other => panic!("expected JSON error, got {:?}", other),
        }
    }
}
