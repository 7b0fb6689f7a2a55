//! Document structures produced by the analyzer.

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Quad};
use crate::layout::Policy;

/// Writing direction of a word or text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl Direction {
    /// Direction implied by a quad's shape: taller than wide reads vertically.
    pub fn of_quad(quad: &Quad) -> Self {
        if quad.height() > quad.width() {
            Direction::Vertical
        } else {
            Direction::Horizontal
        }
    }

    /// Majority vote, ties go to horizontal.
    pub fn majority<I: IntoIterator<Item = Direction>>(directions: I) -> Self {
        let (mut horizontal, mut vertical) = (0usize, 0usize);
        for d in directions {
            match d {
                Direction::Horizontal => horizontal += 1,
                Direction::Vertical => vertical += 1,
            }
        }
        if vertical > horizontal {
            Direction::Vertical
        } else {
            Direction::Horizontal
        }
    }
}

/// A recognized word as delivered by the text recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WordRecord")]
pub struct Word {
    /// Polygon, clockwise from top-left.
    pub points: Quad,
    /// Recognized text.
    pub content: String,
    /// Detection confidence (0.0 - 1.0).
    pub det_score: f32,
    /// Recognition confidence (0.0 - 1.0).
    pub rec_score: f32,
    /// Derived from the quad unless the recognizer supplied one.
    pub direction: Direction,
}

#[derive(Deserialize)]
struct WordRecord {
    points: Quad,
    content: String,
    #[serde(default)]
    det_score: f32,
    #[serde(default)]
    rec_score: f32,
    #[serde(default)]
    direction: Option<Direction>,
}

impl From<WordRecord> for Word {
    fn from(r: WordRecord) -> Self {
        let direction = r.direction.unwrap_or_else(|| Direction::of_quad(&r.points));
        Self {
            points: r.points,
            content: r.content,
            det_score: r.det_score,
            rec_score: r.rec_score,
            direction,
        }
    }
}

impl Word {
    /// Create a word, deriving its direction from the quad.
    pub fn new(points: Quad, content: impl Into<String>, det_score: f32, rec_score: f32) -> Self {
        Self {
            direction: Direction::of_quad(&points),
            points,
            content: content.into(),
            det_score,
            rec_score,
        }
    }

    /// Convenience constructor for an axis-aligned word.
    pub fn from_box(bbox: BoundingBox, content: impl Into<String>) -> Self {
        let quad = Quad([
            [bbox.x1, bbox.y1],
            [bbox.x2, bbox.y1],
            [bbox.x2, bbox.y2],
            [bbox.x1, bbox.y2],
        ]);
        Self::new(quad, content, 1.0, 1.0)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.points.bounding_box()
    }
}

/// Layout element category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Paragraph,
    Table,
    Figure,
    /// Row band inside a table.
    Row,
    /// Column band inside a table.
    Column,
    /// Merged cell region inside a table.
    Span,
}

/// A detected layout primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub score: f32,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(kind: ElementKind, bbox: BoundingBox, score: f32) -> Self {
        Self { bbox, score, kind }
    }
}

/// A block of running text with its assigned words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub contents: Option<String>,
    pub direction: Direction,
    /// Position in the document reading order.
    pub order: usize,
}

/// A resolved table cell. Row and column indices are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// `None` until words are aggregated into the cell.
    pub contents: Option<String>,
}

impl Cell {
    /// Check if this cell covers the 1-based grid position `(row, col)`.
    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.row + self.row_span && col >= self.col && col < self.col + self.col_span
    }

    pub fn is_spanning(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }
}

/// A reconstructed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub score: f32,
    pub n_row: usize,
    pub n_col: usize,
    /// Cells in row-major order.
    pub cells: Vec<Cell>,
    /// Position in the document reading order.
    pub order: usize,
}

impl Table {
    /// Get the cell covering a 1-based grid position.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.iter().find(|c| c.covers(row, col))
    }

    /// Convert to a dense grid of cell references, indexed from 0.
    pub fn grid(&self) -> Vec<Vec<Option<&Cell>>> {
        let mut grid = vec![vec![None; self.n_col]; self.n_row];

        for cell in &self.cells {
            for r in (cell.row - 1)..(cell.row - 1 + cell.row_span).min(self.n_row) {
                for c in (cell.col - 1)..(cell.col - 1 + cell.col_span).min(self.n_col) {
                    grid[r][c] = Some(cell);
                }
            }
        }

        grid
    }
}

/// A figure region, passed through with its reading position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub score: f32,
    pub order: usize,
}

/// A readable block of the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Block<'a> {
    Paragraph(&'a Paragraph),
    Table(&'a Table),
    Figure(&'a Figure),
}

impl Block<'_> {
    pub fn bbox(&self) -> BoundingBox {
        match self {
            Block::Paragraph(p) => p.bbox,
            Block::Table(t) => t.bbox,
            Block::Figure(f) => f.bbox,
        }
    }

    pub fn order(&self) -> usize {
        match self {
            Block::Paragraph(p) => p.order,
            Block::Table(t) => t.order,
            Block::Figure(f) => f.order,
        }
    }
}

/// The reconstructed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Reading-order policy chosen for this page.
    pub policy: Policy,
    /// Paragraphs sorted by reading order.
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
    pub figures: Vec<Figure>,
    pub words: Vec<Word>,
}

impl Document {
    /// All blocks sorted by reading order.
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks: Vec<Block<'_>> = self
            .paragraphs
            .iter()
            .map(Block::Paragraph)
            .chain(self.tables.iter().map(Block::Table))
            .chain(self.figures.iter().map(Block::Figure))
            .collect();
        blocks.sort_by_key(|b| b.order());
        blocks
    }

    /// Plain text of the page: paragraphs and table cells in reading order,
    /// blocks separated by a blank line.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        for block in self.blocks() {
            match block {
                Block::Paragraph(p) => {
                    if let Some(contents) = &p.contents {
                        parts.push(contents.clone());
                    }
                }
                Block::Table(t) => {
                    let cells: Vec<&str> = t
                        .cells
                        .iter()
                        .filter_map(|c| c.contents.as_deref())
                        .filter(|c| !c.is_empty())
                        .collect();
                    if !cells.is_empty() {
                        parts.push(cells.join("\n"));
                    }
                }
                Block::Figure(_) => {}
            }
        }
        parts.join("\n\n")
    }
}
