//! Table grid reconstruction from row, column and span detections.
//!
//! Rows and columns are bands across the table; every row/column pair yields
//! a base cell. A span box replaces the base cells it covers with a single
//! merged cell. The resulting cells always tile the `n_row x n_col` grid.

use tracing::debug;

use crate::geometry::{BoundingBox, contains, intersection};
use crate::models::config::TableConfig;
use crate::models::document::{Cell, Element, ElementKind, Table};
use crate::models::input::TableDetection;

use super::filter::nested_survivors;

/// Builds [`Table`]s from table structure detections.
pub struct TableGridBuilder {
    config: TableConfig,
}

impl TableGridBuilder {
    pub fn new(config: TableConfig) -> Self {
        Self { config }
    }

    /// Reconstruct the grid of one detected table.
    pub fn build(&self, detection: &TableDetection) -> Table {
        let rows = self.bands(detection.parts(ElementKind::Row));
        let cols = self.bands(detection.parts(ElementKind::Column));
        let mut spans: Vec<Element> = detection
            .parts(ElementKind::Span)
            .into_iter()
            .filter(|s| s.bbox.is_valid())
            .collect();
        // Confident spans win when two claim the same cells
        spans.sort_by(|a, b| b.score.total_cmp(&a.score));
        let spans: Vec<BoundingBox> = spans.into_iter().map(|s| s.bbox).collect();

        let cells = reconstruct_cells(&rows, &cols, &spans, self.config.span_threshold);

        debug!(
            "Reconstructed table: {}x{} with {} cells",
            rows.len(),
            cols.len(),
            cells.len()
        );

        Table {
            bbox: detection.bbox,
            score: detection.score,
            n_row: rows.len(),
            n_col: cols.len(),
            cells,
            order: 0,
        }
    }

    fn bands(&self, elements: Vec<Element>) -> Vec<BoundingBox> {
        let kept: Vec<Element> = if self.config.suppress_nested_bands {
            nested_survivors(&elements).into_iter().map(|i| elements[i]).collect()
        } else {
            elements.into_iter().filter(|e| e.bbox.is_valid()).collect()
        };
        kept.into_iter().map(|e| e.bbox).collect()
    }
}

/// Compute the cell list for sorted-or-unsorted row and column bands.
///
/// Rows are indexed by ascending `y1`, columns by ascending `x1`, both from 1.
/// A span that covers no base cell, or whose rectangle overlaps an earlier
/// merged cell, is dropped.
pub fn reconstruct_cells(
    rows: &[BoundingBox],
    cols: &[BoundingBox],
    spans: &[BoundingBox],
    span_threshold: f32,
) -> Vec<Cell> {
    let mut rows = rows.to_vec();
    let mut cols = cols.to_vec();
    rows.sort_by(|a, b| a.y1.total_cmp(&b.y1).then(a.x1.total_cmp(&b.x1)));
    cols.sort_by(|a, b| a.x1.total_cmp(&b.x1).then(a.y1.total_cmp(&b.y1)));

    // Bands that miss each other still get a cell so the grid stays dense
    let base: Vec<Vec<BoundingBox>> = rows
        .iter()
        .map(|row| {
            cols.iter()
                .map(|col| {
                    intersection(row, col).unwrap_or_else(|| BoundingBox::new(col.x1, row.y1, col.x2, row.y2))
                })
                .collect()
        })
        .collect();

    let mut claimed = vec![vec![false; cols.len()]; rows.len()];
    let mut merged = Vec::new();

    for span in spans {
        let covered: Vec<(usize, usize)> = base
            .iter()
            .enumerate()
            .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, cell)| (r, c, cell)))
            .filter(|(_, _, cell)| contains(span, cell, span_threshold))
            .map(|(r, c, _)| (r, c))
            .collect();

        let Some(&(first_r, first_c)) = covered.first() else {
            debug!("Dropping span {:?}: covers no cell", span);
            continue;
        };

        let (mut r_min, mut r_max, mut c_min, mut c_max) = (first_r, first_r, first_c, first_c);
        for &(r, c) in &covered {
            r_min = r_min.min(r);
            r_max = r_max.max(r);
            c_min = c_min.min(c);
            c_max = c_max.max(c);
        }

        let overlaps = (r_min..=r_max).any(|r| (c_min..=c_max).any(|c| claimed[r][c]));
        if overlaps {
            debug!("Dropping span {:?}: overlaps a merged cell", span);
            continue;
        }

        for row in claimed.iter_mut().take(r_max + 1).skip(r_min) {
            for flag in row.iter_mut().take(c_max + 1).skip(c_min) {
                *flag = true;
            }
        }

        merged.push(Cell {
            row: r_min + 1,
            col: c_min + 1,
            row_span: r_max - r_min + 1,
            col_span: c_max - c_min + 1,
            bbox: *span,
            contents: None,
        });
    }

    let mut cells: Vec<Cell> = base
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, bbox)| (r, c, *bbox)))
        .filter(|&(r, c, _)| !claimed[r][c])
        .map(|(r, c, bbox)| Cell {
            row: r + 1,
            col: c + 1,
            row_span: 1,
            col_span: 1,
            bbox,
            contents: None,
        })
        .chain(merged)
        .collect();

    cells.sort_by_key(|c| (c.row, c.col));
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::input::ElementRecord;
    use pretty_assertions::assert_eq;

    fn bb(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    fn rows3() -> Vec<BoundingBox> {
        vec![bb(0.0, 0.0, 200.0, 30.0), bb(0.0, 30.0, 200.0, 60.0), bb(0.0, 60.0, 200.0, 90.0)]
    }

    fn cols2() -> Vec<BoundingBox> {
        vec![bb(0.0, 0.0, 100.0, 90.0), bb(100.0, 0.0, 200.0, 90.0)]
    }

    /// Every grid position is covered by exactly one cell.
    fn assert_tiles(cells: &[Cell], n_row: usize, n_col: usize) {
        let mut coverage = vec![vec![0; n_col]; n_row];
        for cell in cells {
            assert!(cell.row >= 1 && cell.col >= 1 && cell.row_span >= 1 && cell.col_span >= 1);
            for r in cell.row..cell.row + cell.row_span {
                for c in cell.col..cell.col + cell.col_span {
                    coverage[r - 1][c - 1] += 1;
                }
            }
        }
        assert!(coverage.iter().flatten().all(|&n| n == 1), "coverage: {:?}", coverage);
    }

    #[test]
    fn test_three_by_two_grid() {
        let cells = reconstruct_cells(&rows3(), &cols2(), &[], 0.75);

        let ids: Vec<(usize, usize)> = cells.iter().map(|c| (c.row, c.col)).collect();
        assert_eq!(ids, vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]);
        assert!(cells.iter().all(|c| c.row_span == 1 && c.col_span == 1));
        assert_eq!(cells[3].bbox, bb(100.0, 30.0, 200.0, 60.0));
        assert_tiles(&cells, 3, 2);
    }

    #[test]
    fn test_span_merges_first_row() {
        let spans = [bb(0.0, 0.0, 200.0, 30.0)];
        let cells = reconstruct_cells(&rows3(), &cols2(), &spans, 0.75);

        assert_eq!(cells.len(), 5);
        assert_eq!(
            cells[0],
            Cell {
                row: 1,
                col: 1,
                row_span: 1,
                col_span: 2,
                bbox: spans[0],
                contents: None,
            }
        );
        assert_tiles(&cells, 3, 2);
    }

    #[test]
    fn test_vertical_span() {
        let spans = [bb(98.0, 28.0, 202.0, 92.0)];
        let cells = reconstruct_cells(&rows3(), &cols2(), &spans, 0.75);

        let merged = cells.iter().find(|c| c.is_spanning()).unwrap();
        assert_eq!((merged.row, merged.col, merged.row_span, merged.col_span), (2, 2, 2, 1));
        assert_eq!(cells.len(), 5);
        assert_tiles(&cells, 3, 2);
    }

    #[test]
    fn test_span_covering_nothing_is_dropped() {
        let spans = [bb(500.0, 500.0, 600.0, 600.0)];
        let cells = reconstruct_cells(&rows3(), &cols2(), &spans, 0.75);
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn test_overlapping_spans_first_wins() {
        let spans = [bb(0.0, 0.0, 200.0, 30.0), bb(0.0, 0.0, 100.0, 60.0)];
        let cells = reconstruct_cells(&rows3(), &cols2(), &spans, 0.75);
        assert_eq!(cells.len(), 5);
        assert_tiles(&cells, 3, 2);
    }

    #[test]
    fn test_unsorted_bands_are_indexed_by_position() {
        let mut rows = rows3();
        rows.reverse();
        let cells = reconstruct_cells(&rows, &cols2(), &[], 0.75);
        assert_eq!(cells[0].bbox, bb(0.0, 0.0, 100.0, 30.0));
    }

    #[test]
    fn test_empty_table() {
        assert!(reconstruct_cells(&[], &cols2(), &[], 0.75).is_empty());
        assert!(reconstruct_cells(&[], &[], &[bb(0.0, 0.0, 1.0, 1.0)], 0.75).is_empty());
    }

    #[test]
    fn test_builder_applies_offset_and_dedupes_bands() {
        let detection = TableDetection::new(bb(100.0, 100.0, 300.0, 190.0))
            .with_offset(100.0, 100.0)
            .with_rows(rows3().into_iter().chain([bb(1.0, 1.0, 199.0, 29.0)]))
            .with_cols(cols2())
            .with_spans([bb(0.0, 0.0, 200.0, 30.0), bb(10.0, 10.0, 5.0, 20.0)]);

        let table = TableGridBuilder::new(TableConfig::default()).build(&detection);

        assert_eq!((table.n_row, table.n_col), (3, 2));
        assert_eq!(table.cells.len(), 5);
        assert_eq!(table.cells[0].bbox, bb(100.0, 100.0, 300.0, 130.0));
        assert_tiles(&table.cells, table.n_row, table.n_col);
    }

    #[test]
    fn test_builder_prefers_confident_span() {
        let mut detection = TableDetection::new(bb(0.0, 0.0, 200.0, 90.0))
            .with_rows(rows3())
            .with_cols(cols2());
        // The weak row-wide span comes first but loses to the column span
        detection.spans = vec![
            ElementRecord::new(bb(0.0, 0.0, 200.0, 30.0), 0.4),
            ElementRecord::new(bb(0.0, 0.0, 100.0, 60.0), 0.9),
        ];

        let table = TableGridBuilder::new(TableConfig::default()).build(&detection);

        let merged: Vec<&Cell> = table.cells.iter().filter(|c| c.is_spanning()).collect();
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].row, merged[0].col, merged[0].row_span, merged[0].col_span), (1, 1, 2, 1));
        assert_eq!(merged[0].bbox, bb(0.0, 0.0, 100.0, 60.0));
        assert_eq!(table.cells.len(), 5);
        assert_tiles(&table.cells, table.n_row, table.n_col);
    }
}
