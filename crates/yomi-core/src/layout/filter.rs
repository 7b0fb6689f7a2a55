//! Post-processing of raw layout detections.
//!
//! Detectors emit overlapping and nested boxes for the same region. Before
//! any structure is built, low-score boxes are discarded, near-duplicates of
//! one category are collapsed and paragraphs detected inside tables are
//! dropped (their words belong to table cells).

use tracing::debug;

use crate::geometry::{BoundingBox, DEFAULT_CONTAINMENT_THRESHOLD, contains};
use crate::models::config::LayoutConfig;
use crate::models::document::Element;
use crate::models::input::{PageDetections, TableDetection};

use super::union_find::UnionFind;

/// Cluster boxes by containment: `i` and `j` share a set if either contains
/// the other.
pub fn element_hierarchy(boxes: &[BoundingBox]) -> UnionFind {
    let mut uf = UnionFind::new(boxes.len());

    for (i, a) in boxes.iter().enumerate() {
        for (j, b) in boxes.iter().enumerate() {
            if i != j && contains(a, b, DEFAULT_CONTAINMENT_THRESHOLD) {
                uf.union(i, j);
            }
        }
    }

    uf
}

/// Indices of the elements that survive nested-duplicate suppression, ascending.
///
/// Boxes that mutually contain each other are clustered and only the largest
/// (then highest score, then earliest) is kept. A survivor lying inside another
/// survivor is dropped as well. Elements with invalid boxes never survive.
pub fn nested_survivors(elements: &[Element]) -> Vec<usize> {
    let valid: Vec<usize> = (0..elements.len()).filter(|&i| elements[i].bbox.is_valid()).collect();
    let mut uf = UnionFind::new(elements.len());

    for (a, &i) in valid.iter().enumerate() {
        for &j in &valid[a + 1..] {
            let (bi, bj) = (&elements[i].bbox, &elements[j].bbox);
            if contains(bi, bj, DEFAULT_CONTAINMENT_THRESHOLD) && contains(bj, bi, DEFAULT_CONTAINMENT_THRESHOLD) {
                uf.union(i, j);
            }
        }
    }

    let mut representatives: Vec<usize> = Vec::new();
    for group in uf.groups() {
        let best = group
            .into_iter()
            .filter(|&i| elements[i].bbox.is_valid())
            .reduce(|best, i| {
                let (b, c) = (&elements[best], &elements[i]);
                let larger = c.bbox.area() > b.bbox.area()
                    || (c.bbox.area() == b.bbox.area() && c.score > b.score);
                if larger { i } else { best }
            });
        representatives.extend(best);
    }

    let survivors: Vec<usize> = representatives
        .iter()
        .copied()
        .filter(|&i| {
            !representatives.iter().any(|&j| {
                j != i && contains(&elements[j].bbox, &elements[i].bbox, DEFAULT_CONTAINMENT_THRESHOLD)
            })
        })
        .collect();

    if survivors.len() < elements.len() {
        debug!("Suppressed {} nested elements", elements.len() - survivors.len());
    }

    survivors
}

/// Layout detections after filtering.
#[derive(Debug, Clone, Default)]
pub struct FilteredLayout {
    pub paragraphs: Vec<Element>,
    pub tables: Vec<TableDetection>,
    pub figures: Vec<Element>,
}

/// Filters the raw layout detections of a page.
pub struct LayoutFilter {
    config: LayoutConfig,
}

impl LayoutFilter {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Apply score filtering, nested suppression and table masking.
    pub fn filter(&self, page: &PageDetections) -> FilteredLayout {
        let paragraphs = self.filter_category(page.paragraph_elements());
        let figures = self.filter_category(page.figure_elements());

        let table_elements = self.filter_category_indices(&page.table_elements());
        let tables: Vec<TableDetection> = table_elements.into_iter().map(|i| page.tables[i].clone()).collect();

        let paragraphs = if self.config.drop_paragraphs_in_tables {
            let before = paragraphs.len();
            let kept: Vec<Element> = paragraphs
                .into_iter()
                .filter(|p| !tables.iter().any(|t| contains(&t.bbox, &p.bbox, DEFAULT_CONTAINMENT_THRESHOLD)))
                .collect();
            if kept.len() < before {
                debug!("Dropped {} paragraphs inside tables", before - kept.len());
            }
            kept
        } else {
            paragraphs
        };

        FilteredLayout {
            paragraphs,
            tables,
            figures,
        }
    }

    fn filter_category(&self, elements: Vec<Element>) -> Vec<Element> {
        self.filter_category_indices(&elements)
            .into_iter()
            .map(|i| elements[i])
            .collect()
    }

    fn filter_category_indices(&self, elements: &[Element]) -> Vec<usize> {
        let scored: Vec<usize> = (0..elements.len())
            .filter(|&i| elements[i].score >= self.config.score_threshold && elements[i].bbox.is_valid())
            .collect();

        if !self.config.suppress_nested {
            return scored;
        }

        let subset: Vec<Element> = scored.iter().map(|&i| elements[i]).collect();
        nested_survivors(&subset).into_iter().map(|k| scored[k]).collect()
    }
}
