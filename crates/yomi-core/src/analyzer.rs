//! Page analysis orchestrating filtering, tables, aggregation and reading order.

use std::time::Instant;

use tracing::{debug, info};

use crate::geometry::BoundingBox;
use crate::layout::{Aggregator, LayoutFilter, Policy, TableGridBuilder, reading_order};
use crate::models::config::{PolicySelection, YomiConfig};
use crate::models::document::{Document, Figure, Table};
use crate::models::input::PageDetections;

/// Turns the raw detections of a page into a structured [`Document`].
pub struct DocumentAnalyzer {
    filter: LayoutFilter,
    tables: TableGridBuilder,
    aggregator: Aggregator,
    config: YomiConfig,
}

/// Builder for DocumentAnalyzer.
pub struct DocumentAnalyzerBuilder {
    config: YomiConfig,
}

impl DocumentAnalyzerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: YomiConfig::default(),
        }
    }

    /// Set configuration.
    pub fn with_config(mut self, config: YomiConfig) -> Self {
        self.config = config;
        self
    }

    /// Force a reading-order policy instead of detecting it per page.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.config.reading_order.policy = match policy {
            Policy::Horizontal => PolicySelection::Horizontal,
            Policy::Vertical => PolicySelection::Vertical,
        };
        self
    }

    /// Build the analyzer.
    pub fn build(self) -> DocumentAnalyzer {
        DocumentAnalyzer {
            filter: LayoutFilter::new(self.config.layout.clone()),
            tables: TableGridBuilder::new(self.config.table.clone()),
            aggregator: Aggregator::new(self.config.aggregation.clone()),
            config: self.config,
        }
    }
}

impl Default for DocumentAnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAnalyzer {
    /// Create a new builder.
    pub fn builder() -> DocumentAnalyzerBuilder {
        DocumentAnalyzerBuilder::new()
    }

    pub fn config(&self) -> &YomiConfig {
        &self.config
    }

    /// Analyze one page.
    pub fn analyze(&self, page: &PageDetections) -> Document {
        let start = Instant::now();
        info!(
            "Analyzing page: {} words, {} paragraphs, {} tables, {} figures",
            page.words.len(),
            page.paragraphs.len(),
            page.tables.len(),
            page.figures.len()
        );

        // Step 1: Clean up layout detections
        let layout = self.filter.filter(page);

        // Step 2: Rebuild table grids
        let mut tables: Vec<Table> = layout.tables.iter().map(|t| self.tables.build(t)).collect();

        // Step 3: Distribute words over cells and paragraphs
        let aggregation = self.aggregator.aggregate(&page.words, &layout.paragraphs, &mut tables);
        let mut paragraphs = aggregation.paragraphs;

        let mut figures: Vec<Figure> = layout
            .figures
            .iter()
            .map(|f| Figure {
                bbox: f.bbox,
                score: f.score,
                order: 0,
            })
            .collect();

        // Step 4: Reading order over every block on the page
        let policy = match self.config.reading_order.policy {
            PolicySelection::Auto => Policy::select(&paragraphs),
            PolicySelection::Horizontal => Policy::Horizontal,
            PolicySelection::Vertical => Policy::Vertical,
        };
        debug!("Reading order policy: {:?}", policy);

        let boxes: Vec<BoundingBox> = paragraphs
            .iter()
            .map(|p| p.bbox)
            .chain(tables.iter().map(|t| t.bbox))
            .chain(figures.iter().map(|f| f.bbox))
            .collect();
        let order = reading_order(&boxes, policy, self.config.reading_order.distance_weight);

        let (n_para, n_table) = (paragraphs.len(), tables.len());
        for (rank, &block) in order.iter().enumerate() {
            if block < n_para {
                paragraphs[block].order = rank;
            } else if block < n_para + n_table {
                tables[block - n_para].order = rank;
            } else {
                figures[block - n_para - n_table].order = rank;
            }
        }
        paragraphs.sort_by_key(|p| p.order);

        info!(
            "Analyzed page in {:?}: {} paragraphs, {} tables, {} figures",
            start.elapsed(),
            paragraphs.len(),
            tables.len(),
            figures.len()
        );

        Document {
            policy,
            paragraphs,
            tables,
            figures,
            words: page.words.clone(),
        }
    }
}
