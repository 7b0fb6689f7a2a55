//! Configuration structures for the analysis pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, YomiError};

/// Main configuration for the yomi pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YomiConfig {
    /// Layout element filtering.
    pub layout: LayoutConfig,

    /// Word-to-region aggregation.
    pub aggregation: AggregationConfig,

    /// Table grid reconstruction.
    pub table: TableConfig,

    /// Reading order.
    pub reading_order: ReadingOrderConfig,
}

/// Layout element filtering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Elements scoring below this are discarded (0.0 keeps everything).
    pub score_threshold: f32,

    /// Drop boxes nested inside another box of the same category.
    pub suppress_nested: bool,

    /// Drop paragraph boxes that lie inside a table.
    pub drop_paragraphs_in_tables: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.0,
            suppress_nested: true,
            drop_paragraphs_in_tables: true,
        }
    }
}

/// Word aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Containment threshold for words inside paragraphs.
    pub paragraph_threshold: f32,

    /// Containment threshold for words inside table cells (cells are tighter).
    pub cell_threshold: f32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            paragraph_threshold: 0.75,
            cell_threshold: 0.6,
        }
    }
}

/// Table grid reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Containment threshold for base cells inside a span box.
    pub span_threshold: f32,

    /// Collapse near-duplicate row/column detections before indexing.
    pub suppress_nested_bands: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            span_threshold: 0.75,
            suppress_nested_bands: true,
        }
    }
}

/// Which reading-order policy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicySelection {
    /// Pick per page from the paragraph area by direction.
    #[default]
    Auto,
    /// Always read top-to-bottom, left-to-right.
    Horizontal,
    /// Always read right-to-left columns, top-to-bottom.
    Vertical,
}

/// Reading order configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingOrderConfig {
    pub policy: PolicySelection,

    /// Weight of the primary axis in the tie-break distance.
    pub distance_weight: f32,
}

impl Default for ReadingOrderConfig {
    fn default() -> Self {
        Self {
            policy: PolicySelection::Auto,
            distance_weight: 5.0,
        }
    }
}

impl YomiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject thresholds outside `[0, 1]` and non-positive weights.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("layout.score_threshold", self.layout.score_threshold),
            ("aggregation.paragraph_threshold", self.aggregation.paragraph_threshold),
            ("aggregation.cell_threshold", self.aggregation.cell_threshold),
            ("table.span_threshold", self.table.span_threshold),
        ];

        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(YomiError::Config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }

        if !(self.reading_order.distance_weight > 0.0) {
            return Err(YomiError::Config(format!(
                "reading_order.distance_weight must be positive, got {}",
                self.reading_order.distance_weight
            )));
        }

        Ok(())
    }
}
