//! Assignment of recognized words to paragraphs and table cells.
//!
//! Regions claim words in a fixed sequence: table cells first, then
//! paragraphs, then every leftover word becomes a paragraph of its own. A
//! claimed word is never reconsidered, so the sequence decides ownership.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::geometry::{BoundingBox, contains};
use crate::models::config::AggregationConfig;
use crate::models::document::{Direction, Element, Paragraph, Table, Word};

/// The region that claimed a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Cell `cell` of table `table` (indices into the aggregated slices).
    Cell { table: usize, cell: usize },
    /// Layout paragraph `index` of the input paragraph list.
    Paragraph(usize),
    /// Word promoted to its own paragraph.
    Standalone,
}

/// Which region owns each word.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    owners: Vec<Option<Owner>>,
}

impl ClaimSet {
    /// All `n` words start unclaimed.
    pub fn new(n: usize) -> Self {
        Self { owners: vec![None; n] }
    }

    pub fn is_claimed(&self, word: usize) -> bool {
        self.owners[word].is_some()
    }

    pub fn owner(&self, word: usize) -> Option<Owner> {
        self.owners[word]
    }

    /// Claim `word` for `owner`; returns false if it was already taken.
    pub fn claim(&mut self, word: usize, owner: Owner) -> bool {
        if self.owners[word].is_some() {
            return false;
        }
        self.owners[word] = Some(owner);
        true
    }

    /// Indices of words nobody claimed yet, ascending.
    pub fn unclaimed(&self) -> Vec<usize> {
        (0..self.owners.len()).filter(|&i| self.owners[i].is_none()).collect()
    }

    /// Words owned by `owner`, ascending.
    pub fn words_of(&self, owner: Owner) -> Vec<usize> {
        (0..self.owners.len()).filter(|&i| self.owners[i] == Some(owner)).collect()
    }
}

/// Text collected for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionText {
    /// Claimed words in reading order.
    pub words: Vec<usize>,
    pub direction: Direction,
    /// Word contents joined by newlines.
    pub contents: String,
}

/// Claim the unclaimed words inside `region` and order them.
///
/// Returns `None` when the region captured no word.
pub fn collect_region(
    region: &BoundingBox,
    words: &[Word],
    threshold: f32,
    owner: Owner,
    claims: &mut ClaimSet,
) -> Option<RegionText> {
    let mut selected: Vec<usize> = Vec::new();
    for (i, word) in words.iter().enumerate() {
        if claims.is_claimed(i) {
            continue;
        }
        if contains(region, &word.bounding_box(), threshold) && claims.claim(i, owner) {
            selected.push(i);
        }
    }

    if selected.is_empty() {
        return None;
    }

    let direction = Direction::majority(selected.iter().map(|&i| words[i].direction));
    sort_words(words, &mut selected, direction);

    let contents = selected
        .iter()
        .map(|&i| words[i].content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    trace!("Region {:?} captured {} words ({:?})", region, selected.len(), direction);

    Some(RegionText {
        words: selected,
        direction,
        contents,
    })
}

/// Sort word indices into reading order for a region of the given direction.
///
/// Horizontal text is grouped into lines by quantizing the top-left `y` with
/// the mean word height, then ordered left to right. Vertical text is grouped
/// into columns by quantizing the top-right `x` with the mean word width,
/// columns right to left, then top to bottom within a column.
pub fn sort_words(words: &[Word], indices: &mut [usize], direction: Direction) {
    if indices.is_empty() {
        return;
    }

    let n = indices.len() as f32;
    let (sum_w, sum_h) = indices.iter().fold((0.0f32, 0.0f32), |(w, h), &i| {
        let b = words[i].bounding_box();
        (w + b.width(), h + b.height())
    });
    let bucket_w = (sum_w / n).trunc().max(1.0);
    let bucket_h = (sum_h / n).trunc().max(1.0);

    match direction {
        Direction::Horizontal => indices.sort_by(|&a, &b| {
            let [ax, ay] = words[a].points.top_left();
            let [bx, by] = words[b].points.top_left();
            (ay / bucket_h)
                .floor()
                .total_cmp(&(by / bucket_h).floor())
                .then(ax.total_cmp(&bx))
        }),
        Direction::Vertical => indices.sort_by(|&a, &b| {
            let [ax, ay] = words[a].points.top_right();
            let [bx, by] = words[b].points.top_right();
            let column: Ordering = (bx / bucket_w).floor().total_cmp(&(ax / bucket_w).floor());
            column.then(ay.total_cmp(&by))
        }),
    }
}

/// Result of aggregating one page.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Layout paragraphs that captured text, followed by standalone words.
    pub paragraphs: Vec<Paragraph>,
    pub claims: ClaimSet,
}

/// Assigns words to table cells and paragraphs.
pub struct Aggregator {
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Fill cell contents in `tables` and build the page's paragraphs.
    pub fn aggregate(&self, words: &[Word], paragraphs: &[Element], tables: &mut [Table]) -> Aggregation {
        let mut claims = ClaimSet::new(words.len());

        for (t, table) in tables.iter_mut().enumerate() {
            for (c, cell) in table.cells.iter_mut().enumerate() {
                let owner = Owner::Cell { table: t, cell: c };
                let text = collect_region(&cell.bbox, words, self.config.cell_threshold, owner, &mut claims);
                cell.contents = Some(text.map(|r| r.contents).unwrap_or_default());
            }
        }

        let mut out = Vec::new();
        for (p, element) in paragraphs.iter().enumerate() {
            let owner = Owner::Paragraph(p);
            match collect_region(&element.bbox, words, self.config.paragraph_threshold, owner, &mut claims) {
                Some(text) => out.push(Paragraph {
                    bbox: element.bbox,
                    contents: Some(text.contents),
                    direction: text.direction,
                    order: 0,
                }),
                None => debug!("Dropping empty paragraph {:?}", element.bbox),
            }
        }

        let leftovers = claims.unclaimed();
        if !leftovers.is_empty() {
            debug!("{} words outside any region become paragraphs", leftovers.len());
        }
        for i in leftovers {
            claims.claim(i, Owner::Standalone);
            let word = &words[i];
            out.push(Paragraph {
                bbox: word.bounding_box(),
                contents: Some(word.content.clone()),
                direction: word.direction,
                order: 0,
            });
        }

        Aggregation { paragraphs: out, claims }
    }
}
