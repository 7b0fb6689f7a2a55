//! Geometry primitives and the predicates every layout stage is built on.
//!
//! All predicates are pure and total: a degenerate box (zero or negative
//! width/height) never raises, it simply relates to nothing.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Default intersection-over-candidate ratio for [`contains`].
pub const DEFAULT_CONTAINMENT_THRESHOLD: f32 = 0.75;

/// Axis-aligned rectangle `(x1, y1, x2, y2)` in page pixels.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Get the width of the box.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Get the height of the box.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Area, or zero for a degenerate box.
    pub fn area(&self) -> f32 {
        if self.is_valid() {
            self.width() * self.height()
        } else {
            0.0
        }
    }

    /// A box is valid when it has positive, finite extent on both axes.
    pub fn is_valid(&self) -> bool {
        self.x1.is_finite()
            && self.y1.is_finite()
            && self.x2.is_finite()
            && self.y2.is_finite()
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    /// Shift the box by `(dx, dy)`.
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(b: [f32; 4]) -> Self {
        Self::new(b[0], b[1], b[2], b[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Four-point polygon of a detected word, clockwise from the top-left corner.
///
/// Deserializing anything other than exactly four points fails with
/// [`InputError::InvalidQuad`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f32; 2]>", into = "Vec<[f32; 2]>")]
pub struct Quad(pub [[f32; 2]; 4]);

impl Quad {
    pub fn top_left(&self) -> [f32; 2] {
        self.0[0]
    }

    pub fn top_right(&self) -> [f32; 2] {
        self.0[1]
    }

    /// Length of the top edge.
    pub fn width(&self) -> f32 {
        edge_length(self.0[0], self.0[1])
    }

    /// Length of the left edge.
    pub fn height(&self) -> f32 {
        edge_length(self.0[0], self.0[3])
    }

    /// Axis-aligned bounds of the polygon.
    pub fn bounding_box(&self) -> BoundingBox {
        quad_to_box(self)
    }
}

fn edge_length(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dx * dx + dy * dy).sqrt()
}

impl TryFrom<Vec<[f32; 2]>> for Quad {
    type Error = InputError;

    fn try_from(points: Vec<[f32; 2]>) -> Result<Self, Self::Error> {
        let points: [[f32; 2]; 4] = points
            .try_into()
            .map_err(|p: Vec<[f32; 2]>| InputError::InvalidQuad { points: p.len() })?;

        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(InputError::NonFinite { context: "word quad" });
        }

        Ok(Quad(points))
    }
}

impl From<Quad> for Vec<[f32; 2]> {
    fn from(q: Quad) -> Self {
        q.0.to_vec()
    }
}

/// Axis-aligned bounds of a quad: min/max over its four vertices.
pub fn quad_to_box(quad: &Quad) -> BoundingBox {
    let mut b = BoundingBox::new(f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for [x, y] in quad.0 {
        b.x1 = b.x1.min(x);
        b.y1 = b.y1.min(y);
        b.x2 = b.x2.max(x);
        b.y2 = b.y2.max(y);
    }
    b
}

/// Rectangle intersection, `None` when the overlap has no area.
pub fn intersection(a: &BoundingBox, b: &BoundingBox) -> Option<BoundingBox> {
    let inter = BoundingBox::new(a.x1.max(b.x1), a.y1.max(b.y1), a.x2.min(b.x2), a.y2.min(b.y2));
    inter.is_valid().then_some(inter)
}

/// True if `b` lies inside `a`, either exactly or with more than `threshold`
/// of `b`'s area covered by `a`.
///
/// Asymmetric: this asks "is b inside a", never the reverse.
pub fn contains(a: &BoundingBox, b: &BoundingBox, threshold: f32) -> bool {
    if !a.is_valid() || !b.is_valid() {
        return false;
    }

    if a.x1 <= b.x1 && a.y1 <= b.y1 && a.x2 >= b.x2 && a.y2 >= b.y2 {
        return true;
    }

    match intersection(a, b) {
        Some(inter) => inter.area() / b.area() > threshold,
        None => false,
    }
}

/// True if the Y projections of the boxes overlap, i.e. the boxes could sit
/// side by side on one line.
pub fn intersects_horizontal(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.is_valid() && b.is_valid() && a.y1.max(b.y1) < a.y2.min(b.y2)
}

/// True if the X projections of the boxes overlap, i.e. one could sit above
/// the other in a column.
pub fn intersects_vertical(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.is_valid() && b.is_valid() && a.x1.max(b.x1) < a.x2.min(b.x2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2, y2)
    }

    #[test]
    fn test_contains_exact() {
        let outer = bb(0.0, 0.0, 100.0, 100.0);
        assert!(contains(&outer, &bb(10.0, 10.0, 20.0, 20.0), 0.75));
        assert!(contains(&outer, &outer, 0.75));
        assert!(!contains(&bb(10.0, 10.0, 20.0, 20.0), &outer, 0.75));
    }

    #[test]
    fn test_contains_with_jitter() {
        let region = bb(0.0, 0.0, 100.0, 20.0);
        // 90% of the word lies inside the region
        let word = bb(90.0, 0.0, 101.0, 10.0);
        let ratio_word = bb(50.0, 0.0, 60.0, 10.0);
        assert!(contains(&region, &ratio_word, 0.75));
        assert!(contains(&region, &word, 0.75));

        // Only half of this one does
        let half = bb(95.0, 0.0, 105.0, 10.0);
        assert!(!contains(&region, &half, 0.75));
        assert!(contains(&region, &half, 0.4));
    }

    #[test]
    fn test_contains_threshold_monotonic() {
        let a = bb(0.0, 0.0, 10.0, 10.0);
        let b = bb(3.0, 3.0, 13.0, 13.0); // 49% covered
        for (t1, t2) in [(0.45, 0.3), (0.48, 0.0), (0.2, 0.1)] {
            assert!(contains(&a, &b, t1));
            assert!(contains(&a, &b, t2));
        }
        assert!(!contains(&a, &b, 0.5));
    }

    #[test]
    fn test_contains_degenerate() {
        let a = bb(0.0, 0.0, 10.0, 10.0);
        assert!(!contains(&a, &bb(5.0, 5.0, 5.0, 8.0), 0.75));
        assert!(!contains(&bb(10.0, 0.0, 0.0, 10.0), &bb(1.0, 1.0, 2.0, 2.0), 0.75));
    }

    #[test]
    fn test_intersection() {
        let a = bb(0.0, 0.0, 10.0, 10.0);
        assert_eq!(intersection(&a, &bb(5.0, 5.0, 15.0, 15.0)), Some(bb(5.0, 5.0, 10.0, 10.0)));
        // Touching edges have no area
        assert_eq!(intersection(&a, &bb(10.0, 0.0, 20.0, 10.0)), None);
        assert_eq!(intersection(&a, &bb(20.0, 20.0, 30.0, 30.0)), None);
    }

    #[test]
    fn test_projection_overlap() {
        let left = bb(0.0, 0.0, 10.0, 10.0);
        let right = bb(20.0, 5.0, 30.0, 15.0);
        let below = bb(5.0, 20.0, 15.0, 30.0);

        assert!(intersects_horizontal(&left, &right));
        assert!(!intersects_vertical(&left, &right));
        assert!(intersects_vertical(&left, &below));
        assert!(!intersects_horizontal(&left, &below));
    }

    #[test]
    fn test_quad_to_box_rotated() {
        let quad = Quad([[10.0, 0.0], [20.0, 10.0], [10.0, 20.0], [0.0, 10.0]]);
        assert_eq!(quad_to_box(&quad), bb(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_quad_rejects_wrong_point_count() {
        let err = serde_json::from_str::<Quad>("[[0,0],[1,0],[1,1]]").unwrap_err();
        assert!(err.to_string().contains("4 points"));

        let quad: Quad = serde_json::from_str("[[0,0],[4,0],[4,2],[0,2]]").unwrap();
        assert_eq!(quad.width(), 4.0);
        assert_eq!(quad.height(), 2.0);
    }

    #[test]
    fn test_quad_rejects_overflowing_coordinate() {
        // 1e39 does not fit in an f32 and parses to infinity
        let err = serde_json::from_str::<Quad>("[[0,0],[1e39,0],[1,1],[0,1]]").unwrap_err();
        assert!(err.to_string().contains("non-finite coordinate in word quad"));
    }

    #[test]
    fn test_box_serde_as_array() {
        let b: BoundingBox = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        assert_eq!(b, bb(1.0, 2.0, 3.0, 4.0));
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1.0,2.0,3.0,4.0]");
    }
}
