use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::path::{self, Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }

    pub fn compare(&self, another: &Point) -> Ordering {
        match path::compare(&self.path, &another.path) {
            Ordering::Equal => self.offset.cmp(&another.offset),
            other => other,
        }
    }

    pub fn is_before(&self, another: &Point) -> bool {
        self.compare(another) == Ordering::Less
    }

    pub fn is_after(&self, another: &Point) -> bool {
        self.compare(another) == Ordering::Greater
    }
}

/// An anchor/focus pair. The anchor may come after the focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self) -> bool {
        self.anchor.is_after(&self.focus)
    }

    /// `(start, end)` in document order.
    pub fn edges(&self) -> (Point, Point) {
        if self.is_backward() {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }

    pub fn start(&self) -> Point {
        self.edges().0
    }

    pub fn end(&self) -> Point {
        self.edges().1
    }

    pub fn includes_point(&self, point: &Point) -> bool {
        let (start, end) = self.edges();
        start.compare(point) != Ordering::Greater && point.compare(&end) != Ordering::Greater
    }

    pub fn includes_path(&self, target: &[usize]) -> bool {
        let (start, end) = self.edges();
        path::compare(target, &start.path) != Ordering::Less
            && path::compare(target, &end.path) != Ordering::Greater
    }

    pub fn intersection(&self, another: &Range) -> Option<Range> {
        let (s1, e1) = self.edges();
        let (s2, e2) = another.edges();
        let start = if s1.is_before(&s2) { s2 } else { s1 };
        let end = if e1.is_before(&e2) { e1 } else { e2 };
        if end.is_before(&start) {
            None
        } else {
            Some(Range::new(start, end))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(Path),
    Point(Point),
    Range(Range),
    /// Explicit `from`/`to` bounds for a traversal.
    Span(Path, Path),
}

impl From<Path> for Location {
    fn from(value: Path) -> Self {
        Location::Path(value)
    }
}

impl From<&[usize]> for Location {
    fn from(value: &[usize]) -> Self {
        Location::Path(value.to_vec())
    }
}

impl From<Point> for Location {
    fn from(value: Point) -> Self {
        Location::Point(value)
    }
}

impl From<Range> for Location {
    fn from(value: Range) -> Self {
        Location::Range(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    #[default]
    Start,
    End,
}

/// Which side a point or path sticks to when content is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    #[default]
    Forward,
    Backward,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_range_edges_are_ordered() {
        let range = Range::new(Point::new(vec![1, 0], 2), Point::new(vec![0, 0], 1));
        assert!(range.is_backward());
        let (start, end) = range.edges();
        assert_eq!(start.path, vec![0, 0]);
        assert_eq!(end.path, vec![1, 0]);
    }

    #[test]
    fn intersection_of_disjoint_ranges_is_none() {
        let a = Range::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 2));
        let b = Range::new(Point::new(vec![1, 0], 0), Point::new(vec![1, 0], 2));
        assert!(a.intersection(&b).is_none());
        let c = Range::new(Point::new(vec![0, 0], 1), Point::new(vec![1, 0], 1));
        let hit = a.intersection(&c).unwrap();
        assert_eq!(hit.anchor.offset, 1);
        assert_eq!(hit.focus.offset, 2);
    }
}
