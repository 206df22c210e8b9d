//! Positions that survive structural edits. A ref is tracked by the editor
//! for as long as its handle is alive; dropping it (or calling `unref`)
//! stops the tracking.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::location::{Affinity, Point};
use crate::ops::{Op, transform_path, transform_point};
use crate::path::Path;

#[derive(Debug)]
struct RefState<T> {
    current: Option<T>,
    affinity: Affinity,
}

#[derive(Debug)]
pub struct PathRef(Rc<RefCell<RefState<Path>>>);

impl PathRef {
    /// `None` once the referenced node has been removed.
    pub fn current(&self) -> Option<Path> {
        self.0.borrow().current.clone()
    }

    pub fn unref(self) -> Option<Path> {
        self.current()
    }
}

#[derive(Debug)]
pub struct PointRef(Rc<RefCell<RefState<Point>>>);

impl PointRef {
    pub fn current(&self) -> Option<Point> {
        self.0.borrow().current.clone()
    }

    pub fn unref(self) -> Option<Point> {
        self.current()
    }
}

#[derive(Debug, Default)]
pub(crate) struct RefRegistry {
    paths: Vec<Weak<RefCell<RefState<Path>>>>,
    points: Vec<Weak<RefCell<RefState<Point>>>>,
}

impl RefRegistry {
    pub(crate) fn path_ref(&mut self, path: Path, affinity: Affinity) -> PathRef {
        let state = Rc::new(RefCell::new(RefState {
            current: Some(path),
            affinity,
        }));
        self.paths.push(Rc::downgrade(&state));
        PathRef(state)
    }

    pub(crate) fn point_ref(&mut self, point: Point, affinity: Affinity) -> PointRef {
        let state = Rc::new(RefCell::new(RefState {
            current: Some(point),
            affinity,
        }));
        self.points.push(Rc::downgrade(&state));
        PointRef(state)
    }

    pub(crate) fn transform(&mut self, op: &Op) {
        self.paths.retain(|weak| {
            let Some(state) = weak.upgrade() else {
                return false;
            };
            let mut state = state.borrow_mut();
            let affinity = state.affinity;
            if let Some(path) = state.current.take() {
                state.current = transform_path(&path, op, affinity);
            }
            true
        });
        self.points.retain(|weak| {
            let Some(state) = weak.upgrade() else {
                return false;
            };
            let mut state = state.borrow_mut();
            let affinity = state.affinity;
            if let Some(point) = state.current.take() {
                state.current = transform_point(&point, op, affinity);
            }
            true
        });
    }

    pub(crate) fn live(&self) -> usize {
        self.paths.iter().filter(|w| w.strong_count() > 0).count()
            + self.points.iter().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_refs_are_released() {
        let mut registry = RefRegistry::default();
        let kept = registry.path_ref(vec![1], Affinity::Forward);
        {
            let _scoped = registry.point_ref(Point::new(vec![0, 0], 0), Affinity::Forward);
            assert_eq!(registry.live(), 2);
        }
        assert_eq!(registry.live(), 1);

        registry.transform(&Op::RemoveNode { path: vec![0] });
        assert_eq!(kept.current(), Some(vec![0]));
        assert_eq!(registry.points.len(), 0);

        registry.transform(&Op::RemoveNode { path: vec![0] });
        assert_eq!(kept.unref(), None);
        assert_eq!(registry.live(), 0);
    }
}
