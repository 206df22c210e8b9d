//! Path algebra. A path descends through `children` indices from the root;
//! the empty path is the root itself.

use std::cmp::Ordering;

pub type Path = Vec<usize>;

/// Compares document order. A path and its ancestors compare equal.
pub fn compare(path: &[usize], another: &[usize]) -> Ordering {
    let min = path.len().min(another.len());
    for i in 0..min {
        match path[i].cmp(&another[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

pub fn is_before(path: &[usize], another: &[usize]) -> bool {
    compare(path, another) == Ordering::Less
}

pub fn is_after(path: &[usize], another: &[usize]) -> bool {
    compare(path, another) == Ordering::Greater
}

pub fn is_ancestor(path: &[usize], another: &[usize]) -> bool {
    path.len() < another.len() && compare(path, another) == Ordering::Equal
}

pub fn is_descendant(path: &[usize], another: &[usize]) -> bool {
    is_ancestor(another, path)
}

/// True when `path` equals `another` or is one of its ancestors.
pub fn is_common(path: &[usize], another: &[usize]) -> bool {
    path.len() <= another.len() && compare(path, another) == Ordering::Equal
}

pub fn is_child(path: &[usize], another: &[usize]) -> bool {
    path.len() == another.len() + 1 && compare(path, another) == Ordering::Equal
}

pub fn is_parent(path: &[usize], another: &[usize]) -> bool {
    is_child(another, path)
}

pub fn is_sibling(path: &[usize], another: &[usize]) -> bool {
    if path.is_empty() || path.len() != another.len() {
        return false;
    }
    let n = path.len() - 1;
    path[..n] == another[..n] && path[n] != another[n]
}

/// True when `path` ends before `another` at the same depth under a shared parent.
pub fn ends_before(path: &[usize], another: &[usize]) -> bool {
    let Some(i) = path.len().checked_sub(1) else {
        return false;
    };
    if another.len() <= i {
        return false;
    }
    path[..i] == another[..i] && path[i] < another[i]
}

pub fn ends_after(path: &[usize], another: &[usize]) -> bool {
    let Some(i) = path.len().checked_sub(1) else {
        return false;
    };
    if another.len() <= i {
        return false;
    }
    path[..i] == another[..i] && path[i] > another[i]
}

pub fn common(path: &[usize], another: &[usize]) -> Path {
    path.iter()
        .zip(another)
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| *a)
        .collect()
}

pub fn parent(path: &[usize]) -> Option<Path> {
    path.split_last().map(|(_, parent)| parent.to_vec())
}

pub fn next(path: &[usize]) -> Option<Path> {
    let (last, parent) = path.split_last()?;
    let mut next = parent.to_vec();
    next.push(last + 1);
    Some(next)
}

pub fn previous(path: &[usize]) -> Option<Path> {
    let (last, parent) = path.split_last()?;
    let ix = last.checked_sub(1)?;
    let mut prev = parent.to_vec();
    prev.push(ix);
    Some(prev)
}

pub fn has_previous(path: &[usize]) -> bool {
    path.last().is_some_and(|ix| *ix > 0)
}

pub fn child(path: &[usize], ix: usize) -> Path {
    let mut child = path.to_vec();
    child.push(ix);
    child
}

/// Ancestor paths from the root's children down to the parent of `path`.
pub fn ancestors(path: &[usize]) -> Vec<Path> {
    (1..path.len()).map(|len| path[..len].to_vec()).collect()
}

/// `path` relative to `ancestor`, when `ancestor` is common to it.
pub fn relative(path: &[usize], ancestor: &[usize]) -> Option<Path> {
    if !is_common(ancestor, path) {
        return None;
    }
    Some(path[ancestor.len()..].to_vec())
}

pub fn last_index(path: &[usize]) -> Option<usize> {
    path.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_treats_ancestors_as_equal() {
        assert_eq!(compare(&[0, 1], &[0, 1, 2]), Ordering::Equal);
        assert_eq!(compare(&[0, 1], &[0, 2]), Ordering::Less);
        assert_eq!(compare(&[1], &[0, 5, 5]), Ordering::Greater);
    }

    #[test]
    fn ancestry_predicates() {
        assert!(is_ancestor(&[0], &[0, 1]));
        assert!(!is_ancestor(&[0, 1], &[0, 1]));
        assert!(is_common(&[0, 1], &[0, 1]));
        assert!(is_child(&[0, 1], &[0]));
        assert!(is_sibling(&[0, 1], &[0, 3]));
        assert!(!is_sibling(&[0, 1], &[1, 1]));
    }

    #[test]
    fn ends_before_requires_shared_parent() {
        assert!(ends_before(&[0, 1], &[0, 2, 5]));
        assert!(!ends_before(&[0, 1], &[1, 2]));
        assert!(!ends_before(&[0, 1], &[0]));
    }

    #[test]
    fn next_previous_and_common() {
        assert_eq!(next(&[2, 3]), Some(vec![2, 4]));
        assert_eq!(previous(&[2, 0]), None);
        assert_eq!(previous(&[2, 3]), Some(vec![2, 2]));
        assert_eq!(next(&[]), None);
        assert_eq!(common(&[0, 1, 2], &[0, 1, 5]), vec![0, 1]);
        assert_eq!(ancestors(&[1, 2, 3]), vec![vec![1], vec![1, 2]]);
        assert_eq!(relative(&[1, 2, 3], &[1]), Some(vec![2, 3]));
    }
}
