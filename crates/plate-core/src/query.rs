//! Read-only lookups over the editor's document: node searches bounded by a
//! location, ancestor lookups and point arithmetic. Nothing here fails; a
//! missing selection, an unresolvable path or an empty result all come back
//! as `None`, `false` or an empty iterator.

use std::cmp::Ordering;

use crate::editor::Editor;
use crate::location::{Edge, Location, Point, Range};
use crate::matcher::{Match, matches};
use crate::node::{Document, ElementNode, Node, TextNode};
use crate::path::{self, Path};

pub type NodeEntry<'a> = (&'a Node, Path);

/// How nested matches are reported by [`get_nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    All,
    /// Skip matches below an already reported match.
    Highest,
    /// Report only the deepest match of each branch.
    Lowest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextUnit {
    #[default]
    Character,
    Word,
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Defaults to the editor selection.
    pub at: Option<Location>,
    pub matcher: Match,
    pub mode: Mode,
    pub reverse: bool,
    /// Descend into void elements.
    pub voids: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at: impl Into<Location>) -> Self {
        self.at = Some(at.into());
        self
    }

    pub fn matcher(mut self, matcher: Match) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }
}

/// An ancestor that is either an element or the document root.
#[derive(Debug, Clone, Copy)]
pub enum Ancestor<'a> {
    Root(&'a Document),
    Element(&'a ElementNode, &'a Node),
}

impl<'a> Ancestor<'a> {
    pub fn children(&self) -> &'a [Node] {
        match self {
            Ancestor::Root(doc) => &doc.children,
            Ancestor::Element(el, _) => &el.children,
        }
    }

    pub fn element(&self) -> Option<&'a ElementNode> {
        match self {
            Ancestor::Root(_) => None,
            Ancestor::Element(el, _) => Some(el),
        }
    }

    pub fn node(&self) -> Option<&'a Node> {
        match self {
            Ancestor::Root(_) => None,
            Ancestor::Element(_, node) => Some(node),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Ancestor::Root(_))
    }
}

type Pass<'a> = Box<dyn Fn(&Node) -> bool + 'a>;

/// Pre-order walk of the document bounded by `from`/`to`. Ancestors of
/// `from` are yielded on the way down; `pass` stops descent into a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    from: Path,
    to: Option<Path>,
    reverse: bool,
    pass: Option<Pass<'a>>,
    path: Path,
    visited: bool,
    done: bool,
}

impl<'a> Descendants<'a> {
    pub fn new(doc: &'a Document, from: Path, to: Option<Path>, reverse: bool) -> Self {
        Self {
            doc,
            from,
            to,
            reverse,
            pass: None,
            path: Vec::new(),
            visited: false,
            done: false,
        }
    }

    fn pass(mut self, pass: Pass<'a>) -> Self {
        self.pass = Some(pass);
        self
    }

    fn empty(doc: &'a Document) -> Self {
        let mut this = Self::new(doc, Vec::new(), None, false);
        this.done = true;
        this
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let current = self.path.clone();
            if let Some(to) = &self.to {
                let past = if self.reverse {
                    path::is_before(&current, to)
                } else {
                    path::is_after(&current, to)
                };
                if past {
                    self.done = true;
                    return None;
                }
            }

            let node = if current.is_empty() {
                None
            } else {
                match self.doc.node(&current) {
                    Some(node) => Some(node),
                    None => {
                        self.done = true;
                        return None;
                    }
                }
            };
            let children = match node {
                Some(node) => node.children(),
                None => self.doc.children.as_slice(),
            };
            let emit = if self.visited { None } else { node };

            let passed = match (node, &self.pass) {
                (Some(node), Some(pass)) => pass(node),
                _ => false,
            };
            if !self.visited && !children.is_empty() && !passed {
                let mut ix = if self.reverse { children.len() - 1 } else { 0 };
                if path::is_ancestor(&current, &self.from) {
                    ix = self.from[current.len()];
                    if ix >= children.len() {
                        self.done = true;
                    }
                }
                self.path.push(ix);
                self.visited = false;
            } else if current.is_empty() {
                self.done = true;
            } else if !self.reverse && current.last().is_some_and(|ix| ix + 1 < self.siblings(&current)) {
                if let Some(last) = self.path.last_mut() {
                    *last += 1;
                }
                self.visited = false;
            } else if self.reverse && path::has_previous(&current) {
                if let Some(last) = self.path.last_mut() {
                    *last -= 1;
                }
                self.visited = false;
            } else {
                self.path.pop();
                self.visited = true;
            }

            if let Some(node) = emit {
                return Some((node, current));
            }
        }
    }
}

impl Descendants<'_> {
    fn siblings(&self, at: &[usize]) -> usize {
        path::parent(at)
            .and_then(|parent| self.doc.children_at(&parent))
            .map_or(0, <[Node]>::len)
    }
}

/// Lazy matching entries, see [`get_nodes`].
pub struct Nodes<'a> {
    inner: Descendants<'a>,
    matcher: Match,
    mode: Mode,
    scope: Option<Path>,
    hit: Option<NodeEntry<'a>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = NodeEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some((node, path)) = self.inner.next() else {
                if self.mode == Mode::Lowest {
                    return self.hit.take();
                }
                return None;
            };
            if let Some(scope) = &self.scope
                && !path::is_common(scope, &path)
            {
                continue;
            }

            let is_lower = self
                .hit
                .as_ref()
                .is_some_and(|(_, hit)| path::compare(&path, hit) == Ordering::Equal);
            if self.mode == Mode::Highest && is_lower {
                continue;
            }
            if !matches(node, &path, &self.matcher) {
                continue;
            }
            if self.mode == Mode::Lowest && is_lower {
                self.hit = Some((node, path));
                continue;
            }

            let emit = if self.mode == Mode::Lowest {
                self.hit.replace((node, path))
            } else {
                self.hit = Some((node, path.clone()));
                Some((node, path))
            };
            if emit.is_some() {
                return emit;
            }
        }
    }
}

/// All entries matching `options`, in document order (or reversed).
///
/// A `Path` scope yields only that node and its descendants. Point and range
/// scopes also yield the ancestors the walk descends through.
pub fn get_nodes<'a>(editor: &'a Editor, options: QueryOptions) -> Nodes<'a> {
    let doc = editor.doc();
    let empty = |matcher: Match| Nodes {
        inner: Descendants::empty(doc),
        matcher,
        mode: options.mode,
        scope: None,
        hit: None,
    };

    let Some(at) = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))
    else {
        return empty(options.matcher);
    };

    let (from, to, scope) = match &at {
        Location::Span(from, to) => (from.clone(), to.clone(), None),
        other => {
            let (Some(first), Some(last)) = (
                location_path(doc, other, Edge::Start),
                location_path(doc, other, Edge::End),
            ) else {
                return empty(options.matcher);
            };
            let scope = match other {
                Location::Path(p) => Some(p.clone()),
                _ => None,
            };
            if options.reverse {
                (last, first, scope)
            } else {
                (first, last, scope)
            }
        }
    };

    let mut inner = Descendants::new(doc, from, Some(to), options.reverse);
    if !options.voids {
        inner = inner.pass(Box::new(move |node| editor.is_void(node)));
    }
    Nodes {
        inner,
        matcher: options.matcher,
        mode: options.mode,
        scope,
        hit: None,
    }
}

pub fn find_node<'a>(editor: &'a Editor, options: QueryOptions) -> Option<NodeEntry<'a>> {
    get_nodes(editor, options).next()
}

pub fn some_node(editor: &Editor, options: QueryOptions) -> bool {
    find_node(editor, options).is_some()
}

/// Like [`find_node`], but a `Path` scope never yields the node at that path.
pub fn find_descendant<'a>(editor: &'a Editor, options: QueryOptions) -> Option<NodeEntry<'a>> {
    let root = match &options.at {
        Some(Location::Path(p)) => Some(p.clone()),
        _ => None,
    };
    get_nodes(editor, options).find(|(_, path)| root.as_ref() != Some(path))
}

pub fn get_nodes_by_type<'a, I, S>(editor: &'a Editor, kinds: I, options: QueryOptions) -> Nodes<'a>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    get_nodes(editor, options.matcher(Match::kinds(kinds)))
}

/// Ancestors of `at` from the top level down, `at` included. Stops at the
/// first void unless `voids`.
pub fn levels<'a>(editor: &'a Editor, at: &[usize], matcher: &Match, voids: bool) -> Vec<NodeEntry<'a>> {
    let mut out = Vec::new();
    for len in 1..=at.len() {
        let path = at[..len].to_vec();
        let Some(node) = editor.doc().node(&path) else {
            break;
        };
        if !matches(node, &path, matcher) {
            continue;
        }
        out.push((node, path));
        if !voids && editor.is_void(node) {
            break;
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct AboveOptions {
    pub at: Option<Location>,
    pub matcher: Match,
    /// `Highest` picks the top-most match; anything else the closest one.
    pub mode: Mode,
    pub voids: bool,
}

impl AboveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, at: impl Into<Location>) -> Self {
        self.at = Some(at.into());
        self
    }

    pub fn matcher(mut self, matcher: Match) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn voids(mut self, voids: bool) -> Self {
        self.voids = voids;
        self
    }
}

/// Closest (or highest) matching element strictly above `at`. For a range,
/// the common ancestor of both ends is a candidate too.
pub fn get_above<'a>(editor: &'a Editor, options: AboveOptions) -> Option<NodeEntry<'a>> {
    let at = options
        .at
        .clone()
        .or_else(|| editor.selection().cloned().map(Location::Range))?;
    let at_path = location_common_path(&at);
    if !editor.doc().has_path(&at_path) {
        return None;
    }

    let mut found = levels(editor, &at_path, &options.matcher, options.voids);
    if options.mode != Mode::Highest {
        found.reverse();
    }
    found.into_iter().find(|(node, p)| {
        if node.is_text() {
            return false;
        }
        match &at {
            Location::Range(range) => {
                path::is_ancestor(p, &range.anchor.path) && path::is_ancestor(p, &range.focus.path)
            }
            _ => *p != at_path,
        }
    })
}

/// Closest block above `at`, falling back to the document root.
pub fn get_block_above<'a>(editor: &'a Editor, options: AboveOptions) -> (Ancestor<'a>, Path) {
    let user = options.matcher.clone();
    let registry = editor.registry_handle();
    let options = options.matcher(Match::predicate(move |node, path| {
        registry.is_block(node) && matches(node, path, &user)
    }));
    match get_above(editor, options) {
        Some((node, path)) => match node {
            Node::Element(el) => (Ancestor::Element(el, node), path),
            Node::Text(_) => (Ancestor::Root(editor.doc()), Vec::new()),
        },
        None => (Ancestor::Root(editor.doc()), Vec::new()),
    }
}

/// Parent of the node at `at`; the root for top-level nodes.
pub fn get_parent<'a>(editor: &'a Editor, at: &[usize]) -> Option<(Ancestor<'a>, Path)> {
    let doc = editor.doc();
    if at.is_empty() || !doc.has_path(at) {
        return None;
    }
    let parent = path::parent(at)?;
    if parent.is_empty() {
        return Some((Ancestor::Root(doc), parent));
    }
    let node = doc.node(&parent)?;
    let el = node.as_element()?;
    Some((Ancestor::Element(el, node), parent))
}

/// Path of the first (or last) leaf of `at`.
pub fn location_path(doc: &Document, at: &Location, edge: Edge) -> Option<Path> {
    match at {
        Location::Path(p) => {
            if !doc.has_path(p) {
                return None;
            }
            edge_leaf_path(doc, p, edge)
        }
        Location::Point(point) => doc.node(&point.path).map(|_| point.path.clone()),
        Location::Range(range) => {
            let point = match edge {
                Edge::Start => range.start(),
                Edge::End => range.end(),
            };
            doc.node(&point.path).map(|_| point.path)
        }
        Location::Span(from, to) => {
            let p = match edge {
                Edge::Start => from,
                Edge::End => to,
            };
            doc.node(p).map(|_| p.clone())
        }
    }
}

fn edge_leaf_path(doc: &Document, at: &[usize], edge: Edge) -> Option<Path> {
    let mut path = at.to_vec();
    if doc.node(&path).is_some_and(Node::is_text) {
        return Some(path);
    }
    loop {
        let children = doc.children_at(&path)?;
        if children.is_empty() {
            return if path.is_empty() { None } else { Some(path) };
        }
        let ix = match edge {
            Edge::Start => 0,
            Edge::End => children.len() - 1,
        };
        path.push(ix);
        if doc.node(&path).is_some_and(Node::is_text) {
            return Some(path);
        }
    }
}

/// The path a location narrows to: a range resolves to the common ancestor
/// of its ends.
pub fn location_common_path(at: &Location) -> Path {
    match at {
        Location::Path(p) => p.clone(),
        Location::Point(point) => point.path.clone(),
        Location::Range(range) => path::common(&range.anchor.path, &range.focus.path),
        Location::Span(from, to) => path::common(from, to),
    }
}

pub fn point(editor: &Editor, at: &Location, edge: Edge) -> Option<Point> {
    let doc = editor.doc();
    match at {
        Location::Point(point) => doc.text(&point.path).map(|_| point.clone()),
        Location::Range(range) => {
            let point = match edge {
                Edge::Start => range.start(),
                Edge::End => range.end(),
            };
            doc.text(&point.path).map(|_| point)
        }
        Location::Path(_) | Location::Span(..) => {
            let leaf = location_path(doc, at, edge)?;
            let text = doc.text(&leaf)?;
            let offset = match edge {
                Edge::Start => 0,
                Edge::End => text.text.len(),
            };
            Some(Point::new(leaf, offset))
        }
    }
}

pub fn start(editor: &Editor, at: &Location) -> Option<Point> {
    point(editor, at, Edge::Start)
}

pub fn end(editor: &Editor, at: &Location) -> Option<Point> {
    point(editor, at, Edge::End)
}

pub fn edges(editor: &Editor, at: &Location) -> Option<(Point, Point)> {
    Some((start(editor, at)?, end(editor, at)?))
}

pub fn range_of(editor: &Editor, at: &Location) -> Option<Range> {
    match at {
        Location::Range(range) => Some(range.clone()),
        _ => {
            let (start, end) = edges(editor, at)?;
            Some(Range::new(start, end))
        }
    }
}

/// Range from the start of `from` to the end of `to`.
pub fn range_between(editor: &Editor, from: &Location, to: &Location) -> Option<Range> {
    Some(Range::new(start(editor, from)?, end(editor, to)?))
}

pub fn leaf<'a>(editor: &'a Editor, at: &Location, edge: Edge) -> Option<(&'a TextNode, Path)> {
    let path = location_path(editor.doc(), at, edge)?;
    let text = editor.doc().text(&path)?;
    Some((text, path))
}

/// Text content covered by `at`, void content excluded.
pub fn string(editor: &Editor, at: &Location) -> String {
    let Some(range) = range_of(editor, at) else {
        return String::new();
    };
    let (start, end) = range.edges();
    let mut out = String::new();
    let options = QueryOptions::new()
        .at(range.clone())
        .matcher(Match::text());
    for (node, path) in get_nodes(editor, options) {
        let Node::Text(t) = node else {
            continue;
        };
        let mut text = t.text.as_str();
        if path == end.path {
            text = &text[..crate::ops::clamp_to_char_boundary(text, end.offset)];
        }
        if path == start.path {
            let from = crate::ops::clamp_to_char_boundary(text, start.offset);
            text = &text[from..];
        }
        out.push_str(text);
    }
    out
}

/// Lowest block path above `at`, or the root.
pub(crate) fn block_path_of(editor: &Editor, at: &[usize]) -> Path {
    get_block_above(editor, AboveOptions::new().at(at.to_vec())).1
}

/// Text leaves directly owned by the block at `block`, voids excluded.
fn block_texts<'a>(editor: &'a Editor, block: &[usize]) -> Vec<(Path, &'a str)> {
    fn walk<'a>(
        editor: &'a Editor,
        children: &'a [Node],
        path: &mut Path,
        out: &mut Vec<(Path, &'a str)>,
    ) {
        for (ix, node) in children.iter().enumerate() {
            path.push(ix);
            match node {
                Node::Text(t) => out.push((path.clone(), t.text.as_str())),
                Node::Element(el) => {
                    if !editor.is_void(node) && !editor.is_block(node) {
                        walk(editor, &el.children, path, out);
                    }
                }
            }
            path.pop();
        }
    }
    let mut out = Vec::new();
    if let Some(children) = editor.doc().children_at(block) {
        walk(editor, children, &mut block.to_vec(), &mut out);
    }
    out
}

fn block_offset(texts: &[(Path, &str)], point: &Point) -> usize {
    let mut offset = 0;
    for (path, text) in texts {
        match path::compare(path, &point.path) {
            Ordering::Less => offset += text.len(),
            Ordering::Equal if *path == point.path => {
                return offset + point.offset.min(text.len());
            }
            _ => break,
        }
    }
    offset
}

fn block_point(texts: &[(Path, &str)], offset: usize, prefer_later: bool) -> Option<Point> {
    let mut start = 0;
    let mut found = None;
    for (path, text) in texts {
        let end = start + text.len();
        if start <= offset && offset <= end {
            found = Some(Point::new(path.clone(), offset - start));
            if !prefer_later || offset < end {
                break;
            }
        } else if offset < start {
            break;
        }
        start = end;
    }
    found
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn step_forward(s: &str, from: usize, unit: TextUnit) -> usize {
    let rest = &s[from..];
    match unit {
        TextUnit::Character => from + rest.chars().next().map_or(0, char::len_utf8),
        TextUnit::Word => {
            let mut ix = from;
            let mut seen_word = false;
            for c in rest.chars() {
                if is_word_char(c) {
                    seen_word = true;
                } else if seen_word {
                    break;
                }
                ix += c.len_utf8();
            }
            ix
        }
    }
}

fn step_backward(s: &str, from: usize, unit: TextUnit) -> usize {
    let head = &s[..from];
    match unit {
        TextUnit::Character => from - head.chars().next_back().map_or(0, char::len_utf8),
        TextUnit::Word => {
            let mut ix = from;
            let mut seen_word = false;
            for c in head.chars().rev() {
                if is_word_char(c) {
                    seen_word = true;
                } else if seen_word {
                    break;
                }
                ix -= c.len_utf8();
            }
            ix
        }
    }
}

/// Next caret position after `point`. Leaving a block is one step and lands
/// at the start of the next block (or of the next void).
pub fn after(editor: &Editor, point: &Point, unit: TextUnit) -> Option<Point> {
    let block = block_path_of(editor, &point.path);
    let texts = block_texts(editor, &block);
    let offset = block_offset(&texts, point);
    let content: String = texts.iter().map(|(_, t)| *t).collect();
    if offset < content.len() {
        let next = step_forward(&content, offset, unit);
        return block_point(&texts, next, false);
    }
    adjacent_block_edge(editor, &block, false)
}

/// Previous caret position before `point`, see [`after`].
pub fn before(editor: &Editor, point: &Point, unit: TextUnit) -> Option<Point> {
    let block = block_path_of(editor, &point.path);
    let texts = block_texts(editor, &block);
    let offset = block_offset(&texts, point);
    if offset > 0 {
        let content: String = texts.iter().map(|(_, t)| *t).collect();
        let prev = step_backward(&content, offset, unit);
        return block_point(&texts, prev, true);
    }
    adjacent_block_edge(editor, &block, true)
}

fn adjacent_block_edge(editor: &Editor, block: &[usize], reverse: bool) -> Option<Point> {
    if block.is_empty() {
        return None;
    }
    let doc = editor.doc();
    let edge = if reverse { Edge::Start } else { Edge::End };
    let from = edge_leaf_path(doc, block, edge)?;
    let walk = Descendants::new(doc, from, None, reverse).pass(Box::new(|node| editor.is_void(node)));
    for (node, path) in walk {
        let outside = if reverse {
            path::is_before(&path, block)
        } else {
            path::is_after(&path, block)
        };
        if !outside {
            continue;
        }
        if node.is_text() || editor.is_void(node) {
            let edge = if reverse { Edge::End } else { Edge::Start };
            return self::point(editor, &Location::Path(path), edge);
        }
    }
    None
}

/// Closest entry before `at` in document order. Without a matcher, only
/// siblings of `at` qualify.
pub fn previous<'a>(editor: &'a Editor, at: &[usize], matcher: Option<Match>) -> Option<NodeEntry<'a>> {
    if at.is_empty() {
        return None;
    }
    let anchor = start(editor, &Location::Path(at.to_vec()))?;
    let before = before(editor, &anchor, TextUnit::Character)?;
    let first = location_path(editor.doc(), &Location::Path(Vec::new()), Edge::Start)?;
    let matcher = matcher.unwrap_or_else(|| Match::siblings_of(at));
    let options = QueryOptions::new()
        .at(Location::Span(before.path, first))
        .matcher(matcher)
        .mode(Mode::Lowest)
        .reverse(true);
    find_node(editor, options)
}

/// Closest entry after `at` in document order, see [`previous`].
pub fn next<'a>(editor: &'a Editor, at: &[usize], matcher: Option<Match>) -> Option<NodeEntry<'a>> {
    if at.is_empty() {
        return None;
    }
    let anchor = end(editor, &Location::Path(at.to_vec()))?;
    let after = after(editor, &anchor, TextUnit::Character)?;
    let last = location_path(editor.doc(), &Location::Path(Vec::new()), Edge::End)?;
    let matcher = matcher.unwrap_or_else(|| Match::siblings_of(at));
    let options = QueryOptions::new()
        .at(Location::Span(after.path, last))
        .matcher(matcher)
        .mode(Mode::Lowest);
    find_node(editor, options)
}

pub fn is_start(editor: &Editor, point: &Point, at: &Location) -> bool {
    start(editor, at).is_some_and(|s| s == *point)
}

pub fn is_end(editor: &Editor, point: &Point, at: &Location) -> bool {
    end(editor, at).is_some_and(|e| e == *point)
}

pub fn is_edge(editor: &Editor, point: &Point, at: &Location) -> bool {
    is_start(editor, point, at) || is_end(editor, point, at)
}

/// No children, or a single empty text in a non-void element.
pub fn is_empty(editor: &Editor, node: &Node) -> bool {
    let children = node.children();
    match children {
        [] => true,
        [Node::Text(t)] => t.text.is_empty() && !editor.is_void(node),
        _ => false,
    }
}

/// The block holding the selection has no text and no inline children.
pub fn is_block_above_empty(editor: &Editor) -> bool {
    let (block, path) = get_block_above(editor, AboveOptions::new());
    if path.is_empty() {
        return false;
    }
    block.node().is_some_and(|node| {
        node.string().is_empty() && !node.children().iter().any(|c| editor.is_inline(c))
    })
}

pub fn is_selection_at_block_start(editor: &Editor) -> bool {
    let Some(selection) = editor.selection() else {
        return false;
    };
    let (_, block) = get_block_above(editor, AboveOptions::new());
    if block.is_empty() {
        return false;
    }
    let at = Location::Path(block);
    is_start(editor, &selection.focus, &at)
        || (selection.is_expanded() && is_start(editor, &selection.anchor, &at))
}

/// Pulls the end of a range that sits at offset 0 of a following block back
/// to the end of the last non-empty text before it.
pub fn unhang_range(editor: &Editor, range: &Range, voids: bool) -> Range {
    let (start, mut end) = range.edges();
    if start.offset != 0 || end.offset != 0 || range.is_collapsed() || path::has_previous(&end.path) {
        return range.clone();
    }

    let registry = editor.registry_handle();
    let block_path = get_above(
        editor,
        AboveOptions::new()
            .at(end.clone())
            .matcher(Match::predicate(move |node, _| registry.is_block(node)))
            .voids(voids),
    )
    .map(|(_, p)| p)
    .unwrap_or_default();

    let options = QueryOptions::new()
        .at(Range::new(start.clone(), end.clone()))
        .matcher(Match::text())
        .reverse(true)
        .voids(voids);
    for (node, path) in get_nodes(editor, options).skip(1) {
        let Node::Text(t) = node else {
            continue;
        };
        if !t.text.is_empty() || path::is_before(&path, &block_path) {
            end = Point::new(path, t.text.len());
            break;
        }
    }
    Range::new(start, end)
}

/// Highest void element above (or at) `at`.
pub fn void_above<'a>(editor: &'a Editor, at: &Location) -> Option<NodeEntry<'a>> {
    let registry = editor.registry_handle();
    let at_path = location_common_path(at);
    let options = AboveOptions::new()
        .at(at.clone())
        .matcher(Match::predicate(move |node, _| registry.is_void(node)))
        .mode(Mode::Highest)
        .voids(true);
    get_above(editor, options).or_else(|| {
        let node = editor.doc().node(&at_path)?;
        editor.is_void(node).then_some((node, at_path))
    })
}
