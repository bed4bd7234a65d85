//! Source positions threaded through every resolution, and the location tree
//! captured from them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A zero-based line/column position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based column.
    pub column: u32,
}

impl Position {
    /// A position at `line`, `column`.
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// A range of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// First character.
    pub start: Position,
    /// One past the last character.
    pub end: Position,
}

impl Span {
    /// A span between two positions.
    pub const fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// A span on a single line.
    pub const fn on_line(line: u32, start_column: u32, end_column: u32) -> Self {
        Span {
            start: Position::new(line, start_column),
            end: Position::new(line, end_column),
        }
    }
}

/// Where a value written during a parse came from, with the same for
/// everything written beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// The span of the name that produced this node.
    pub span: Span,
    /// Nested locations, keyed by property name or array index.
    pub children: BTreeMap<String, SourceLocation>,
}

impl SourceLocation {
    /// Zero-based line where this node starts.
    pub const fn start_line(&self) -> u32 {
        self.span.start.line
    }

    /// Follow a dotted path, e.g. `elements.0.foo`.
    pub fn get(&self, dotted: &str) -> Option<&SourceLocation> {
        dotted
            .split('.')
            .try_fold(self, |node, key| node.children.get(key))
    }

    fn node_mut(&mut self, path: &[String]) -> &mut SourceLocation {
        let mut node = self;
        for key in path {
            node = node.children.entry(key.clone()).or_default();
        }
        node
    }
}

/// The location tree under construction during one parse.
///
/// Cloning a `SourceMap` yields another handle to the same tree.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    root: Rc<RefCell<SourceLocation>>,
}

impl SourceMap {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// An owned copy of the tree as it is now.
    pub fn snapshot(&self) -> SourceLocation {
        self.root.borrow().clone()
    }

    pub(crate) fn cursor(&self) -> LocationCursor {
        LocationCursor {
            map: self.clone(),
            path: Vec::new(),
        }
    }
}

/// A position within a [`SourceMap`], held by each bound container.
#[derive(Debug, Clone)]
pub(crate) struct LocationCursor {
    map: SourceMap,
    path: Vec<String>,
}

impl LocationCursor {
    /// Step into `key`, recording `span` if the node is new.
    pub(crate) fn child(&self, key: &str, span: Span) -> LocationCursor {
        let mut path = self.path.clone();
        path.push(key.to_string());
        {
            let mut root = self.map.root.borrow_mut();
            let parent = root.node_mut(&self.path);
            parent
                .children
                .entry(key.to_string())
                .or_insert_with(|| SourceLocation {
                    span,
                    children: BTreeMap::new(),
                });
        }
        LocationCursor {
            map: self.map.clone(),
            path,
        }
    }

    /// Record `span` for the leaf `key`, replacing any earlier record.
    pub(crate) fn record(&self, key: &str, span: Span) {
        let mut root = self.map.root.borrow_mut();
        let node = root.node_mut(&self.path);
        node.children.entry(key.to_string()).or_default().span = span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_keeps_first_span_and_record_overwrites() {
        let map = SourceMap::new();
        let root = map.cursor();

        let first = Span::on_line(2, 0, 3);
        let second = Span::on_line(7, 0, 3);
        let elements = root.child("elements", first);
        root.child("elements", second);
        elements.record("name", first);
        elements.record("name", second);

        let tree = map.snapshot();
        assert_eq!(tree.get("elements").map(SourceLocation::start_line), Some(2));
        assert_eq!(tree.get("elements.name").map(SourceLocation::start_line), Some(7));
        assert!(tree.get("elements.missing").is_none());
    }

    #[test]
    fn position_displays_one_based() {
        assert_eq!(Position::new(0, 4).to_string(), "1:5");
    }
}
