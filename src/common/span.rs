use std::fmt::{Display, Formatter, Result};
use std::rc::Rc;

use crate::common::source::Source;

/// A `Span` refers to a section of a source,
/// much like a `&str`, but with a reference to a `Source` rather than a `String`.
/// Spans are paired with other datastructures
/// and used when reporting errors.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Span {
    pub source: Rc<Source>,
    pub offset: usize,
    pub length: usize,
}

impl Span {
    /// Create a new `Span` from an offset with a length.
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span {
            source: Rc::clone(source),
            offset,
            length,
        }
    }

    /// A `Span` that points at a specific point in the source.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span {
            source: Rc::clone(source),
            offset,
            length: 1,
        }
    }

    /// Creates a new `Span` which spans the space of the previous two.
    /// ```plain
    /// (fx+ 1 2)
    /// ^^^^      | Span a
    ///        ^  | Span b
    /// ^^^^^^^^  | combined
    /// ```
    pub fn combine(a: &Span, b: &Span) -> Span {
        let offset = a.offset.min(b.offset);
        let end = (a.offset + a.length).max(b.offset + b.length);
        Span::new(&a.source, offset, end - offset)
    }

    /// Returns the contents of a `Span`, indexing into the source file.
    pub fn contents(&self) -> &str {
        let end = (self.offset + self.length).min(self.source.contents.len());
        &self.source.contents[self.offset.min(end)..end]
    }

    /// The zero-based line and column this `Span` starts on.
    fn position(&self) -> (usize, usize) {
        let before = &self.source.contents[..self.offset.min(self.source.contents.len())];
        let line = before.matches('\n').count();
        let col = before.len() - before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, col)
    }
}

impl Display for Span {
    /// Prints where the `Span` occurs in its source:
    /// ```plain
    /// In ./source:1:6
    ///   |
    /// 1 | (fx+ 1)
    ///   |      ^
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let (line, col) = self.position();
        let text = self
            .source
            .contents
            .lines()
            .nth(line)
            .unwrap_or("");

        let readable_line = (line + 1).to_string();
        let padding = " ".repeat(readable_line.len());
        // keep the caret run inside the quoted line
        let carets = "^".repeat(self.length.max(1).min(text.len().saturating_sub(col).max(1)));

        writeln!(
            f,
            "In {}:{}:{}",
            self.source.path.display(),
            line + 1,
            col + 1
        )?;
        writeln!(f, "{} |", padding)?;
        writeln!(f, "{} | {}", readable_line, text)?;
        write!(f, "{} | {}{}", padding, " ".repeat(col), carets)
    }
}

/// A wrapper that annotates some item with the `Span` it was parsed from.
/// For example, a `Spanned<Expr>` is an expression that knows where it
/// occurs in the source code.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(item: T, span: Span) -> Spanned<T> {
        Spanned { item, span }
    }
}
