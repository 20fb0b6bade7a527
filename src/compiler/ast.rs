use crate::common::span::Spanned;
use crate::common::value::Value;
use crate::compiler::prims::Prim;

/// Which member of the `let` family a binding form came from.
/// The distinction only matters to the code generator: it decides
/// which environment each right-hand side is emitted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetKind {
    Plain,
    Star,
    Rec,
}

/// One `(identifier expression)` pair inside a `let` form.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Spanned<String>,
    pub init: Spanned<Expr>,
}

/// An expression of the surface language.
/// Compound nodes own their children outright, so dropping a node
/// drops the whole subtree; primitive descriptors are borrowed from
/// the static table and outlive every AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An immediate constant, already encoded as a tagged word.
    Imm(Value),
    /// A reference to a lexical binding.
    Id(String),
    If {
        cond: Box<Spanned<Expr>>,
        then: Box<Spanned<Expr>>,
        other: Box<Spanned<Expr>>,
    },
    Let {
        kind: LetKind,
        bindings: Vec<Binding>,
        body: Box<Spanned<Expr>>,
    },
    /// An ordered, non-empty sequence of expressions.
    /// All but the last are evaluated for effect.
    Seq(Vec<Spanned<Expr>>),
    Unary {
        prim: &'static Prim,
        arg: Box<Spanned<Expr>>,
    },
    Binary {
        prim: &'static Prim,
        args: Box<(Spanned<Expr>, Spanned<Expr>)>,
    },
}
