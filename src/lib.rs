//! # Junco
//!
//! Junco is an ahead-of-time compiler for a small Scheme subset. It
//! parses a program, generates x86-64 assembly for it, hands the
//! result to the system C toolchain together with a small generated
//! runtime, and either leaves behind a standalone executable or loads
//! the result as a shared object and runs it on the spot.
//!
//! ## Overview of the compilation process
//!
//! Source code is represented as a [`common::Source`]; regions of it
//! are marked with [`common::Span`]s, which every AST node and
//! diagnostic carries.
//!
//! The parser ([`compiler::parse`]) is a plain recursive-descent
//! reader over a cursor: each production either consumes input and
//! succeeds or restores the cursor and lets the caller try the next
//! alternative. Procedure calls are resolved against the static
//! primitive table ([`compiler::prims`]) already at parse time.
//!
//! The code generator ([`compiler::emit`]) walks the AST once,
//! depth-first and left-to-right, keeping the result of the previous
//! expression in `%rax`, spilling temporaries below the stack pointer
//! at the free stack index it threads along, and resolving identifiers
//! through a lexical environment ([`compiler::env`]).
//!
//! Values never leave the one-word tagged representation defined in
//! [`common::value`]; those constants appear verbatim in the emitted
//! assembly and in the generated C runtime ([`runtime`]), so that
//! module is the single place they are defined.
//!
//! The driver ([`driver`]) strings the stages together:
//!
//! ```no_run
//! use junco::driver::{self, Settings};
//!
//! driver::evaluate("(fx+ 40 2)", &Settings::default()).unwrap();
//! ```

pub mod common;
pub mod compiler;
pub mod driver;
pub mod error;
pub mod runtime;

pub use common::{Source, Span, Spanned, Value};
pub use error::Error;
