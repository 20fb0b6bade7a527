//! The compiler pipeline: source text is parsed into an AST
//! (`parse`), then walked by the code generator (`emit`) to produce
//! assembly text. There are no passes in between; emission is literal
//! and single-pass.

pub mod ast;
pub mod emit;
pub mod env;
pub mod labels;
pub mod parse;
pub mod prims;
pub mod syntax;

pub use emit::emit_program;
pub use labels::Labels;
pub use parse::{parse_expression, parse_program};
pub use syntax::Syntax;
