//! Datastructures shared across the whole pipeline:
//!
//! - Source code representation and span annotations.
//! - The tagged-immediate value encoding used by the compiler,
//!   the emitted assembly, and the runtime alike.

pub mod source;
pub mod span;
pub mod value;

pub use source::Source;
pub use span::{Span, Spanned};
pub use value::Value;
