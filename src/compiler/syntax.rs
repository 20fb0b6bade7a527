use std::fmt::{Display, Formatter, Result};

use crate::common::span::Span;

/// A static diagnostic found at compile time: a reason paired with the
/// location it applies to. Pretty-printed with the offending line and a
/// caret run underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub reason: String,
    pub span: Span,
}

impl Syntax {
    pub fn error(reason: &str, span: &Span) -> Syntax {
        Syntax {
            reason: reason.to_string(),
            span: span.clone(),
        }
    }
}

impl Display for Syntax {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "{}", self.span)?;
        write!(f, "{}", self.reason)
    }
}
