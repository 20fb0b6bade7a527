//! The one error channel for the whole compiler. Internal code signals
//! a variant; only the top-level driver decides what to do with it
//! (print one line to stderr and exit non-zero).

use std::process::ExitStatus;

use thiserror::Error;

use crate::compiler::syntax::Syntax;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error\n{0}")]
    Parse(Syntax),

    #[error("unknown primitive\n{0}")]
    UnknownPrimitive(Syntax),

    #[error("arity mismatch\n{0}")]
    ArityMismatch(Syntax),

    #[error("unbound identifier\n{0}")]
    UnboundIdentifier(Syntax),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toolchain failed: `{command}` exited with {status}")]
    Toolchain { command: String, status: ExitStatus },

    #[error("loader error: {0}")]
    Loader(String),
}
