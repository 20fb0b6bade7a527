//! The registry of built-in primitives. Every entry pairs the name the
//! reader sees with the emitter that inlines it; the table is static,
//! immutable, and only ever borrowed — AST nodes point into it.

use crate::common::span::Spanned;
use crate::compiler::ast::Expr;
use crate::compiler::emit::Emitter;
use crate::compiler::env::Env;
use crate::error::Error;

pub type UnaryEmitter = fn(&mut Emitter, &Spanned<Expr>, usize, &mut Env) -> Result<(), Error>;
pub type BinaryEmitter =
    fn(&mut Emitter, &Spanned<Expr>, &Spanned<Expr>, usize, &mut Env) -> Result<(), Error>;

/// The emitter for a primitive; the variant doubles as its arity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimEmit {
    Unary(UnaryEmitter),
    Binary(BinaryEmitter),
}

#[derive(Debug, PartialEq)]
pub struct Prim {
    pub name: &'static str,
    pub emit: PrimEmit,
}

impl Prim {
    pub fn arity(&self) -> usize {
        match self.emit {
            PrimEmit::Unary(_) => 1,
            PrimEmit::Binary(_) => 2,
        }
    }
}

pub static PRIMITIVES: &[Prim] = &[
    Prim { name: "fxadd1", emit: PrimEmit::Unary(Emitter::fxadd1) },
    Prim { name: "fxsub1", emit: PrimEmit::Unary(Emitter::fxsub1) },
    Prim { name: "fxzero?", emit: PrimEmit::Unary(Emitter::fxzerop) },
    Prim { name: "char->fixnum", emit: PrimEmit::Unary(Emitter::char_to_fixnum) },
    Prim { name: "fixnum->char", emit: PrimEmit::Unary(Emitter::fixnum_to_char) },
    Prim { name: "null?", emit: PrimEmit::Unary(Emitter::nullp) },
    Prim { name: "not", emit: PrimEmit::Unary(Emitter::not) },
    Prim { name: "fixnum?", emit: PrimEmit::Unary(Emitter::fixnump) },
    Prim { name: "boolean?", emit: PrimEmit::Unary(Emitter::booleanp) },
    Prim { name: "char?", emit: PrimEmit::Unary(Emitter::charp) },
    Prim { name: "fxlognot", emit: PrimEmit::Unary(Emitter::fxlognot) },
    Prim { name: "fx+", emit: PrimEmit::Binary(Emitter::fxadd) },
    Prim { name: "fx-", emit: PrimEmit::Binary(Emitter::fxsub) },
    Prim { name: "fx*", emit: PrimEmit::Binary(Emitter::fxmul) },
    Prim { name: "fxlogand", emit: PrimEmit::Binary(Emitter::fxlogand) },
    Prim { name: "fxlogor", emit: PrimEmit::Binary(Emitter::fxlogor) },
    Prim { name: "fx=", emit: PrimEmit::Binary(Emitter::fxeq) },
    Prim { name: "fx<=", emit: PrimEmit::Binary(Emitter::fxle) },
    Prim { name: "fx<", emit: PrimEmit::Binary(Emitter::fxlt) },
    Prim { name: "fx>=", emit: PrimEmit::Binary(Emitter::fxge) },
    Prim { name: "fx>", emit: PrimEmit::Binary(Emitter::fxgt) },
    Prim { name: "char=", emit: PrimEmit::Binary(Emitter::chareq) },
    Prim { name: "char<=", emit: PrimEmit::Binary(Emitter::charle) },
    Prim { name: "char<", emit: PrimEmit::Binary(Emitter::charlt) },
    Prim { name: "char>=", emit: PrimEmit::Binary(Emitter::charge) },
    Prim { name: "char>", emit: PrimEmit::Binary(Emitter::chargt) },
];

/// Exact-name lookup into the table.
pub fn lookup(name: &str) -> Option<&'static Prim> {
    PRIMITIVES.iter().find(|prim| prim.name == name)
}
