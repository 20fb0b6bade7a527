//! The code generator. Walks a checked AST and writes x86-64 assembly
//! (AT&T syntax, System V calling convention) into a growing buffer.
//!
//! The contract for every expression emitter: on exit the expression's
//! tagged value is in `%rax`. Temporaries spill to the stack at fixed
//! negative offsets from `%rsp`; `si` is the next free offset and only
//! ever grows while walking down the tree, so a child's scratch slots
//! never alias a slot the caller still cares about.

use crate::common::span::{Span, Spanned};
use crate::common::value::{
    Value, BOOL_MASK, BOOL_SHIFT, BOOL_TAG, CHAR_MASK, CHAR_SHIFT, CHAR_TAG, FALSE_CST, FX_MASK,
    FX_SHIFT, FX_TAG, NULL_CST, TRUE_CST,
};
use crate::compiler::ast::{Binding, Expr, LetKind};
use crate::compiler::env::Env;
use crate::compiler::labels::Labels;
use crate::compiler::prims::PrimEmit;
use crate::compiler::syntax::Syntax;
use crate::error::Error;

/// Stack slots are one machine word apart.
pub const WORD_BYTES: usize = 8;

#[cfg(any(target_os = "macos", target_os = "ios"))]
const SYMBOL_PREFIX: &str = "_";
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
const SYMBOL_PREFIX: &str = "";

macro_rules! asm {
    ($self:ident, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let _ = writeln!($self.out, $($arg)*);
    }};
}

/// Compiles a whole program to assembly text.
///
/// Two symbols come out: `L_scheme_entry` holds the compiled body, and
/// `scheme_entry` is the thunk the runtime calls. The thunk parks the
/// host stack pointer in `%rcx`, points `%rsp` at the dedicated stack
/// the runtime passes in `%rdi`, runs the body, and switches back.
pub fn emit_program(expr: &Spanned<Expr>, labels: &mut Labels) -> Result<String, Error> {
    let mut emitter = Emitter {
        out: String::new(),
        labels: std::mem::take(labels),
    };
    let result = emitter.program(expr);

    // hand the counter back so the next compilation in this process
    // keeps allocating fresh labels
    *labels = emitter.labels;
    result.map(|()| emitter.out)
}

pub struct Emitter {
    out: String,
    labels: Labels,
}

impl Emitter {
    fn program(&mut self, expr: &Spanned<Expr>) -> Result<(), Error> {
        let mut env = Env::new();

        self.prologue("L_scheme_entry");
        self.expr(expr, WORD_BYTES, &mut env)?;
        self.epilogue();

        self.prologue("scheme_entry");
        asm!(self, "    movq   %rsp, %rcx");
        asm!(self, "    movq   %rdi, %rsp");
        asm!(self, "    call   {}L_scheme_entry", SYMBOL_PREFIX);
        asm!(self, "    movq   %rcx, %rsp");
        self.epilogue();
        Ok(())
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    fn prologue(&mut self, name: &str) {
        asm!(self, "    .section __TEXT,__text,regular,pure_instructions");
        asm!(self, "    .globl {}{}", SYMBOL_PREFIX, name);
        asm!(self, "    .p2align 4, 0x90");
        asm!(self, "{}{}:", SYMBOL_PREFIX, name);
    }

    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    fn prologue(&mut self, name: &str) {
        asm!(self, "    .text");
        asm!(self, "    .globl {}{}", SYMBOL_PREFIX, name);
        asm!(self, "    .type {}{}, @function", SYMBOL_PREFIX, name);
        asm!(self, "{}{}:", SYMBOL_PREFIX, name);
    }

    fn epilogue(&mut self) {
        asm!(self, "    ret");
    }

    fn label(&mut self, label: &str) {
        asm!(self, "{}:", label);
    }

    /// Spills `%rax` to the stack slot at `si`.
    fn save(&mut self, si: usize) {
        asm!(self, "    movq   %rax, -{}(%rsp)", si);
    }

    fn expr(&mut self, expr: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        match &expr.item {
            Expr::Imm(value) => {
                self.imm(*value);
                Ok(())
            }
            Expr::Id(name) => self.identifier(name, &expr.span, env),
            Expr::If { cond, then, other } => self.conditional(cond, then, other, si, env),
            Expr::Let {
                kind,
                bindings,
                body,
            } => self.let_form(*kind, bindings, body, si, env),
            Expr::Seq(exprs) => self.seq(exprs, si, env),
            Expr::Unary { prim, arg } => match prim.emit {
                PrimEmit::Unary(emit) => emit(self, arg, si, env),
                PrimEmit::Binary(_) => unreachable!("binary emitter on unary call"),
            },
            Expr::Binary { prim, args } => match prim.emit {
                PrimEmit::Binary(emit) => emit(self, &args.0, &args.1, si, env),
                PrimEmit::Unary(_) => unreachable!("unary emitter on binary call"),
            },
        }
    }

    /// Loads an encoded constant into the result register. Constants
    /// that fit in 32 bits take the short form; `movl` into `%eax`
    /// zero-extends into the full register.
    fn imm(&mut self, value: Value) {
        let bits = value.bits();
        if bits > u32::MAX as u64 {
            asm!(self, "    movabsq ${}, %rax", bits);
        } else {
            asm!(self, "    movl ${}, %eax", bits);
        }
    }

    fn identifier(&mut self, name: &str, span: &Span, env: &Env) -> Result<(), Error> {
        match env.lookup(name) {
            Some(offset) => {
                asm!(self, "    movq   -{}(%rsp), %rax", offset);
                Ok(())
            }
            None => Err(Error::UnboundIdentifier(Syntax::error(
                &format!("`{}` is not bound here", name),
                span,
            ))),
        }
    }

    /// Only the literal `#f` takes the else branch; every other value,
    /// `0` and `()` included, counts as true.
    fn conditional(
        &mut self,
        cond: &Spanned<Expr>,
        then: &Spanned<Expr>,
        other: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        let else_label = self.labels.fresh();
        let end_label = self.labels.fresh();

        self.expr(cond, si, env)?;
        asm!(self, "    cmpq   ${}, %rax", FALSE_CST);
        asm!(self, "    je     {}", else_label);
        self.expr(then, si, env)?;
        asm!(self, "    jmp    {}", end_label);
        self.label(&else_label);
        self.expr(other, si, env)?;
        self.label(&end_label);
        Ok(())
    }

    fn let_form(
        &mut self,
        kind: LetKind,
        bindings: &[Binding],
        body: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        let mark = env.mark();
        let mut free_si = si;

        match kind {
            // Plain `let`: every right-hand side is emitted under the
            // incoming environment, so none of them can see this
            // form's bindings. The frames go in only once all the
            // initialisers have landed in their slots.
            LetKind::Plain => {
                let mut slots = Vec::with_capacity(bindings.len());
                for binding in bindings {
                    self.expr(&binding.init, free_si, env)?;
                    self.save(free_si);
                    slots.push((binding.name.item.as_str(), free_si));
                    free_si += WORD_BYTES;
                }
                for (name, offset) in slots {
                    env.push(name, offset);
                }
            }
            // `let*` extends the environment as it goes, so each
            // right-hand side sees all the earlier ones. `letrec`
            // compiles identically: without closures there is nothing
            // a recursive reference could mean.
            LetKind::Star | LetKind::Rec => {
                for binding in bindings {
                    self.expr(&binding.init, free_si, env)?;
                    self.save(free_si);
                    env.push(&binding.name.item, free_si);
                    free_si += WORD_BYTES;
                }
            }
        }

        self.expr(body, free_si, env)?;
        env.truncate(mark);
        Ok(())
    }

    fn seq(&mut self, exprs: &[Spanned<Expr>], si: usize, env: &mut Env) -> Result<(), Error> {
        for expr in exprs {
            self.expr(expr, si, env)?;
        }
        Ok(())
    }

    /// Turns the flags of a preceding compare into a tagged boolean.
    fn materialize_bool(&mut self) {
        asm!(self, "    sete   %al");
        asm!(self, "    movzbl %al, %eax");
        asm!(self, "    salq   ${}, %rax", BOOL_SHIFT);
        asm!(self, "    orq    ${}, %rax", BOOL_TAG);
    }

    /// The tail shared by every comparison primitive: compare `%rax`
    /// against the spilled left operand, then select between the two
    /// tagged boolean constants. `cmov` is the *false* condition.
    fn select_bool(&mut self, si: usize, cmov: &str) {
        asm!(self, "    cmpq   -{}(%rsp), %rax", si);
        asm!(self, "    movq   ${}, %rdx", FALSE_CST);
        asm!(self, "    movabsq ${}, %rax", TRUE_CST);
        asm!(self, "    cmov{} %rdx, %rax", cmov);
    }

    /// Binary comparison protocol: left operand to the scratch slot,
    /// right operand to `%rax`, optionally untag both by `shift`, then
    /// select a boolean.
    fn comparison(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
        shift: Option<u8>,
        cmov: &str,
    ) -> Result<(), Error> {
        self.expr(lhs, si, env)?;
        self.save(si);
        self.expr(rhs, si + WORD_BYTES, env)?;
        if let Some(shift) = shift {
            asm!(self, "    sarq   ${}, -{}(%rsp)", shift, si);
            asm!(self, "    sarq   ${}, %rax", shift);
        }
        self.select_bool(si, cmov);
        Ok(())
    }

    // Primitive emitters. Each assumes its arguments are ordinary
    // expressions and leaves a correctly tagged result in %rax; the
    // pre/post tag adjustments must stay in lockstep with the
    // common::value constants.

    pub fn fxadd1(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    addq   ${}, %rax", 1u64 << FX_SHIFT);
        Ok(())
    }

    pub fn fxsub1(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    subq   ${}, %rax", 1u64 << FX_SHIFT);
        Ok(())
    }

    pub fn fxzerop(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        // encoded zero is just the fixnum tag
        asm!(self, "    movl   ${}, %edx", FALSE_CST);
        asm!(self, "    cmpq   ${}, %rax", FX_TAG);
        asm!(self, "    movabsq ${}, %rax", TRUE_CST);
        asm!(self, "    cmovne %rdx, %rax");
        Ok(())
    }

    pub fn char_to_fixnum(
        &mut self,
        arg: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    sarq   ${}, %rax", CHAR_SHIFT);
        asm!(self, "    salq   ${}, %rax", FX_SHIFT);
        asm!(self, "    orq    ${}, %rax", FX_TAG);
        Ok(())
    }

    pub fn fixnum_to_char(
        &mut self,
        arg: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    sarq   ${}, %rax", FX_SHIFT);
        asm!(self, "    salq   ${}, %rax", CHAR_SHIFT);
        asm!(self, "    orq    ${}, %rax", CHAR_TAG);
        Ok(())
    }

    pub fn nullp(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    cmpq   ${}, %rax", NULL_CST);
        self.materialize_bool();
        Ok(())
    }

    /// `not` answers `#t` for `#f` and `#f` for everything else;
    /// of all the values only `#f` counts as false.
    pub fn not(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    movq   ${}, %rdx", FALSE_CST);
        asm!(self, "    cmpq   ${}, %rax", FALSE_CST);
        asm!(self, "    movabsq ${}, %rax", TRUE_CST);
        asm!(self, "    cmovne %rdx, %rax");
        Ok(())
    }

    pub fn fixnump(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    andq   ${}, %rax", FX_MASK);
        asm!(self, "    cmpq   ${}, %rax", FX_TAG);
        self.materialize_bool();
        Ok(())
    }

    pub fn booleanp(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    andq   ${}, %rax", BOOL_MASK);
        asm!(self, "    cmpq   ${}, %rax", BOOL_TAG);
        self.materialize_bool();
        Ok(())
    }

    pub fn charp(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        asm!(self, "    andq   ${}, %rax", CHAR_MASK);
        asm!(self, "    cmpq   ${}, %rax", CHAR_TAG);
        self.materialize_bool();
        Ok(())
    }

    pub fn fxlognot(&mut self, arg: &Spanned<Expr>, si: usize, env: &mut Env) -> Result<(), Error> {
        self.expr(arg, si, env)?;
        // the mask immediate must be the sign-extended 32-bit form,
        // the assembler rejects a 64-bit logical immediate
        asm!(self, "    notq   %rax");
        asm!(self, "    andq   ${}, %rax", !(FX_MASK as i64));
        asm!(self, "    orq    ${}, %rax", FX_TAG);
        Ok(())
    }

    /// Untag one operand and the sum comes out tagged: the fixnum tag
    /// survives addition as long as exactly one operand carries it.
    pub fn fxadd(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(lhs, si, env)?;
        asm!(self, "    xorq   ${}, %rax", FX_MASK);
        self.save(si);
        self.expr(rhs, si + WORD_BYTES, env)?;
        asm!(self, "    addq   -{}(%rsp), %rax", si);
        Ok(())
    }

    pub fn fxsub(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(lhs, si, env)?;
        asm!(self, "    sarq   ${}, %rax", FX_SHIFT);
        self.save(si);
        self.expr(rhs, si + WORD_BYTES, env)?;
        asm!(self, "    sarq   ${}, %rax", FX_SHIFT);
        asm!(self, "    movq   %rax, %r8");
        asm!(self, "    movq   -{}(%rsp), %rax", si);
        asm!(self, "    subq   %r8, %rax");
        asm!(self, "    salq   ${}, %rax", FX_SHIFT);
        asm!(self, "    orq    ${}, %rax", FX_TAG);
        Ok(())
    }

    pub fn fxmul(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(lhs, si, env)?;
        asm!(self, "    sarq   ${}, %rax", FX_SHIFT);
        self.save(si);
        self.expr(rhs, si + WORD_BYTES, env)?;
        asm!(self, "    sarq   ${}, %rax", FX_SHIFT);
        asm!(self, "    imulq  -{}(%rsp), %rax", si);
        asm!(self, "    salq   ${}, %rax", FX_SHIFT);
        asm!(self, "    orq    ${}, %rax", FX_TAG);
        Ok(())
    }

    /// Both operands keep their tags: the low bits agree, so the
    /// logical result is already correctly tagged.
    pub fn fxlogand(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(lhs, si, env)?;
        self.save(si);
        self.expr(rhs, si + WORD_BYTES, env)?;
        asm!(self, "    andq   -{}(%rsp), %rax", si);
        Ok(())
    }

    pub fn fxlogor(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.expr(lhs, si, env)?;
        self.save(si);
        self.expr(rhs, si + WORD_BYTES, env)?;
        asm!(self, "    orq    -{}(%rsp), %rax", si);
        Ok(())
    }

    pub fn fxeq(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, None, "ne")
    }

    // After the compare, %rax holds the right operand and the stack
    // slot the left, so the false-conditions read mirrored.

    pub fn fxlt(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(FX_SHIFT), "le")
    }

    pub fn fxle(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(FX_SHIFT), "l")
    }

    pub fn fxgt(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(FX_SHIFT), "ge")
    }

    pub fn fxge(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(FX_SHIFT), "g")
    }

    pub fn chareq(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, None, "ne")
    }

    pub fn charlt(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(CHAR_SHIFT), "le")
    }

    pub fn charle(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(CHAR_SHIFT), "l")
    }

    pub fn chargt(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(CHAR_SHIFT), "ge")
    }

    pub fn charge(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        si: usize,
        env: &mut Env,
    ) -> Result<(), Error> {
        self.comparison(lhs, rhs, si, env, Some(CHAR_SHIFT), "g")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::source::Source;
    use crate::compiler::parse;

    fn emit(src: &str) -> String {
        let ast = parse::parse_program(Source::source(src)).unwrap();
        emit_program(&ast, &mut Labels::new()).unwrap()
    }

    #[test]
    fn small_immediates_use_the_short_load() {
        let asm = emit("42");
        // 42 encodes to 85
        assert!(asm.contains("movl $85, %eax"));
        assert!(!asm.contains("movabsq $85,"));
    }

    #[test]
    fn wide_immediates_use_movabsq() {
        // #t = 0x400000004 does not fit in 32 bits
        assert!(emit("#t").contains(&format!("movabsq ${}, %rax", TRUE_CST)));
        // #f = 0x4 does
        assert!(emit("#f").contains("movl $4, %eax"));
    }

    #[test]
    fn entry_symbols_are_present() {
        let asm = emit("42");
        assert!(asm.contains("L_scheme_entry:"));
        assert!(asm.contains("\nscheme_entry:") || asm.contains("\n_scheme_entry:"));
        assert!(asm.contains("movq   %rsp, %rcx"));
        assert!(asm.contains("movq   %rdi, %rsp"));
    }

    #[test]
    fn conditional_tests_against_false_only() {
        let asm = emit("(if 0 1 2)");
        assert!(asm.contains(&format!("cmpq   ${}, %rax", FALSE_CST)));
        assert!(asm.contains("je     .Ljunco0"));
        assert!(asm.contains("jmp    .Ljunco1"));
        assert!(asm.contains(".Ljunco0:"));
        assert!(asm.contains(".Ljunco1:"));
    }

    #[test]
    fn nested_conditionals_get_fresh_labels() {
        let asm = emit("(if #t (if #f 1 2) 3)");
        for n in 0..4 {
            assert!(asm.contains(&format!(".Ljunco{}:", n)));
        }
    }

    #[test]
    fn binary_primitives_spill_below_the_parent() {
        // outer fx+ spills at -8, inner fx+ at -16
        let asm = emit("(fx+ 1 (fx+ 2 3))");
        assert!(asm.contains("movq   %rax, -8(%rsp)"));
        assert!(asm.contains("movq   %rax, -16(%rsp)"));
        assert!(asm.contains("addq   -8(%rsp), %rax"));
        assert!(asm.contains("addq   -16(%rsp), %rax"));
    }

    #[test]
    fn let_binds_successive_slots() {
        let asm = emit("(let ((x 10) (y 20)) (fx+ x y))");
        assert!(asm.contains("movq   %rax, -8(%rsp)"));
        assert!(asm.contains("movq   %rax, -16(%rsp)"));
        // the body loads both bindings back
        assert!(asm.contains("movq   -8(%rsp), %rax"));
        assert!(asm.contains("movq   -16(%rsp), %rax"));
    }

    #[test]
    fn let_spill_does_not_alias_bindings() {
        // the fx+ inside the body must scratch at -24, past both slots
        let asm = emit("(let ((x 1) (y 2)) (fx+ x y))");
        assert!(asm.contains("movq   %rax, -24(%rsp)"));
    }

    #[test]
    fn unbound_identifier_is_a_compile_error() {
        let ast = parse::parse_program(Source::source("(let ((x 1)) y)")).unwrap();
        let result = emit_program(&ast, &mut Labels::new());
        assert!(matches!(result, Err(Error::UnboundIdentifier(_))));
    }

    #[test]
    fn plain_let_initialisers_cannot_see_new_bindings() {
        let ast =
            parse::parse_program(Source::source("(let ((x 1) (y x)) y)")).unwrap();
        let result = emit_program(&ast, &mut Labels::new());
        assert!(matches!(result, Err(Error::UnboundIdentifier(_))));
    }

    #[test]
    fn let_star_initialisers_see_earlier_bindings() {
        let ast =
            parse::parse_program(Source::source("(let* ((x 1) (y x)) y)")).unwrap();
        assert!(emit_program(&ast, &mut Labels::new()).is_ok());
    }

    #[test]
    fn letrec_compiles_like_let_star() {
        let star = emit("(let* ((x 1) (y x)) y)");
        let rec = emit("(letrec ((x 1) (y x)) y)");
        assert_eq!(star, rec);
    }

    #[test]
    fn comparison_untags_before_comparing() {
        let asm = emit("(fx< 3 5)");
        assert!(asm.contains("sarq   $1, -8(%rsp)"));
        assert!(asm.contains("sarq   $1, %rax"));
        assert!(asm.contains("cmovle %rdx, %rax"));
    }

    #[test]
    fn char_comparison_uses_the_char_shift() {
        let asm = emit("(char< #\\a #\\b)");
        assert!(asm.contains("sarq   $2, -8(%rsp)"));
    }

    #[test]
    fn seq_emits_in_source_order() {
        let asm = emit("1 2 3");
        let first = asm.find("movl $3, %eax").unwrap();
        let second = asm.find("movl $5, %eax").unwrap();
        let third = asm.find("movl $7, %eax").unwrap();
        assert!(first < second && second < third);
    }
}
