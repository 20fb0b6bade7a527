//! A recursive-descent parser over a string cursor.
//!
//! Every sub-parser follows the same contract: try to parse its
//! production, and either advance the cursor and succeed, or put the
//! cursor back exactly where it was and report `Ok(None)` so the
//! caller can try an alternative. Once a production has committed
//! (say, `(if` has been consumed), failure is no longer speculative
//! and surfaces as a hard `Err` that aborts the compilation.

use std::rc::Rc;

use crate::common::source::Source;
use crate::common::span::{Span, Spanned};
use crate::common::value::{Value, CHAR_NAMES, FX_MAX, FX_MIN};
use crate::compiler::ast::{Binding, Expr, LetKind};
use crate::compiler::prims;
use crate::compiler::syntax::Syntax;
use crate::error::Error;

/// `Ok(None)` is a speculative failure: nothing consumed, the caller
/// may try something else. `Err` is fatal.
type Parsed<T> = Result<Option<T>, Error>;

/// Parses a whole program: one or more commands, then end of input.
pub fn parse_program(source: Rc<Source>) -> Result<Spanned<Expr>, Error> {
    Parser::new(source).program()
}

/// Parses exactly one expression followed by end of input
/// (the `-e` evaluation surface).
pub fn parse_expression(source: Rc<Source>) -> Result<Spanned<Expr>, Error> {
    Parser::new(source).single_expression()
}

struct Parser {
    source: Rc<Source>,
    index: usize,
}

impl Parser {
    fn new(source: Rc<Source>) -> Parser {
        Parser { source, index: 0 }
    }

    fn program(&mut self) -> Result<Spanned<Expr>, Error> {
        self.strip();
        let first = self.require_expression("expected an expression")?;
        let mut commands = vec![first];

        self.strip();
        while let Some(command) = self.expression()? {
            commands.push(command);
            self.strip();
        }
        self.end_of_input()?;

        let span = Span::combine(
            &commands[0].span,
            &commands[commands.len() - 1].span,
        );
        Ok(Spanned::new(Expr::Seq(commands), span))
    }

    fn single_expression(&mut self) -> Result<Spanned<Expr>, Error> {
        self.strip();
        let expr = self.require_expression("expected an expression")?;
        self.strip();
        self.end_of_input()?;
        Ok(expr)
    }

    // cursor plumbing

    fn rest(&self) -> &str {
        &self.source.contents[self.index..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.index += c.len_utf8();
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.index += s.len();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and `;`-to-end-of-line comments; comments
    /// behave exactly like whitespace. Reaches a fixpoint, so calling
    /// it twice in a row never moves the cursor further.
    fn strip(&mut self) {
        loop {
            let before = self.index;
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.bump();
            }
            if self.peek() == Some(';') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            }
            if self.index == before {
                break;
            }
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(&self.source, start, self.index - start)
    }

    fn fail(&self, reason: &str) -> Error {
        Error::Parse(Syntax::error(
            reason,
            &Span::point(&self.source, self.index),
        ))
    }

    fn fail_at(&self, start: usize, reason: &str) -> Error {
        Error::Parse(Syntax::error(reason, &self.span_from(start)))
    }

    fn expect(&mut self, c: char, reason: &str) -> Result<(), Error> {
        if self.eat_char(c) {
            Ok(())
        } else {
            Err(self.fail(reason))
        }
    }

    fn end_of_input(&mut self) -> Result<(), Error> {
        if self.index < self.source.contents.len() {
            Err(self.fail("unexpected trailing input"))
        } else {
            Ok(())
        }
    }

    fn require_expression(&mut self, reason: &str) -> Result<Spanned<Expr>, Error> {
        match self.expression()? {
            Some(expr) => Ok(expr),
            None => Err(self.fail(reason)),
        }
    }

    // productions

    fn expression(&mut self) -> Parsed<Spanned<Expr>> {
        if let Some(imm) = self.immediate()? {
            return Ok(Some(imm));
        }
        if let Some(id) = self.identifier()? {
            let span = id.span.clone();
            return Ok(Some(Spanned::new(Expr::Id(id.item), span)));
        }
        self.compound()
    }

    /// `immediate ::= fixnum | boolean | () | character`
    fn immediate(&mut self) -> Parsed<Spanned<Expr>> {
        if let Some(imm) = self.fixnum()? {
            return Ok(Some(imm));
        }
        if let Some(imm) = self.boolean() {
            return Ok(Some(imm));
        }
        if let Some(imm) = self.null() {
            return Ok(Some(imm));
        }
        self.character()
    }

    fn imm_node(&self, start: usize, value: Value) -> Spanned<Expr> {
        Spanned::new(Expr::Imm(value), self.span_from(start))
    }

    fn fixnum(&mut self) -> Parsed<Spanned<Expr>> {
        let start = self.index;

        if matches!(self.peek(), Some('+') | Some('-')) {
            self.bump();
        }
        let digits = self.index;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.index == digits {
            self.index = start;
            return Ok(None);
        }

        let text = &self.source.contents[start..self.index];
        match text.parse::<i64>() {
            Ok(n) if (FX_MIN..=FX_MAX).contains(&n) => {
                Ok(Some(self.imm_node(start, Value::fixnum(n))))
            }
            _ => Err(self.fail_at(start, "fixnum literal out of range")),
        }
    }

    fn boolean(&mut self) -> Option<Spanned<Expr>> {
        let start = self.index;
        if self.eat_str("#t") {
            Some(self.imm_node(start, Value::boolean(true)))
        } else if self.eat_str("#f") {
            Some(self.imm_node(start, Value::boolean(false)))
        } else {
            None
        }
    }

    fn null(&mut self) -> Option<Spanned<Expr>> {
        let start = self.index;
        if self.eat_str("()") {
            Some(self.imm_node(start, Value::null()))
        } else {
            None
        }
    }

    /// `#\<name>` for the nine named characters, else `#\c` for any
    /// ASCII `c`. Named forms win, so `#\newline` is a newline while
    /// `#\n` is the letter n.
    fn character(&mut self) -> Parsed<Spanned<Expr>> {
        let start = self.index;
        if !self.eat_str("#\\") {
            return Ok(None);
        }

        for (name, code) in CHAR_NAMES {
            if self.eat_str(name) {
                return Ok(Some(self.imm_node(start, Value::character(*code))));
            }
        }

        match self.peek() {
            Some(c) if c.is_ascii() => {
                self.bump();
                Ok(Some(self.imm_node(start, Value::character(c as u8))))
            }
            _ => Err(self.fail_at(start, "unsupported character literal")),
        }
    }

    /// ```plain
    /// identifier ::= initial subsequent*
    ///              | '|' symbol-element* '|'
    ///              | peculiar-identifier
    /// ```
    /// The verbatim `|...|` form keeps its bars and escapes, byte for
    /// byte; two spellings name the same binding only if they are the
    /// same bytes.
    fn identifier(&mut self) -> Parsed<Spanned<String>> {
        let start = self.index;

        if let Some(c) = self.peek() {
            if is_initial(c) {
                self.bump();
                while matches!(self.peek(), Some(c) if is_subsequent(c)) {
                    self.bump();
                }
                return Ok(Some(self.name_from(start)));
            }

            if c == '|' {
                self.bump();
                while self.symbol_element() {}
                if self.eat_char('|') {
                    return Ok(Some(self.name_from(start)));
                }
                self.index = start;
                return Ok(None);
            }
        }

        if self.peculiar_identifier() {
            return Ok(Some(self.name_from(start)));
        }

        self.index = start;
        Ok(None)
    }

    fn name_from(&self, start: usize) -> Spanned<String> {
        Spanned::new(
            self.source.contents[start..self.index].to_string(),
            self.span_from(start),
        )
    }

    /// One element between the bars of a `|...|` identifier: any
    /// character except `|` and `\`, or `\|`, or an inline hex escape
    /// `\xH+`, or one of the mnemonic escapes `\a \b \t \n \r`.
    fn symbol_element(&mut self) -> bool {
        match self.peek() {
            None | Some('|') => false,
            Some('\\') => {
                let start = self.index;
                self.bump();
                match self.peek() {
                    Some('|') => {
                        self.bump();
                        true
                    }
                    Some('a') | Some('b') | Some('t') | Some('n') | Some('r') => {
                        self.bump();
                        true
                    }
                    Some('x') => {
                        self.bump();
                        let digits = self.index;
                        while matches!(self.peek(), Some(c) if is_hex_digit(c)) {
                            self.bump();
                        }
                        if self.index == digits {
                            self.index = start;
                            false
                        } else {
                            true
                        }
                    }
                    _ => {
                        self.index = start;
                        false
                    }
                }
            }
            Some(_) => {
                self.bump();
                true
            }
        }
    }

    /// ```plain
    /// peculiar-identifier ::= sign sign-subsequent subsequent*
    ///                       | sign '.' dot-subsequent subsequent*
    ///                       | '.' dot-subsequent subsequent*
    ///                       | sign
    /// ```
    fn peculiar_identifier(&mut self) -> bool {
        let start = self.index;

        if matches!(self.peek(), Some(c) if is_explicit_sign(c)) {
            self.bump();

            if matches!(self.peek(), Some(c) if is_sign_subsequent(c)) {
                self.bump();
                while matches!(self.peek(), Some(c) if is_subsequent(c)) {
                    self.bump();
                }
                return true;
            }

            if self.peek() == Some('.') {
                self.bump();
                if matches!(self.peek(), Some(c) if is_dot_subsequent(c)) {
                    self.bump();
                    while matches!(self.peek(), Some(c) if is_subsequent(c)) {
                        self.bump();
                    }
                    return true;
                }
                // just the sign after all
                self.index = start;
                self.bump();
                return true;
            }

            // a lone sign is an identifier
            return true;
        }

        if self.peek() == Some('.') {
            self.bump();
            if matches!(self.peek(), Some(c) if is_dot_subsequent(c)) {
                self.bump();
                while matches!(self.peek(), Some(c) if is_subsequent(c)) {
                    self.bump();
                }
                return true;
            }
            self.index = start;
        }

        false
    }

    /// A parenthesised form: `if`, one of the `let` family, or a
    /// procedure call. The keyword decides, and once it has been read
    /// the production is committed.
    fn compound(&mut self) -> Parsed<Spanned<Expr>> {
        let start = self.index;
        if !self.eat_char('(') {
            return Ok(None);
        }
        self.strip();

        if let Some(id) = self.identifier()? {
            return match id.item.as_str() {
                "if" => self.if_form(start).map(Some),
                "let" => self.let_form(start, LetKind::Plain).map(Some),
                "let*" => self.let_form(start, LetKind::Star).map(Some),
                "letrec" => self.let_form(start, LetKind::Rec).map(Some),
                _ => self.procedure_call(start, id).map(Some),
            };
        }

        // the grammar admits any expression in operator position, but
        // only a primitive identifier can actually be called
        if let Some(operator) = self.expression()? {
            return Err(Error::UnknownPrimitive(Syntax::error(
                "operator does not name a primitive",
                &operator.span,
            )));
        }
        Err(self.fail("expected an operator"))
    }

    fn if_form(&mut self, start: usize) -> Result<Spanned<Expr>, Error> {
        self.strip();
        let cond = self.require_expression("expected a condition after `if`")?;
        self.strip();
        let then = self.require_expression("expected a consequent in `if`")?;
        self.strip();
        let other = self.require_expression("expected an alternative in `if`")?;
        self.strip();
        self.expect(')', "expected `)` to close `if`")?;

        Ok(Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                then: Box::new(then),
                other: Box::new(other),
            },
            self.span_from(start),
        ))
    }

    fn let_form(&mut self, start: usize, kind: LetKind) -> Result<Spanned<Expr>, Error> {
        self.strip();
        self.expect('(', "expected a binding list")?;

        let mut bindings = vec![];
        loop {
            self.strip();
            if self.eat_char(')') {
                break;
            }
            bindings.push(self.binding()?);
        }

        self.strip();
        let body = self.body()?;
        self.strip();
        self.expect(')', "expected `)` to close the binding form")?;

        Ok(Spanned::new(
            Expr::Let {
                kind,
                bindings,
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    /// `binding ::= ( identifier expression )`
    fn binding(&mut self) -> Result<Binding, Error> {
        self.expect('(', "expected a binding")?;
        self.strip();
        let name = match self.identifier()? {
            Some(name) => name,
            None => return Err(self.fail("expected an identifier to bind")),
        };
        self.strip();
        let init = self.require_expression("expected an expression to bind")?;
        self.strip();
        self.expect(')', "expected `)` to close the binding")?;

        Ok(Binding { name, init })
    }

    /// `body ::= expression+`, wrapped in a sequence node.
    fn body(&mut self) -> Result<Spanned<Expr>, Error> {
        let first = self.require_expression("expected a body")?;
        let mut exprs = vec![first];

        self.strip();
        while let Some(expr) = self.expression()? {
            exprs.push(expr);
            self.strip();
        }

        let span = Span::combine(&exprs[0].span, &exprs[exprs.len() - 1].span);
        Ok(Spanned::new(Expr::Seq(exprs), span))
    }

    fn procedure_call(
        &mut self,
        start: usize,
        operator: Spanned<String>,
    ) -> Result<Spanned<Expr>, Error> {
        let prim = prims::lookup(&operator.item).ok_or_else(|| {
            Error::UnknownPrimitive(Syntax::error(
                &format!("`{}` is not a known primitive", operator.item),
                &operator.span,
            ))
        })?;

        self.strip();
        let mut operands = vec![];
        while let Some(operand) = self.expression()? {
            operands.push(operand);
            self.strip();
        }
        self.expect(')', "expected `)` to close the call")?;

        if operands.len() != prim.arity() {
            return Err(Error::ArityMismatch(Syntax::error(
                &format!(
                    "`{}` expects {} argument{}, got {}",
                    prim.name,
                    prim.arity(),
                    if prim.arity() == 1 { "" } else { "s" },
                    operands.len()
                ),
                &self.span_from(start),
            )));
        }

        let span = self.span_from(start);
        let expr = match prim.arity() {
            1 => Expr::Unary {
                prim,
                arg: Box::new(operands.pop().expect("one operand")),
            },
            _ => {
                let rhs = operands.pop().expect("two operands");
                let lhs = operands.pop().expect("two operands");
                Expr::Binary {
                    prim,
                    args: Box::new((lhs, rhs)),
                }
            }
        };
        Ok(Spanned::new(expr, span))
    }
}

// character classes of the identifier grammar

fn is_initial(c: char) -> bool {
    c.is_ascii_alphabetic() || "!$%&*/:<=>?^_~".contains(c)
}

fn is_explicit_sign(c: char) -> bool {
    c == '+' || c == '-'
}

fn is_subsequent(c: char) -> bool {
    is_initial(c) || c.is_ascii_digit() || is_explicit_sign(c) || c == '.' || c == '@'
}

fn is_sign_subsequent(c: char) -> bool {
    is_initial(c) || is_explicit_sign(c) || c == '@'
}

fn is_dot_subsequent(c: char) -> bool {
    is_sign_subsequent(c) || c == '.'
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_digit() || ('a'..='f').contains(&c)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    fn parse(src: &str) -> Result<Spanned<Expr>, Error> {
        parse_program(Source::source(src))
    }

    /// Unwraps the single command of a program.
    fn parse_one(src: &str) -> Expr {
        match parse(src).unwrap().item {
            Expr::Seq(mut exprs) if exprs.len() == 1 => exprs.pop().unwrap().item,
            other => other,
        }
    }

    #[test]
    fn immediates() {
        assert_eq!(parse_one("42"), Expr::Imm(Value::fixnum(42)));
        assert_eq!(parse_one("-273"), Expr::Imm(Value::fixnum(-273)));
        assert_eq!(parse_one("+7"), Expr::Imm(Value::fixnum(7)));
        assert_eq!(parse_one("#t"), Expr::Imm(Value::boolean(true)));
        assert_eq!(parse_one("#f"), Expr::Imm(Value::boolean(false)));
        assert_eq!(parse_one("()"), Expr::Imm(Value::null()));
        assert_eq!(parse_one("#\\A"), Expr::Imm(Value::character(b'A')));
        assert_eq!(parse_one("#\\newline"), Expr::Imm(Value::character(b'\n')));
        assert_eq!(parse_one("#\\space"), Expr::Imm(Value::character(b' ')));
        assert_eq!(parse_one("#\\n"), Expr::Imm(Value::character(b'n')));
    }

    #[test]
    fn fixnum_range() {
        assert_eq!(
            parse_one(&FX_MAX.to_string()),
            Expr::Imm(Value::fixnum(FX_MAX))
        );
        assert_eq!(
            parse_one(&FX_MIN.to_string()),
            Expr::Imm(Value::fixnum(FX_MIN))
        );
        assert!(matches!(
            parse(&(FX_MAX as i128 + 1).to_string()),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn printed_immediates_parse_back() {
        let values = [
            Value::fixnum(0),
            Value::fixnum(42),
            Value::fixnum(-7),
            Value::boolean(true),
            Value::boolean(false),
            Value::null(),
            Value::character(b'x'),
            Value::character(b'\n'),
            Value::character(0x7f),
            Value::character(b' '),
            Value::character(0x07),
        ];
        for value in values {
            assert_eq!(
                parse_one(&value.to_string()),
                Expr::Imm(value),
                "value printed as {}",
                value
            );
        }
    }

    #[test]
    fn identifiers() {
        assert_eq!(parse_one("hello"), Expr::Id("hello".to_string()));
        assert_eq!(parse_one("fx"), Expr::Id("fx".to_string()));
        assert_eq!(parse_one("x->y?"), Expr::Id("x->y?".to_string()));
        assert_eq!(parse_one("+"), Expr::Id("+".to_string()));
        assert_eq!(parse_one("-"), Expr::Id("-".to_string()));
        assert_eq!(parse_one("..."), Expr::Id("...".to_string()));
        assert_eq!(parse_one("+soup+"), Expr::Id("+soup+".to_string()));
        assert_eq!(
            parse_one("|two words|"),
            Expr::Id("|two words|".to_string())
        );
        assert_eq!(
            parse_one("|bar\\|bar|"),
            Expr::Id("|bar\\|bar|".to_string())
        );
        assert_eq!(parse_one("|\\x6a|"), Expr::Id("|\\x6a|".to_string()));
    }

    #[test]
    fn whitespace_and_comments_are_skipped() {
        let expr = parse_one("  ; leading comment\n  42 ; trailing comment");
        assert_eq!(expr, Expr::Imm(Value::fixnum(42)));
    }

    #[test]
    fn strip_is_idempotent() {
        let mut parser = Parser::new(Source::source("   ; comment\n\t  42"));
        parser.strip();
        let after_first = parser.index;
        parser.strip();
        assert_eq!(parser.index, after_first);
    }

    #[test]
    fn conditional() {
        match parse_one("(if #f 1 2)") {
            Expr::If { cond, then, other } => {
                assert_eq!(cond.item, Expr::Imm(Value::boolean(false)));
                assert_eq!(then.item, Expr::Imm(Value::fixnum(1)));
                assert_eq!(other.item, Expr::Imm(Value::fixnum(2)));
            }
            other => panic!("expected an if, got {:?}", other),
        }
    }

    #[test]
    fn let_family() {
        for (src, kind) in [
            ("(let ((x 1)) x)", LetKind::Plain),
            ("(let* ((x 1)) x)", LetKind::Star),
            ("(letrec ((x 1)) x)", LetKind::Rec),
        ] {
            match parse_one(src) {
                Expr::Let { kind: parsed, bindings, body } => {
                    assert_eq!(parsed, kind);
                    assert_eq!(bindings.len(), 1);
                    assert_eq!(bindings[0].name.item, "x");
                    assert!(matches!(body.item, Expr::Seq(_)));
                }
                other => panic!("expected a let, got {:?}", other),
            }
        }
    }

    #[test]
    fn let_body_is_a_sequence() {
        match parse_one("(let ((x 1)) 10 20 x)") {
            Expr::Let { body, .. } => match body.item {
                Expr::Seq(exprs) => assert_eq!(exprs.len(), 3),
                other => panic!("expected a sequence body, got {:?}", other),
            },
            other => panic!("expected a let, got {:?}", other),
        }
    }

    #[test]
    fn empty_binding_list() {
        assert!(matches!(parse_one("(let () 5)"), Expr::Let { .. }));
    }

    #[test]
    fn procedure_calls() {
        match parse_one("(fxadd1 41)") {
            Expr::Unary { prim, arg } => {
                assert_eq!(prim.name, "fxadd1");
                assert_eq!(arg.item, Expr::Imm(Value::fixnum(41)));
            }
            other => panic!("expected a unary call, got {:?}", other),
        }

        match parse_one("(fx+ 3 4)") {
            Expr::Binary { prim, args } => {
                assert_eq!(prim.name, "fx+");
                assert_eq!(args.0.item, Expr::Imm(Value::fixnum(3)));
                assert_eq!(args.1.item, Expr::Imm(Value::fixnum(4)));
            }
            other => panic!("expected a binary call, got {:?}", other),
        }
    }

    #[test]
    fn a_program_is_a_command_sequence() {
        match parse("1 2 3").unwrap().item {
            Expr::Seq(exprs) => assert_eq!(exprs.len(), 3),
            other => panic!("expected a sequence, got {:?}", other),
        }
    }

    #[test]
    fn arity_mismatch() {
        assert!(matches!(parse("(fx+ 1)"), Err(Error::ArityMismatch(_))));
        assert!(matches!(parse("(fxadd1 1 2)"), Err(Error::ArityMismatch(_))));
        assert!(matches!(parse("(not)"), Err(Error::ArityMismatch(_))));
    }

    #[test]
    fn unknown_primitive() {
        assert!(matches!(parse("(foo 1 2)"), Err(Error::UnknownPrimitive(_))));
        // a non-identifier operator cannot name a primitive either
        assert!(matches!(parse("(42 1)"), Err(Error::UnknownPrimitive(_))));
    }

    #[test]
    fn committed_failures_are_parse_errors() {
        assert!(matches!(parse("(if 1 2"), Err(Error::Parse(_))));
        assert!(matches!(parse("(let ((x 1) x)"), Err(Error::Parse(_))));
        assert!(matches!(parse("(let ((x)) x)"), Err(Error::Parse(_))));
        assert!(matches!(parse("("), Err(Error::Parse(_))));
    }

    #[test]
    fn trailing_garbage_fails_in_both_modes() {
        assert!(matches!(parse("42)"), Err(Error::Parse(_))));
        assert!(matches!(
            parse_expression(Source::source("42 43")),
            Err(Error::Parse(_))
        ));
        // trailing whitespace and comments are fine
        assert!(parse("42  ; done\n").is_ok());
        assert!(parse_expression(Source::source("42  ; done\n")).is_ok());
    }

    #[test]
    fn empty_input_fails() {
        assert!(matches!(parse(""), Err(Error::Parse(_))));
        assert!(matches!(parse("; just a comment"), Err(Error::Parse(_))));
    }

    proptest! {
        #[test]
        fn doesnt_crash(s in "\\PC*") {
            let _ = parse_program(Source::source(&s));
        }

        #[test]
        fn fixnums_in_range_parse(n in FX_MIN..=FX_MAX) {
            prop_assert_eq!(parse_one(&n.to_string()), Expr::Imm(Value::fixnum(n)));
        }
    }
}
