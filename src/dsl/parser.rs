//! Parser for the Oort language.
//!
//! Recursive descent for statements, dispatched on the leading keyword;
//! precedence climbing for expressions. A bare identifier followed by `=`
//! starts an assignment, anything else must be a call statement.

use std::path::PathBuf;
use std::rc::Rc;

use super::ast::*;
use super::error::CompileError;
use super::token::{Token, TokenKind};

/// Binding power of a call's `(`, above every binary operator.
const CALL_PRECEDENCE: u8 = 5;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    path: PathBuf,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, path: impl Into<PathBuf>) -> Self {
        Self {
            tokens,
            pos: 0,
            path: path.into(),
        }
    }

    pub fn parse(&mut self) -> Result<Module, CompileError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.check(TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
        }

        Ok(Module::new(self.path.clone(), statements))
    }

    fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
        let (line, col) = (self.peek().line, self.peek().col);

        let kind = match &self.peek().kind {
            TokenKind::From => self.parse_import()?,
            TokenKind::Fn => self.parse_function()?,
            TokenKind::Macro => self.parse_macro()?,
            TokenKind::On => self.parse_on_block()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Var => {
                self.advance();
                self.parse_assignment()?
            }
            TokenKind::Ident(_) if self.peek_next_kind() == Some(&TokenKind::Eq) => {
                self.parse_assignment()?
            }
            _ => self.parse_call_statement()?,
        };

        Ok(Stmt::new(kind, line, col))
    }

    /// `from "path" import * | name [as alias], ...`
    fn parse_import(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::From, "expected 'from'")?;
        let source = self.expect_string("expected a file path string after 'from'")?;
        self.expect(TokenKind::Import, "expected 'import'")?;

        if self.check(TokenKind::Star) {
            self.advance();
            return Ok(StmtKind::Import(ImportStmt {
                source,
                items: ImportItems::Wildcard,
            }));
        }

        let mut items = Vec::new();
        loop {
            let name = self.expect_ident("expected an identifier to import")?;
            let alias = if self.check(TokenKind::As) {
                self.advance();
                Some(self.expect_ident("expected an alias after 'as'")?)
            } else {
                None
            };
            items.push(ImportItem { name, alias });
            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(StmtKind::Import(ImportStmt {
            source,
            items: ImportItems::Named(items),
        }))
    }

    fn parse_function(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::Fn, "expected 'fn'")?;
        let name = self.expect_ident("expected function name")?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(StmtKind::Function(FunctionDecl { name, params, body }))
    }

    fn parse_macro(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::Macro, "expected 'macro'")?;
        let name = self.expect_ident("expected macro name")?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(StmtKind::Macro(Rc::new(MacroDecl { name, params, body })))
    }

    fn parse_params(&mut self) -> Result<Vec<String>, CompileError> {
        self.expect(TokenKind::LParen, "expected '(' after name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_ident("expected parameter name")?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameters")?;
        Ok(params)
    }

    fn parse_on_block(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::On, "expected 'on'")?;
        let event = match self.peek().kind {
            TokenKind::Load => Event::Load,
            TokenKind::Tick => Event::Tick,
            _ => return Err(self.error_here("expected 'load' or 'tick'")),
        };
        self.advance();
        let body = self.parse_block()?;
        Ok(StmtKind::On(OnBlock { event, body }))
    }

    fn parse_if(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::If, "expected 'if'")?;
        let condition = self.parse_expression(0)?;
        let then_block = self.parse_block()?;
        let else_block = if self.check(TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(StmtKind::If(IfStmt {
            condition,
            then_block,
            else_block,
        }))
    }

    /// `for entity e in @a { ... }`
    fn parse_for(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::For, "expected 'for'")?;
        let kind = self.expect_ident("expected element kind in for loop")?;
        let var = self.expect_ident("expected variable name in for loop")?;
        self.expect(TokenKind::In, "expected 'in' in for loop")?;
        let iterable = self.parse_expression(0)?;
        let body = self.parse_block()?;
        Ok(StmtKind::For(ForStmt {
            kind,
            var,
            iterable,
            body,
        }))
    }

    fn parse_while(&mut self) -> Result<StmtKind, CompileError> {
        self.expect(TokenKind::While, "expected 'while'")?;
        let condition = self.parse_expression(0)?;
        let body = self.parse_block()?;
        Ok(StmtKind::While(WhileStmt { condition, body }))
    }

    fn parse_assignment(&mut self) -> Result<StmtKind, CompileError> {
        let target = self.expect_ident("expected variable name")?;
        self.expect(TokenKind::Eq, "expected '=' in assignment")?;
        let value = self.parse_expression(0)?;
        self.skip_semicolon();
        Ok(StmtKind::Assign(Assignment { target, value }))
    }

    fn parse_call_statement(&mut self) -> Result<StmtKind, CompileError> {
        let start = self.pos;
        match self.parse_expression(0)? {
            Expr::Call(call) => {
                self.skip_semicolon();
                Ok(StmtKind::Call(call))
            }
            _ => {
                // Point at the statement's first token, not wherever the expression stopped.
                self.pos = start;
                Err(self.error_here("invalid statement, expected a function call"))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Block, CompileError> {
        self.expect(TokenKind::LBrace, "expected '{' to start a block")?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.check(TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace, "expected '}' to end a block")?;
        Ok(Block::new(statements))
    }

    // --- Expressions ---

    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expr, CompileError> {
        let mut left = self.parse_primary()?;

        while !self.is_at_end() && min_precedence < self.infix_precedence() {
            left = if self.check(TokenKind::LParen) {
                self.parse_call(left)?
            } else {
                let op = self.binary_op().ok_or_else(|| self.error_here("expected operator"))?;
                self.advance();
                let right = self.parse_expression(op.precedence())?;
                Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                }
            };
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let expr = match &self.peek().kind {
            TokenKind::Ident(name) => Expr::Ident(name.clone()),
            TokenKind::Integer(value) => Expr::Int(*value),
            TokenKind::Str(value) => Expr::Str(value.clone()),
            TokenKind::Selector(value) => Expr::Str(value.clone()),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(0)?;
                self.expect(TokenKind::RParen, "expected ')' after expression")?;
                if self.check(TokenKind::LParen) {
                    return Err(self.error_here("expected a function name before '('"));
                }
                return Ok(inner);
            }
            _ => return Err(self.error_here("expected an expression")),
        };
        self.advance();
        Ok(expr)
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, CompileError> {
        let callee = match callee {
            Expr::Ident(name) => name,
            _ => return Err(self.error_here("expected a function name before '('")),
        };
        self.expect(TokenKind::LParen, "expected '(' to start a call")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression(0)?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after arguments")?;
        Ok(Expr::Call(CallExpr { callee, args }))
    }

    fn binary_op(&self) -> Option<BinOp> {
        let op = match self.peek().kind {
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::NotEq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::LtEq,
            TokenKind::GtEq => BinOp::GtEq,
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            _ => return None,
        };
        Some(op)
    }

    /// Precedence of the token in infix position; 0 ends the expression.
    fn infix_precedence(&self) -> u8 {
        if self.check(TokenKind::LParen) {
            CALL_PRECEDENCE
        } else {
            self.binary_op().map_or(0, BinOp::precedence)
        }
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end()
            && std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind)
    }

    fn skip_semicolon(&mut self) {
        if self.check(TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<(), CompileError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here(message)),
        }
    }

    fn expect_string(&mut self, message: &str) -> Result<String, CompileError> {
        match &self.peek().kind {
            TokenKind::Str(value) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.error_here(message)),
        }
    }

    fn error_here(&self, message: &str) -> CompileError {
        let t = self.peek();
        let err = CompileError::parse(message, t.line, t.col).in_file(&self.path);
        if t.kind == TokenKind::Eof {
            err
        } else {
            err.near(t.text.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;

    fn parse(src: &str) -> Result<Module, CompileError> {
        crate::dsl::Compiler::parse(std::path::Path::new("test.oort"), src)
    }

    fn first(src: &str) -> StmtKind {
        parse(src).unwrap().statements.remove(0).kind
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn parse_empty_module() {
        let module = parse("").unwrap();
        assert!(module.statements.is_empty());
        assert_eq!(module.path, PathBuf::from("test.oort"));
    }

    #[test]
    fn parse_function_declaration() {
        let StmtKind::Function(f) = first("fn greet(who, times) { say(who) }") else {
            panic!("expected function");
        };
        assert_eq!(f.name, "greet");
        assert_eq!(f.params, vec!["who", "times"]);
        assert_eq!(f.body.statements.len(), 1);
    }

    #[test]
    fn parse_macro_declaration() {
        let StmtKind::Macro(m) = first("macro twice(x) { say(x); say(x); }") else {
            panic!("expected macro");
        };
        assert_eq!(m.name, "twice");
        assert_eq!(m.params, vec!["x"]);
        assert_eq!(m.body.statements.len(), 2);
    }

    #[test]
    fn parse_on_blocks() {
        let module = parse("on load { say(1) }\non tick { }").unwrap();
        assert!(module.has_event(Event::Load));
        assert!(module.has_event(Event::Tick));
    }

    #[test]
    fn parse_imports() {
        let StmtKind::Import(import) = first(r#"from "lib/util.oort" import a, b as c"#) else {
            panic!("expected import");
        };
        assert_eq!(import.source, "lib/util.oort");
        let ImportItems::Named(items) = import.items else {
            panic!("expected named items");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].local_name(), "a");
        assert_eq!(items[1].name, "b");
        assert_eq!(items[1].local_name(), "c");

        let StmtKind::Import(star) = first(r#"from "x.oort" import *"#) else {
            panic!("expected import");
        };
        assert_eq!(star.items, ImportItems::Wildcard);
    }

    #[test]
    fn parse_if_else() {
        let StmtKind::If(stmt) = first("if hp < 10 { heal(); } else { say(\"ok\") }") else {
            panic!("expected if");
        };
        assert_eq!(
            stmt.condition,
            Expr::Binary {
                left: Box::new(ident("hp")),
                op: BinOp::Lt,
                right: Box::new(Expr::Int(10)),
            }
        );
        assert_eq!(stmt.then_block.statements.len(), 1);
        assert!(stmt.else_block.is_some());
    }

    #[test]
    fn parse_for_loop_with_selector() {
        let StmtKind::For(stmt) = first("for entity e in @a { kill(@s) }") else {
            panic!("expected for");
        };
        assert_eq!(stmt.kind, "entity");
        assert_eq!(stmt.var, "e");
        assert_eq!(stmt.iterable, Expr::Str("@a".to_string()));
    }

    #[test]
    fn parse_while_loop() {
        let StmtKind::While(stmt) = first("while count > 0 { count = count - 1 }") else {
            panic!("expected while");
        };
        assert!(matches!(stmt.condition, Expr::Binary { op: BinOp::Gt, .. }));
        assert!(matches!(
            stmt.body.statements[0].kind,
            StmtKind::Assign(_)
        ));
    }

    #[test]
    fn parse_assignment_with_and_without_var() {
        let module = parse("var x = 5\nx = x + 3;").unwrap();
        assert_eq!(module.statements.len(), 2);
        let StmtKind::Assign(a) = &module.statements[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(a.target, "x");
        assert_eq!(a.value, Expr::Int(5));
        let StmtKind::Assign(b) = &module.statements[1].kind else {
            panic!("expected assignment");
        };
        assert!(matches!(b.value, Expr::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let StmtKind::Assign(a) = first("x = 1 + 2 * 3") else {
            panic!("expected assignment");
        };
        let Expr::Binary { op, right, .. } = a.value else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn additive_is_left_associative() {
        let StmtKind::Assign(a) = first("x = 10 - 4 - 3") else {
            panic!("expected assignment");
        };
        let Expr::Binary { left, op, right } = a.value else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Sub);
        assert!(matches!(*left, Expr::Binary { op: BinOp::Sub, .. }));
        assert_eq!(*right, Expr::Int(3));
    }

    #[test]
    fn comparison_binds_loosest() {
        let StmtKind::If(stmt) = first("if a + 1 >= b * 2 { f() }") else {
            panic!("expected if");
        };
        assert!(matches!(stmt.condition, Expr::Binary { op: BinOp::GtEq, .. }));
    }

    #[test]
    fn parenthesized_grouping() {
        let StmtKind::Assign(a) = first("x = (1 + 2) * 3") else {
            panic!("expected assignment");
        };
        let Expr::Binary { left, op, .. } = a.value else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Mul);
        assert!(matches!(*left, Expr::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn parse_call_arguments() {
        let StmtKind::Call(call) = first(r#"give(@p, "diamond", 1 + 2)"#) else {
            panic!("expected call");
        };
        assert_eq!(call.callee, "give");
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[0], Expr::Str("@p".to_string()));
        assert_eq!(call.args[1], Expr::Str("diamond".to_string()));
    }

    #[test]
    fn nested_call_as_argument() {
        let StmtKind::Call(call) = first("outer(inner(1))") else {
            panic!("expected call");
        };
        assert!(matches!(&call.args[0], Expr::Call(c) if c.callee == "inner"));
    }

    #[test]
    fn statement_positions_are_recorded() {
        let module = parse("fn a() {}\n\n  say(1)").unwrap();
        assert_eq!((module.statements[0].line, module.statements[0].col), (1, 1));
        assert_eq!((module.statements[1].line, module.statements[1].col), (3, 3));
    }

    #[test]
    fn stray_semicolons_are_ignored() {
        let module = parse(";; fn a() { ; say(1);; } ;").unwrap();
        assert_eq!(module.statements.len(), 1);
    }

    #[test]
    fn comments_and_whitespace_do_not_change_statement_count() {
        let plain = parse("fn a() { say(1) }\non load { a() }").unwrap();
        let noisy = parse(
            "# header\n\nfn a() {   # body\n    say(1)\n}\n\n\n# between\non load {\n  a()   \n}\n# end",
        )
        .unwrap();
        assert_eq!(plain.statements.len(), noisy.statements.len());
        let mut noisy_stripped = noisy.clone();
        let mut plain_stripped = plain.clone();
        for stmt in noisy_stripped.statements.iter_mut().chain(plain_stripped.statements.iter_mut()) {
            stmt.line = 0;
            stmt.col = 0;
            for block in stmt.blocks_mut() {
                for inner in &mut block.statements {
                    inner.line = 0;
                    inner.col = 0;
                }
            }
        }
        assert_eq!(plain_stripped.statements, noisy_stripped.statements);
    }

    #[test]
    fn non_call_expression_statement_is_rejected() {
        let err = parse("x + 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!((err.line, err.col), (1, 1));
        assert_eq!(err.token.as_deref(), Some("x"));
    }

    #[test]
    fn computed_callee_is_rejected() {
        assert!(parse("(f)(1)").is_err());
        assert!(parse("\"s\"(1)").is_err());
    }

    #[test]
    fn parse_error_missing_brace() {
        let err = parse("fn main() { say(1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert!(err.token.is_none(), "error at end of input carries no token");
        assert_eq!(err.file, Some(PathBuf::from("test.oort")));
    }

    #[test]
    fn parse_error_bad_event() {
        let err = parse("on start { }").unwrap_err();
        assert_eq!(err.token.as_deref(), Some("start"));
    }

    #[test]
    fn assignment_inside_condition_is_rejected() {
        assert!(parse("if x = 1 { f() }").is_err());
    }

    #[test]
    fn trailing_comma_in_arguments_is_rejected() {
        assert!(parse("f(1,)").is_err());
        assert!(parse("fn f(a,) {}").is_err());
    }

    #[test]
    fn lex_errors_carry_the_file() {
        let err = parse("say(1) $").unwrap_err();
        assert_eq!(err.kind, ErrorKind::LexError);
        assert_eq!(err.file, Some(PathBuf::from("test.oort")));
    }
}
