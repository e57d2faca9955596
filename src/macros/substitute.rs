//! Clone-with-substitution of macro bodies.
//!
//! Every expansion site gets its own freshly built subtree; nothing is
//! shared with the declaration or with other sites. Output nodes carry no
//! scopes.

use std::collections::HashMap;

use crate::dsl::ast::*;

/// Parameter name → argument expression.
pub type Bindings = HashMap<String, Expr>;

/// Copy `statements`, replacing identifier expressions bound in `bindings`.
///
/// Assignment targets, declaration names and callees are left alone, and a
/// name rebound inside the body (function parameter, loop variable) is not
/// replaced within that construct.
pub fn substitute_statements(statements: &[Stmt], bindings: &Bindings) -> Vec<Stmt> {
    statements
        .iter()
        .map(|stmt| substitute_stmt(stmt, bindings))
        .collect()
}

fn substitute_stmt(stmt: &Stmt, bindings: &Bindings) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Import(import) => StmtKind::Import(import.clone()),
        StmtKind::Macro(decl) => StmtKind::Macro(decl.clone()),
        StmtKind::Function(f) => {
            let inner = without(bindings, &f.params);
            StmtKind::Function(FunctionDecl {
                name: f.name.clone(),
                params: f.params.clone(),
                body: substitute_block(&f.body, &inner),
            })
        }
        StmtKind::On(on) => StmtKind::On(OnBlock {
            event: on.event,
            body: substitute_block(&on.body, bindings),
        }),
        StmtKind::If(stmt) => StmtKind::If(IfStmt {
            condition: substitute_expr(&stmt.condition, bindings),
            then_block: substitute_block(&stmt.then_block, bindings),
            else_block: stmt
                .else_block
                .as_ref()
                .map(|block| substitute_block(block, bindings)),
        }),
        StmtKind::For(stmt) => {
            let inner = without(bindings, std::slice::from_ref(&stmt.var));
            StmtKind::For(ForStmt {
                kind: stmt.kind.clone(),
                var: stmt.var.clone(),
                iterable: substitute_expr(&stmt.iterable, bindings),
                body: substitute_block(&stmt.body, &inner),
            })
        }
        StmtKind::While(stmt) => StmtKind::While(WhileStmt {
            condition: substitute_expr(&stmt.condition, bindings),
            body: substitute_block(&stmt.body, bindings),
        }),
        StmtKind::Assign(assign) => StmtKind::Assign(Assignment {
            target: assign.target.clone(),
            value: substitute_expr(&assign.value, bindings),
        }),
        StmtKind::Call(call) => StmtKind::Call(substitute_call(call, bindings)),
    };
    Stmt::new(kind, stmt.line, stmt.col)
}

fn substitute_block(block: &Block, bindings: &Bindings) -> Block {
    Block::new(substitute_statements(&block.statements, bindings))
}

fn substitute_call(call: &CallExpr, bindings: &Bindings) -> CallExpr {
    CallExpr {
        callee: call.callee.clone(),
        args: call
            .args
            .iter()
            .map(|arg| substitute_expr(arg, bindings))
            .collect(),
    }
}

/// Argument expressions are inserted as-is, never rescanned.
pub fn substitute_expr(expr: &Expr, bindings: &Bindings) -> Expr {
    match expr {
        Expr::Ident(name) => bindings.get(name).cloned().unwrap_or_else(|| expr.clone()),
        Expr::Str(_) | Expr::Int(_) => expr.clone(),
        Expr::Binary { left, op, right } => Expr::Binary {
            left: Box::new(substitute_expr(left, bindings)),
            op: *op,
            right: Box::new(substitute_expr(right, bindings)),
        },
        Expr::Call(call) => Expr::Call(substitute_call(call, bindings)),
    }
}

/// `bindings` minus `names`, cloned only when something is actually shadowed.
fn without<'b>(bindings: &'b Bindings, names: &[String]) -> std::borrow::Cow<'b, Bindings> {
    if names.iter().any(|n| bindings.contains_key(n)) {
        let mut inner = bindings.clone();
        for name in names {
            inner.remove(name);
        }
        std::borrow::Cow::Owned(inner)
    } else {
        std::borrow::Cow::Borrowed(bindings)
    }
}
